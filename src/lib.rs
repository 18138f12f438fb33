pub mod error;
pub mod ordered_index;
pub mod appointment_queue;
pub mod chained_table;
pub mod model;
pub mod proximity;
pub mod inventory;
