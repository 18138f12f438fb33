use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("no key can be extracted from the value")]
    InvalidValue,
    #[error("key not found")]
    NotFound,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is empty")]
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("key not found in table")]
    KeyNotFound,
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u32 },
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: u32 },
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Table(#[from] TableError),
}
