use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use crate::appointment_queue::AppointmentQueue;
use crate::error::InventoryError;
use crate::model::{Agent, Amenity, Appointment, Bid, Client, GeoPoint, Property, PropertyType};
use crate::ordered_index::OrderedIndex;
use crate::proximity::PropertyGraph;

pub const DEFAULT_RECOMMENDATIONS: usize = 5;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub properties: u32,
    pub clients: u32,
    pub agents: u32,
    /// Fixed seed for reproducible inventories, entropy otherwise.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self{properties: 100, clients: 100, agents: 10, seed: None}
    }
}

#[derive(Clone, Debug)]
pub struct ClientRequirements {
    pub price_min: f64,
    pub price_max: f64,
    pub amenities: Vec<Amenity>,
    pub property_type: PropertyType,
}

/// Listings, clients and agents indexed by id, plus pending appointments and
/// placed bids.
pub struct Inventory {
    properties: OrderedIndex<u32, Property>,
    clients: OrderedIndex<u32, Client>,
    agents: OrderedIndex<u32, Agent>,
    appointments: AppointmentQueue<Appointment>,
    bids: Vec<Bid>,
    graph: PropertyGraph,
}

impl Inventory {
    pub fn new() -> Self {
        Self{
            properties: OrderedIndex::new(|p: &Property| p.property_id),
            clients: OrderedIndex::new(|c: &Client| c.client_id),
            agents: OrderedIndex::new(|a: &Agent| a.agent_id),
            appointments: AppointmentQueue::new(),
            bids: Vec::new(),
            graph: PropertyGraph::new(),
        }
    }

    pub fn generate(config: &GeneratorConfig) -> Result<Self, InventoryError> {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        info!("generating {} properties, {} clients, {} agents (seed {:?})",
              config.properties, config.clients, config.agents, config.seed);

        let mut inventory = Self::new();
        for p in Property::random_batch(&mut rng, config.properties) {
            inventory.add_property(p)?;
        }
        for c in Client::random_batch(&mut rng, config.clients) {
            inventory.add_client(c)?;
        }
        for a in Agent::random_batch(&mut rng, config.agents) {
            inventory.add_agent(a)?;
        }
        Ok(inventory)
    }

    pub fn add_property(&mut self, property: Property) -> Result<(), InventoryError> {
        let id = property.property_id;
        if self.properties.contains(&id) {
            return Err(InventoryError::AlreadyExists{kind: "property", id});
        }
        self.graph.add_property(id, property.position);
        self.properties.insert(property)?;
        debug!("added property {}", id);
        Ok(())
    }

    pub fn property(&self, id: u32) -> Result<&Property, InventoryError> {
        self.properties.find(&id).ok_or(InventoryError::NotFound{kind: "property", id})
    }

    pub fn all_properties(&self) -> Vec<&Property> {
        self.properties.export_ordered()
    }

    pub fn remove_property(&mut self, id: u32) -> Result<Property, InventoryError> {
        let property = self.properties.delete(&id).ok_or(InventoryError::NotFound{kind: "property", id})?;
        self.graph.remove_property(id);
        debug!("removed property {}", id);
        Ok(property)
    }

    /// Replaces the stored property with the same id.
    pub fn update_property(&mut self, property: Property) -> Result<Property, InventoryError> {
        let previous = self.remove_property(property.property_id)?;
        self.add_property(property)?;
        Ok(previous)
    }

    pub fn add_client(&mut self, client: Client) -> Result<(), InventoryError> {
        let id = client.client_id;
        if self.clients.contains(&id) {
            return Err(InventoryError::AlreadyExists{kind: "client", id});
        }
        self.clients.insert(client)?;
        debug!("added client {}", id);
        Ok(())
    }

    pub fn client(&self, id: u32) -> Result<&Client, InventoryError> {
        self.clients.find(&id).ok_or(InventoryError::NotFound{kind: "client", id})
    }

    pub fn update_client_requirements(&mut self, id: u32, requirements: ClientRequirements)
                                      -> Result<(), InventoryError> {
        let mut client = self.clients.delete(&id).ok_or(InventoryError::NotFound{kind: "client", id})?;
        client.preferred_price_min = requirements.price_min;
        client.preferred_price_max = requirements.price_max;
        client.preferred_amenities = requirements.amenities;
        client.preferred_property_type = requirements.property_type;
        self.clients.insert(client)?;
        debug!("updated requirements of client {}", id);
        Ok(())
    }

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), InventoryError> {
        let id = agent.agent_id;
        if self.agents.contains(&id) {
            return Err(InventoryError::AlreadyExists{kind: "agent", id});
        }
        self.agents.insert(agent)?;
        debug!("added agent {}", id);
        Ok(())
    }

    pub fn agent(&self, id: u32) -> Result<&Agent, InventoryError> {
        self.agents.find(&id).ok_or(InventoryError::NotFound{kind: "agent", id})
    }

    pub fn schedule_appointment(&mut self, appointment: Appointment) {
        debug!("scheduled appointment {}", appointment.appointment_id);
        self.appointments.enqueue(appointment);
    }

    pub fn next_appointment(&mut self) -> Result<Appointment, InventoryError> {
        Ok(self.appointments.dequeue()?)
    }

    pub fn pending_appointments(&self) -> usize {
        self.appointments.len()
    }

    pub fn place_bid(&mut self, bid: Bid) -> Result<(), InventoryError> {
        self.property(bid.property_id)?;
        self.client(bid.client_id)?;
        debug!("client {} bid {:.2} on property {}", bid.client_id, bid.amount, bid.property_id);
        self.bids.push(bid);
        Ok(())
    }

    pub fn bids_for(&self, property_id: u32) -> Vec<&Bid> {
        self.bids.iter().filter(|b| b.property_id == property_id).collect()
    }

    pub fn highest_bid(&self, property_id: u32) -> Option<&Bid> {
        self.bids.iter()
            .filter(|b| b.property_id == property_id)
            .max_by(|a, b| a.amount.total_cmp(&b.amount))
    }

    /// Properties within the client's price range, of the preferred type and
    /// sharing at least one preferred amenity.
    pub fn filter_properties(&self, client_id: u32) -> Result<Vec<&Property>, InventoryError> {
        let client = self.client(client_id)?;
        Ok(self.properties.iter().filter(|p| client.accepts(p)).collect())
    }

    pub fn recommend_properties(&self, client_id: u32, near: &GeoPoint, limit: usize)
                                -> Result<Vec<&Property>, InventoryError> {
        let mut matches = self.filter_properties(client_id)?;
        matches.sort_by(|a, b| {
            near.distance_km(&a.position).total_cmp(&near.distance_km(&b.position))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    pub fn nearest_properties(&self, property_id: u32, n: usize) -> Result<Vec<(u32, f64)>, InventoryError> {
        self.property(property_id)?;
        Ok(self.graph.nearest(property_id, n))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
fn test_inventory() -> Inventory {
    Inventory::generate(&GeneratorConfig{seed: Some(2024), ..GeneratorConfig::default()}).unwrap()
}

#[cfg(test)]
fn test_property(property_id: u32, price: f64, amenities: Vec<Amenity>, position: GeoPoint) -> Property {
    Property{
        property_id,
        price,
        amenities,
        property_type: PropertyType::House,
        location: format!("{} Main St, Trenton, New Jersey 08608", property_id),
        position,
    }
}

#[test]
fn test_generated_lookups() {
    let inventory = test_inventory();
    assert_eq!(inventory.property(23).unwrap().property_id, 23);
    assert_eq!(inventory.client(55).unwrap().client_id, 55);
    let agent = inventory.agent(5).unwrap();
    assert_eq!(agent.assigned_properties, (41..=50).collect::<Vec<u32>>());

    assert!(matches!(inventory.agent(11), Err(InventoryError::NotFound{kind: "agent", id: 11})));
    let ids: Vec<u32> = inventory.all_properties().iter().map(|p| p.property_id).collect();
    assert_eq!(ids, (1..=100).collect::<Vec<u32>>());
}

#[test]
fn test_appointments_first_in_first_out() {
    let mut inventory = Inventory::new();
    let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .unwrap();
    for (appointment_id, client_id, agent_id, property_id) in
        [(3, 11, 1, 10), (2, 12, 2, 20), (1, 13, 3, 30), (4, 14, 4, 40), (5, 15, 5, 50)] {
        inventory.schedule_appointment(Appointment{appointment_id, client_id, agent_id, property_id,
                                                   scheduled_at: now});
    }
    assert_eq!(inventory.pending_appointments(), 5);

    let order: Vec<u32> = (0..5).map(|_| inventory.next_appointment().unwrap().appointment_id).collect();
    assert_eq!(order, vec![3, 2, 1, 4, 5]);
    assert!(matches!(inventory.next_appointment(), Err(InventoryError::Queue(_))));
}

#[test]
fn test_duplicate_ids_rejected() {
    let mut inventory = test_inventory();
    let existing = inventory.property(7).unwrap().clone();
    assert!(matches!(inventory.add_property(existing),
                     Err(InventoryError::AlreadyExists{kind: "property", id: 7})));
    assert_eq!(inventory.all_properties().len(), 100);
}

#[test]
fn test_update_and_remove_property() {
    let mut inventory = test_inventory();
    let mut updated = inventory.property(10).unwrap().clone();
    updated.price = 123_456.0;
    let previous = inventory.update_property(updated).unwrap();
    assert_eq!(previous.property_id, 10);
    assert_eq!(inventory.property(10).unwrap().price, 123_456.0);

    inventory.remove_property(10).unwrap();
    assert!(inventory.property(10).is_err());
    assert!(inventory.remove_property(10).is_err());
    assert_eq!(inventory.all_properties().len(), 99);
    assert!(inventory.nearest_properties(1, 200).unwrap().iter().all(|n| n.0 != 10));
}

#[test]
fn test_recommendations() {
    let mut inventory = Inventory::new();
    let origin = GeoPoint::new(40.2, -74.7);
    inventory.add_property(test_property(1, 300_000.0, vec![Amenity::Gym], GeoPoint::new(40.9, -74.1))).unwrap();
    inventory.add_property(test_property(2, 350_000.0, vec![Amenity::Gym, Amenity::Park], GeoPoint::new(40.21, -74.71))).unwrap();
    inventory.add_property(test_property(3, 900_000.0, vec![Amenity::Gym], GeoPoint::new(40.2, -74.7))).unwrap();
    inventory.add_property(test_property(4, 310_000.0, vec![Amenity::Storage], GeoPoint::new(40.2, -74.7))).unwrap();
    inventory.add_client(Client{
        client_id: 1,
        name: "Dana Cruz".to_string(),
        preferred_price_min: 250_000.0,
        preferred_price_max: 400_000.0,
        preferred_amenities: vec![Amenity::Gym, Amenity::Balcony],
        preferred_property_type: PropertyType::House,
    }).unwrap();

    let filtered: Vec<u32> = inventory.filter_properties(1).unwrap().iter().map(|p| p.property_id).collect();
    assert_eq!(filtered, vec![1, 2]);

    let recommended: Vec<u32> = inventory.recommend_properties(1, &origin, DEFAULT_RECOMMENDATIONS).unwrap()
        .iter().map(|p| p.property_id).collect();
    assert_eq!(recommended, vec![2, 1]);

    inventory.update_client_requirements(1, ClientRequirements{
        price_min: 800_000.0,
        price_max: 1_000_000.0,
        amenities: vec![Amenity::Gym],
        property_type: PropertyType::House,
    }).unwrap();
    let filtered: Vec<u32> = inventory.filter_properties(1).unwrap().iter().map(|p| p.property_id).collect();
    assert_eq!(filtered, vec![3]);
    assert!(inventory.recommend_properties(2, &origin, 5).is_err());
}

#[test]
fn test_bids() {
    let mut inventory = test_inventory();
    inventory.place_bid(Bid{bid_id: 1, client_id: 4, property_id: 23, amount: 410_000.0}).unwrap();
    inventory.place_bid(Bid{bid_id: 2, client_id: 5, property_id: 23, amount: 425_000.0}).unwrap();
    inventory.place_bid(Bid{bid_id: 3, client_id: 5, property_id: 24, amount: 300_000.0}).unwrap();
    assert!(inventory.place_bid(Bid{bid_id: 4, client_id: 5, property_id: 999, amount: 1.0}).is_err());

    assert_eq!(inventory.bids_for(23).len(), 2);
    assert_eq!(inventory.highest_bid(23).map(|b| b.bid_id), Some(2));
    assert_eq!(inventory.highest_bid(25), None);
}
