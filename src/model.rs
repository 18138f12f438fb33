use std::fmt;
use chrono::NaiveDateTime;
use fake::Dummy;
use fake::faker::address::raw::{BuildingNumber, CityName, StreetName, ZipCode};
use fake::faker::name::raw::Name;
use fake::locales::EN;
use rand::Rng;
use rand::seq::SliceRandom;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Amenity {
    Parking,
    SwimmingPool,
    Gym,
    Garden,
    Elevator,
    PetFriendly,
    Security,
    Laundry,
    Furnished,
    AirConditioning,
    WiFi,
    Dishwasher,
    Park,
    Balcony,
    Storage,
}

impl Amenity {
    pub const ALL: [Amenity; 15] = [
        Amenity::Parking,
        Amenity::SwimmingPool,
        Amenity::Gym,
        Amenity::Garden,
        Amenity::Elevator,
        Amenity::PetFriendly,
        Amenity::Security,
        Amenity::Laundry,
        Amenity::Furnished,
        Amenity::AirConditioning,
        Amenity::WiFi,
        Amenity::Dishwasher,
        Amenity::Park,
        Amenity::Balcony,
        Amenity::Storage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Parking => "Parking",
            Self::SwimmingPool => "Swimming Pool",
            Self::Gym => "Gym",
            Self::Garden => "Garden",
            Self::Elevator => "Elevator",
            Self::PetFriendly => "Pet Friendly",
            Self::Security => "Security",
            Self::Laundry => "Laundry",
            Self::Furnished => "Furnished",
            Self::AirConditioning => "Air Conditioning",
            Self::WiFi => "Wi-Fi",
            Self::Dishwasher => "Dishwasher",
            Self::Park => "Park",
            Self::Balcony => "Balcony",
            Self::Storage => "Storage",
        }
    }
}

impl fmt::Display for Amenity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PropertyType {
    House,
    Condominium,
    Apartment,
    Townhouse,
    Villa,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::House,
        PropertyType::Condominium,
        PropertyType::Apartment,
        PropertyType::Townhouse,
        PropertyType::Villa,
    ];

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::House => "House",
            Self::Condominium => "Condominium",
            Self::Apartment => "Apartment",
            Self::Townhouse => "Townhouse",
            Self::Villa => "Villa",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self{latitude, longitude}
    }

    /// Great-circle distance in kilometers (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Property {
    pub property_id: u32,
    pub price: f64,
    pub amenities: Vec<Amenity>,
    pub property_type: PropertyType,
    pub location: String,
    pub position: GeoPoint,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Client {
    pub client_id: u32,
    pub name: String,
    pub preferred_price_min: f64,
    pub preferred_price_max: f64,
    pub preferred_amenities: Vec<Amenity>,
    pub preferred_property_type: PropertyType,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Agent {
    pub agent_id: u32,
    pub name: String,
    pub assigned_properties: Vec<u32>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Appointment {
    pub appointment_id: u32,
    pub client_id: u32,
    pub agent_id: u32,
    pub property_id: u32,
    pub scheduled_at: NaiveDateTime,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Bid {
    pub bid_id: u32,
    pub client_id: u32,
    pub property_id: u32,
    pub amount: f64,
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

fn random_amenities<R: Rng + ?Sized>(rng: &mut R, max: usize) -> Vec<Amenity> {
    let count = rng.gen_range(1..=max);
    Amenity::ALL.choose_multiple(rng, count).copied().collect()
}

fn join_amenities(amenities: &[Amenity]) -> String {
    amenities.iter().map(|a| a.label()).collect::<Vec<_>>().join(", ")
}

impl Property {
    /// Generates properties with ids `1..=count` located in New Jersey.
    pub fn random_batch<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<Property> {
        (1..=count).map(|property_id| {
            let price = round_to(rng.gen_range(100_000.0..1_000_000.0), 2);
            let amenities = random_amenities(rng, 5);
            let property_type = PropertyType::random(rng);

            let number: String = Dummy::dummy_with_rng(&BuildingNumber(EN), rng);
            let street: String = Dummy::dummy_with_rng(&StreetName(EN), rng);
            let city: String = Dummy::dummy_with_rng(&CityName(EN), rng);
            let zip: String = Dummy::dummy_with_rng(&ZipCode(EN), rng);
            let location = format!("{} {}, {}, New Jersey {}", number, street, city, zip);

            let position = GeoPoint::new(round_to(rng.gen_range(39.8..41.4), 6),
                                         round_to(rng.gen_range(-75.5..-73.5), 6));

            Property{property_id, price, amenities, property_type, location, position}
        }).collect()
    }
}

impl Client {
    pub fn random_batch<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<Client> {
        (1..=count).map(|client_id| {
            let name: String = Dummy::dummy_with_rng(&Name(EN), rng);
            let preferred_price_min = round_to(rng.gen_range(200_000.0..1_000_000.0), 2);
            let lowest_max = preferred_price_min + 500.0;
            let preferred_price_max = round_to(rng.gen_range(lowest_max..=lowest_max.max(1_000_000.0)), 2);
            let preferred_amenities = random_amenities(rng, 3);
            let preferred_property_type = PropertyType::random(rng);

            Client{
                client_id,
                name,
                preferred_price_min,
                preferred_price_max,
                preferred_amenities,
                preferred_property_type,
            }
        }).collect()
    }

    pub fn accepts(&self, property: &Property) -> bool {
        property.price >= self.preferred_price_min
            && property.price <= self.preferred_price_max
            && property.property_type == self.preferred_property_type
            && property.amenities.iter().any(|a| self.preferred_amenities.contains(a))
    }
}

impl Agent {
    /// Agent `n` is assigned properties `(n - 1) * 10 + 1 ..= n * 10`.
    pub fn random_batch<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<Agent> {
        (1..=count).map(|agent_id| {
            let name: String = Dummy::dummy_with_rng(&Name(EN), rng);
            let assigned_properties = ((agent_id - 1) * 10 + 1..=agent_id * 10).collect();
            Agent{agent_id, name, assigned_properties}
        }).collect()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Property ID: {}", self.property_id)?;
        writeln!(f, "Price: ${:.2}", self.price)?;
        writeln!(f, "Amenities: {}", join_amenities(&self.amenities))?;
        writeln!(f, "Property Type: {}", self.property_type)?;
        writeln!(f, "Location: {}", self.location)?;
        writeln!(f, "Latitude: {}", self.position.latitude)?;
        write!(f, "Longitude: {}", self.position.longitude)
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Client ID: {}", self.client_id)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Preferred Price Range: ${:.2} - ${:.2}",
                 self.preferred_price_min, self.preferred_price_max)?;
        writeln!(f, "Preferred Amenities: {}", join_amenities(&self.preferred_amenities))?;
        write!(f, "Preferred Property Type: {}", self.preferred_property_type)
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assigned = self.assigned_properties.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        writeln!(f, "Agent ID: {}", self.agent_id)?;
        writeln!(f, "Name: {}", self.name)?;
        write!(f, "Assigned Properties: {}", assigned.join(", "))
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Appointment ID: {}", self.appointment_id)?;
        writeln!(f, "Client: {}", self.client_id)?;
        writeln!(f, "Agent: {}", self.agent_id)?;
        writeln!(f, "Property ID: {}", self.property_id)?;
        write!(f, "Date and Time: {}", self.scheduled_at.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bid ID: {}, Client: {}, Property ID: {}, Bid Amount: ${:.2}",
               self.bid_id, self.client_id, self.property_id, self.amount)
    }
}


#[cfg(test)]
use rand::SeedableRng;
#[cfg(test)]
use rand::rngs::SmallRng;

#[test]
fn test_random_properties() {
    let mut rng = SmallRng::seed_from_u64(7);
    let properties = Property::random_batch(&mut rng, 100);
    assert_eq!(properties.len(), 100);

    for (i, p) in properties.iter().enumerate() {
        assert_eq!(p.property_id, i as u32 + 1);
        assert!(p.price >= 100_000.0 && p.price <= 1_000_000.0);
        assert!(!p.amenities.is_empty() && p.amenities.len() <= 5);
        let mut dedup = p.amenities.clone();
        dedup.sort_by_key(|a| a.label());
        dedup.dedup();
        assert_eq!(dedup.len(), p.amenities.len());
        assert!(p.position.latitude >= 39.8 && p.position.latitude <= 41.4);
        assert!(p.position.longitude >= -75.5 && p.position.longitude <= -73.5);
        assert!(p.location.contains(", New Jersey "));
    }
}

#[test]
fn test_random_clients() {
    let mut rng = SmallRng::seed_from_u64(11);
    for c in Client::random_batch(&mut rng, 100) {
        assert!(c.preferred_price_min >= 200_000.0);
        assert!(c.preferred_price_max >= c.preferred_price_min + 499.99);
        assert!(!c.name.is_empty());
        assert!(!c.preferred_amenities.is_empty() && c.preferred_amenities.len() <= 3);
    }
}

#[test]
fn test_random_agents() {
    let mut rng = SmallRng::seed_from_u64(3);
    let agents = Agent::random_batch(&mut rng, 10);
    assert_eq!(agents[0].assigned_properties, (1..=10).collect::<Vec<u32>>());
    assert_eq!(agents[4].assigned_properties, (41..=50).collect::<Vec<u32>>());
    assert_eq!(agents[9].agent_id, 10);
}

#[test]
fn test_same_seed_same_batch() {
    let a = Property::random_batch(&mut SmallRng::seed_from_u64(5), 20);
    let b = Property::random_batch(&mut SmallRng::seed_from_u64(5), 20);
    assert_eq!(a, b);
}

#[test]
fn test_distance_km() {
    let new_york = GeoPoint::new(40.7128, -74.0060);
    let los_angeles = GeoPoint::new(34.0522, -118.2437);
    let d = new_york.distance_km(&los_angeles);
    assert!((d - 3935.7).abs() < 5.0, "{}", d);
    assert_eq!(new_york.distance_km(&new_york), 0.0);
}

#[test]
fn test_display() {
    let agent = Agent{agent_id: 5, name: "Ann Lee".to_string(), assigned_properties: vec![41, 42]};
    assert_eq!(agent.to_string(), "Agent ID: 5\nName: Ann Lee\nAssigned Properties: 41, 42");

    let bid = Bid{bid_id: 1, client_id: 2, property_id: 3, amount: 1500.5};
    assert_eq!(bid.to_string(), "Bid ID: 1, Client: 2, Property ID: 3, Bid Amount: $1500.50");
    assert_eq!(Amenity::WiFi.to_string(), "Wi-Fi");
}
