use log::warn;
use crate::chained_table::ChainedTable;
use crate::model::GeoPoint;

struct Vertex {
    id: u32,
    position: GeoPoint,
}

/// Properties as points on the globe, searched by brute force.
pub struct PropertyGraph {
    vertices: ChainedTable<u32, Vertex>,
}

impl PropertyGraph {
    pub fn new() -> Self {
        Self{vertices: ChainedTable::new(|v: &Vertex| v.id)}
    }

    /// Returns false, keeping the first position, when `id` is already known.
    pub fn add_property(&mut self, id: u32, position: GeoPoint) -> bool {
        if self.vertices.find(&id).is_some() {
            warn!("property {} already exists in the graph", id);
            return false;
        }
        self.vertices.insert(Vertex{id, position});
        true
    }

    pub fn remove_property(&mut self, id: u32) -> bool {
        self.vertices.remove(&id).is_ok()
    }

    pub fn position(&self, id: u32) -> Option<GeoPoint> {
        self.vertices.find(&id).map(|v| v.position)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The `n` properties closest to `id`, excluding itself, as `(id, km)`
    /// pairs sorted by distance. Unknown ids yield nothing.
    pub fn nearest(&self, id: u32, n: usize) -> Vec<(u32, f64)> {
        match self.position(id) {
            None => {
                warn!("property {} does not exist in the graph", id);
                Vec::new()
            },
            Some(origin) => self.collect_nearest(&origin, n, Some(id)),
        }
    }

    pub fn nearest_to(&self, point: &GeoPoint, n: usize) -> Vec<(u32, f64)> {
        self.collect_nearest(point, n, None)
    }

    fn collect_nearest(&self, origin: &GeoPoint, n: usize, exclude: Option<u32>) -> Vec<(u32, f64)> {
        let mut distances: Vec<(u32, f64)> = self.vertices.values()
            .filter(|v| Some(v.id) != exclude)
            .map(|v| (v.id, origin.distance_km(&v.position)))
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        distances.truncate(n);
        distances
    }
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
fn test_cities() -> PropertyGraph {
    let mut g = PropertyGraph::new();
    g.add_property(1, GeoPoint::new(40.7128, -74.0060));
    g.add_property(2, GeoPoint::new(34.0522, -118.2437));
    g.add_property(3, GeoPoint::new(41.8781, -87.6298));
    g.add_property(4, GeoPoint::new(29.7604, -95.3698));
    g.add_property(5, GeoPoint::new(37.7749, -122.4194));
    g
}

#[test]
fn test_nearest() {
    let g = test_cities();
    let nearest: Vec<u32> = g.nearest(1, 3).iter().map(|n| n.0).collect();
    assert_eq!(nearest, vec![3, 4, 2]);

    let all = g.nearest(1, 10);
    assert_eq!(all.len(), 4);
    assert!(all.windows(2).all(|w| w[0].1 <= w[1].1));
    assert!(g.nearest(42, 3).is_empty());
}

#[test]
fn test_duplicate_keeps_first() {
    let mut g = test_cities();
    assert!(!g.add_property(1, GeoPoint::new(0.0, 0.0)));
    assert_eq!(g.position(1), Some(GeoPoint::new(40.7128, -74.0060)));
    assert_eq!(g.len(), 5);

    assert!(g.remove_property(1));
    assert!(!g.remove_property(1));
    assert_eq!(g.nearest_to(&GeoPoint::new(37.0, -122.0), 1)[0].0, 5);
}
