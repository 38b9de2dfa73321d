use crate::cluster::ClusterId;
use crate::domain::{Domain, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct Body<const D: usize> {
    id: usize,
    position: Position<D>,
    cluster: Option<ClusterId>,
}

impl<const D: usize> Body<D> {
    pub fn new(id: usize, position: Position<D>) -> Self {
        Self {
            id,
            position,
            cluster: None,
        }
    }

    pub fn from(id: usize, coords: [f64; D]) -> Self {
        Self::new(id, Position::from(coords))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> &Position<D> {
        &self.position
    }

    pub fn cluster(&self) -> Option<ClusterId> {
        self.cluster
    }

    pub fn set_cluster_id(&mut self, cluster: Option<ClusterId>) {
        self.cluster = cluster;
    }

    pub fn distance_to_body(&self, other: &Self, domain: &Domain<D>) -> f64 {
        domain.distance(&self.position, &other.position)
    }
}
