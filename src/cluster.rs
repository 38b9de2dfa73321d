use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::body::Body;
use crate::domain::Position;
use crate::TrackingError;

pub const MIN_CLUSTER_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(pub u64);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bonded bodies of one frame. Members are body ids, which double as
/// indices into the frame's body slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    bodies: Vec<usize>,
    id: Option<ClusterId>,
}

impl Cluster {
    pub fn new(bodies: Vec<usize>) -> Result<Self, TrackingError> {
        if bodies.len() < MIN_CLUSTER_SIZE {
            return Err(TrackingError::UndersizedCluster(bodies.len()));
        }
        Ok(Self { bodies, id: None })
    }

    pub fn body_ids(&self) -> &[usize] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn id(&self) -> Option<ClusterId> {
        self.id
    }

    pub fn min_body_id(&self) -> usize {
        self.bodies.iter().copied().min().unwrap_or(usize::MAX)
    }

    pub fn positions<const D: usize>(&self, bodies: &[Body<D>]) -> Vec<Position<D>> {
        self.bodies.iter().map(|&i| *bodies[i].position()).collect()
    }

    /// Clusters the members belonged to in `old_bodies`.
    pub fn possible_matches<const D: usize>(&self, old_bodies: &[Body<D>]) -> BTreeSet<ClusterId> {
        self.overlaps(old_bodies).into_keys().collect()
    }

    /// Number of members shared with each cluster of `old_bodies`.
    pub fn overlaps<const D: usize>(&self, old_bodies: &[Body<D>]) -> BTreeMap<ClusterId, usize> {
        self.bodies
            .iter()
            .filter_map(|&i| old_bodies.get(i).and_then(Body::cluster))
            .fold(BTreeMap::new(), |mut overlaps, id| {
                *overlaps.entry(id).or_default() += 1;
                overlaps
            })
    }

    /// Members that were not part of any cluster in `old_bodies`.
    pub fn monomers_gained<const D: usize>(&self, old_bodies: &[Body<D>]) -> usize {
        self.bodies
            .iter()
            .filter(|&&i| old_bodies.get(i).and_then(Body::cluster).is_none())
            .count()
    }

    /// Sets the id and writes it onto every member body.
    pub fn set_cluster_id<const D: usize>(
        &mut self,
        id: Option<ClusterId>,
        bodies: &mut [Body<D>],
    ) {
        self.id = id;
        for &i in self.bodies.iter() {
            bodies[i].set_cluster_id(id);
        }
    }

    /// Takes the id of `victim`, leaving it unassigned. The victim's bodies
    /// are not touched: they belong to an earlier frame.
    pub fn steal_id<const D: usize>(&mut self, victim: &mut Cluster, bodies: &mut [Body<D>]) {
        self.set_cluster_id(victim.id.take(), bodies);
    }
}
