use std::collections::HashMap;

use crate::body::Body;
use crate::cluster::{Cluster, ClusterId};
use crate::TrackingError;

/// Bodies and clusters of one trajectory frame. Clusters are looked up by
/// id through a table rebuilt once ids are assigned.
#[derive(Debug, Clone)]
pub struct Frame<const D: usize> {
    frame_num: u64,
    bodies: Vec<Body<D>>,
    clusters: Vec<Cluster>,
    index: HashMap<ClusterId, usize>,
    monomer_fraction: f64,
}

impl<const D: usize> Frame<D> {
    /// Body ids must equal their position in `bodies`. Cluster references
    /// carried by the bodies are cleared.
    pub fn new(frame_num: u64, mut bodies: Vec<Body<D>>) -> Result<Self, TrackingError> {
        for (index, body) in bodies.iter_mut().enumerate() {
            if body.id() != index {
                return Err(TrackingError::BodyIdMismatch {
                    index,
                    id: body.id(),
                });
            }
            body.set_cluster_id(None);
        }
        let monomer_fraction = if bodies.is_empty() { 0.0 } else { 1.0 };
        Ok(Self {
            frame_num,
            bodies,
            clusters: Vec::new(),
            index: HashMap::new(),
            monomer_fraction,
        })
    }

    /// Turns every group of at least `min_size` bodies into an unlabeled
    /// cluster and updates the monomer fraction. Previous labels are dropped.
    pub fn form_clusters(
        &mut self,
        groups: &[Vec<usize>],
        min_size: usize,
    ) -> Result<(), TrackingError> {
        self.clusters = groups
            .iter()
            .filter(|group| group.len() >= min_size)
            .map(|group| Cluster::new(group.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        self.index.clear();
        self.bodies.iter_mut().for_each(|b| b.set_cluster_id(None));
        let clustered: usize = self.clusters.iter().map(Cluster::len).sum();
        self.monomer_fraction = if self.bodies.is_empty() {
            0.0
        } else {
            self.bodies.len().saturating_sub(clustered) as f64 / self.bodies.len() as f64
        };
        Ok(())
    }

    pub fn frame_num(&self) -> u64 {
        self.frame_num
    }

    pub fn bodies(&self) -> &[Body<D>] {
        &self.bodies
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn monomer_fraction(&self) -> f64 {
        self.monomer_fraction
    }

    pub fn monomer_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.cluster().is_none()).count()
    }

    /// Cluster that carried `id` when this frame was labeled.
    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.index.get(&id).map(|&k| &self.clusters[k])
    }

    pub(crate) fn cluster_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        let k = *self.index.get(&id)?;
        Some(&mut self.clusters[k])
    }

    pub(crate) fn labeled_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.index.keys().copied()
    }

    pub(crate) fn set_cluster_id(&mut self, k: usize, id: Option<ClusterId>) {
        self.clusters[k].set_cluster_id(id, &mut self.bodies);
    }

    pub(crate) fn steal_id(&mut self, k: usize, victim: &mut Cluster) {
        self.clusters[k].steal_id(victim, &mut self.bodies);
    }

    pub(crate) fn reindex(&mut self) {
        self.index = self
            .clusters
            .iter()
            .enumerate()
            .filter_map(|(k, c)| c.id().map(|id| (id, k)))
            .collect();
    }
}
