use std::sync::Arc;

use crate::body::Body;
use crate::cluster::Cluster;
use crate::observer::{Observer, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct MonomerEvent<const D: usize> {
    pub snapshot: Snapshot<D>,
    pub count: usize,
}

/// Lifecycle record of one cluster id: birth, death and the observables
/// recorded every frame the cluster was seen.
#[derive(Debug, Clone)]
pub struct ClusterInfo<const D: usize> {
    birth_frame: u64,
    death_frame: Option<u64>,
    last_updated: Option<u64>,
    lifetime: Option<u64>,
    has_parent: bool,
    observer: Arc<Observer>,
    data: Vec<Snapshot<D>>,
    from_monomer: Vec<MonomerEvent<D>>,
    to_monomer: Vec<MonomerEvent<D>>,
}

impl<const D: usize> ClusterInfo<D> {
    pub fn new(
        cluster: &Cluster,
        bodies: &[Body<D>],
        frame_num: u64,
        monomer_frac: f64,
        observer: Arc<Observer>,
    ) -> Self {
        let mut info = Self {
            birth_frame: frame_num,
            death_frame: None,
            last_updated: None,
            lifetime: None,
            has_parent: false,
            observer,
            data: Vec::new(),
            from_monomer: Vec::new(),
            to_monomer: Vec::new(),
        };
        info.update_data(cluster, bodies, frame_num, monomer_frac);
        info
    }

    /// Records the pre-split state this cluster was born from, at most once.
    pub fn set_parent(&mut self, cluster: &Cluster, bodies: &[Body<D>]) {
        if !self.has_parent && !self.is_dead() {
            self.data.insert(0, self.observer.compute(cluster, bodies));
            self.has_parent = true;
        }
    }

    /// Marks the cluster dead at `frame_num`. Ignored when already dead or
    /// when `frame_num` precedes the birth frame. Returns whether it died.
    pub fn kill(&mut self, frame_num: u64) -> bool {
        if self.is_dead() || frame_num < self.birth_frame {
            return false;
        }
        self.death_frame = Some(frame_num);
        self.lifetime = Some(frame_num - self.birth_frame);
        true
    }

    /// Appends an observation unless dead or `frame_num` is not past the
    /// last recorded frame. Returns whether anything was recorded.
    pub fn update_data(
        &mut self,
        cluster: &Cluster,
        bodies: &[Body<D>],
        frame_num: u64,
        monomer_frac: f64,
    ) -> bool {
        if self.is_dead() || self.last_updated.is_some_and(|last| frame_num <= last) {
            return false;
        }
        let mut snapshot = self.observer.compute(cluster, bodies);
        snapshot.frame = Some(frame_num);
        snapshot.monomer_fraction = Some(monomer_frac);
        self.data.push(snapshot);
        self.last_updated = Some(frame_num);
        true
    }

    /// Monomers absorbed into the cluster; `monomer_frac` is the fraction
    /// the monomers were drawn from.
    pub fn add_monomers(
        &mut self,
        cluster: &Cluster,
        bodies: &[Body<D>],
        frame_num: u64,
        num_monomers: usize,
        monomer_frac: f64,
    ) {
        if self.is_dead() {
            return;
        }
        let mut snapshot = self.observer.compute(cluster, bodies);
        snapshot.frame = Some(frame_num);
        snapshot.monomer_fraction = Some(monomer_frac);
        self.from_monomer.push(MonomerEvent {
            snapshot,
            count: num_monomers,
        });
    }

    pub fn remove_monomers(
        &mut self,
        cluster: &Cluster,
        bodies: &[Body<D>],
        frame_num: u64,
        num_monomers: usize,
    ) {
        if self.is_dead() {
            return;
        }
        let mut snapshot = self.observer.compute(cluster, bodies);
        snapshot.frame = Some(frame_num);
        self.to_monomer.push(MonomerEvent {
            snapshot,
            count: num_monomers,
        });
    }

    pub fn data(&self) -> &[Snapshot<D>] {
        &self.data
    }

    pub fn monomer_gain_data(&self) -> &[MonomerEvent<D>] {
        &self.from_monomer
    }

    pub fn monomer_loss_data(&self) -> &[MonomerEvent<D>] {
        &self.to_monomer
    }

    pub fn birth_frame(&self) -> u64 {
        self.birth_frame
    }

    pub fn death_frame(&self) -> Option<u64> {
        self.death_frame
    }

    pub fn last_updated(&self) -> Option<u64> {
        self.last_updated
    }

    pub fn lifetime(&self) -> Option<u64> {
        self.lifetime
    }

    pub fn is_dead(&self) -> bool {
        self.death_frame.is_some()
    }

    pub fn has_parent(&self) -> bool {
        self.has_parent
    }
}
