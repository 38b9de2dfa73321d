use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::body::Body;
use crate::cluster::Cluster;
use crate::domain::Position;
use crate::TrackingError;

/// Per-cluster quantity that can be recorded into a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Observable {
    NumBodies,
    Positions,
}

impl Observable {
    pub const ALL: [Observable; 2] = [Self::NumBodies, Self::Positions];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NumBodies => "num_bodies",
            Self::Positions => "positions",
        }
    }

    fn compute<const D: usize>(&self, cluster: &Cluster, bodies: &[Body<D>]) -> Value<D> {
        match self {
            Self::NumBodies => Value::Count(cluster.len()),
            Self::Positions => Value::Positions(cluster.positions(bodies)),
        }
    }
}

impl FromStr for Observable {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|obs| obs.name() == name)
            .ok_or_else(|| TrackingError::UnsupportedObservable(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value<const D: usize> {
    Count(usize),
    Positions(Vec<Position<D>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<const D: usize> {
    pub frame: Option<u64>,
    pub monomer_fraction: Option<f64>,
    values: BTreeMap<Observable, Value<D>>,
}

impl<const D: usize> Snapshot<D> {
    pub fn get(&self, observable: Observable) -> Option<&Value<D>> {
        self.values.get(&observable)
    }

    pub fn num_bodies(&self) -> Option<usize> {
        match self.get(Observable::NumBodies) {
            Some(Value::Count(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn positions(&self) -> Option<&[Position<D>]> {
        match self.get(Observable::Positions) {
            Some(Value::Positions(p)) => Some(p.as_slice()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observer {
    observables: BTreeSet<Observable>,
}

impl Default for Observer {
    fn default() -> Self {
        Self::new([Observable::NumBodies])
    }
}

impl Observer {
    pub fn new(observables: impl IntoIterator<Item = Observable>) -> Self {
        Self {
            observables: observables.into_iter().collect(),
        }
    }

    pub fn from_names<S: AsRef<str>>(
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, TrackingError> {
        let observables = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { observables })
    }

    pub fn add_observable(&mut self, name: &str) -> Result<(), TrackingError> {
        self.observables.insert(name.parse()?);
        Ok(())
    }

    pub fn observables(&self) -> &BTreeSet<Observable> {
        &self.observables
    }

    pub fn compute<const D: usize>(&self, cluster: &Cluster, bodies: &[Body<D>]) -> Snapshot<D> {
        Snapshot {
            frame: None,
            monomer_fraction: None,
            values: self
                .observables
                .iter()
                .map(|obs| (*obs, obs.compute(cluster, bodies)))
                .collect(),
        }
    }
}
