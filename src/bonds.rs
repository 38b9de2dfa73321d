use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::TrackingError;

/// Symmetric bond adjacency keyed by body id. Neighbor sets are ordered so
/// traversal order is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BondDict {
    bonds: BTreeMap<usize, BTreeSet<usize>>,
}

impl BondDict {
    /// Dictionary with an empty entry for every id in `0..n`.
    pub fn new(n: usize) -> Self {
        Self {
            bonds: (0..n).map(|i| (i, BTreeSet::new())).collect(),
        }
    }

    pub fn from_pairs(n: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        pairs.into_iter().fold(Self::new(n), |mut dict, (a, b)| {
            dict.insert(a, b);
            dict
        })
    }

    pub fn from_adjacency(bonds: BTreeMap<usize, BTreeSet<usize>>) -> Self {
        Self { bonds }
    }

    pub fn insert(&mut self, a: usize, b: usize) {
        self.bonds.entry(a).or_default().insert(b);
        self.bonds.entry(b).or_default().insert(a);
    }

    pub fn neighbors(&self, id: usize) -> Option<&BTreeSet<usize>> {
        self.bonds.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Checks that ids are exactly `0..len` and every bond has its reverse.
    pub fn validate(&self) -> Result<(), TrackingError> {
        let n = self.bonds.len();
        if let Some(missing) = (0..n).find(|i| !self.bonds.contains_key(i)) {
            return Err(TrackingError::MissingBondEntry(missing));
        }
        for (&a, adj) in self.bonds.iter() {
            for &b in adj {
                match self.bonds.get(&b) {
                    None => return Err(TrackingError::MissingBondEntry(b)),
                    Some(rev) if !rev.contains(&a) => {
                        return Err(TrackingError::AsymmetricBond(a, b));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Connected components of the bond graph in breadth-first discovery
    /// order. Each new component starts at the lowest unassigned id.
    pub fn groups(&self) -> Result<Vec<Vec<usize>>, TrackingError> {
        let n = self.bonds.len();
        let mut to_group: Vec<Option<usize>> = vec![None; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut queue = VecDeque::new();
        for start in 0..n {
            if to_group[start].is_some() {
                continue;
            }
            let group_num = groups.len();
            to_group[start] = Some(group_num);
            groups.push(vec![start]);
            queue.push_back(start);
            while let Some(id) = queue.pop_front() {
                let adj = self
                    .bonds
                    .get(&id)
                    .ok_or(TrackingError::MissingBondEntry(id))?;
                for &member in adj {
                    if member >= n {
                        return Err(TrackingError::MissingBondEntry(member));
                    }
                    if to_group[member].is_none() {
                        to_group[member] = Some(group_num);
                        groups[group_num].push(member);
                        queue.push_back(member);
                    }
                }
            }
        }
        Ok(groups)
    }
}

/// Number of groups of each size, and the largest size (0 if no groups).
pub fn group_size_histogram(groups: &[Vec<usize>]) -> (BTreeMap<usize, usize>, usize) {
    let sizes = groups.iter().fold(BTreeMap::new(), |mut sizes, group| {
        *sizes.entry(group.len()).or_default() += 1;
        sizes
    });
    let largest = sizes.keys().next_back().copied().unwrap_or(0);
    (sizes, largest)
}
