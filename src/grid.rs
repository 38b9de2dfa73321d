use itertools::Itertools;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::body::Body;
use crate::bonds::BondDict;
use crate::domain::{Domain, Position};
use crate::TrackingError;

const REACH: isize = 2;
/// Fewer, wider cells stay correct, so tiny radii are capped here.
const MAX_CELLS_PER_AXIS: usize = 1 << 20;

/// Bucket grid with cells at least `R/2` wide, so every pair closer than
/// `R` sits within a 5^D block of cells around either body.
///
/// Every axis must be at least `R/2` long. Axes are split into at most
/// `2^20` cells, which widens the cells for very small radii.
#[derive(Debug, Clone)]
pub struct NeighborGrid<const D: usize> {
    domain: Domain<D>,
    radius: f64,
    num_cells: [usize; D],
    box_size: Position<D>,
    offsets: Vec<[isize; D]>,
    cells: HashMap<[usize; D], Vec<usize>>,
    body_cells: Vec<[usize; D]>,
}

impl<const D: usize> NeighborGrid<D> {
    pub fn new(domain: Domain<D>, radius: f64) -> Result<Self, TrackingError> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(TrackingError::InvalidRadius(radius));
        }
        let size = domain.size();
        if let Some(axis) = (0..D).find(|&i| size[i] < radius / 2.0) {
            return Err(TrackingError::RadiusExceedsDomain {
                axis,
                size: size[axis],
                radius,
            });
        }
        let num_cells: [usize; D] = std::array::from_fn(|i| {
            ((size[i] / (radius / 2.0)).floor() as usize).clamp(1, MAX_CELLS_PER_AXIS)
        });
        let box_size = Position::from_fn(|i, _| size[i] / num_cells[i] as f64);
        let offsets = itertools::repeat_n(-REACH..=REACH, D)
            .multi_cartesian_product()
            .map(|offset| std::array::from_fn(|i| offset[i]))
            .collect();
        Ok(Self {
            domain,
            radius,
            num_cells,
            box_size,
            offsets,
            cells: HashMap::new(),
            body_cells: Vec::new(),
        })
    }

    pub fn domain(&self) -> &Domain<D> {
        &self.domain
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn num_cells(&self) -> &[usize; D] {
        &self.num_cells
    }

    pub fn box_size(&self) -> &Position<D> {
        &self.box_size
    }

    fn cell_index(&self, pos: &Position<D>) -> [usize; D] {
        let lo = self.domain.lo();
        std::array::from_fn(|i| {
            (((pos[i] - lo[i]) / self.box_size[i]) as usize).min(self.num_cells[i] - 1)
        })
    }

    /// Rebuilds the cell map from scratch. On error the grid is left empty.
    pub fn update(&mut self, bodies: &[Body<D>]) -> Result<(), TrackingError> {
        self.cells.clear();
        self.body_cells.clear();
        let body_cells = bodies
            .iter()
            .map(|body| {
                let pos = body.position();
                match self.domain.outside_axis(pos) {
                    Some(axis) => Err(TrackingError::OutOfBounds {
                        body: body.id(),
                        axis,
                        value: pos[axis],
                    }),
                    None => Ok(self.cell_index(pos)),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (i, cell) in body_cells.iter().enumerate() {
            self.cells.entry(*cell).or_default().push(i);
        }
        self.body_cells = body_cells;
        Ok(())
    }

    fn adjacent_cells(&self, center: [usize; D]) -> Vec<[usize; D]> {
        self.offsets
            .iter()
            .filter_map(|offset| {
                let mut cell = [0; D];
                for i in 0..D {
                    let n = self.num_cells[i] as isize;
                    let c = center[i] as isize + offset[i];
                    cell[i] = if self.domain.is_periodic(i) {
                        c.rem_euclid(n) as usize
                    } else if (0..n).contains(&c) {
                        c as usize
                    } else {
                        return None;
                    };
                }
                Some(cell)
            })
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Indices of the bodies strictly closer than the radius to
    /// `bodies[index]`, using minimum-image distances. `bodies` must be the
    /// slice passed to the last [`update`](Self::update).
    pub fn neighborhood(&self, bodies: &[Body<D>], index: usize) -> Vec<usize> {
        let Some(&center) = self.body_cells.get(index) else {
            return Vec::new();
        };
        let body = &bodies[index];
        self.adjacent_cells(center)
            .into_iter()
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .filter(|&j| j != index && bodies[j].distance_to_body(body, &self.domain) < self.radius)
            .collect()
    }

    /// Bond dictionary over all bodies: neighbors within the radius that
    /// also satisfy `criterion`. Queries run in parallel.
    pub fn bond_dict<F>(&self, bodies: &[Body<D>], criterion: F) -> BondDict
    where
        F: Fn(&Body<D>, &Body<D>) -> bool + Sync,
    {
        let adjacency = (0..bodies.len())
            .into_par_iter()
            .map(|i| {
                let bonded = self
                    .neighborhood(bodies, i)
                    .into_iter()
                    .filter(|&j| criterion(&bodies[i], &bodies[j]))
                    .map(|j| bodies[j].id())
                    .collect::<BTreeSet<_>>();
                (bodies[i].id(), bonded)
            })
            .collect::<BTreeMap<_, _>>();
        BondDict::from_adjacency(adjacency)
    }
}
