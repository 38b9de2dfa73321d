use nalgebra::SVector;

use crate::TrackingError;

pub type Position<const D: usize> = SVector<f64, D>;

/// Axis-aligned simulation box with per-axis periodicity. Only `D` of 2
/// or 3 can be constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain<const D: usize> {
    lo: Position<D>,
    hi: Position<D>,
    periodic: [bool; D],
}

impl<const D: usize> Domain<D> {
    pub fn new(lim: [[f64; 2]; D], periodic: [bool; D]) -> Result<Self, TrackingError> {
        if !(2..=3).contains(&D) {
            return Err(TrackingError::UnsupportedDimension(D));
        }
        for (axis, &[lo, hi]) in lim.iter().enumerate() {
            if !(hi - lo > 0.0) || !lo.is_finite() || !hi.is_finite() {
                return Err(TrackingError::InvalidDomain { axis, lo, hi });
            }
        }
        Ok(Self {
            lo: Position::from_fn(|i, _| lim[i][0]),
            hi: Position::from_fn(|i, _| lim[i][1]),
            periodic,
        })
    }

    pub fn lo(&self) -> &Position<D> {
        &self.lo
    }

    pub fn hi(&self) -> &Position<D> {
        &self.hi
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    pub fn size(&self) -> Position<D> {
        Position::from_fn(|i, _| self.hi[i] - self.lo[i])
    }

    /// First axis on which `pos` falls outside `[lo, hi]`.
    pub fn outside_axis(&self, pos: &Position<D>) -> Option<usize> {
        (0..D).find(|&i| !(pos[i] >= self.lo[i] && pos[i] <= self.hi[i]))
    }

    /// Folds coordinates on periodic axes back into the box.
    pub fn wrap(&self, pos: &Position<D>) -> Position<D> {
        Position::from_fn(|i, _| {
            if self.periodic[i] {
                let size = self.hi[i] - self.lo[i];
                self.lo[i] + (pos[i] - self.lo[i]).rem_euclid(size)
            } else {
                pos[i]
            }
        })
    }

    /// Displacement `b - a` under the minimum-image convention.
    pub fn displacement(&self, a: &Position<D>, b: &Position<D>) -> Position<D> {
        Position::from_fn(|i, _| {
            let d = b[i] - a[i];
            if self.periodic[i] {
                let size = self.hi[i] - self.lo[i];
                d - size * (d / size).round()
            } else {
                d
            }
        })
    }

    pub fn distance(&self, a: &Position<D>, b: &Position<D>) -> f64 {
        self.displacement(a, b)
            .iter()
            .map(|d| d * d)
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::assert_f64_near;

    #[test]
    fn test_invalid_domain() {
        let err = Domain::new([[0.0, 1.0], [2.0, 2.0]], [false; 2]).unwrap_err();
        assert_eq!(
            err,
            TrackingError::InvalidDomain {
                axis: 1,
                lo: 2.0,
                hi: 2.0
            }
        );
        assert!(Domain::new([[1.0, 0.0]; 3], [false; 3]).is_err());
    }

    #[test]
    fn test_unsupported_dimension() {
        assert_eq!(
            Domain::new([[0.0, 1.0]], [false]).unwrap_err(),
            TrackingError::UnsupportedDimension(1)
        );
        assert_eq!(
            Domain::new([[0.0, 1.0]; 4], [true; 4]).unwrap_err(),
            TrackingError::UnsupportedDimension(4)
        );
        assert!(Domain::new([[0.0, 1.0]; 2], [true; 2]).is_ok());
    }

    #[test]
    fn test_minimum_image_distance() {
        let domain = Domain::new([[0.0, 10.0], [-5.0, 5.0]], [true, false]).unwrap();
        let a = Position::from([0.5, -4.5]);
        let b = Position::from([9.5, -4.5]);
        assert_f64_near!(domain.distance(&a, &b), 1.0);
        let c = Position::from([0.5, 4.5]);
        assert_f64_near!(domain.distance(&a, &c), 9.0);
    }

    #[test]
    fn test_wrap_and_bounds() {
        let domain = Domain::new([[0.0, 10.0], [0.0, 10.0]], [true, false]).unwrap();
        let pos = Position::from([-1.0, 3.0]);
        assert_eq!(domain.outside_axis(&pos), Some(0));
        let wrapped = domain.wrap(&pos);
        assert_f64_near!(wrapped[0], 9.0);
        assert_eq!(domain.outside_axis(&wrapped), None);
        assert_eq!(domain.outside_axis(&Position::from([1.0, 11.0])), Some(1));
        assert_eq!(domain.outside_axis(&Position::from([1.0, f64::NAN])), Some(1));
    }
}
