use super::{lit, tighten, unbounded, Barrier, SLACK_FLOOR};
use crate::errors::{Result, SamplerError};
use ndarray::{Array1, Array2, ArrayView1, Axis, NdFloat, Zip};

/// Constraint matrix of a polytope: a dense `m × d` matrix, or the diagonal of a
/// square one (one constraint per coordinate).
#[derive(Debug, Clone, PartialEq)]
enum Constraints<T> {
    Dense(Array2<T>),
    Diagonal(Array1<T>),
}

/**
Weighted log barrier of the polytope `{x : Ax <= b}`.

The potential is `φ(x) = -Σ_i w_i log(b_i - <a_i, x>)`. All weights are 1 when none
are given. The region must be bounded along every direction a sampler may draw.
Otherwise [`Barrier::boundary_distances`] reports a degenerate direction.

# Example

```rust
use conspace_sampler::barriers::{Barrier, PolytopeBarrier};
use ndarray::{arr1, arr2};

// The triangle x >= 0, y >= 0, x + y <= 1.
let a = arr2(&[[-1.0, 0.0], [0.0, -1.0], [1.0, 1.0]]);
let barrier = PolytopeBarrier::new(a, arr1(&[0.0, 0.0, 1.0]), None).unwrap();
assert!(barrier.contains(arr1(&[0.25, 0.25]).view()));
assert!(!barrier.contains(arr1(&[0.75, 0.75]).view()));
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct PolytopeBarrier<T> {
    a: Constraints<T>,
    b: Array1<T>,
    weights: Option<Array1<T>>,
}

impl<T: NdFloat> PolytopeBarrier<T> {
    /// Polytope with a dense `m × d` constraint matrix.
    pub fn new(a: Array2<T>, b: Array1<T>, weights: Option<Array1<T>>) -> Result<Self> {
        if a.ncols() == 0 || a.nrows() == 0 {
            return Err(SamplerError::InvalidBarrier(
                "polytope needs at least one constraint and one dimension".to_string(),
            ));
        }
        Self::validated(Constraints::Dense(a), b, weights)
    }

    /// Polytope with constraints `a_i x_i <= b_i`, one per coordinate.
    pub fn diagonal(a: Array1<T>, b: Array1<T>, weights: Option<Array1<T>>) -> Result<Self> {
        if a.is_empty() {
            return Err(SamplerError::InvalidBarrier(
                "polytope needs at least one constraint and one dimension".to_string(),
            ));
        }
        if a.iter().any(|ai| *ai == T::zero()) {
            return Err(SamplerError::InvalidBarrier(
                "diagonal polytope coefficients must be non-zero".to_string(),
            ));
        }
        Self::validated(Constraints::Diagonal(a), b, weights)
    }

    fn validated(a: Constraints<T>, b: Array1<T>, weights: Option<Array1<T>>) -> Result<Self> {
        let n_constraints = match &a {
            Constraints::Dense(m) => m.nrows(),
            Constraints::Diagonal(d) => d.len(),
        };
        if b.len() != n_constraints {
            return Err(SamplerError::InvalidBarrier(format!(
                "polytope has {n_constraints} constraints but b has length {}",
                b.len()
            )));
        }
        if let Some(w) = &weights {
            if w.len() != n_constraints {
                return Err(SamplerError::InvalidBarrier(
                    "if weights are passed, they need one entry per constraint".to_string(),
                ));
            }
        }
        Ok(Self { a, b, weights })
    }

    /// Whether the constraint matrix is stored as a diagonal.
    pub fn is_diagonal(&self) -> bool {
        matches!(self.a, Constraints::Diagonal(_))
    }

    pub fn n_constraints(&self) -> usize {
        self.b.len()
    }

    fn apply(&self, x: ArrayView1<T>) -> Array1<T> {
        match &self.a {
            Constraints::Dense(m) => m.dot(&x),
            Constraints::Diagonal(d) => d * &x,
        }
    }

    fn safe_slack(&self, x: ArrayView1<T>) -> Array1<T> {
        let floor = lit::<T>(SLACK_FLOOR);
        (&self.b - &self.apply(x)).mapv(|s| s.max(floor))
    }

    fn weight(&self, i: usize) -> T {
        self.weights.as_ref().map_or(T::one(), |w| w[i])
    }
}

impl<T: NdFloat> Barrier<T> for PolytopeBarrier<T> {
    fn dimension(&self) -> usize {
        match &self.a {
            Constraints::Dense(m) => m.ncols(),
            Constraints::Diagonal(d) => d.len(),
        }
    }

    fn contains(&self, x: ArrayView1<T>) -> bool {
        Zip::from(&self.apply(x))
            .and(&self.b)
            .all(|&ax, &b| ax <= b)
    }

    fn chord(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> (T, T) {
        let rates = self.apply(direction);
        let slacks = &self.b - &self.apply(x);
        let mut interval = unbounded::<T>();
        for (&rate, &slack) in rates.iter().zip(slacks.iter()) {
            tighten(&mut interval, rate, slack);
        }
        interval
    }

    fn value(&self, x: ArrayView1<T>) -> T {
        let logs = self.safe_slack(x).mapv(|s| s.ln());
        let weighted = match &self.weights {
            Some(w) => logs * w,
            None => logs,
        };
        -weighted.sum()
    }

    fn gradient(&self, x: ArrayView1<T>) -> Array1<T> {
        let mut coeffs = self.safe_slack(x).mapv(|s| s.recip());
        if let Some(w) = &self.weights {
            coeffs *= w;
        }
        match &self.a {
            Constraints::Dense(m) => m.t().dot(&coeffs),
            Constraints::Diagonal(d) => d * &coeffs,
        }
    }

    fn hessian(&self, x: ArrayView1<T>) -> Array2<T> {
        let slack = self.safe_slack(x);
        let coeffs = Array1::from_shape_fn(slack.len(), |i| self.weight(i) / (slack[i] * slack[i]));
        match &self.a {
            Constraints::Dense(m) => {
                let scaled = m * &coeffs.view().insert_axis(Axis(1));
                m.t().dot(&scaled)
            }
            Constraints::Diagonal(d) => Array2::from_diag(&(d * d * &coeffs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barriers::BoxBarrier;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2, Array};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn unit_square() -> PolytopeBarrier<f64> {
        let a = arr2(&[[1.0, 0.0], [-1.0, 0.0], [0.0, 1.0], [0.0, -1.0]]);
        PolytopeBarrier::new(a, arr1(&[1.0, 1.0, 1.0, 1.0]), None).unwrap()
    }

    #[test]
    fn rejects_inconsistent_shapes() {
        let a = arr2(&[[1.0, 0.0], [0.0, 1.0]]);
        assert!(PolytopeBarrier::new(a.clone(), arr1(&[1.0]), None).is_err());
        assert!(PolytopeBarrier::new(a, arr1(&[1.0, 1.0]), Some(arr1(&[1.0]))).is_err());
        assert!(PolytopeBarrier::diagonal(arr1(&[1.0, 0.0]), arr1(&[1.0, 1.0]), None).is_err());
    }

    #[test]
    fn square_chord_matches_the_box() {
        let square = unit_square();
        let reference = BoxBarrier::new(arr1(&[1.0, 1.0])).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            let x = Array::from_shape_fn(2, |_| rng.random::<f64>() * 2.0 - 1.0);
            let angle = rng.random::<f64>() * std::f64::consts::TAU;
            let d = arr1(&[angle.cos(), angle.sin()]);
            let (lo, hi) = square.boundary_distances(x.view(), d.view()).unwrap();
            let (ref_lo, ref_hi) = reference.boundary_distances(x.view(), d.view()).unwrap();
            assert_abs_diff_eq!(lo, ref_lo, epsilon = 1e-12);
            assert_abs_diff_eq!(hi, ref_hi, epsilon = 1e-12);
        }
    }

    #[test]
    fn unbounded_direction_is_degenerate() {
        // Half-plane x <= 1.
        let half_plane = PolytopeBarrier::new(arr2(&[[1.0, 0.0]]), arr1(&[1.0]), None).unwrap();
        let result = half_plane.boundary_distances(arr1(&[0.0, 0.0]).view(), arr1(&[0.0, 1.0]).view());
        assert!(matches!(result, Err(SamplerError::DegenerateDirection)));
    }

    #[test]
    fn diagonal_matches_dense() {
        let mut rng = SmallRng::seed_from_u64(23);
        for dim in [5, 7, 9, 11] {
            let a = Array::from_shape_fn(dim, |_| {
                let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
                sign * (rng.random::<f64>() * 3.0 + 1.0)
            });
            let b = Array::from_shape_fn(dim, |_| rng.random::<f64>() * 2.0 - 1.0);
            let full = PolytopeBarrier::new(Array2::from_diag(&a), b.clone(), None).unwrap();
            let diag = PolytopeBarrier::diagonal(a.clone(), b.clone(), None).unwrap();
            assert!(diag.is_diagonal() && !full.is_diagonal());

            // Feasible points sit strictly below each bound b_i / a_i.
            let bounds = &b / &a;
            let x = Array::from_shape_fn(dim, |i| {
                let offset = rng.random::<f64>() * 2.0;
                if a[i] > 0.0 {
                    bounds[i] - 2.0 + offset
                } else {
                    bounds[i] + offset
                }
            });
            let y = Array::from_shape_fn(dim, |i| {
                if a[i] > 0.0 {
                    bounds[i] + 1.0
                } else {
                    bounds[i] - 1.0
                }
            });

            for poly in [&full, &diag] {
                assert!(poly.contains(x.view()));
                assert!(!poly.contains(y.view()));
            }
            assert_abs_diff_eq!(full.value(x.view()), diag.value(x.view()), epsilon = 1e-9);
            assert_abs_diff_eq!(full.gradient(x.view()), diag.gradient(x.view()), epsilon = 1e-9);
            assert_abs_diff_eq!(full.hessian(x.view()), diag.hessian(x.view()), epsilon = 1e-6);
        }
    }

    #[test]
    fn weights_scale_the_potential() {
        let a = arr2(&[[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]]);
        let b = arr1(&[1.0, 1.0, 1.0]);
        let plain = PolytopeBarrier::new(a.clone(), b.clone(), None).unwrap();
        let weighted = PolytopeBarrier::new(a, b, Some(arr1(&[2.0, 2.0, 2.0]))).unwrap();
        let x = arr1(&[0.1, -0.2]);
        assert_abs_diff_eq!(weighted.value(x.view()), 2.0 * plain.value(x.view()), epsilon = 1e-12);
        assert_abs_diff_eq!(
            weighted.gradient(x.view()),
            plain.gradient(x.view()) * 2.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            weighted.hessian(x.view()),
            plain.hessian(x.view()) * 2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn gradient_of_the_square_at_origin_vanishes() {
        let square = unit_square();
        let x = arr1(&[0.0, 0.0]);
        assert_abs_diff_eq!(square.gradient(x.view()), arr1(&[0.0, 0.0]), epsilon = 1e-12);
        assert_abs_diff_eq!(
            square.hessian(x.view()),
            arr2(&[[2.0, 0.0], [0.0, 2.0]]),
            epsilon = 1e-12
        );
        assert_eq!(square.boundary_to_interior_half(x.view()), None);
    }
}
