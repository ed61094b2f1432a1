use super::{lit, tighten, unbounded, Barrier, SLACK_FLOOR};
use crate::errors::{Result, SamplerError};
use ndarray::{Array1, Array2, ArrayView1, NdFloat};

/**
Log barrier of the probability simplex in `d + 1` coordinates, written in the `d`
free coordinates:

`φ(x) = -Σ_i log(x_i) - log(1 - Σ_i x_i)`, with feasible region `x_i >= 0`, `Σ_i x_i <= 1`.

# Example

```rust
use conspace_sampler::barriers::{Barrier, SimplexBarrier};
use ndarray::arr1;

let barrier = SimplexBarrier::<f64>::new(2).unwrap();
assert!(barrier.contains(arr1(&[0.2, 0.3]).view()));
assert!(!barrier.contains(arr1(&[0.6, 0.6]).view()));
assert!(!barrier.contains(arr1(&[-0.1, 0.3]).view()));
```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplexBarrier<T> {
    dimension: usize,
    _float: std::marker::PhantomData<T>,
}

impl<T: NdFloat> SimplexBarrier<T> {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(SamplerError::InvalidBarrier(
                "simplex dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            _float: std::marker::PhantomData,
        })
    }

    /// `1 - Σ x_i`, clamped from below.
    fn safe_interior(&self, x: ArrayView1<T>) -> T {
        (T::one() - x.sum()).max(lit(SLACK_FLOOR))
    }

    /// Returns the point `x` with `gradient(x) = y`.
    ///
    /// With `c = 1 - Σ x_i` the solution is `x_i = c / (1 - c y_i)`, where `c` is the
    /// root of `c + Σ_i c / (1 - c y_i) - 1` on `(0, min(1, 1 / max y))`. The root is
    /// found by bisection and the result is clamped at `1e-8`.
    pub fn inverse_gradient(&self, y: ArrayView1<T>) -> Array1<T> {
        let residual = |c: T| c + y.mapv(|yi| c / (T::one() - c * yi)).sum() - T::one();

        let y_max = y.fold(T::neg_infinity(), |m, &yi| m.max(yi));
        let mut upper = y_max.recip().min(T::one());
        if upper < T::zero() {
            upper = T::one();
        }
        let mut lower = T::zero();
        for _ in 0..BISECTION_STEPS {
            let middle = lit::<T>(0.5) * (lower + upper);
            if residual(middle) > T::zero() {
                upper = middle;
            } else {
                lower = middle;
            }
        }

        let floor = lit::<T>(SLACK_FLOOR);
        y.mapv(|yi| (upper / (T::one() - upper * yi)).max(floor))
    }
}

const BISECTION_STEPS: usize = 35;

impl<T: NdFloat> Barrier<T> for SimplexBarrier<T> {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn contains(&self, x: ArrayView1<T>) -> bool {
        x.sum() <= T::one() && x.iter().all(|xi| *xi >= T::zero())
    }

    fn chord(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> (T, T) {
        let mut interval = unbounded::<T>();
        // -x_i - t d_i <= 0
        for (&xi, &di) in x.iter().zip(direction.iter()) {
            tighten(&mut interval, -di, xi);
        }
        tighten(&mut interval, direction.sum(), T::one() - x.sum());
        interval
    }

    fn value(&self, x: ArrayView1<T>) -> T {
        -x.mapv(|xi| xi.ln()).sum() - self.safe_interior(x).ln()
    }

    fn gradient(&self, x: ArrayView1<T>) -> Array1<T> {
        let floor = lit::<T>(SLACK_FLOOR);
        let interior = self.safe_interior(x).recip();
        x.mapv(|xi| -xi.max(floor).recip() + interior)
    }

    fn hessian(&self, x: ArrayView1<T>) -> Array2<T> {
        let cap = lit::<T>(1e8);
        let diag = x.mapv(|xi| (xi * xi).recip().min(cap));
        let interior = self.safe_interior(x);
        let shared = (interior * interior).recip().min(cap);
        Array2::from_diag(&diag) + shared
    }

    fn boundary_to_interior_half(&self, x: ArrayView1<T>) -> Option<bool> {
        let level = lit::<T>(0.5).powf(lit::<T>(1.0 / self.dimension as f64));
        Some(x.sum() > level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2, Array};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn rejects_zero_dimension() {
        assert!(SimplexBarrier::<f64>::new(0).is_err());
    }

    #[test]
    fn feasibility_inside_and_outside() {
        let mut rng = SmallRng::seed_from_u64(31);
        for dim in [3, 5, 7, 11] {
            let barrier = SimplexBarrier::<f64>::new(dim).unwrap();
            let raw = Array::from_shape_fn(dim, |_| rng.random::<f64>());
            let inside = &raw / raw.sum() * 0.9;
            let outside = &raw / raw.sum() * 1.1;
            assert!(barrier.contains(inside.view()));
            assert!(!barrier.contains(outside.view()));
        }
    }

    #[test]
    fn chord_through_the_triangle() {
        let barrier = SimplexBarrier::<f64>::new(2).unwrap();
        let x = arr1(&[0.25, 0.25]);
        let (t_min, t_max) = barrier
            .boundary_distances(x.view(), arr1(&[1.0, 0.0]).view())
            .unwrap();
        assert_abs_diff_eq!(t_min, -0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(t_max, 0.5, epsilon = 1e-12);

        let s = std::f64::consts::FRAC_1_SQRT_2;
        let (t_min, t_max) = barrier
            .boundary_distances(x.view(), arr1(&[s, s]).view())
            .unwrap();
        assert_abs_diff_eq!(t_min, -0.25 / s, epsilon = 1e-12);
        assert_abs_diff_eq!(t_max, 0.25 / s, epsilon = 1e-12);
    }

    #[test]
    fn gradient_inverse_gradient_roundtrip() {
        let mut rng = SmallRng::seed_from_u64(7);
        for dim in [3, 5, 7, 11] {
            let barrier = SimplexBarrier::<f64>::new(dim).unwrap();
            // The last weight is the slack coordinate 1 - Σ x_i.
            let weights = Array::from_shape_fn(dim + 1, |_| rng.random_range(0.05f64..1.0));
            let x = weights.slice(ndarray::s![..dim]).to_owned() / weights.sum();

            let y = barrier.gradient(x.view());
            let back = barrier.inverse_gradient(y.view());
            for (b, xi) in back.iter().zip(x.iter()) {
                assert!(
                    (b - xi).abs() <= 1e-6 + 1e-4 * xi.abs(),
                    "dim {dim}: inverse gradient {back} differs from {x}"
                );
            }
        }
    }

    #[test]
    fn inverse_gradient_of_zero_is_the_barycenter() {
        let barrier = SimplexBarrier::<f64>::new(4).unwrap();
        let x = barrier.inverse_gradient(Array1::zeros(4).view());
        assert_abs_diff_eq!(x, Array1::from_elem(4, 0.2), epsilon = 1e-8);
    }

    #[test]
    fn potential_at_the_barycenter() {
        let barrier = SimplexBarrier::<f64>::new(2).unwrap();
        let third = 1.0 / 3.0;
        let x = arr1(&[third, third]);
        assert_abs_diff_eq!(barrier.value(x.view()), 3.0 * 3.0f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(barrier.gradient(x.view()), arr1(&[0.0, 0.0]), epsilon = 1e-12);
        assert_abs_diff_eq!(
            barrier.hessian(x.view()),
            arr2(&[[18.0, 9.0], [9.0, 18.0]]),
            epsilon = 1e-9
        );
        assert_eq!(barrier.boundary_to_interior_half(x.view()), Some(false));
    }
}
