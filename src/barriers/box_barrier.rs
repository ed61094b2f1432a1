use super::{lit, unbounded, Barrier, SLACK_FLOOR};
use crate::errors::{Result, SamplerError};
use ndarray::{Array1, Array2, ArrayView1, NdFloat, Zip};

/**
Log barrier of the axis-aligned box `[-b_1, b_1] × … × [-b_D, b_D]`.

The potential is `φ(x) = -Σ log(b_i² - x_i²)`. Its Hessian is diagonal.

# Example

```rust
use conspace_sampler::barriers::{Barrier, BoxBarrier};
use ndarray::arr1;

let barrier = BoxBarrier::new(arr1(&[1.0, 2.0])).unwrap();
assert_eq!(barrier.dimension(), 2);
assert!(barrier.contains(arr1(&[1.0, -2.0]).view()));
assert!(!barrier.contains(arr1(&[1.5, 0.0]).view()));
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBarrier<T> {
    bounds: Array1<T>,
}

impl<T: NdFloat> BoxBarrier<T> {
    /// Creates a box with half-widths `bounds`.
    ///
    /// Fails with [`SamplerError::InvalidBarrier`] if `bounds` is empty or holds a
    /// non-positive or non-finite entry.
    pub fn new(bounds: Array1<T>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(SamplerError::InvalidBarrier(
                "box bounds must not be empty".to_string(),
            ));
        }
        if let Some(i) = bounds
            .iter()
            .position(|b| !b.is_finite() || *b <= T::zero())
        {
            return Err(SamplerError::InvalidBarrier(format!(
                "box bound {i} is {}, expected a positive finite value",
                bounds[i]
            )));
        }
        Ok(Self { bounds })
    }

    /// The half-widths of the box.
    pub fn bounds(&self) -> ArrayView1<'_, T> {
        self.bounds.view()
    }

    /// `b² - x²`, clamped from below near the boundary.
    fn safe_diff(&self, x: ArrayView1<T>) -> Array1<T> {
        let floor = lit::<T>(SLACK_FLOOR);
        Zip::from(&self.bounds)
            .and(&x)
            .map_collect(|&b, &xi| (b * b - xi * xi).max(floor))
    }

    /// Returns the point `x` with `gradient(x) = y`.
    ///
    /// Element-wise `(-1 + sqrt(1 + b_i² y_i²)) / y_i`, and `0` where `y_i` is
    /// numerically zero.
    pub fn inverse_gradient(&self, y: ArrayView1<T>) -> Array1<T> {
        let tiny = lit::<T>(1e-7);
        Zip::from(&self.bounds).and(&y).map_collect(|&b, &yi| {
            if yi.abs() <= tiny {
                T::zero()
            } else {
                let by = b * yi;
                (-T::one() + (T::one() + by * by).sqrt()) / yi
            }
        })
    }
}

impl<T: NdFloat> Barrier<T> for BoxBarrier<T> {
    fn dimension(&self) -> usize {
        self.bounds.len()
    }

    fn contains(&self, x: ArrayView1<T>) -> bool {
        Zip::from(&self.bounds).and(&x).all(|&b, &xi| xi.abs() <= b)
    }

    fn chord(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> (T, T) {
        let (mut t_min, mut t_max) = unbounded::<T>();
        for ((&b, &xi), &di) in self.bounds.iter().zip(x.iter()).zip(direction.iter()) {
            if di == T::zero() {
                continue;
            }
            let lower = (-b - xi) / di;
            let upper = (b - xi) / di;
            t_min = t_min.max(lower.min(upper));
            t_max = t_max.min(lower.max(upper));
        }
        (t_min, t_max)
    }

    fn value(&self, x: ArrayView1<T>) -> T {
        -self.safe_diff(x).mapv(|d| d.ln()).sum()
    }

    fn gradient(&self, x: ArrayView1<T>) -> Array1<T> {
        let two = lit::<T>(2.0);
        Zip::from(&x)
            .and(&self.safe_diff(x))
            .map_collect(|&xi, &d| two * xi / d)
    }

    fn hessian(&self, x: ArrayView1<T>) -> Array2<T> {
        let (two, four, cap) = (lit::<T>(2.0), lit::<T>(4.0), lit::<T>(1e7));
        let diag = Zip::from(&x)
            .and(&self.safe_diff(x))
            .map_collect(|&xi, &d| {
                let reci = d.recip();
                let scaled = xi * reci;
                (two * reci + four * scaled * scaled).min(cap)
            });
        Array2::from_diag(&diag)
    }

    fn boundary_to_interior_half(&self, x: ArrayView1<T>) -> Option<bool> {
        let shrink = lit::<T>(0.5).powf(lit::<T>(1.0 / self.dimension() as f64));
        Some(
            Zip::from(&self.bounds)
                .and(&x)
                .fold(false, |acc, &b, &xi| acc || xi.abs() > b * shrink),
        )
    }
}
