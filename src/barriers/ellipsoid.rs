use super::{empty, lit, unbounded, Barrier, SLACK_FLOOR};
use crate::errors::{Result, SamplerError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, NdFloat};

/**
Log barrier of the ellipsoid `{x : xᵀMx <= 1}`.

`M` is symmetric positive definite. It is given by its eigendecomposition `M = U diag(λ) Uᵀ`,
where `rot = U` holds the eigenvectors as columns. The potential is `φ(x) = -log(1 - xᵀMx)`.

# Example

```rust
use conspace_sampler::barriers::{Barrier, EllipsoidBarrier};
use ndarray::{arr1, arr2};

// Axis-aligned ellipse with semi-axes 2 and 1.
let barrier = EllipsoidBarrier::new(arr1(&[0.25, 1.0]), arr2(&[[1.0, 0.0], [0.0, 1.0]])).unwrap();
assert!(barrier.contains(arr1(&[1.9, 0.0]).view()));
assert!(!barrier.contains(arr1(&[0.0, 1.1]).view()));
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct EllipsoidBarrier<T> {
    eigvals: Array1<T>,
    rot: Array2<T>,
    metric: Array2<T>,
    inverse_metric: Array2<T>,
}

impl<T: NdFloat> EllipsoidBarrier<T> {
    /// Creates the ellipsoid with metric `rot · diag(eigvals) · rotᵀ`.
    ///
    /// `rot` must be square with side `eigvals.len()`, and every eigenvalue must be
    /// positive and finite. `rot` is assumed orthogonal.
    pub fn new(eigvals: Array1<T>, rot: Array2<T>) -> Result<Self> {
        let dim = eigvals.len();
        if dim == 0 {
            return Err(SamplerError::InvalidBarrier(
                "ellipsoid needs at least one eigenvalue".to_string(),
            ));
        }
        if rot.dim() != (dim, dim) {
            return Err(SamplerError::InvalidBarrier(format!(
                "ellipsoid rotation has shape {:?}, expected ({dim}, {dim})",
                rot.dim()
            )));
        }
        if eigvals.iter().any(|l| !l.is_finite() || *l <= T::zero()) {
            return Err(SamplerError::InvalidBarrier(
                "ellipsoid eigenvalues must be positive and finite".to_string(),
            ));
        }
        let scaled = &rot * &eigvals;
        let metric = scaled.dot(&rot.t());
        let inv_scaled = &rot / &eigvals;
        let inverse_metric = inv_scaled.dot(&rot.t());
        Ok(Self {
            eigvals,
            rot,
            metric,
            inverse_metric,
        })
    }

    /// The Euclidean ball of the given radius centred at the origin.
    pub fn ball(dim: usize, radius: T) -> Result<Self> {
        if !radius.is_finite() || radius <= T::zero() {
            return Err(SamplerError::InvalidBarrier(format!(
                "ball radius must be positive and finite, got {radius}"
            )));
        }
        Self::new(
            Array1::from_elem(dim, (radius * radius).recip()),
            Array2::eye(dim),
        )
    }

    pub fn eigvals(&self) -> ArrayView1<'_, T> {
        self.eigvals.view()
    }

    pub fn rot(&self) -> ArrayView2<'_, T> {
        self.rot.view()
    }

    fn inner_product(&self, x: ArrayView1<T>) -> T {
        x.dot(&self.metric.dot(&x))
    }

    /// Returns the point `x` with `gradient(x) = y`.
    ///
    /// The solution is `x = λ(y) M⁻¹y` with `λ = (-1 + sqrt(1 + q)) / q`, where
    /// `q = yᵀM⁻¹y`. `q` is clamped at `1e-8`.
    pub fn inverse_gradient(&self, y: ArrayView1<T>) -> Array1<T> {
        let inv_y = self.inverse_metric.dot(&y);
        let q = y.dot(&inv_y).max(lit(SLACK_FLOOR));
        let scale = (-T::one() + (T::one() + q).sqrt()) / q;
        inv_y * scale
    }
}

impl<T: NdFloat> Barrier<T> for EllipsoidBarrier<T> {
    fn dimension(&self) -> usize {
        self.eigvals.len()
    }

    fn contains(&self, x: ArrayView1<T>) -> bool {
        self.inner_product(x) <= T::one()
    }

    fn chord(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> (T, T) {
        // xᵀMx + 2t·xᵀMd + t²·dᵀMd <= 1
        let md = self.metric.dot(&direction);
        let a = direction.dot(&md);
        let b = x.dot(&md);
        let c = self.inner_product(x) - T::one();
        if a <= T::zero() {
            return if c <= T::zero() { unbounded() } else { empty() };
        }
        let disc = b * b - a * c;
        if disc < T::zero() {
            return empty();
        }
        let root = disc.sqrt();
        ((-b - root) / a, (-b + root) / a)
    }

    fn value(&self, x: ArrayView1<T>) -> T {
        let mut ip = self.inner_product(x);
        if ip >= T::one() {
            ip = T::zero();
        }
        -(-ip).ln_1p()
    }

    fn gradient(&self, x: ArrayView1<T>) -> Array1<T> {
        let slack = (T::one() - self.inner_product(x)).max(lit(SLACK_FLOOR));
        self.metric.dot(&x) * (lit::<T>(2.0) / slack)
    }

    fn hessian(&self, x: ArrayView1<T>) -> Array2<T> {
        let slack = (T::one() - self.inner_product(x)).max(lit(SLACK_FLOOR));
        let two = lit::<T>(2.0);
        let scaled_mx = self.metric.dot(&x) * (two / slack);
        let col = scaled_mx.view().insert_axis(Axis(1));
        let row = scaled_mx.view().insert_axis(Axis(0));
        &self.metric * (two / slack) + col.dot(&row)
    }

    fn boundary_to_interior_half(&self, x: ArrayView1<T>) -> Option<bool> {
        let threshold = lit::<T>(0.5).powf(lit::<T>(2.0 / self.dimension() as f64));
        Some(self.inner_product(x) > threshold)
    }
}
