/*!
# Convex Barriers.

A barrier describes a closed convex region of `R^D` with a non-empty interior. It
answers the two questions a hit-and-run walk needs:

- [`Barrier::contains`]: is a point inside the region?
- [`Barrier::boundary_distances`]: along the line `x + t·d`, for which `t` does the
  point stay inside?

Every barrier is also the log-barrier potential of its region (`value`, `gradient`,
`hessian`). These potentials go to infinity at the boundary, and the slacks are
clamped at `1e-8` so evaluations near the boundary stay finite.

Available regions:
- [`BoxBarrier`]: `[-b_1, b_1] × … × [-b_D, b_D]`,
- [`EllipsoidBarrier`]: `{x : xᵀMx <= 1}`,
- [`PolytopeBarrier`]: `{x : Ax <= b}`,
- [`SimplexBarrier`]: `{x : x_i >= 0, Σ x_i <= 1}`,
- [`ComposeBarrier`]: the intersection of any of the above.

## Example

```rust
use conspace_sampler::barriers::{Barrier, BoxBarrier};
use ndarray::arr1;

let barrier = BoxBarrier::new(arr1(&[0.01, 1.0])).unwrap();
assert!(barrier.contains(arr1(&[0.005, -0.5]).view()));

let (t_min, t_max) = barrier
    .boundary_distances(arr1(&[0.0, 0.0]).view(), arr1(&[0.0, 1.0]).view())
    .unwrap();
assert_eq!((t_min, t_max), (-1.0, 1.0));
```
*/

mod box_barrier;
mod compose;
mod ellipsoid;
mod polytope;
mod simplex;

pub use box_barrier::BoxBarrier;
pub use compose::ComposeBarrier;
pub use ellipsoid::EllipsoidBarrier;
pub use polytope::PolytopeBarrier;
pub use simplex::SimplexBarrier;

use crate::errors::{Result, SamplerError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, NdFloat};
use std::sync::Arc;

/// Lower clamp for slack terms so that potentials stay finite on the boundary.
pub(crate) const SLACK_FLOOR: f64 = 1e-8;

/// A closed convex region together with its log-barrier potential.
///
/// Implementors must be [`Send`] + [`Sync`]: samplers share one barrier across the
/// threads that update particles.
pub trait Barrier<T: NdFloat>: Send + Sync {
    /// Dimension `D` of the ambient space.
    fn dimension(&self) -> usize;

    /// Returns `true` iff `x` lies in the closed region.
    fn contains(&self, x: ArrayView1<T>) -> bool;

    /// Raw interval of step lengths `t` for which `x + t·direction` satisfies the
    /// region's constraints.
    ///
    /// The interval may be unbounded, or empty (`t_min > t_max`) when no point of the
    /// line is feasible. Intersections of regions intersect these raw intervals.
    fn chord(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> (T, T);

    /// Returns the interval `[t_min, t_max]` of step lengths along `direction` for which
    /// `x + t·direction` stays inside the region.
    ///
    /// `x` is expected to be feasible, in which case `t_min <= 0 <= t_max`. Fails with
    /// [`SamplerError::DegenerateDirection`] if the interval is empty or not finite, e.g.
    /// for the zero direction.
    fn boundary_distances(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> Result<(T, T)> {
        let (t_min, t_max) = self.chord(x, direction);
        checked_interval(t_min, t_max)
    }

    /// Value of the log-barrier potential at `x`.
    fn value(&self, x: ArrayView1<T>) -> T;

    /// Gradient of the log-barrier potential at `x`.
    fn gradient(&self, x: ArrayView1<T>) -> Array1<T>;

    /// Dense `D × D` Hessian of the log-barrier potential at `x`.
    fn hessian(&self, x: ArrayView1<T>) -> Array2<T>;

    /// Whether `x` lies in the shell between the boundary and an interior copy of the
    /// region that holds half of its volume.
    ///
    /// `None` when the region has no closed form for that shell.
    fn boundary_to_interior_half(&self, _x: ArrayView1<T>) -> Option<bool> {
        None
    }

    /// Row-wise [`Barrier::contains`] over a batch of shape `(N, D)`.
    fn feasibility(&self, particles: ArrayView2<T>) -> Array1<bool> {
        particles.outer_iter().map(|x| self.contains(x)).collect()
    }
}

macro_rules! forward_barrier {
    ($($wrapper:ty),*) => {$(
        impl<T: NdFloat, B: Barrier<T> + ?Sized> Barrier<T> for $wrapper {
            fn dimension(&self) -> usize {
                (**self).dimension()
            }
            fn contains(&self, x: ArrayView1<T>) -> bool {
                (**self).contains(x)
            }
            fn chord(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> (T, T) {
                (**self).chord(x, direction)
            }
            fn boundary_distances(
                &self,
                x: ArrayView1<T>,
                direction: ArrayView1<T>,
            ) -> Result<(T, T)> {
                (**self).boundary_distances(x, direction)
            }
            fn value(&self, x: ArrayView1<T>) -> T {
                (**self).value(x)
            }
            fn gradient(&self, x: ArrayView1<T>) -> Array1<T> {
                (**self).gradient(x)
            }
            fn hessian(&self, x: ArrayView1<T>) -> Array2<T> {
                (**self).hessian(x)
            }
            fn boundary_to_interior_half(&self, x: ArrayView1<T>) -> Option<bool> {
                (**self).boundary_to_interior_half(x)
            }
        }
    )*};
}

forward_barrier!(&B, Box<B>, Arc<B>);

/// Converts an `f64` constant into the barrier's float type.
pub(crate) fn lit<T: NdFloat>(v: f64) -> T {
    T::from(v).expect("f64 constants are representable in every NdFloat")
}

/// Validates a raw chord: finite and non-empty.
pub(crate) fn checked_interval<T: NdFloat>(t_min: T, t_max: T) -> Result<(T, T)> {
    if t_min.is_finite() && t_max.is_finite() && t_min <= t_max {
        Ok((t_min, t_max))
    } else {
        Err(SamplerError::DegenerateDirection)
    }
}

/// Tightens `[t_min, t_max]` by the half-line constraint `rate · t <= slack`.
///
/// A zero rate leaves the interval untouched if the constraint holds and empties it
/// otherwise.
pub(crate) fn tighten<T: NdFloat>(interval: &mut (T, T), rate: T, slack: T) {
    if rate > T::zero() {
        interval.1 = interval.1.min(slack / rate);
    } else if rate < T::zero() {
        interval.0 = interval.0.max(slack / rate);
    } else if slack < T::zero() {
        *interval = empty();
    }
}

pub(crate) fn unbounded<T: NdFloat>() -> (T, T) {
    (T::neg_infinity(), T::infinity())
}

pub(crate) fn empty<T: NdFloat>() -> (T, T) {
    (T::infinity(), T::neg_infinity())
}
