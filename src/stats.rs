//! Running statistics over a particle batch: potential scale reduction (R-hat) across
//! particles and the share of particles near the boundary.

use crate::barriers::Barrier;
use crate::errors::Result;
use ndarray::{prelude::*, ErrorKind, NdFloat, ShapeError};
use ndarray_stats::QuantileExt;

/// Tracks running means of every particle's coordinates across iterations.
///
/// Each particle is treated as one chain, so [`ParticleTracker::rhat`] compares the
/// within-particle variance with the spread of the particle means. Values near 1
/// indicate that the particles have forgotten their starting points.
///
/// # Fields
/// - `n`: Number of recorded iterations.
/// - `mean`: Per-particle mean of the coordinates.
/// - `mean_sq`: Per-particle mean of the squared coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleTracker {
    n: usize,
    mean: Array2<f64>,    // n_particles x n_params
    mean_sq: Array2<f64>, // n_particles x n_params
}

impl ParticleTracker {
    /// Creates a tracker for `n_particles` particles in `n_params` dimensions.
    pub fn new(n_particles: usize, n_params: usize) -> Self {
        Self {
            n: 0,
            mean: Array2::zeros((n_particles, n_params)),
            mean_sq: Array2::zeros((n_particles, n_params)),
        }
    }

    /// Number of batches recorded so far.
    pub fn n_steps(&self) -> usize {
        self.n
    }

    /// Records one batch of shape `(n_particles, n_params)`.
    pub fn step<T: NdFloat>(&mut self, x: ArrayView2<T>) -> Result<()> {
        if x.dim() != self.mean.dim() {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }
        self.n += 1;

        let n = self.n as f64;
        let x_arr = x.mapv(|v| v.to_f64().unwrap_or(f64::NAN));

        self.mean = (&self.mean * (n - 1.0) + &x_arr) / n;
        if self.n == 1 {
            self.mean_sq = x_arr.pow2();
        } else {
            self.mean_sq = (&self.mean_sq * (n - 1.0) + x_arr.pow2()) / n;
        }
        Ok(())
    }

    /// R-hat for every coordinate.
    ///
    /// Entries are NaN until at least two batches of at least two particles have been
    /// recorded.
    pub fn rhat(&self) -> Array1<f64> {
        let n_params = self.mean.ncols();
        let n_particles = self.mean.nrows() as f64;
        if self.n < 2 || n_particles < 2.0 {
            return Array1::from_elem(n_params, f64::NAN);
        }
        let n = self.n as f64;

        let Some(grand_mean) = self.mean.mean_axis(Axis(0)) else {
            return Array1::from_elem(n_params, f64::NAN);
        };
        let between = (&self.mean - &grand_mean.insert_axis(Axis(0)))
            .pow2()
            .sum_axis(Axis(0))
            * (n / (n_particles - 1.0));
        let sm2 = (&self.mean_sq - &self.mean.pow2()) * (n / (n - 1.0));
        let within = sm2.sum_axis(Axis(0)) / n_particles;
        let var = &within * ((n - 1.0) / n) + between / n;
        (var / within).sqrt()
    }

    /// Largest finite R-hat across coordinates, skipping NaNs.
    pub fn max_rhat(&self) -> Option<f64> {
        let rhat = self.rhat();
        if rhat.is_empty() {
            return None;
        }
        let max = *rhat.max_skipnan();
        (!max.is_nan()).then_some(max)
    }
}

/// Share of particles lying in the outer shell that holds half of the region's volume.
///
/// Close to 0.5 for a uniform batch. `None` when the barrier has no closed form for
/// the shell or the batch is empty.
pub fn boundary_half_fraction<T, B>(barrier: &B, particles: ArrayView2<T>) -> Option<f64>
where
    T: NdFloat,
    B: Barrier<T> + ?Sized,
{
    if particles.nrows() == 0 {
        return None;
    }
    let mut outside = 0usize;
    for x in particles.outer_iter() {
        if barrier.boundary_to_interior_half(x)? {
            outside += 1;
        }
    }
    Some(outside as f64 / particles.nrows() as f64)
}
