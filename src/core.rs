/*!
# Core Particle-Sampler Utilities.

This module provides the machinery shared by every particle sampler:
- The [`ParticleSampler<T>`] trait, which abstracts a batch of `N` particles in `D`
  dimensions that is advanced one iteration at a time. Implementors supply
  [`ParticleSampler::step`] and get [`ParticleSampler::mix`], which runs a fixed number of
  iterations, optionally keeps the trajectory and optionally displays a progress bar.
- [`MixOutput`], the result of a mixing run.
- Initialisation helpers ([`init_uniform`], [`init_uniform_with_seed`], [`init_det`],
  [`init_at`]) that build starting batches.

This module is generic over the float type using [`ndarray::NdFloat`].
*/

use crate::errors::{Result, SamplerError};
use crate::stats::ParticleTracker;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use ndarray::prelude::*;
use ndarray::NdFloat;
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Result of [`ParticleSampler::mix`].
#[derive(Debug, Clone, PartialEq)]
pub enum MixOutput<T> {
    /// The batch after the last iteration, shape `(N, D)`.
    Final(Array2<T>),
    /// The batch after every iteration, shape `(num_iters, N, D)`. The initial batch is
    /// not included.
    Trajectory(Array3<T>),
}

impl<T> MixOutput<T> {
    pub fn shape(&self) -> &[usize] {
        match self {
            MixOutput::Final(batch) => batch.shape(),
            MixOutput::Trajectory(trajectory) => trajectory.shape(),
        }
    }

    /// The last batch of the run.
    ///
    /// `None` for an empty trajectory (`num_iters = 0`).
    pub fn last(&self) -> Option<ArrayView2<'_, T>> {
        match self {
            MixOutput::Final(batch) => Some(batch.view()),
            MixOutput::Trajectory(trajectory) => {
                let n = trajectory.len_of(Axis(0));
                (n > 0).then(|| trajectory.index_axis(Axis(0), n - 1))
            }
        }
    }

    pub fn into_final(self) -> Option<Array2<T>> {
        match self {
            MixOutput::Final(batch) => Some(batch),
            MixOutput::Trajectory(_) => None,
        }
    }

    pub fn into_trajectory(self) -> Option<Array3<T>> {
        match self {
            MixOutput::Trajectory(trajectory) => Some(trajectory),
            MixOutput::Final(_) => None,
        }
    }
}

/// A batch of particles that is advanced by a Markov transition kernel.
///
/// A type implementing [`ParticleSampler<T>`] must provide:
/// - `set_initial_particles()`: validates and stores the starting batch.
/// - `particles()`: the current batch, if any.
/// - `step()`: advances every particle by one iteration and returns the new batch.
///
/// Implementors get [`ParticleSampler::mix`] for free.
pub trait ParticleSampler<T: NdFloat> {
    /// Number of particles `N`.
    fn num_samples(&self) -> usize;

    /// Dimension `D` of each particle.
    fn dimension(&self) -> usize;

    /// Stores the starting batch of shape `(N, D)`.
    fn set_initial_particles(&mut self, particles: Array2<T>) -> Result<()>;

    /// The current batch, or `None` before initialisation.
    fn particles(&self) -> Option<ArrayView2<'_, T>>;

    /// Performs one iteration on every particle and returns the updated batch.
    fn step(&mut self) -> Result<ArrayView2<'_, T>>;

    /// Share of particles in the outer half-volume shell of the region, when known.
    fn boundary_half_fraction(&self) -> Option<f64> {
        None
    }

    /// Runs `num_iters` iterations starting from the current batch.
    ///
    /// # Arguments
    ///
    /// * `num_iters` - Number of iterations to run. Zero returns the current batch unchanged.
    /// * `return_particles` - If `true`, returns the batch after every iteration as an
    ///   array of shape `(num_iters, N, D)`. Otherwise only the final `(N, D)` batch.
    /// * `no_progress` - If `true`, suppresses the progress bar. Has no effect on the result.
    ///
    /// # Errors
    ///
    /// [`SamplerError::NotInitialized`] before [`ParticleSampler::set_initial_particles`].
    /// Any failing iteration aborts the run and its error is returned.
    fn mix(
        &mut self,
        num_iters: usize,
        return_particles: bool,
        no_progress: bool,
    ) -> Result<MixOutput<T>> {
        let (n, d) = self
            .particles()
            .map(|p| p.dim())
            .ok_or(SamplerError::NotInitialized)?;
        debug!("mixing {n} particles in {d} dimensions for {num_iters} iterations");

        let mut trajectory = return_particles.then(|| Array3::<T>::zeros((num_iters, n, d)));
        let mut progress = (!no_progress).then(|| {
            (
                progress_bar(num_iters as u64),
                ParticleTracker::new(n, d),
                Instant::now(),
            )
        });
        let freq = Duration::from_millis(250);

        for i in 0..num_iters {
            let batch = self.step().inspect_err(|e| {
                warn!("iteration {i} of {num_iters} failed: {e}");
            })?;
            if let Some(trajectory) = trajectory.as_mut() {
                trajectory.index_axis_mut(Axis(0), i).assign(&batch);
            }
            if let Some((_, tracker, _)) = progress.as_mut() {
                tracker.step(batch)?;
            }

            if let Some((pb, tracker, last)) = progress.as_mut() {
                pb.inc(1);
                let now = Instant::now();
                if now >= *last + freq || i + 1 == num_iters {
                    pb.set_message(progress_message(
                        tracker.max_rhat(),
                        self.boundary_half_fraction(),
                    ));
                    *last = now;
                }
            }
        }

        if let Some((pb, _, _)) = progress {
            pb.finish();
        }
        debug!("finished {num_iters} iterations");

        match trajectory {
            Some(trajectory) => Ok(MixOutput::Trajectory(trajectory)),
            None => self
                .particles()
                .map(|p| MixOutput::Final(p.to_owned()))
                .ok_or(SamplerError::NotInitialized),
        }
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{prefix:8} {bar:40.cyan/blue} {pos}/{len} ({eta}) | {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_prefix("Mixing");
    pb
}

fn progress_message(max_rhat: Option<f64>, half_fraction: Option<f64>) -> String {
    let mut msg = match max_rhat {
        Some(rhat) => format!("max(rhat)≈{rhat:.2}"),
        None => "max(rhat)≈-".to_string(),
    };
    if let Some(fraction) = half_fraction {
        msg.push_str(&format!(" boundary-half≈{fraction:.2}"));
    }
    msg
}

/// Draws `n` particles uniformly from the cube `[-half_width, half_width]^d`.
///
/// # Examples
/// ```
/// # use conspace_sampler::core::init_uniform;
/// let batch = init_uniform::<f64>(500, 2, 0.001);
/// assert_eq!(batch.dim(), (500, 2));
/// assert!(batch.iter().all(|x| x.abs() <= 0.001));
/// ```
pub fn init_uniform<T>(n: usize, d: usize, half_width: T) -> Array2<T>
where
    T: NdFloat,
    StandardUniform: Distribution<T>,
{
    let rng = SmallRng::seed_from_u64(rand::rng().random::<u64>());
    _init(n, d, half_width, rng)
}

/// Same as [`init_uniform`] with seed 42.
pub fn init_det<T>(n: usize, d: usize, half_width: T) -> Array2<T>
where
    T: NdFloat,
    StandardUniform: Distribution<T>,
{
    init_uniform_with_seed(n, d, half_width, 42)
}

/// Same as [`init_uniform`] except this function returns a deterministic batch.
pub fn init_uniform_with_seed<T>(n: usize, d: usize, half_width: T, seed: u64) -> Array2<T>
where
    T: NdFloat,
    StandardUniform: Distribution<T>,
{
    let rng = SmallRng::seed_from_u64(seed);
    _init(n, d, half_width, rng)
}

/// `n` copies of `point`, e.g. to start every particle at a corner of the region.
pub fn init_at<T: NdFloat>(n: usize, point: ArrayView1<T>) -> Array2<T> {
    let mut batch = Array2::zeros((n, point.len()));
    batch.rows_mut().into_iter().for_each(|mut row| row.assign(&point));
    batch
}

fn _init<T>(n: usize, d: usize, half_width: T, mut rng: SmallRng) -> Array2<T>
where
    T: NdFloat,
    StandardUniform: Distribution<T>,
{
    let two = T::one() + T::one();
    Array2::from_shape_fn((n, d), |_| {
        let u: T = rng.sample(StandardUniform);
        half_width * (two * u - T::one())
    })
}
