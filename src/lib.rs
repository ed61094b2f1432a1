//! # Conspace Sampler
//!
//! A compact Rust library for sampling **particle batches inside convex regions** with a
//! **hit-and-run** Markov chain. Every particle moves along a random chord of the region,
//! so no particle ever leaves it.
//!
//! ## Getting Started
//!
//! To use this library, add it to your project:
//! ```bash
//! cargo add conspace-sampler
//! ```
//!
//! Sampling takes three ingredients:
//! 1. **A barrier** describing the region, implementing the [`barriers::Barrier`] trait.
//!    Boxes, ellipsoids, polytopes, simplices and their intersections are provided.
//! 2. **A sampler** owning `N` particles, here [`hit_and_run::HitAndRunSampler`].
//! 3. **An initial batch** of feasible particles, e.g. from [`core::init_uniform`].
//!
//! ## Example: A Narrow Box
//!
//! ```rust
//! use conspace_sampler::barriers::{Barrier, BoxBarrier};
//! use conspace_sampler::core::{init_uniform, ParticleSampler};
//! use conspace_sampler::hit_and_run::HitAndRunSampler;
//! use ndarray::arr1;
//!
//! // [-0.01, 0.01] × [-1, 1]
//! let barrier = BoxBarrier::new(arr1(&[0.01, 1.0])).unwrap();
//!
//! // 500 particles starting in a tiny square around the origin.
//! let mut sampler = HitAndRunSampler::new(&barrier, 500).seed(42);
//! sampler.set_initial_particles(init_uniform(500, 2, 0.001)).unwrap();
//!
//! // 100 iterations, keep only the final batch, no progress bar.
//! let batch = sampler.mix(100, false, true).unwrap().into_final().unwrap();
//! assert_eq!(batch.dim(), (500, 2));
//! assert!(barrier.feasibility(batch.view()).iter().all(|inside| *inside));
//! ```
//!
//! ## Example: The Unit Disk With a Trajectory
//!
//! ```rust
//! use conspace_sampler::barriers::EllipsoidBarrier;
//! use conspace_sampler::core::{init_det, ParticleSampler};
//! use conspace_sampler::hit_and_run::HitAndRunSampler;
//!
//! let disk = EllipsoidBarrier::<f64>::ball(2, 1.0).unwrap();
//! let mut sampler = HitAndRunSampler::new(disk, 100).seed(7);
//! sampler.set_initial_particles(init_det(100, 2, 0.1)).unwrap();
//!
//! // Keep every iteration: shape (iterations, particles, dimensions).
//! let trajectory = sampler.mix(50, true, true).unwrap();
//! assert_eq!(trajectory.shape(), &[50, 100, 2]);
//! ```
//!
//! ## Logging and Progress
//!
//! Diagnostics go through the [`log`] facade; install any logger to see them. Passing
//! `no_progress = false` to [`core::ParticleSampler::mix`] shows a progress bar with the
//! largest R-hat across particles and the share of particles near the boundary.
//!
//! ## Features
//!
//! - `csv` (default): [`io::csv`] writes trajectories to CSV files.

pub mod barriers;
pub mod core;
pub mod errors;
pub mod hit_and_run;
pub mod io;
pub mod stats;

pub use errors::{Result, SamplerError};
