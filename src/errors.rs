//! Error type shared by barriers and samplers.

use ndarray::ShapeError;
use thiserror::Error;

/// Everything that can go wrong while building a barrier or running a sampler.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SamplerError {
    /// The initial particle batch has the wrong shape or contains an infeasible particle.
    #[error("invalid initial particles: {0}")]
    InvalidInit(String),

    /// `mix` or `step` was called before `set_initial_particles`.
    #[error("sampler has no particles; call set_initial_particles first")]
    NotInitialized,

    /// The feasible chord along a sampled direction is empty or unbounded.
    ///
    /// Only reachable when a particle has left the region or the region is unbounded
    /// along the direction.
    #[error("degenerate direction: empty or unbounded feasible interval")]
    DegenerateDirection,

    /// Barrier parameters are empty, non-positive or inconsistently shaped.
    #[error("invalid barrier: {0}")]
    InvalidBarrier(String),

    #[error("array shape error: {0}")]
    Shape(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
