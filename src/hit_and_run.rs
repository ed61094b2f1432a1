/*!
# Hit-and-Run Sampler

Hit-and-run is a Markov chain that targets the uniform distribution on a convex
region. Each iteration moves every particle `x` as follows:

1. draw a direction `d` uniformly from the unit sphere (a normalised standard normal
   vector),
2. ask the barrier for the chord `[t_min, t_max]` of the line `x + t·d` inside the region,
3. draw `t` uniformly from the chord and move to `x + t·d`.

Particles never leave the region. They are updated in parallel with Rayon, and every
particle owns its random number generator, so a seeded run is reproducible regardless
of the number of threads.

## Example

```rust
use conspace_sampler::barriers::BoxBarrier;
use conspace_sampler::core::{init_uniform, ParticleSampler};
use conspace_sampler::hit_and_run::HitAndRunSampler;
use ndarray::arr1;

let barrier = BoxBarrier::new(arr1(&[0.01, 1.0])).unwrap();
let mut sampler = HitAndRunSampler::new(barrier, 500).seed(42);
sampler
    .set_initial_particles(init_uniform(500, 2, 0.001))
    .unwrap();

let out = sampler.mix(10, true, true).unwrap();
assert_eq!(out.shape(), &[10, 500, 2]);
```
*/

use crate::barriers::Barrier;
use crate::core::ParticleSampler;
use crate::errors::{Result, SamplerError};
use crate::stats;
use log::{debug, trace};
use ndarray::prelude::*;
use ndarray::NdFloat;
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

/// How often a step length is halved when rounding leaves the candidate just outside
/// the region.
const MAX_HALVINGS: usize = 64;

/// Hit-and-run sampler for a batch of particles inside a [`Barrier`].
///
/// # Type Parameters
/// - `T`: Float type of the particles (`f32` or `f64`).
/// - `B`: The barrier. `&B`, `Box<B>` and `Arc<B>` work as well.
///
/// # Fields
/// - `barrier`: The region to sample from.
/// - `num_samples`: Number of particles `N`.
/// - `particles`: The current batch of shape `(N, D)`, `None` until initialised.
/// - `rngs`: One random number generator per particle.
#[derive(Debug, Clone)]
pub struct HitAndRunSampler<T, B> {
    barrier: B,
    num_samples: usize,
    dimension: usize,
    particles: Option<Array2<T>>,
    rngs: Vec<SmallRng>,
}

impl<T, B> HitAndRunSampler<T, B>
where
    T: NdFloat,
    B: Barrier<T>,
    StandardNormal: Distribution<T>,
    StandardUniform: Distribution<T>,
{
    /// Creates a sampler for `num_samples` particles in `barrier`.
    ///
    /// The dimension is taken from the barrier. The generators are seeded from
    /// entropy; use [`HitAndRunSampler::seed`] for reproducible runs.
    pub fn new(barrier: B, num_samples: usize) -> Self {
        let dimension = barrier.dimension();
        let rngs = (0..num_samples)
            .map(|_| SmallRng::seed_from_u64(rand::rng().random::<u64>()))
            .collect();
        Self {
            barrier,
            num_samples,
            dimension,
            particles: None,
            rngs,
        }
    }

    /// Sets a new seed for all particles.
    ///
    /// Particle `i` is reseeded with `seed + 1 + i`.
    pub fn seed(mut self, seed: u64) -> Self {
        for (i, rng) in self.rngs.iter_mut().enumerate() {
            *rng = SmallRng::seed_from_u64(seed.wrapping_add(1).wrapping_add(i as u64));
        }
        self
    }

    pub fn barrier(&self) -> &B {
        &self.barrier
    }

    /// Whether initial particles have been set.
    pub fn is_ready(&self) -> bool {
        self.particles.is_some()
    }
}

impl<T, B> ParticleSampler<T> for HitAndRunSampler<T, B>
where
    T: NdFloat,
    B: Barrier<T>,
    StandardNormal: Distribution<T>,
    StandardUniform: Distribution<T>,
{
    fn num_samples(&self) -> usize {
        self.num_samples
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    /// Validates and stores the starting batch.
    ///
    /// Fails with [`SamplerError::InvalidInit`] if the shape is not `(N, D)` or a particle
    /// lies outside the region. A failed call leaves the sampler unchanged.
    fn set_initial_particles(&mut self, particles: Array2<T>) -> Result<()> {
        let expected = (self.num_samples, self.dimension);
        if particles.dim() != expected {
            return Err(SamplerError::InvalidInit(format!(
                "expected shape {expected:?}, got {:?}",
                particles.dim()
            )));
        }
        if let Some(row) = particles
            .outer_iter()
            .position(|x| !self.barrier.contains(x))
        {
            return Err(SamplerError::InvalidInit(format!(
                "particle {row} lies outside the barrier: {}",
                particles.row(row)
            )));
        }
        debug!(
            "initialised {} particles in {} dimensions",
            self.num_samples, self.dimension
        );
        self.particles = Some(particles);
        Ok(())
    }

    fn particles(&self) -> Option<ArrayView2<'_, T>> {
        self.particles.as_ref().map(|p| p.view())
    }

    fn step(&mut self) -> Result<ArrayView2<'_, T>> {
        let barrier = &self.barrier;
        let particles = self.particles.as_mut().ok_or(SamplerError::NotInitialized)?;
        particles
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(self.rngs.par_iter_mut())
            .try_for_each(|(x, rng)| hit_and_run_move(barrier, x, rng))?;
        Ok(particles.view())
    }

    fn boundary_half_fraction(&self) -> Option<f64> {
        let particles = self.particles.as_ref()?;
        stats::boundary_half_fraction(&self.barrier, particles.view())
    }
}

/// Moves `x` to a uniformly drawn point on a uniformly oriented chord through it.
fn hit_and_run_move<T, B, R>(barrier: &B, mut x: ArrayViewMut1<T>, rng: &mut R) -> Result<()>
where
    T: NdFloat,
    B: Barrier<T> + ?Sized,
    R: Rng,
    StandardNormal: Distribution<T>,
    StandardUniform: Distribution<T>,
{
    let direction = random_direction(x.len(), rng);
    let (t_min, t_max) = barrier.boundary_distances(x.view(), direction.view())?;
    let u: T = rng.sample(StandardUniform);
    let mut t = t_min + u * (t_max - t_min);

    let half = (T::one() + T::one()).recip();
    for halvings in 0..=MAX_HALVINGS {
        let candidate = &direction * t + &x;
        if barrier.contains(candidate.view()) {
            if halvings > 0 {
                trace!("step length halved {halvings} times to stay inside the barrier");
            }
            x.assign(&candidate);
            return Ok(());
        }
        t *= half;
    }
    Err(SamplerError::DegenerateDirection)
}

/// Uniform direction on the unit sphere in `dim` dimensions.
fn random_direction<T, R>(dim: usize, rng: &mut R) -> Array1<T>
where
    T: NdFloat,
    R: Rng,
    StandardNormal: Distribution<T>,
{
    loop {
        let d: Array1<T> = Array1::from_shape_fn(dim, |_| rng.sample(StandardNormal));
        let norm = d.dot(&d).sqrt();
        if norm > T::zero() && norm.is_finite() {
            return d / norm;
        }
    }
}
