//! Runs hit-and-run on the 2-simplex from its barycenter and saves the trajectory to CSV.

use conspace_sampler::barriers::SimplexBarrier;
use conspace_sampler::core::{init_at, ParticleSampler};
use conspace_sampler::hit_and_run::HitAndRunSampler;
use conspace_sampler::io::csv::save_mix_output;
use ndarray::{arr1, Axis};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_PARTICLES: usize = 64;
    const N_ITERS: usize = 200;
    let filename = std::env::temp_dir().join("simplex_trace.csv");

    let barrier = SimplexBarrier::<f64>::new(2)?;
    let mut sampler = HitAndRunSampler::new(barrier, N_PARTICLES).seed(42);
    let third = 1.0 / 3.0;
    sampler.set_initial_particles(init_at(N_PARTICLES, arr1(&[third, third]).view()))?;

    let out = sampler.mix(N_ITERS, true, true)?;
    save_mix_output(&out, &filename)?;

    let last = out.last().ok_or("empty trajectory")?;
    let mean = last.mean_axis(Axis(0)).ok_or("no particles")?;
    println!(
        "Saved {:?} to {}. Final mean: ({:.2}, {:.2}), boundary-half fraction: {:?}",
        out.shape(),
        filename.display(),
        mean[0],
        mean[1],
        sampler.boundary_half_fraction()
    );
    Ok(())
}
