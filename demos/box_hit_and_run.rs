//! Mixes 500 particles inside the narrow box [-0.01, 0.01] × [-1, 1] with hit-and-run,
//! starting from a tiny square around the origin, and prints the trajectory's shape.

use conspace_sampler::barriers::{Barrier, BoxBarrier};
use conspace_sampler::core::{init_uniform, ParticleSampler};
use conspace_sampler::hit_and_run::HitAndRunSampler;
use ndarray::{arr1, Axis};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_PARTICLES: usize = 500;
    const N_ITERS: usize = 1000;

    let barrier = BoxBarrier::new(arr1(&[0.01, 1.0]))?;
    let mut sampler = HitAndRunSampler::new(&barrier, N_PARTICLES);
    sampler.set_initial_particles(init_uniform(N_PARTICLES, 2, 0.001))?;

    // Keep all iterations, with a progress bar.
    let out = sampler.mix(N_ITERS, true, false)?;
    println!("{:?}", out.shape());

    let last = out.last().ok_or("empty trajectory")?;
    let all_inside = barrier.feasibility(last).iter().all(|inside| *inside);
    let var = last.var_axis(Axis(0), 0.0);
    println!(
        "all particles inside: {all_inside}, variance: ({:.2e}, {:.3}), uniform: ({:.2e}, {:.3})",
        var[0],
        var[1],
        0.01f64.powi(2) / 3.0,
        1.0 / 3.0
    );
    Ok(())
}
