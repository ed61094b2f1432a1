/*!
# I/O Utilities for Saving Particle Trajectories to CSV

Writers for mixing trajectories. Enable via the `csv` feature.
*/

use crate::core::MixOutput;
use ndarray::{ArrayView3, Axis};
use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{StringRecord, Writer};

/// Writes a trajectory (iteration × particle × dimension) as CSV into `sink`.
///
/// Columns are `iteration`, `particle`, then `dim_0 .. dim_{D-1}`; one row per particle
/// per iteration, iterations outermost.
pub fn write_csv<T: Display, W: Write>(
    data: ArrayView3<T>,
    sink: W,
) -> Result<(), Box<dyn Error>> {
    let (_, _, n_dims) = data.dim();
    let mut wtr = Writer::from_writer(sink);
    wtr.write_record(
        ["iteration".to_string(), "particle".to_string()]
            .into_iter()
            .chain((0..n_dims).map(|i| format!("dim_{i}"))),
    )?;

    let mut record = StringRecord::with_capacity(16 * (n_dims + 2), n_dims + 2);
    for (iteration, batch) in data.outer_iter().enumerate() {
        let iteration = iteration.to_string();
        for (particle, x) in batch.outer_iter().enumerate() {
            record.clear();
            record.push_field(&iteration);
            record.push_field(&particle.to_string());
            for v in x.iter() {
                record.push_field(&v.to_string());
            }
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/**
Saves a particle trajectory to the file `filename`, in the layout of [`write_csv`].

# Examples

```rust
use conspace_sampler::io::csv::save_csv;
use ndarray::arr3;

// One iteration of 2 particles in 4 dimensions.
let data = arr3(&[[[1, 2, 3, 4], [5, 6, 7, 8]]]);

save_csv(data.view(), std::env::temp_dir().join("trajectory.csv"))?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_csv<T: Display>(
    data: ArrayView3<T>,
    filename: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    write_csv(data, File::create(filename)?)
}

/// Saves the result of a mixing run.
///
/// A final batch is written as a single iteration with index 0.
pub fn save_mix_output<T: Display>(
    output: &MixOutput<T>,
    filename: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    match output {
        MixOutput::Trajectory(trajectory) => save_csv(trajectory.view(), filename),
        MixOutput::Final(batch) => save_csv(batch.view().insert_axis(Axis(0)), filename),
    }
}
