/*!
Helper functions for saving particle trajectories to disk.
*/

#[cfg(feature = "csv")]
pub mod csv;
