// File: rolegate-core/src/tasks/mod.rs

pub mod session_sweep;
pub mod verification_sweep;

pub use session_sweep::spawn_session_sweep_task;
pub use verification_sweep::{run_verification_sweep, spawn_verification_sweep_task};
