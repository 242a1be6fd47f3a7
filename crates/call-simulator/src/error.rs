//! Error types for simulations.

use profile_store::{StoreError, ValidationError};
use thiserror::Error;

/// Errors that can occur when starting a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Input was rejected before anything started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The write that a simulation depends on did not reach the store.
    #[error("remote write failed: {0}")]
    RemoteWrite(#[from] StoreError),

    /// The same simulation is already running.
    #[error("{0} already in progress")]
    Busy(&'static str),

    /// The owning session was torn down.
    #[error("session closed")]
    Closed,
}
