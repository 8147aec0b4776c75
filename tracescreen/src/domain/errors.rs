//! Structured error types for tracescreen
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::io;
use thiserror::Error;

/// Why a tracer session could not be started.
///
/// None of these abort the program: the screen opens with the message as a
/// permanent notice line instead of live output.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Tracing unavailable on not supported system.")]
    UnsupportedPlatform,

    #[error("Failed to create tracer pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("Failed to set non-blocking mode on tracer pipe: {0}")]
    NonBlocking(#[source] io::Error),

    #[error("Could not execute '{program}'. Please make sure it is available in your $PATH.")]
    TracerMissing { program: String },

    #[error("Failed to start '{program}': {source}")]
    ProcessCreation {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl SpawnError {
    /// True when the failure was known before any spawn was attempted.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform)
    }
}

#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Terminal error: {0}")]
    TerminalError(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
