use std::collections::TryReserveError;

use thiserror::Error;

/// Why a composite failed. The compositor is all-or-nothing: on error the
/// frame is considered not rendered and every partial structure is freed
/// before returning.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("scratch allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// Why a composite returned. `Interrupted` is not an error: the raster is
/// partially updated but memory-safe, and the caller simply re-issues the
/// composite later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStatus {
    Done,
    Interrupted,
}

/// Polls the injected cancellation predicate.
pub(crate) fn cancelled(cancel: Option<&dyn Fn() -> bool>) -> bool {
    cancel.map_or(false, |probe| probe())
}
