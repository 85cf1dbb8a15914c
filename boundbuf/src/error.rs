use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoundBufError {
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("failed to allocate storage for {capacity} slots: {source}")]
    Allocation {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },
}
