use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MpmcBufError {
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    #[error("capacity {0} cannot be rounded up to a power of two")]
    CapacityOverflow(usize),

    #[error("failed to allocate queue slots: {0}")]
    AllocationFailed(#[from] TryReserveError),
}
