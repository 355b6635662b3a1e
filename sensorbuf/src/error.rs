use mpmcbuf::MpmcBufError;
use thiserror::Error;

use crate::stream::StreamKind;

#[derive(Error, Debug)]
pub enum SensorBufError {
    #[error("driver refused {stream} callback registration (status {status})")]
    Registration { stream: StreamKind, status: i32 },
    #[error("{stream} callback is installed with a different driver")]
    DriverMismatch { stream: StreamKind },
    #[error("queue error: {0}")]
    Queue(#[from] MpmcBufError),
}

pub type Result<T> = std::result::Result<T, SensorBufError>;
