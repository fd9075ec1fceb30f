use crate::types::Status;
use std::time::Duration;
use thiserror::Error;

/// lwIP status returned by the radio's transmit primitive on success.
pub const ERR_OK: i32 = 0;
/// lwIP status for an illegal argument.
pub const ERR_ARG: i32 = -16;

/// Failure reported by the radio driver layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("invalid argument")]
    InvalidArgument,

    #[error("driver returned error code {0}")]
    Code(i32),

    #[error("driver error: {0}")]
    Other(String),
}

impl DriverError {
    /// Map a raw driver status code onto a result.
    pub fn check(code: i32) -> Result<(), DriverError> {
        match code {
            ERR_OK => Ok(()),
            ERR_ARG => Err(DriverError::InvalidArgument),
            other => Err(DriverError::Code(other)),
        }
    }
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("no frame available")]
    WouldBlock,

    #[error("frame of {len} bytes does not fit in a {capacity} byte buffer")]
    FrameTooLarge { len: usize, capacity: usize },

    #[error("transmit rejected: {0}")]
    TransmitRejected(DriverError),

    #[error("transmit failed: {0}")]
    TransmitFailed(DriverError),

    #[error("link still down after waiting {waited:?}")]
    NotConnected { waited: Duration },

    #[error("failed to register receive callback: {0}")]
    Registration(DriverError),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RelayError {
    /// Collapse the error into the status set exposed to the consumer runtime.
    pub fn status(&self) -> Status {
        match self {
            RelayError::WouldBlock => Status::Again,
            RelayError::FrameTooLarge { .. } | RelayError::TransmitRejected(_) => Status::Invalid,
            RelayError::InvalidConfig(_) => Status::Invalid,
            RelayError::TransmitFailed(_)
            | RelayError::NotConnected { .. }
            | RelayError::Registration(_)
            | RelayError::Driver(_) => Status::Unspecified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_maps_lwip_codes() {
        assert_eq!(DriverError::check(ERR_OK), Ok(()));
        assert_eq!(DriverError::check(ERR_ARG), Err(DriverError::InvalidArgument));
        assert_eq!(DriverError::check(-1), Err(DriverError::Code(-1)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::WouldBlock.status(), Status::Again);
        assert_eq!(
            RelayError::FrameTooLarge {
                len: 40,
                capacity: 20
            }
            .status(),
            Status::Invalid
        );
        assert_eq!(
            RelayError::TransmitRejected(DriverError::InvalidArgument).status(),
            Status::Invalid
        );
        assert_eq!(
            RelayError::TransmitFailed(DriverError::Code(-4)).status(),
            Status::Unspecified
        );
        assert_eq!(
            RelayError::NotConnected {
                waited: Duration::from_millis(5)
            }
            .status(),
            Status::Unspecified
        );
    }
}
