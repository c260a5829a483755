use embedded_hal_nb::serial::Error;

use crate::serial::ErrorShim;

/// Transport failures. Malformed input is never an error, the parser just
/// resynchronises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmataError<ReadError, WriteError> {
    Read(ReadError),
    Write(WriteError),
    /// Output could not be queued: the transmit queue is full and the
    /// hardware is not draining it.
    TxQueueFull,
}

impl<Er, Ew: Error> From<ErrorShim<Ew>> for FirmataError<Er, Ew> {
    fn from(value: ErrorShim<Ew>) -> Self {
        match value {
            ErrorShim::Serial(e) => FirmataError::Write(e),
            ErrorShim::QueueFull => FirmataError::TxQueueFull,
        }
    }
}

impl<Er: core::fmt::Debug, Ew: core::fmt::Debug> core::fmt::Display for FirmataError<Er, Ew> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FirmataError::Read(e) => write!(f, "transport read failed: {e:?}"),
            FirmataError::Write(e) => write!(f, "transport write failed: {e:?}"),
            FirmataError::TxQueueFull => write!(f, "transmit queue full"),
        }
    }
}
