use core::fmt::Debug;
use embedded_nor::{NorFlashError, NorFlashErrorKind};

/// Error type for the SPI NOR flash driver.
///
/// It is generic over the transport error type (TE), so the same driver can sit on top of
/// any [`crate::transport::Transport`] strategy. Transport errors are passed through untouched,
/// the driver never retries a failed transfer.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpiFlashError<TE> {
    /// Error from the bus transport
    #[error("Transport error: {0:?}")]
    Transport(TE),
    /// The identify response did not carry the manufacturer code of the chip family.
    #[error("Unexpected manufacturer id {found:#04X}, expected {expected:#04X}")]
    GeometryMismatch { expected: u8, found: u8 },
    /// Erase offset or length is not a multiple of the sector size.
    /// Rejected before anything is sent to the chip.
    #[error("Requested bytes not aligned")]
    NotAligned,
    /// The busy bit did not clear within the program poll budget.
    /// The page may be partially programmed.
    #[error("Program timed out")]
    ProgramTimeout,
    /// The busy bit did not clear within the erase poll budget.
    /// The sector may be partially erased.
    #[error("Erase timed out")]
    EraseTimeout,
    /// Requested bytes out of bounds
    #[error("Requested bytes out of bounds")]
    OutOfBounds,
    /// The device has not been identified yet, call `init` first
    #[error("Device not probed")]
    NotProbed,
    /// Other error
    #[error("Other error. Should not happen")]
    Other,
}

// Convert from driver error to the more generic NorFlashError
impl<TE: Debug> NorFlashError for SpiFlashError<TE> {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            SpiFlashError::NotAligned => NorFlashErrorKind::NotAligned,
            SpiFlashError::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            SpiFlashError::ProgramTimeout => NorFlashErrorKind::Timeout,
            SpiFlashError::EraseTimeout => NorFlashErrorKind::Timeout,
            SpiFlashError::Transport(_) => NorFlashErrorKind::Other,
            SpiFlashError::GeometryMismatch { .. } => NorFlashErrorKind::Other,
            SpiFlashError::NotProbed => NorFlashErrorKind::Other,
            SpiFlashError::Other => NorFlashErrorKind::Other,
        }
    }
}

// This impl is only for the helper check bounds / alignment functions for auto conversion from errors
impl<TE> From<NorFlashErrorKind> for SpiFlashError<TE> {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => SpiFlashError::NotAligned,
            NorFlashErrorKind::OutOfBounds => SpiFlashError::OutOfBounds,
            _ => SpiFlashError::Other,
        }
    }
}
