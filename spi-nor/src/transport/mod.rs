//! Bus transport: how command and data phases reach the chip.
//!
//! The operation engine only talks to [`Transport`]. Two strategies are provided:
//!
//! * [`SplitPhase`] issues the command phase and the data phase as two operations of one
//!   chip-select transaction on an [`embedded_hal::spi::SpiDevice`].
//! * [`CombinedEcho`] issues a single full-duplex transfer of command and data through a
//!   scratch frame. The response echoes the command bytes, which are skipped.
//!
//! [`IrqSpi`] adapts an interrupt-completed peripheral to [`embedded_hal::spi::SpiDevice`] so
//! either strategy can run on top of it.

use core::num::NonZeroUsize;

use embedded_hal::spi::{Mode, MODE_0};

mod echo;
mod irq;
mod split;

pub use echo::{CombinedEcho, EchoError};
pub use irq::{Completion, IrqSpi, IrqSpiError, StartTransfer};
pub use split::SplitPhase;

/// What follows the command phase of a transfer
#[derive(Debug)]
pub enum DataPhase<'a> {
    /// Command only
    None,
    /// Bytes clocked out to the chip after the command
    Write(&'a [u8]),
    /// Bytes clocked in from the chip after the command
    Read(&'a mut [u8]),
}

impl DataPhase<'_> {
    pub fn len(&self) -> usize {
        match self {
            DataPhase::None => 0,
            DataPhase::Write(buf) => buf.len(),
            DataPhase::Read(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Blocking transfer primitive the driver is written against.
///
/// Each call runs to completion before returning; at most one transfer is in flight.
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Largest data phase a single transfer may carry.
    fn max_transfer(&self) -> NonZeroUsize;

    /// Issue `command`, then the data phase, under one chip select.
    fn transfer(&mut self, command: &[u8], data: DataPhase<'_>) -> Result<(), Self::Error>;
}

/// Order bits are shifted on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Settings the SPI peripheral must be configured with for the flash.
///
/// Clock rate, mode and bit order are applied by the HAL when the bus is created;
/// the transport uses `max_transfer` and `orc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// SCK frequency in Hz
    pub frequency: u32,
    /// Clock polarity and phase
    pub mode: Mode,
    pub bit_order: BitOrder,
    /// Largest number of data bytes per physical transfer
    pub max_transfer: NonZeroUsize,
    /// Over-read character, clocked out while only reading
    pub orc: u8,
}

impl BusConfig {
    /// 8 MHz, mode 0, MSB first, 256 byte transfers
    pub const W25Q: BusConfig = BusConfig {
        frequency: 8_000_000,
        mode: MODE_0,
        bit_order: BitOrder::MsbFirst,
        max_transfer: match NonZeroUsize::new(256) {
            Some(n) => n,
            None => unreachable!(),
        },
        orc: 0xCC,
    };

    /// Same settings with a different transfer limit
    pub const fn with_max_transfer(mut self, max_transfer: NonZeroUsize) -> Self {
        self.max_transfer = max_transfer;
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig::W25Q
    }
}
