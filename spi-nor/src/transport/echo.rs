use core::num::NonZeroUsize;

use embedded_hal::spi::SpiDevice;

use super::{BusConfig, DataPhase, Transport};
use crate::command::MAX_COMMAND_LEN;

#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EchoError<SE> {
    /// Error from the SPI peripheral
    #[error("SpiDevice error: {0:?}")]
    Spi(SE),
    /// Command plus data does not fit the scratch frame
    #[error("Frame of {0} bytes does not fit the transfer buffer")]
    FrameTooLong(usize),
}

/// Command and data in a single full-duplex transfer.
///
/// Both directions go through `N`-byte scratch buffers. The bytes received while the
/// command is shifted out are an echo of the command and are dropped, so a read of `n`
/// bytes clocks `command.len() + n` bytes on the wire.
#[derive(Debug)]
pub struct CombinedEcho<SPI, const N: usize> {
    spi: SPI,
    config: BusConfig,
    tx: [u8; N],
    rx: [u8; N],
}

impl<SPI, const N: usize> CombinedEcho<SPI, N> {
    const FITS_COMMAND: () = assert!(
        N > MAX_COMMAND_LEN,
        "transfer buffer must hold a full command frame and at least one data byte"
    );

    pub fn new(spi: SPI, config: BusConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_COMMAND;
        CombinedEcho {
            spi,
            config,
            tx: [0; N],
            rx: [0; N],
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn spi(&self) -> &SPI {
        &self.spi
    }

    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Give back the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice, const N: usize> Transport for CombinedEcho<SPI, N> {
    type Error = EchoError<SPI::Error>;

    fn max_transfer(&self) -> NonZeroUsize {
        match NonZeroUsize::new(N - MAX_COMMAND_LEN) {
            Some(room) => room.min(self.config.max_transfer),
            None => self.config.max_transfer,
        }
    }

    fn transfer(&mut self, command: &[u8], data: DataPhase<'_>) -> Result<(), Self::Error> {
        let header = command.len();
        let total = header + data.len();
        if total > N {
            return Err(EchoError::FrameTooLong(total));
        }

        self.tx[..header].copy_from_slice(command);
        match &data {
            DataPhase::Write(buf) => self.tx[header..total].copy_from_slice(buf),
            _ => self.tx[header..total].fill(self.config.orc),
        }

        self.spi
            .transfer(&mut self.rx[..total], &self.tx[..total])
            .map_err(EchoError::Spi)?;

        if let DataPhase::Read(buf) = data {
            // Skip the echoed command
            buf.copy_from_slice(&self.rx[header..total]);
        }
        Ok(())
    }
}
