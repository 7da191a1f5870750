use core::num::NonZeroUsize;

use embedded_hal::spi::{Operation, SpiDevice};

use super::{BusConfig, DataPhase, Transport};

/// Command and data phase as separate operations of one [SpiDevice] transaction.
///
/// The device keeps chip select asserted across both operations, so the chip sees a single
/// frame while the data never has to be copied next to the command.
#[derive(Debug)]
pub struct SplitPhase<SPI> {
    spi: SPI,
    config: BusConfig,
}

impl<SPI> SplitPhase<SPI> {
    pub fn new(spi: SPI, config: BusConfig) -> Self {
        SplitPhase { spi, config }
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

impl<SPI: SpiDevice> Transport for SplitPhase<SPI> {
    type Error = SPI::Error;

    fn max_transfer(&self) -> NonZeroUsize {
        self.config.max_transfer
    }

    fn transfer(&mut self, command: &[u8], data: DataPhase<'_>) -> Result<(), Self::Error> {
        match data {
            DataPhase::None => self.spi.transaction(&mut [Operation::Write(command)]),
            DataPhase::Write(buf) => self
                .spi
                .transaction(&mut [Operation::Write(command), Operation::Write(buf)]),
            DataPhase::Read(buf) => self
                .spi
                .transaction(&mut [Operation::Write(command), Operation::Read(buf)]),
        }
    }
}
