use embedded_nor::ByteAddress;
use utils::transfer;

use crate::{
    command::CommandFrame,
    error::SpiFlashError,
    transport::{DataPhase, Transport},
    EraseSize, JedecID, SpiNor,
};

/// Blocking SPI NOR flash trait.
/// Contains the low level, single transfer commands.
///
/// Some compound functions are provided, combining a write-class command with the
/// write enable that has to precede it and the status poll that has to follow it.
///
/// The default implementations are fairly generic and should work for most 25-series SPI NOR
/// flash devices. Look to make changes to the [SpiNor] trait first to change the default behavior.
/// If this isn't possible, override the default function(s).
pub trait SpiNorBlocking<T: Transport>: SpiNor {
    // ============= Commands =============

    /// Read the three byte JEDEC identification
    fn read_jedec_id_cmd(&self, transport: &mut T) -> Result<JedecID, SpiFlashError<T::Error>> {
        let mut buf = [0; 3];
        transfer(
            transport,
            CommandFrame::opcode(Self::JEDEC_COMMAND),
            DataPhase::Read(&mut buf),
        )?;
        Ok(JedecID::from_response(buf))
    }

    /// Read the register used for busy polling
    fn read_status_cmd(&self, transport: &mut T) -> Result<u8, SpiFlashError<T::Error>> {
        let mut buf = [0; 1];
        transfer(
            transport,
            CommandFrame::opcode(Self::STATUS_POLL.opcode),
            DataPhase::Read(&mut buf),
        )?;
        Ok(buf[0])
    }

    /// Enable writing to the flash device
    fn write_enable_cmd(&self, transport: &mut T) -> Result<(), SpiFlashError<T::Error>> {
        transfer(
            transport,
            CommandFrame::opcode(Self::WRITE_ENABLE_COMMAND),
            DataPhase::None,
        )
    }

    /// Read `buf.len()` bytes starting at `address`. Must fit in a single transfer.
    fn fast_read_cmd(
        &self,
        transport: &mut T,
        address: ByteAddress,
        buf: &mut [u8],
    ) -> Result<(), SpiFlashError<T::Error>> {
        transfer(
            transport,
            CommandFrame::addressed_with_dummy(Self::FAST_READ_COMMAND, address),
            DataPhase::Read(buf),
        )
    }

    /// Shift `data` into the page at `address`.
    ///
    /// Bytes past the end of the page wrap to its start, so the caller must not cross
    /// a page boundary.
    ///
    /// Use [SpiNorBlocking::write_enable_cmd] to enable writing before this command
    fn page_program_cmd(
        &self,
        transport: &mut T,
        address: ByteAddress,
        data: &[u8],
    ) -> Result<(), SpiFlashError<T::Error>> {
        transfer(
            transport,
            CommandFrame::addressed(Self::PAGE_PROGRAM_COMMAND, address),
            DataPhase::Write(data),
        )
    }

    /// Erase the sector or block containing `address`
    ///
    /// Use [SpiNorBlocking::write_enable_cmd] to enable writing before this command
    fn erase_cmd(
        &self,
        transport: &mut T,
        size: EraseSize,
        address: ByteAddress,
    ) -> Result<(), SpiFlashError<T::Error>> {
        let opcode = match size {
            EraseSize::Sector4K => Self::SECTOR_ERASE_4K_COMMAND,
            EraseSize::Block64K => Self::BLOCK_ERASE_64K_COMMAND,
        };
        transfer(
            transport,
            CommandFrame::addressed(opcode, address),
            DataPhase::None,
        )
    }

    /// Erase the whole chip
    ///
    /// Use [SpiNorBlocking::write_enable_cmd] to enable writing before this command
    fn chip_erase_cmd(&self, transport: &mut T) -> Result<(), SpiFlashError<T::Error>> {
        transfer(
            transport,
            CommandFrame::opcode(Self::CHIP_ERASE_COMMAND),
            DataPhase::None,
        )
    }

    // ============= Status functions ============

    /// Check if the device accepts new commands
    fn is_ready(&self, transport: &mut T) -> Result<bool, SpiFlashError<T::Error>> {
        let status = self.read_status_cmd(transport)?;
        Ok(Self::STATUS_POLL.is_ready(status))
    }

    /// Poll the status register until ready, at most `budget` times.
    ///
    /// Every iteration reads the status again straight away. Returns `false` if the
    /// device was still busy after the last read; a budget of zero reads nothing.
    fn wait_ready(&self, transport: &mut T, budget: u32) -> Result<bool, SpiFlashError<T::Error>> {
        for _ in 0..budget {
            if self.is_ready(transport)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ============= RWE functions =============

    /// Program a slice that lies within one page and wait for it to complete.
    ///
    /// The region must have been erased first.
    fn program_page(
        &self,
        transport: &mut T,
        address: ByteAddress,
        data: &[u8],
    ) -> Result<(), SpiFlashError<T::Error>> {
        // Enable writing
        self.write_enable_cmd(transport)?;
        // Shift the data into the page
        self.page_program_cmd(transport, address, data)?;
        // Wait for the program to complete
        if !self.wait_ready(transport, Self::PROGRAM_POLL_BUDGET)? {
            warn!("Program at {} still busy", address.as_u32());
            return Err(SpiFlashError::ProgramTimeout);
        }
        Ok(())
    }

    /// Erase one sector or block and wait for it to complete
    fn erase_sector(
        &self,
        transport: &mut T,
        size: EraseSize,
        address: ByteAddress,
    ) -> Result<(), SpiFlashError<T::Error>> {
        let budget = match size {
            EraseSize::Sector4K => Self::SECTOR_ERASE_POLL_BUDGET,
            EraseSize::Block64K => Self::BLOCK_ERASE_POLL_BUDGET,
        };
        // Enable writing
        self.write_enable_cmd(transport)?;
        // Erase the sector
        self.erase_cmd(transport, size, address)?;
        // Wait for the erase to complete
        if !self.wait_ready(transport, budget)? {
            warn!("Erase at {} still busy", address.as_u32());
            return Err(SpiFlashError::EraseTimeout);
        }
        Ok(())
    }

    /// Erase the whole chip and wait for it to complete
    fn erase_chip(&self, transport: &mut T) -> Result<(), SpiFlashError<T::Error>> {
        self.write_enable_cmd(transport)?;
        self.chip_erase_cmd(transport)?;
        if !self.wait_ready(transport, Self::CHIP_ERASE_POLL_BUDGET)? {
            warn!("Chip erase still busy");
            return Err(SpiFlashError::EraseTimeout);
        }
        Ok(())
    }
}

pub mod utils {
    use crate::{
        command::CommandFrame,
        error::SpiFlashError,
        transport::{DataPhase, Transport},
    };

    /// Wrapper around [Transport::transfer] that maps errors
    pub fn transfer<T: Transport>(
        transport: &mut T,
        command: CommandFrame,
        data: DataPhase<'_>,
    ) -> Result<(), SpiFlashError<T::Error>> {
        trace!(
            "Command {} address {:?} dummy {}",
            command.opcode_byte(),
            command.address(),
            command.has_dummy()
        );
        transport
            .transfer(command.as_bytes(), data)
            .map_err(SpiFlashError::Transport)
    }
}
