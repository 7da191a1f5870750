#![cfg_attr(not(any(test, feature = "std")), no_std)]
// Must be first to share macros across crate
pub(crate) mod fmt;

pub mod cmd_blocking;
pub mod command;
mod device;
pub mod error;
mod geometry;
#[cfg(any(test, feature = "std"))]
pub mod test;
pub mod transport;

pub use device::SpiNorDevice;
pub use geometry::{Geometry, JedecID};

/// Core trait that a SPI NOR flash family must implement.
///
/// Enables use of the [crate::cmd_blocking::SpiNorBlocking] trait, which together with
/// this one forms the capability table of a family. The family is chosen when the
/// [SpiNorDevice] is created and checked against the chip by `init`.
///
/// At minimum requires [SpiNor::NAME], [SpiNor::MANUFACTURER_ID] and [SpiNor::CAPACITY].
///
/// Default command implementations in [crate::cmd_blocking::SpiNorBlocking] can be overriden
/// by changing the COMMAND constants.
pub trait SpiNor {
    /// Human readable name of the part
    const NAME: &'static str;
    /// Expected first byte of the identify response
    const MANUFACTURER_ID: u8;

    // Device layout
    /// The size of a program page in bytes
    const PAGE_SIZE: u32 = 256;
    /// The total capacity of the device in bytes
    const CAPACITY: u32;
    /// Capacity code that selects 64 KiB sectors instead of 4 KiB
    const LARGE_SECTOR_CODE: u8 = 0x20;

    // Commands
    /// The command to read the JEDEC ID of the flash device
    const JEDEC_COMMAND: u8 = 0x9F;
    /// Read with one dummy byte after the address
    const FAST_READ_COMMAND: u8 = 0x0B;
    /// Program up to a page
    const PAGE_PROGRAM_COMMAND: u8 = 0x02;
    /// Enable writing to the flash device, including erasing
    const WRITE_ENABLE_COMMAND: u8 = 0x06;
    /// Erase a 4 KiB sector
    const SECTOR_ERASE_4K_COMMAND: u8 = 0x20;
    /// Erase a 64 KiB block
    const BLOCK_ERASE_64K_COMMAND: u8 = 0xD8;
    /// Erase the whole flash device
    const CHIP_ERASE_COMMAND: u8 = 0xC7;

    /// Register polled after program and erase
    const STATUS_POLL: StatusPoll = StatusPoll::WIP;

    // Poll budgets, in status reads
    const PROGRAM_POLL_BUDGET: u32 = 2000;
    const SECTOR_ERASE_POLL_BUDGET: u32 = 5000;
    const BLOCK_ERASE_POLL_BUDGET: u32 = 10000;
    const CHIP_ERASE_POLL_BUDGET: u32 = 1_000_000;

    /// Derive the layout from an identify response whose manufacturer already matched.
    fn geometry(id: JedecID) -> Geometry {
        let sector_size = if id.capacity_code() == Self::LARGE_SECTOR_CODE {
            EraseSize::Block64K.bytes()
        } else {
            EraseSize::Sector4K.bytes()
        };
        Geometry {
            manufacturer_id: id.manufacturer(),
            capacity_code: id.capacity_code(),
            page_size: Self::PAGE_SIZE,
            sector_size,
            total_size: Self::CAPACITY,
        }
    }
}

/// How readiness is read back after a write-class command.
///
/// The register at `opcode` is read and the device is ready once
/// `status & mask == ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusPoll {
    pub opcode: u8,
    pub mask: u8,
    pub ready: u8,
}

impl StatusPoll {
    /// Status register 1, write-in-progress bit must be clear
    pub const WIP: StatusPoll = StatusPoll {
        opcode: 0x05,
        mask: 0x01,
        ready: 0x00,
    };

    /// Flag status register, program/erase controller bit must be set
    pub const FLAG_STATUS: StatusPoll = StatusPoll {
        opcode: 0x70,
        mask: 0x80,
        ready: 0x80,
    };

    pub fn is_ready(&self, status: u8) -> bool {
        status & self.mask == self.ready
    }
}

/// Erase granularity in use, follows the sector size of the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EraseSize {
    Sector4K,
    Block64K,
}

impl EraseSize {
    /// Anything other than 4 KiB uses the 64 KiB block erase
    pub fn for_sector_size(sector_size: u32) -> Self {
        if sector_size == 4096 {
            EraseSize::Sector4K
        } else {
            EraseSize::Block64K
        }
    }

    pub fn bytes(&self) -> u32 {
        match self {
            EraseSize::Sector4K => 4096,
            EraseSize::Block64K => 65536,
        }
    }
}
