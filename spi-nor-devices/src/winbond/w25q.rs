use spi_nor::SpiNor;

/// Concrete type that implements all the flash device features
/// for the W25Q series of NOR flash devices.
///
/// `B` is the number of 64 KiB blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct W25Q<const B: u32>();

/// Specific flash device with block count
pub type W25Q32 = W25Q<64>;
pub type W25Q64 = W25Q<128>;
pub type W25Q128 = W25Q<256>;

impl<const B: u32> W25Q<B> {
    /// Creates a new instance of the W25Q flash device.
    pub fn new() -> Self {
        Self()
    }
}

impl<const B: u32> Default for W25Q<B> {
    fn default() -> Self {
        Self::new()
    }
}

// W25Q parts poll bit 0 of status register 1 and use the default commands
impl<const B: u32> SpiNor for W25Q<B> {
    const NAME: &'static str = match B {
        64 => "W25Q32",
        128 => "W25Q64",
        256 => "W25Q128",
        _ => "W25Q",
    };
    const MANUFACTURER_ID: u8 = 0xEF;
    const CAPACITY: u32 = B * 16 * 4096;
}

// Implement blocking trait
mod blocking {
    use super::W25Q;
    use spi_nor::{cmd_blocking::SpiNorBlocking, transport::Transport};

    impl<T: Transport, const B: u32> SpiNorBlocking<T> for W25Q<B> {}
}
