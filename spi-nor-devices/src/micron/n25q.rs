use spi_nor::{SpiNor, StatusPoll};

/// Concrete type that implements all the flash device features
/// for the N25Q series of NOR flash devices.
///
/// Completion of program and erase is read from the flag status register.
/// `B` is the number of 64 KiB blocks. Parts above 16 MiB need 4-byte addressing
/// and are not covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct N25Q<const B: u32>();

/// Specific flash device with block count
pub type N25Q032 = N25Q<64>;
pub type N25Q064 = N25Q<128>;
pub type N25Q128 = N25Q<256>;

impl<const B: u32> N25Q<B> {
    /// Creates a new instance of the N25Q flash device.
    pub fn new() -> Self {
        Self()
    }
}

impl<const B: u32> Default for N25Q<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const B: u32> SpiNor for N25Q<B> {
    const NAME: &'static str = match B {
        64 => "N25Q032",
        128 => "N25Q064",
        256 => "N25Q128",
        _ => "N25Q",
    };
    const MANUFACTURER_ID: u8 = 0x20;
    const CAPACITY: u32 = B * 16 * 4096;
    const STATUS_POLL: StatusPoll = StatusPoll::FLAG_STATUS;
}

// Implement blocking trait
mod blocking {
    use super::N25Q;
    use spi_nor::{cmd_blocking::SpiNorBlocking, transport::Transport};

    impl<T: Transport, const B: u32> SpiNorBlocking<T> for N25Q<B> {}
}
