use core::{
    fmt::Display,
    ops::{Add, AddAssign},
};

/// Index of a program page in the flash device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageIndex(pub(crate) u32);

impl PageIndex {
    pub fn new(index: u32) -> Self {
        PageIndex(index)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn as_byte_address(&self, page_size: u32) -> ByteAddress {
        ByteAddress(self.0 * page_size)
    }
}

impl Display for PageIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Index of an erase sector in the flash device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectorIndex(pub(crate) u32);

impl SectorIndex {
    pub fn new(index: u32) -> Self {
        SectorIndex(index)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn as_byte_address(&self, sector_size: u32) -> ByteAddress {
        ByteAddress(self.0 * sector_size)
    }
}

impl Display for SectorIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Address of a byte in the flash device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteAddress(pub(crate) u32);

impl ByteAddress {
    pub fn new(address: u32) -> Self {
        ByteAddress(address)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn as_page_index(&self, page_size: u32) -> PageIndex {
        PageIndex(self.0 / page_size)
    }

    pub fn as_sector_index(&self, sector_size: u32) -> SectorIndex {
        SectorIndex(self.0 / sector_size)
    }

    /// Number of bytes into the page
    pub fn page_offset(&self, page_size: u32) -> u32 {
        self.0 % page_size
    }

    /// Number of bytes into the sector
    pub fn sector_offset(&self, sector_size: u32) -> u32 {
        self.0 % sector_size
    }

    /// Bytes left before the next page boundary, at least 1
    pub fn page_remaining(&self, page_size: u32) -> u32 {
        page_size - self.page_offset(page_size)
    }
}

impl From<u32> for ByteAddress {
    fn from(address: u32) -> Self {
        ByteAddress(address)
    }
}

impl From<ByteAddress> for u32 {
    fn from(ba: ByteAddress) -> Self {
        ba.as_u32()
    }
}

impl Add<u32> for ByteAddress {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        ByteAddress(self.0 + rhs)
    }
}

impl AddAssign<u32> for ByteAddress {
    fn add_assign(&mut self, rhs: u32) {
        self.0 += rhs;
    }
}

impl Display for ByteAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
