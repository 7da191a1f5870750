#![no_std]

mod address;
pub use address::{ByteAddress, PageIndex, SectorIndex};

pub trait NorFlashError: core::fmt::Debug {
    /// Convert a specific NOR flash error into a generic error kind
    fn kind(&self) -> NorFlashErrorKind;
}

/// A trait that NorFlash implementations can use to share an error type.
pub trait ErrorType {
    /// Errors returned by this NOR flash.
    type Error: NorFlashError;
}

/// NOR flash error kinds.
///
/// NOR flash implementations must map their error to those generic error kinds through the
/// [`NorFlashError`] trait.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum NorFlashErrorKind {
    /// The arguments are not properly aligned.
    NotAligned,

    /// The arguments are out of bounds.
    OutOfBounds,

    /// The device stayed busy for longer than the operation allows.
    Timeout,

    /// Error specific to the implementation.
    Other,
}

/// Read only NOR flash trait.
pub trait ReadNorFlash: ErrorType {
    /// The minumum number of bytes the storage peripheral can read
    const READ_SIZE: usize;

    /// Read a slice of data from the storage peripheral, starting the read
    /// operation at the given address offset, and reading `bytes.len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are not aligned or out of bounds. The implementation
    /// can use the [`check_read`] helper function.
    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error>;

    /// The capacity of the peripheral in bytes.
    fn capacity(&self) -> u32;
}

/// NOR flash trait.
///
/// Unlike NAND, the layout of a NOR device is often only known after it has been
/// identified, so page and erase sizes are queried at runtime.
pub trait NorFlash: ReadNorFlash {
    /// The minumum number of bytes the storage peripheral can write
    const WRITE_SIZE: usize;

    /// The minumum number of bytes the storage peripheral can erase (sector size)
    fn erase_size(&self) -> u32;

    /// The largest number of bytes a single program command may write
    fn page_size(&self) -> u32;

    /// Erase the given storage range, clearing all data within `[from..to]`.
    /// The given range will contain all 1s afterwards.
    ///
    /// If power is lost during erase, contents of the sector are undefined.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are not aligned or out of bounds (the case where `to >
    /// from` is considered out of bounds). The implementation can use the [`check_erase`]
    /// helper function.
    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error>;

    /// Program `bytes` starting at `offset`. Bits can only be cleared, so the region
    /// must have been erased first.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are not aligned or out of bounds. The implementation
    /// can use the [`check_write`] helper function.
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Return whether a read operation is within bounds.
pub fn check_read<T: ReadNorFlash>(
    flash: &T,
    offset: u32,
    length: usize,
) -> Result<(), NorFlashErrorKind> {
    check_slice(flash, T::READ_SIZE, offset, length)
}

/// Return whether an erase operation is aligned and within bounds.
pub fn check_erase<T: NorFlash>(flash: &T, from: u32, to: u32) -> Result<(), NorFlashErrorKind> {
    if from > to || to > flash.capacity() {
        return Err(NorFlashErrorKind::OutOfBounds);
    }
    let erase_size = flash.erase_size();
    if erase_size == 0 || from % erase_size != 0 || to % erase_size != 0 {
        return Err(NorFlashErrorKind::NotAligned);
    }
    Ok(())
}

/// Return whether a write operation is aligned and within bounds.
pub fn check_write<T: NorFlash>(
    flash: &T,
    offset: u32,
    length: usize,
) -> Result<(), NorFlashErrorKind> {
    check_slice(flash, T::WRITE_SIZE, offset, length)
}

pub fn check_slice<T: ReadNorFlash>(
    flash: &T,
    align: usize,
    offset: u32,
    length: usize,
) -> Result<(), NorFlashErrorKind> {
    let capacity = flash.capacity() as usize;
    if length > capacity || offset as usize > capacity - length {
        return Err(NorFlashErrorKind::OutOfBounds);
    }
    if offset as usize % align != 0 || length % align != 0 {
        return Err(NorFlashErrorKind::NotAligned);
    }
    Ok(())
}
