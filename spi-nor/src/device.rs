use core::fmt::Debug;

use embedded_nor::{
    check_erase, check_read, check_write, ByteAddress, ErrorType, NorFlash, ReadNorFlash,
};

use crate::{
    cmd_blocking::SpiNorBlocking, error::SpiFlashError, transport::Transport, EraseSize, Geometry,
    JedecID,
};

/// Concrete type that implements all the flash device features.
///
/// This type is generic over the bus [Transport] and the chip family D.
/// The family supplies the command set through [SpiNorBlocking], configured by the
/// constants of [crate::SpiNor]. It is fixed for the lifetime of the driver and
/// checked against the chip by [SpiNorDevice::init].
///
/// The geometry is discovered by [SpiNorDevice::init] and stays zero until then. Every
/// other call made before a successful init fails with [SpiFlashError::NotProbed].
///
/// [SpiNorDevice] implements the [embedded_nor::NorFlash] trait, which adds bounds checks
/// on top of the `*_blocking` functions.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiNorDevice<T, D> {
    pub transport: T,
    pub device: D,
    geometry: Geometry,
}

// Manually implement Debug to avoid bounds on the transport
impl<T, D> Debug for SpiNorDevice<T, D>
where
    D: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpiNorDevice")
            .field("device", &self.device)
            .field("geometry", &self.geometry)
            .finish()
    }
}

impl<T, D> SpiNorDevice<T, D> {
    /// Create a new [SpiNorDevice] with an empty geometry
    pub fn new(transport: T, device: D) -> Self {
        SpiNorDevice {
            transport,
            device,
            geometry: Geometry::default(),
        }
    }

    /// The discovered layout, all zero before [SpiNorDevice::init]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Give back the transport and the family
    pub fn release(self) -> (T, D) {
        (self.transport, self.device)
    }
}

impl<T: Transport, D: SpiNorBlocking<T>> SpiNorDevice<T, D> {
    fn probed(&self) -> Result<Geometry, SpiFlashError<T::Error>> {
        if self.geometry.is_probed() {
            Ok(self.geometry)
        } else {
            Err(SpiFlashError::NotProbed)
        }
    }

    /// Identify the chip and populate the geometry.
    ///
    /// Fails with [SpiFlashError::GeometryMismatch] if the manufacturer does not match
    /// the family, leaving the geometry empty. Once successful, further calls return
    /// the stored geometry without touching the bus.
    pub fn init(&mut self) -> Result<Geometry, SpiFlashError<T::Error>> {
        if self.geometry.is_probed() {
            return Ok(self.geometry);
        }
        let id = self.device.read_jedec_id_cmd(&mut self.transport)?;
        if id.manufacturer() != D::MANUFACTURER_ID {
            warn!(
                "Expected manufacturer {} for {}, found {}",
                D::MANUFACTURER_ID,
                D::NAME,
                id.manufacturer()
            );
            return Err(SpiFlashError::GeometryMismatch {
                expected: D::MANUFACTURER_ID,
                found: id.manufacturer(),
            });
        }
        let geometry = D::geometry(id);
        info!(
            "Found {}: {:?}, {} sectors of {} bytes, {} pages of {} bytes",
            D::NAME,
            id,
            geometry.sector_count(),
            geometry.sector_size,
            geometry.page_count(),
            geometry.page_size
        );
        self.geometry = geometry;
        Ok(geometry)
    }

    /// Get the Jedec ID of the flash device using blocking SPI
    pub fn jedec_blocking(&mut self) -> Result<JedecID, SpiFlashError<T::Error>> {
        self.device.read_jedec_id_cmd(&mut self.transport)
    }

    /// Read the raw status register used for busy polling
    pub fn read_status_blocking(&mut self) -> Result<u8, SpiFlashError<T::Error>> {
        self.device.read_status_cmd(&mut self.transport)
    }

    /// Read `buf.len()` bytes starting at `offset`.
    ///
    /// Split into transfers of at most [Transport::max_transfer] bytes. If a transfer fails,
    /// the chunks before it are already in `buf`.
    pub fn read_blocking(
        &mut self,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), SpiFlashError<T::Error>> {
        self.probed()?;
        let max = self.transport.max_transfer().get();
        let mut address = ByteAddress::new(offset);
        for chunk in buf.chunks_mut(max) {
            trace!("Read {} bytes at {}", chunk.len(), address.as_u32());
            self.device
                .fast_read_cmd(&mut self.transport, address, chunk)?;
            address += chunk.len() as u32;
        }
        Ok(())
    }

    /// Program `data` starting at `offset`. The region must have been erased first.
    ///
    /// No program frame crosses a page boundary or exceeds [Transport::max_transfer].
    pub fn write_blocking(&mut self, offset: u32, data: &[u8]) -> Result<(), SpiFlashError<T::Error>> {
        let geometry = self.probed()?;
        let max = self.transport.max_transfer().get();
        let mut address = ByteAddress::new(offset);
        let mut remaining = data;
        while !remaining.is_empty() {
            let chunk = remaining
                .len()
                .min(address.page_remaining(geometry.page_size) as usize)
                .min(max);
            let (head, tail) = remaining.split_at(chunk);
            trace!(
                "Program {} bytes at {} in page {}",
                chunk,
                address.as_u32(),
                address.as_page_index(geometry.page_size).as_u32()
            );
            self.device
                .program_page(&mut self.transport, address, head)?;
            address += chunk as u32;
            remaining = tail;
        }
        Ok(())
    }

    /// Erase `length` bytes starting at `offset`, one sector at a time.
    ///
    /// Both must be multiples of the sector size, otherwise nothing is sent to the chip.
    pub fn erase_blocking(&mut self, offset: u32, length: u32) -> Result<(), SpiFlashError<T::Error>> {
        let geometry = self.probed()?;
        let sector_size = geometry.sector_size;
        if ByteAddress::new(offset).sector_offset(sector_size) != 0 || length % sector_size != 0 {
            debug!("Erase of {} bytes at {} not aligned", length, offset);
            return Err(SpiFlashError::NotAligned);
        }
        let size = EraseSize::for_sector_size(sector_size);
        let mut address = ByteAddress::new(offset);
        for _ in 0..length / sector_size {
            trace!("Erase sector {}", address.as_sector_index(sector_size).as_u32());
            self.device
                .erase_sector(&mut self.transport, size, address)?;
            address += sector_size;
        }
        Ok(())
    }

    /// Erase the whole chip
    pub fn erase_chip_blocking(&mut self) -> Result<(), SpiFlashError<T::Error>> {
        self.probed()?;
        debug!("Erasing {}", D::NAME);
        self.device.erase_chip(&mut self.transport)
    }
}

impl<T: Transport, D> ErrorType for SpiNorDevice<T, D> {
    type Error = SpiFlashError<T::Error>;
}

impl<T: Transport, D: SpiNorBlocking<T>> ReadNorFlash for SpiNorDevice<T, D> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        trace!("Reading {} bytes from offset {}", bytes.len(), offset);
        self.probed()?;
        // Check that the requested read is within bounds
        check_read(self, offset, bytes.len())?;
        self.read_blocking(offset, bytes)
    }

    fn capacity(&self) -> u32 {
        self.geometry.total_size
    }
}

impl<T: Transport, D: SpiNorBlocking<T>> NorFlash for SpiNorDevice<T, D> {
    const WRITE_SIZE: usize = 1;

    fn erase_size(&self) -> u32 {
        self.geometry.sector_size
    }

    fn page_size(&self) -> u32 {
        self.geometry.page_size
    }

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        trace!("Erasing from {} to {}", from, to);
        self.probed()?;
        // Check that the requested erase is aligned and within bounds
        check_erase(self, from, to)?;
        self.erase_blocking(from, to - from)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        trace!("Writing {} bytes to offset {}", bytes.len(), offset);
        self.probed()?;
        // Check that the requested write is within bounds
        check_write(self, offset, bytes.len())?;
        self.write_blocking(offset, bytes)
    }
}
