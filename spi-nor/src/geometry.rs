/// The JEDEC identification returned by the identify command.
///
/// The first byte is the manufacturer, followed by two device bytes, MSB first on the wire.
/// See https://www.jedec.org/standards-documents/docs/jep-106ab for a list of manufacturer IDs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JedecID {
    /// Manufacturer code
    id: u8,
    /// The device id. MSB first on wire
    device: u16,
}

impl JedecID {
    pub fn new(id: u8, device: u16) -> Self {
        JedecID { id, device }
    }

    /// Parse the three byte identify response
    pub fn from_response(response: [u8; 3]) -> Self {
        JedecID {
            id: response[0],
            device: u16::from_be_bytes([response[1], response[2]]),
        }
    }

    pub fn manufacturer(&self) -> u8 {
        self.id
    }

    pub fn device(&self) -> u16 {
        self.device
    }

    /// First device byte. Selects the sector size of the part.
    pub fn capacity_code(&self) -> u8 {
        (self.device >> 8) as u8
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for JedecID {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "JedecID(id: {:02X}, device: {:04X})",
            self.id,
            self.device
        );
    }
}

/// Layout of the chip, discovered by `init`.
///
/// All zero until the chip has been identified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub manufacturer_id: u8,
    /// Raw identify byte the sector size was derived from
    pub capacity_code: u8,
    /// Largest program unit. Program commands never cross a page boundary.
    pub page_size: u32,
    /// Smallest erase unit
    pub sector_size: u32,
    /// Total capacity in bytes
    pub total_size: u32,
}

impl Geometry {
    pub fn is_probed(&self) -> bool {
        self.page_size != 0 && self.sector_size != 0
    }

    pub fn sector_count(&self) -> u32 {
        match self.sector_size {
            0 => 0,
            size => self.total_size / size,
        }
    }

    pub fn page_count(&self) -> u32 {
        match self.page_size {
            0 => 0,
            size => self.total_size / size,
        }
    }
}
