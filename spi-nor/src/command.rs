//! Command frames sent ahead of every data phase.
//!
//! A frame is the opcode, optionally followed by a 24-bit big-endian address and,
//! for fast reads, a single dummy byte that gives the chip time to fetch the first
//! data byte. Frames are built per transfer and never stored.

use embedded_nor::ByteAddress;

/// Longest frame: opcode, three address bytes and a dummy byte.
pub const MAX_COMMAND_LEN: usize = 5;

/// Value clocked out during the dummy cycle
pub const DUMMY_BYTE: u8 = 0x00;

/// Encode the low 24 bits of `address`, most significant byte first.
///
/// Higher bits are dropped, which limits 3-byte addressing to 16 MiB.
pub fn address_bytes(address: u32) -> [u8; 3] {
    [(address >> 16) as u8, (address >> 8) as u8, address as u8]
}

/// A single command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFrame {
    bytes: [u8; MAX_COMMAND_LEN],
    len: u8,
}

impl CommandFrame {
    /// Frame consisting of the opcode only
    pub fn opcode(opcode: u8) -> Self {
        CommandFrame {
            bytes: [opcode, 0, 0, 0, 0],
            len: 1,
        }
    }

    /// Opcode followed by a 24-bit address
    pub fn addressed(opcode: u8, address: ByteAddress) -> Self {
        let [a2, a1, a0] = address_bytes(address.as_u32());
        CommandFrame {
            bytes: [opcode, a2, a1, a0, 0],
            len: 4,
        }
    }

    /// Opcode, 24-bit address and one dummy byte, as used by fast read
    pub fn addressed_with_dummy(opcode: u8, address: ByteAddress) -> Self {
        let mut frame = Self::addressed(opcode, address);
        frame.bytes[4] = DUMMY_BYTE;
        frame.len = 5;
        frame
    }

    pub fn opcode_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// The address carried by the frame, if any
    pub fn address(&self) -> Option<u32> {
        if self.len < 4 {
            return None;
        }
        Some(u32::from_be_bytes([0, self.bytes[1], self.bytes[2], self.bytes[3]]))
    }

    pub fn has_dummy(&self) -> bool {
        self.len == 5
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
