//! A simulated SPI NOR chip for exercising the driver without hardware.
//!
//! [VirtualNorChip] decodes the byte stream of each chip-select frame the way a 25-series
//! part does: identify, status, fast read, write enable, page program with page wrap,
//! sector, block and chip erase. Program and erase only take effect when the write enable
//! latch is set, and leave the chip busy for a configurable number of status reads.
//! While busy every command other than a status read is ignored.

use std::vec;
use std::vec::Vec;

use embedded_hal::spi::{self, ErrorKind, Operation, SpiDevice};

use crate::{cmd_blocking::SpiNorBlocking, transport::Transport, SpiNor, StatusPoll};

const PAGE_SIZE: usize = 256;
const SECTOR_SIZE: usize = 4096;
const BLOCK_SIZE: usize = 65536;

const STATUS_BUSY: u8 = 0x01;
const STATUS_WEL: u8 = 0x02;
const FLAG_READY: u8 = 0x80;

/// Failure injected into a simulated transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

impl spi::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Family matching [VirtualNorChip::w25q64]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimW25Q;

impl SpiNor for SimW25Q {
    const NAME: &'static str = "simulated W25Q64";
    const MANUFACTURER_ID: u8 = 0xEF;
    const CAPACITY: u32 = 8 * 1024 * 1024;
}

impl<T: Transport> SpiNorBlocking<T> for SimW25Q {}

/// Family polling the flag status register, for chips built with
/// [VirtualNorChip::with_flag_status]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimFlagStatus;

impl SpiNor for SimFlagStatus {
    const NAME: &'static str = "simulated flag status part";
    const MANUFACTURER_ID: u8 = 0x20;
    const CAPACITY: u32 = 16 * 1024 * 1024;
    const STATUS_POLL: StatusPoll = StatusPoll::FLAG_STATUS;
}

impl<T: Transport> SpiNorBlocking<T> for SimFlagStatus {}

#[derive(Debug, Clone)]
pub struct VirtualNorChip {
    id: [u8; 3],
    memory: Vec<u8>,
    flag_status: bool,
    write_enabled: bool,
    busy_polls: u32,
    busy_remaining: u32,
    stuck_busy: bool,
    selected: bool,
    frame: Vec<u8>,
    frames: Vec<Vec<u8>>,
    ignored: usize,
    fail_in: Option<usize>,
}

impl VirtualNorChip {
    /// Erased chip answering identify with `id`
    pub fn new(id: [u8; 3], capacity: usize) -> Self {
        VirtualNorChip {
            id,
            memory: vec![0xFF; capacity],
            flag_status: false,
            write_enabled: false,
            busy_polls: 0,
            busy_remaining: 0,
            stuck_busy: false,
            selected: false,
            frame: Vec::new(),
            frames: Vec::new(),
            ignored: 0,
            fail_in: None,
        }
    }

    /// 8 MiB Winbond part with 4 KiB sectors
    pub fn w25q64() -> Self {
        Self::new([0xEF, 0x40, 0x17], 8 * 1024 * 1024)
    }

    /// 16 MiB part answering the flag status register, for [SimFlagStatus]
    pub fn flag_status_part() -> Self {
        Self::new([0x20, 0xBA, 0x18], 16 * 1024 * 1024).with_flag_status()
    }

    /// Also answer the flag status register, bit 7 set when ready
    pub fn with_flag_status(mut self) -> Self {
        self.flag_status = true;
        self
    }

    /// Status reads that report busy after each program or erase
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Report busy forever, or stop doing so
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Make the transaction `n` calls from now fail without touching the chip
    pub fn fail_transaction(&mut self, n: usize) {
        self.fail_in = Some(n);
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Every completed frame, as the bytes clocked in by the chip
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }

    /// Number of completed frames starting with `opcode`
    pub fn count(&self, opcode: u8) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.first() == Some(&opcode))
            .count()
    }

    /// Frames dropped because the chip was busy or writing was not enabled
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    pub fn write_enabled(&self) -> bool {
        self.write_enabled
    }

    pub fn is_busy(&self) -> bool {
        self.stuck_busy || self.busy_remaining > 0
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    // ============= Wire level =============

    /// Assert chip select, starting a new frame
    pub fn select(&mut self) {
        self.selected = true;
        self.frame.clear();
    }

    /// Clock one byte in each direction
    pub fn exchange(&mut self, mosi: u8) -> u8 {
        if !self.selected {
            return 0xFF;
        }
        self.frame.push(mosi);
        let position = self.frame.len() - 1;
        if position == 0 {
            return 0xFF;
        }
        match self.frame[0] {
            0x05 => self.status(),
            0x70 if self.flag_status => self.flag_status_register(),
            _ if self.is_busy() => 0xFF,
            0x9F => self.id.get(position - 1).copied().unwrap_or(0xFF),
            // Opcode, three address bytes and the dummy byte before data comes out
            0x0B if position >= 5 => {
                let address = self.frame_address() + position - 5;
                self.memory[address % self.memory.len()]
            }
            _ => 0xFF,
        }
    }

    /// Release chip select and act on the completed frame
    pub fn deselect(&mut self) {
        if !self.selected {
            return;
        }
        self.selected = false;
        let frame = core::mem::take(&mut self.frame);
        if let Some(&opcode) = frame.first() {
            self.execute(opcode, &frame);
            self.frames.push(frame);
        }
    }

    fn status(&self) -> u8 {
        let mut status = 0;
        if self.is_busy() {
            status |= STATUS_BUSY;
        }
        if self.write_enabled {
            status |= STATUS_WEL;
        }
        status
    }

    fn flag_status_register(&self) -> u8 {
        if self.is_busy() {
            0
        } else {
            FLAG_READY
        }
    }

    fn frame_address(&self) -> usize {
        ((self.frame[1] as usize) << 16) | ((self.frame[2] as usize) << 8) | self.frame[3] as usize
    }

    fn execute(&mut self, opcode: u8, frame: &[u8]) {
        let is_status = opcode == 0x05 || (opcode == 0x70 && self.flag_status);
        if is_status {
            self.busy_remaining = self.busy_remaining.saturating_sub(1);
            return;
        }
        if self.is_busy() {
            self.ignored += 1;
            return;
        }
        match opcode {
            0x06 => self.write_enabled = true,
            0x04 => self.write_enabled = false,
            0x02 | 0x20 | 0xD8 if frame.len() < 4 => self.ignored += 1,
            0x02 | 0x20 | 0xD8 | 0xC7 if !self.write_enabled => self.ignored += 1,
            0x02 => {
                let address = self.address_of(frame);
                self.program(address, &frame[4..]);
                self.start_busy();
            }
            0x20 => {
                let address = self.address_of(frame);
                self.erase(address, SECTOR_SIZE);
                self.start_busy();
            }
            0xD8 => {
                let address = self.address_of(frame);
                self.erase(address, BLOCK_SIZE);
                self.start_busy();
            }
            0xC7 => {
                self.memory.fill(0xFF);
                self.start_busy();
            }
            _ => {}
        }
    }

    fn address_of(&self, frame: &[u8]) -> usize {
        let address =
            ((frame[1] as usize) << 16) | ((frame[2] as usize) << 8) | frame[3] as usize;
        address % self.memory.len()
    }

    /// Bytes past the end of the page wrap around to its start. Programming only clears bits.
    fn program(&mut self, address: usize, data: &[u8]) {
        let page_start = address - address % PAGE_SIZE;
        for (i, byte) in data.iter().enumerate() {
            let offset = (address % PAGE_SIZE + i) % PAGE_SIZE;
            self.memory[page_start + offset] &= byte;
        }
    }

    fn erase(&mut self, address: usize, size: usize) {
        let start = address - address % size;
        let end = (start + size).min(self.memory.len());
        self.memory[start..end].fill(0xFF);
    }

    fn start_busy(&mut self) {
        self.write_enabled = false;
        self.busy_remaining = self.busy_polls;
    }

    fn take_failure(&mut self) -> bool {
        match self.fail_in {
            Some(0) => {
                self.fail_in = None;
                true
            }
            Some(n) => {
                self.fail_in = Some(n - 1);
                false
            }
            None => false,
        }
    }
}

impl spi::ErrorType for VirtualNorChip {
    type Error = SimError;
}

impl SpiDevice for VirtualNorChip {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        if self.take_failure() {
            return Err(SimError);
        }
        self.select();
        for op in operations {
            match op {
                Operation::Write(buf) => {
                    for &byte in buf.iter() {
                        self.exchange(byte);
                    }
                }
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        *slot = self.exchange(0x00);
                    }
                }
                Operation::Transfer(read, write) => {
                    for i in 0..read.len().max(write.len()) {
                        let miso = self.exchange(write.get(i).copied().unwrap_or(0x00));
                        if let Some(slot) = read.get_mut(i) {
                            *slot = miso;
                        }
                    }
                }
                Operation::TransferInPlace(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.exchange(*byte);
                    }
                }
                Operation::DelayNs(_) => {}
            }
        }
        self.deselect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn frame(chip: &mut VirtualNorChip, bytes: &[u8]) -> Vec<u8> {
        let mut read = vec![0; bytes.len()];
        chip.transfer(&mut read, bytes).unwrap();
        read
    }

    #[test]
    fn program_needs_write_enable() {
        let mut chip = VirtualNorChip::w25q64();
        frame(&mut chip, &[0x02, 0x00, 0x00, 0x00, 0x12]);
        assert_eq!(chip.memory()[0], 0xFF);
        assert_eq!(chip.ignored(), 1);

        frame(&mut chip, &[0x06]);
        assert!(chip.write_enabled());
        frame(&mut chip, &[0x02, 0x00, 0x00, 0x00, 0x12]);
        assert_eq!(chip.memory()[0], 0x12);
        // Latch clears once the program starts
        assert!(!chip.write_enabled());
    }

    #[test]
    fn program_wraps_within_the_page() {
        let mut chip = VirtualNorChip::w25q64();
        frame(&mut chip, &[0x06]);
        frame(&mut chip, &[0x02, 0x00, 0x01, 0xFE, 0xA0, 0xA1, 0xA2]);
        assert_eq!(chip.memory()[0x1FE], 0xA0);
        assert_eq!(chip.memory()[0x1FF], 0xA1);
        assert_eq!(chip.memory()[0x100], 0xA2);
        assert_eq!(chip.memory()[0x200], 0xFF);
    }

    #[test]
    fn busy_countdown_and_ignored_commands() {
        let mut chip = VirtualNorChip::w25q64().with_busy_polls(2);
        frame(&mut chip, &[0x06]);
        frame(&mut chip, &[0x20, 0x00, 0x10, 0x00]);
        assert!(chip.is_busy());

        // Ignored while busy
        frame(&mut chip, &[0x06]);
        assert!(!chip.write_enabled());

        assert_eq!(frame(&mut chip, &[0x05, 0x00])[1] & STATUS_BUSY, STATUS_BUSY);
        assert_eq!(frame(&mut chip, &[0x05, 0x00])[1] & STATUS_BUSY, STATUS_BUSY);
        assert_eq!(frame(&mut chip, &[0x05, 0x00])[1] & STATUS_BUSY, 0);
        assert_eq!(chip.ignored(), 1);
    }

    #[test]
    fn fast_read_after_dummy() {
        let mut chip = VirtualNorChip::w25q64();
        chip.memory_mut()[0x1234] = 0x5A;
        chip.memory_mut()[0x1235] = 0xA5;
        let response = frame(&mut chip, &[0x0B, 0x00, 0x12, 0x34, 0x00, 0xCC, 0xCC]);
        assert_eq!(&response[5..], &[0x5A, 0xA5]);
    }

    #[test]
    fn flag_status_reports_ready_bit() {
        let mut chip = VirtualNorChip::w25q64().with_flag_status();
        assert_eq!(frame(&mut chip, &[0x70, 0x00])[1], FLAG_READY);
        chip.set_stuck_busy(true);
        assert_eq!(frame(&mut chip, &[0x70, 0x00])[1], 0);
    }

    #[test]
    fn injected_failure_skips_the_bus() {
        let mut chip = VirtualNorChip::w25q64();
        chip.fail_transaction(1);
        assert!(chip.write(&[0x06]).is_ok());
        assert_eq!(chip.write(&[0x06]), Err(SimError));
        assert!(chip.write(&[0x06]).is_ok());
        assert_eq!(chip.frames().len(), 2);
    }
}
