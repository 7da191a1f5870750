use core::fmt::Debug;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embedded_hal::{
    delay::DelayNs,
    spi::{self, ErrorKind, Operation, SpiDevice},
};

/// Completion of one physical transfer, delivered from the transfer-done interrupt.
///
/// A single-slot signal carrying the transfer result. The interrupt handler calls
/// [`Completion::complete`], the thread that started the transfer blocks in
/// [`Completion::wait`]. Usable as a `static` shared with the handler.
pub struct Completion<E> {
    signal: Signal<CriticalSectionRawMutex, Result<(), E>>,
}

impl<E> Completion<E> {
    pub const fn new() -> Self {
        Completion {
            signal: Signal::new(),
        }
    }

    /// Report the outcome of the transfer in flight. Call from the interrupt handler.
    pub fn complete(&self, result: Result<(), E>) {
        self.signal.signal(result);
    }

    /// Whether a result is waiting to be taken
    pub fn is_complete(&self) -> bool {
        self.signal.signaled()
    }

    /// Spin until the transfer in flight reports back, and take its result.
    pub fn wait(&self) -> Result<(), E> {
        loop {
            if let Some(result) = self.signal.try_take() {
                return result;
            }
            core::hint::spin_loop();
        }
    }

    /// Drop a stale result before starting a new transfer.
    pub fn reset(&self) {
        self.signal.reset();
    }
}

impl<E> Default for Completion<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A peripheral that starts transfers and reports their end through an interrupt.
pub trait StartTransfer {
    type Error: Debug;

    /// Drive chip select. `true` selects the flash.
    fn set_cs(&mut self, selected: bool);

    /// Start a full-duplex transfer of `max(write.len(), read.len())` bytes.
    ///
    /// Bytes past the end of `write` are the over-read character, bytes past the end of
    /// `read` are discarded. Completion must be signalled through the [`Completion`] the
    /// peripheral's interrupt handler shares with [`IrqSpi`].
    fn start(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error>;
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqSpiError<E> {
    /// The peripheral refused to start or reported a failed transfer
    Peripheral(E),
    /// The operation needs a capability the peripheral does not have
    Unsupported,
}

impl<E: Debug> spi::Error for IrqSpiError<E> {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// [SpiDevice] over an interrupt-completed peripheral.
///
/// Every operation of a transaction starts one transfer and waits on the shared
/// [`Completion`] before the next one is started, so at most one transfer is in flight.
/// Chip select is released at the end of the transaction, also when an operation fails.
/// Delays inside a transaction block on the delay provider with chip select held.
pub struct IrqSpi<'a, P: StartTransfer, D> {
    peripheral: P,
    done: &'a Completion<P::Error>,
    delay: D,
}

impl<'a, P: StartTransfer, D: DelayNs> IrqSpi<'a, P, D> {
    pub fn new(peripheral: P, done: &'a Completion<P::Error>, delay: D) -> Self {
        IrqSpi {
            peripheral,
            done,
            delay,
        }
    }

    pub fn release(self) -> P {
        self.peripheral
    }

    fn run(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), IrqSpiError<P::Error>> {
        self.done.reset();
        self.peripheral
            .start(write, read)
            .map_err(IrqSpiError::Peripheral)?;
        self.done.wait().map_err(IrqSpiError::Peripheral)
    }

    fn run_all(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), IrqSpiError<P::Error>> {
        for op in operations {
            match op {
                Operation::Write(buf) => self.run(buf, &mut [])?,
                Operation::Read(buf) => self.run(&[], buf)?,
                Operation::Transfer(read, write) => self.run(write, read)?,
                // Needs separate source and destination buffers
                Operation::TransferInPlace(_) => return Err(IrqSpiError::Unsupported),
                Operation::DelayNs(ns) => self.delay.delay_ns(*ns),
            }
        }
        Ok(())
    }
}

impl<P: StartTransfer, D> spi::ErrorType for IrqSpi<'_, P, D> {
    type Error = IrqSpiError<P::Error>;
}

impl<P: StartTransfer, D: DelayNs> SpiDevice for IrqSpi<'_, P, D> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.peripheral.set_cs(true);
        let result = self.run_all(operations);
        self.peripheral.set_cs(false);
        result
    }
}
