//! Blocking driver, generic over [`embedded_hal::spi::SpiDevice`].

use core::mem::size_of;

use embedded_hal::spi::{Operation, SpiDevice};
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::capacity::Capacity;
use crate::command::Command;
use crate::error::Error;
use crate::register::OperatingMode;
use crate::{PAGE_SIZE, PROBE_BASE, PROBE_WRAP};

/// The generic low level M23x driver.
///
/// The `SpiDevice` handed to the constructor identifies the chip-select line:
/// it owns the bus-plus-CS binding and brackets every operation in one
/// uninterrupted transaction, which these chips require because the internal
/// address counter only survives within a single chip-select assertion.
pub struct M23x<SPI>
where
    SPI: SpiDevice,
{
    spi: SPI,
    capacity: Capacity,
}

impl<SPI, E> M23x<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    /// Create a driver, switch the chip to sequential mode and detect its
    /// capacity.
    ///
    /// Detection writes two sentinel bytes per candidate capacity (at address
    /// zero and one past the candidate's last offset), so whatever the chip
    /// held at those locations is lost. If no candidate's boundary wraps, the
    /// largest supported capacity is assumed; a part bigger than 1 Mbit is
    /// indistinguishable from a 1 Mbit one.
    pub fn new(spi: SPI) -> Result<Self, Error<E>> {
        let mut sram = Self {
            spi,
            capacity: Capacity::Kbit64,
        };
        sram.write_mode(OperatingMode::Sequential)?;
        sram.detect()?;
        Ok(sram)
    }

    /// Create a driver for a known part, skipping the capacity probe.
    ///
    /// Use this when the memory already holds data that must survive
    /// construction, or when the board is only ever populated with one part.
    pub fn with_capacity(spi: SPI, capacity: Capacity) -> Result<Self, Error<E>> {
        let mut sram = Self { spi, capacity };
        sram.write_mode(OperatingMode::Sequential)?;
        Ok(sram)
    }

    /// Detected (or configured) capacity of the attached part.
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Number of bytes available on the chip.
    pub fn capacity_bytes(&self) -> u32 {
        self.capacity.bytes()
    }

    /// Release the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Probe-and-compare capacity detection.
    ///
    /// Walks the supported capacities smallest first, temporarily adopting each
    /// candidate's address width. A sentinel is written to address zero and a
    /// second one to the address one past the candidate's last offset; on a
    /// chip of exactly that capacity the second write wraps onto address zero,
    /// and reading it back proves the boundary. Candidates that are too small
    /// leave address zero untouched and the walk continues.
    fn detect(&mut self) -> Result<(), Error<E>> {
        for capacity in Capacity::ASCENDING {
            self.capacity = capacity;
            self.write(0, &[PROBE_BASE])?;
            self.write(capacity.bytes(), &[PROBE_WRAP])?;
            let mut readback = [0u8; 1];
            self.read(0, &mut readback)?;
            #[cfg(feature = "defmt")]
            defmt::trace!(
                "Probe {=u32} bytes: address 0 reads {=u8:x}",
                capacity.bytes(),
                readback[0]
            );
            if readback[0] == PROBE_WRAP {
                #[cfg(feature = "defmt")]
                defmt::debug!("Detected {=u32} byte part", capacity.bytes());
                return Ok(());
            }
        }
        // No boundary wrapped, so the part is at least as large as the biggest
        // supported one. Assume 1 Mbit; anything larger cannot be told apart.
        self.capacity = Capacity::Mbit1;
        #[cfg(feature = "defmt")]
        defmt::debug!("No wrap observed, assuming {=u32} bytes", self.capacity.bytes());
        Ok(())
    }

    fn command_frame(&self, command: Command, address: u32) -> ([u8; 4], usize) {
        let width = self.capacity.address_width();
        let mut frame = [0u8; 4];
        frame[0] = command as u8;
        width.encode(address, &mut frame[1..]);
        (frame, 1 + width.bytes() as usize)
    }

    /// Read `buf.len()` bytes starting at `address`.
    ///
    /// Returns the address one past the last byte read, wrapped to the start of
    /// the array if the transfer crossed the top.
    pub fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<u32, Error<E>> {
        let (frame, len) = self.command_frame(Command::Read, address);
        self.spi
            .transaction(&mut [Operation::Write(&frame[..len]), Operation::Read(buf)])
            .map_err(Error::Spi)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("Read from {=u32}, {=usize}: {:?}", address, buf.len(), buf);
        Ok(self.capacity.advance(address, buf.len()))
    }

    /// Write `buf` starting at `address`.
    ///
    /// Returns the address one past the last byte written, wrapped like
    /// [`read`](Self::read); a transfer that runs past the last address
    /// continues from address zero rather than stopping.
    pub fn write(&mut self, address: u32, buf: &[u8]) -> Result<u32, Error<E>> {
        let (frame, len) = self.command_frame(Command::Write, address);
        self.spi
            .transaction(&mut [Operation::Write(&frame[..len]), Operation::Write(buf)])
            .map_err(Error::Spi)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("Write from {=u32}, {=usize}: {:?}", address, buf.len(), buf);
        Ok(self.capacity.advance(address, buf.len()))
    }

    /// Read any fixed-size value from `address`.
    ///
    /// Returns the value together with the wrapped next address.
    pub fn read_value<T>(&mut self, address: u32) -> Result<(T, u32), Error<E>>
    where
        T: FromBytes + IntoBytes,
    {
        let mut value = T::new_zeroed();
        let next = self.read(address, value.as_mut_bytes())?;
        Ok((value, next))
    }

    /// Write any fixed-size value at `address`. Returns the wrapped next
    /// address.
    pub fn write_value<T>(&mut self, address: u32, value: &T) -> Result<u32, Error<E>>
    where
        T: IntoBytes + Immutable,
    {
        self.write(address, value.as_bytes())
    }

    /// Fill memory with copies of `value`, starting at `address`.
    ///
    /// Each write's return address feeds the next one, but unlike
    /// [`write`](Self::write) the fill stops once the next copy would no longer
    /// fit entirely below the end of the array instead of wrapping back to the
    /// start. A trailing gap smaller than the value stays untouched.
    pub fn fill<T>(&mut self, mut address: u32, value: &T) -> Result<(), Error<E>>
    where
        T: IntoBytes + Immutable,
    {
        let len = size_of::<T>() as u64;
        while u64::from(address) + len <= u64::from(self.capacity.bytes()) {
            let next = self.write_value(address, value)?;
            if next <= address {
                break;
            }
            address = next;
        }
        Ok(())
    }

    /// Set every byte of the array to `value`, one page per transaction.
    pub fn clear(&mut self, value: u8) -> Result<(), Error<E>> {
        let page = [value; PAGE_SIZE as usize];
        let mut address = 0;
        loop {
            let next = self.write(address, &page)?;
            if next <= address {
                break;
            }
            address = next;
        }
        Ok(())
    }

    /// Read the mode register.
    pub fn read_mode(&mut self) -> Result<OperatingMode, Error<E>> {
        let mut frame = [Command::ReadMode as u8, 0];
        self.spi.transfer_in_place(&mut frame).map_err(Error::Spi)?;
        OperatingMode::from_register(frame[1]).ok_or(Error::UnknownMode)
    }

    /// Write the mode register.
    ///
    /// The driver assumes sequential mode; switching away breaks the wrapped
    /// multi-byte transfers every other operation relies on.
    pub fn write_mode(&mut self, mode: OperatingMode) -> Result<(), Error<E>> {
        self.spi
            .write(&[Command::WriteMode as u8, mode as u8])
            .map_err(Error::Spi)
    }
}

/// Implementation of the [`Storage`](embedded_storage::Storage) traits.
///
/// SRAM is byte-granular with no erase, so the plain storage traits fit where
/// a flash part would implement `NorFlash`.
mod es {
    use embedded_hal::spi::SpiDevice;
    use embedded_storage::{ReadStorage, Storage};

    use super::M23x;
    use crate::error::Error;

    impl<SPI: SpiDevice> ReadStorage for M23x<SPI> {
        type Error = Error<SPI::Error>;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            M23x::read(self, offset, bytes)?;
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.capacity_bytes() as usize
        }
    }

    impl<SPI: SpiDevice> Storage for M23x<SPI> {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            M23x::write(self, offset, bytes)?;
            Ok(())
        }
    }
}
