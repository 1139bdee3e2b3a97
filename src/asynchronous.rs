//! Async driver, generic over [`embedded_hal_async::spi::SpiDevice`].
//!
//! Mirrors [`blocking::M23x`](crate::blocking::M23x) with `async fn`s. Each
//! operation is still a single SPI transaction: the driver only suspends at
//! bus await points, never in the middle of a chip-select assertion.

use core::mem::size_of;

use embedded_hal::spi::Operation;
use embedded_hal_async::spi::SpiDevice;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::capacity::Capacity;
use crate::command::Command;
use crate::error::Error;
use crate::register::OperatingMode;
use crate::{PAGE_SIZE, PROBE_BASE, PROBE_WRAP};

/// The generic low level async M23x driver.
pub struct AsyncM23x<SPI>
where
    SPI: SpiDevice,
{
    spi: SPI,
    capacity: Capacity,
}

impl<SPI, E> AsyncM23x<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    /// Create a driver, switch the chip to sequential mode and detect its
    /// capacity.
    ///
    /// See [`blocking::M23x::new`](crate::blocking::M23x::new) for the probe's
    /// side effects and the largest-capacity fallback.
    pub async fn new(spi: SPI) -> Result<Self, Error<E>> {
        let mut sram = Self {
            spi,
            capacity: Capacity::Kbit64,
        };
        sram.write_mode(OperatingMode::Sequential).await?;
        sram.detect().await?;
        Ok(sram)
    }

    /// Create a driver for a known part, skipping the capacity probe.
    pub async fn with_capacity(spi: SPI, capacity: Capacity) -> Result<Self, Error<E>> {
        let mut sram = Self { spi, capacity };
        sram.write_mode(OperatingMode::Sequential).await?;
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

    async fn detect(&mut self) -> Result<(), Error<E>> {
        for capacity in Capacity::ASCENDING {
            self.capacity = capacity;
            self.write(0, &[PROBE_BASE]).await?;
            self.write(capacity.bytes(), &[PROBE_WRAP]).await?;
            let mut readback = [0u8; 1];
            self.read(0, &mut readback).await?;
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

    /// Read `buf.len()` bytes starting at `address`. Returns the wrapped next
    /// address.
    pub async fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<u32, Error<E>> {
        let (frame, len) = self.command_frame(Command::Read, address);
        self.spi
            .transaction(&mut [Operation::Write(&frame[..len]), Operation::Read(buf)])
            .await
            .map_err(Error::Spi)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("Read from {=u32}, {=usize}: {:?}", address, buf.len(), buf);
        Ok(self.capacity.advance(address, buf.len()))
    }

    /// Write `buf` starting at `address`. Returns the wrapped next address.
    pub async fn write(&mut self, address: u32, buf: &[u8]) -> Result<u32, Error<E>> {
        let (frame, len) = self.command_frame(Command::Write, address);
        self.spi
            .transaction(&mut [Operation::Write(&frame[..len]), Operation::Write(buf)])
            .await
            .map_err(Error::Spi)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("Write from {=u32}, {=usize}: {:?}", address, buf.len(), buf);
        Ok(self.capacity.advance(address, buf.len()))
    }

    /// Read any fixed-size value from `address`.
    pub async fn read_value<T>(&mut self, address: u32) -> Result<(T, u32), Error<E>>
    where
        T: FromBytes + IntoBytes,
    {
        let mut value = T::new_zeroed();
        let next = self.read(address, value.as_mut_bytes()).await?;
        Ok((value, next))
    }

    /// Write any fixed-size value at `address`. Returns the wrapped next
    /// address.
    pub async fn write_value<T>(&mut self, address: u32, value: &T) -> Result<u32, Error<E>>
    where
        T: IntoBytes + Immutable,
    {
        self.write(address, value.as_bytes()).await
    }

    /// Fill memory with copies of `value`, starting at `address`.
    ///
    /// Stops once the next copy would no longer fit below the end of the array;
    /// see [`blocking::M23x::fill`](crate::blocking::M23x::fill).
    pub async fn fill<T>(&mut self, mut address: u32, value: &T) -> Result<(), Error<E>>
    where
        T: IntoBytes + Immutable,
    {
        let len = size_of::<T>() as u64;
        while u64::from(address) + len <= u64::from(self.capacity.bytes()) {
            let next = self.write_value(address, value).await?;
            if next <= address {
                break;
            }
            address = next;
        }
        Ok(())
    }

    /// Set every byte of the array to `value`, one page per transaction.
    pub async fn clear(&mut self, value: u8) -> Result<(), Error<E>> {
        let page = [value; PAGE_SIZE as usize];
        let mut address = 0;
        loop {
            let next = self.write(address, &page).await?;
            if next <= address {
                break;
            }
            address = next;
        }
        Ok(())
    }

    /// Read the mode register.
    pub async fn read_mode(&mut self) -> Result<OperatingMode, Error<E>> {
        let mut frame = [Command::ReadMode as u8, 0];
        self.spi
            .transfer_in_place(&mut frame)
            .await
            .map_err(Error::Spi)?;
        OperatingMode::from_register(frame[1]).ok_or(Error::UnknownMode)
    }

    /// Write the mode register.
    pub async fn write_mode(&mut self, mode: OperatingMode) -> Result<(), Error<E>> {
        self.spi
            .write(&[Command::WriteMode as u8, mode as u8])
            .await
            .map_err(Error::Spi)
    }
}
