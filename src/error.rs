//! Driver error type.
//!
//! The 23x family has no acknowledge, status or error signaling of any kind, so
//! the only failures this layer can observe are the ones the SPI implementation
//! reports. A chip that is absent, miswired, or larger than the largest
//! supported part returns wrong data silently rather than an error.

/// Errors returned by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// SPI bus error
    Spi(E),
    /// Mode register readback held the reserved bit pattern
    UnknownMode,
}
