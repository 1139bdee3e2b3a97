#![no_std]
//! This is a platform agnostic library for the Microchip 23x series of serial SRAM and
//! NVSRAM SPI memory chips using [embedded-hal](https://github.com/rust-embedded/embedded-hal).
//!
//! Multiple chips are supported:
//! * 23A640 / 23K640 (8 KiB)
//! * 23A1280 / 23K1280 (16 KiB)
//! * 23A256 / 23K256 (32 KiB)
//! * 23A512 / 23LC512 / 23LCV512 (64 KiB)
//! * 23A1024 / 23LC1024 / 23LCV1024 (128 KiB)
//!
//! The chips differ only in capacity and in whether they take 2 or 3 address bytes, so a
//! single driver serves the whole family. The family exposes no device-ID register, so
//! [`blocking::M23x::new`] determines the attached part by probing: two sentinel bytes are
//! written around each candidate capacity boundary, smallest first, and the first boundary
//! that wraps back to address zero is the real one. If no wrap is ever observed the driver
//! assumes the largest supported part. Probing overwrites up to two bytes per candidate,
//! so contents present at those locations before construction are lost; use
//! [`blocking::M23x::with_capacity`] when the part is known and the contents must survive.
//!
//! The driver switches the chip to sequential mode at construction and leaves it there:
//! reads and writes of any length cross page boundaries freely and wrap from the last
//! address back to zero inside a single transaction.
//!
//! These chips have no status or acknowledge mechanism. A missing chip, a broken bus, or a
//! part larger than 1 Mbit (which this probe cannot distinguish from a 1 Mbit part) all
//! produce silently wrong data rather than an error; only failures reported by the SPI
//! implementation itself surface as [`error::Error::Spi`].

pub mod asynchronous;
pub mod blocking;
pub mod capacity;
mod command;
pub mod error;
pub mod register;

/// Page size shared by the whole family, in bytes.
pub const PAGE_SIZE: u32 = 32;

// Capacity probe sentinels. Distinct, non-zero, and unequal to the 0x00/0xFF
// erase patterns so stale memory cannot mimic a wrap.
pub(crate) const PROBE_BASE: u8 = 0xA5;
pub(crate) const PROBE_WRAP: u8 = 0x5A;
