//! Capacity model and wrapped address arithmetic.
//!
//! Everything the wire layer needs to know about a part is derived from its
//! [`Capacity`]: how many bytes it holds, how many address bytes it takes, and
//! where sequential transfers land after crossing the top of the array.

/// Capacity of a 23x series part.
///
/// Variants are ordered smallest to largest so the detection probe can walk
/// them with derived comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capacity {
    /// 64 Kbit, 8 KiB (23x640)
    Kbit64,
    /// 128 Kbit, 16 KiB (23x1280)
    Kbit128,
    /// 256 Kbit, 32 KiB (23x256)
    Kbit256,
    /// 512 Kbit, 64 KiB (23x512, 23LCV512)
    Kbit512,
    /// 1 Mbit, 128 KiB (23x1024, 23LCV1024)
    Mbit1,
}

/// Number of address bytes a part expects after the command byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressWidth {
    /// 16-bit address, parts up to 64 KiB
    TwoByte,
    /// 24-bit address, 1 Mbit parts only
    ThreeByte,
}

impl Capacity {
    /// All supported capacities, smallest first. This is the detection probe's
    /// search space; parts larger than the last entry cannot be detected.
    pub const ASCENDING: [Capacity; 5] = [
        Capacity::Kbit64,
        Capacity::Kbit128,
        Capacity::Kbit256,
        Capacity::Kbit512,
        Capacity::Mbit1,
    ];

    /// Size of the memory array in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Capacity::Kbit64 => 8192,
            Capacity::Kbit128 => 16384,
            Capacity::Kbit256 => 32768,
            Capacity::Kbit512 => 65536,
            Capacity::Mbit1 => 131072,
        }
    }

    /// Address width the part expects on the wire. Only the 1 Mbit parts take a
    /// third address byte.
    pub const fn address_width(self) -> AddressWidth {
        match self {
            Capacity::Mbit1 => AddressWidth::ThreeByte,
            _ => AddressWidth::TwoByte,
        }
    }

    /// Address reached after transferring `count` bytes starting at `address`.
    ///
    /// In sequential mode a transfer that runs past the last address continues
    /// from address zero, so the result is `(address + count) % bytes()`. This
    /// holds for any `count`, including counts at or above the capacity, where
    /// several wraps collapse into one modulo step.
    pub const fn advance(self, address: u32, count: usize) -> u32 {
        ((address as u64 + count as u64) % self.bytes() as u64) as u32
    }
}

impl AddressWidth {
    /// Number of address bytes sent on the wire.
    pub const fn bytes(self) -> u8 {
        match self {
            AddressWidth::TwoByte => 2,
            AddressWidth::ThreeByte => 3,
        }
    }

    /// Encode an address into `buf`, most significant byte first.
    ///
    /// Bits above the wire width are truncated, not reduced modulo a capacity:
    /// the chip masks its own don't-care bits, and the capacity probe depends
    /// on out-of-range addresses being sent raw.
    pub fn encode(self, address: u32, buf: &mut [u8]) {
        match self {
            AddressWidth::TwoByte => {
                buf[0] = (address >> 8) as u8;
                buf[1] = address as u8;
            }
            AddressWidth::ThreeByte => {
                buf[0] = (address >> 16) as u8;
                buf[1] = (address >> 8) as u8;
                buf[2] = address as u8;
            }
        }
    }
}
