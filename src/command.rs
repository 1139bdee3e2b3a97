/// Instruction set of the 23x family.
///
/// Every transaction starts with one of these opcodes. `Read` and `Write` are
/// followed by 2 or 3 address bytes and then data; the mode register
/// instructions are followed by a single register byte.
#[derive(Clone, Copy)]
#[repr(u8)]
pub(crate) enum Command {
    /// Read data from memory
    Read = 0x03,
    /// Write data to memory
    Write = 0x02,
    /// Read the mode register
    ReadMode = 0x05,
    /// Write the mode register
    WriteMode = 0x01,
}
