//! In-memory simulation of a 23x part for the integration tests.
//!
//! The simulation speaks the wire protocol one exchanged byte at a time, the
//! way the real part does: an opcode, then as many address bytes as the
//! simulated capacity requires, then data. Sending a 2-byte address to a part
//! that expects 3 therefore consumes the first data byte as the missing
//! address byte, which is exactly the mismatch the capacity probe has to
//! survive on 1 Mbit chips.

#![allow(dead_code)]

use core::convert::Infallible;
use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

const CMD_WRITE_MODE: u8 = 0x01;
const CMD_WRITE: u8 = 0x02;
const CMD_READ: u8 = 0x03;
const CMD_READ_MODE: u8 = 0x05;

#[derive(Clone, Copy)]
enum State {
    Command,
    ModeWrite,
    ModeRead,
    Address { write: bool, remaining: u8, addr: u32 },
    Data { write: bool, addr: u32, transferred: usize },
    Idle,
}

pub struct SimChip {
    mem: Vec<u8>,
    mode: u8,
    state: State,
    /// Write commands that completed their address phase.
    pub data_writes: usize,
}

impl SimChip {
    /// A power-of-two sized part, all bytes erased to `0xFF`, in the power-on
    /// byte mode.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two());
        Self {
            mem: vec![0xFF; capacity],
            mode: 0x00,
            state: State::Command,
            data_writes: 0,
        }
    }

    pub fn mem(&self) -> &[u8] {
        &self.mem
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    fn address_bytes(&self) -> u8 {
        if self.mem.len() > 65536 {
            3
        } else {
            2
        }
    }

    fn next_addr(&self, addr: u32) -> u32 {
        match self.mode >> 6 {
            0b11 => (addr + 1) % self.mem.len() as u32,
            0b10 => (addr & !31) | ((addr + 1) & 31),
            _ => addr,
        }
    }

    fn exchange(&mut self, mosi: u8) -> u8 {
        match self.state {
            State::Command => {
                self.state = match mosi {
                    CMD_WRITE_MODE => State::ModeWrite,
                    CMD_READ_MODE => State::ModeRead,
                    CMD_WRITE | CMD_READ => State::Address {
                        write: mosi == CMD_WRITE,
                        remaining: self.address_bytes(),
                        addr: 0,
                    },
                    _ => State::Idle,
                };
                0xFF
            }
            State::ModeWrite => {
                self.mode = mosi;
                self.state = State::Idle;
                0xFF
            }
            State::ModeRead => {
                self.state = State::Idle;
                self.mode
            }
            State::Address {
                write,
                remaining,
                addr,
            } => {
                let addr = (addr << 8) | mosi as u32;
                if remaining == 1 {
                    if write {
                        self.data_writes += 1;
                    }
                    self.state = State::Data {
                        write,
                        // Don't-care address bits are masked off.
                        addr: addr % self.mem.len() as u32,
                        transferred: 0,
                    };
                } else {
                    self.state = State::Address {
                        write,
                        remaining: remaining - 1,
                        addr,
                    };
                }
                0xFF
            }
            State::Data {
                write,
                addr,
                transferred,
            } => {
                // Byte mode transfers a single byte; extra clocks do nothing.
                if self.mode >> 6 == 0b00 && transferred >= 1 {
                    return 0xFF;
                }
                let miso = if write {
                    self.mem[addr as usize] = mosi;
                    0xFF
                } else {
                    self.mem[addr as usize]
                };
                self.state = State::Data {
                    write,
                    addr: self.next_addr(addr),
                    transferred: transferred + 1,
                };
                miso
            }
            State::Idle => 0xFF,
        }
    }

    fn run(&mut self, operations: &mut [Operation<'_, u8>]) {
        self.state = State::Command;
        for op in operations.iter_mut() {
            match op {
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        *slot = self.exchange(0x00);
                    }
                }
                Operation::Write(bytes) => {
                    for byte in bytes.iter() {
                        self.exchange(*byte);
                    }
                }
                Operation::Transfer(read, write) => {
                    let len = read.len().max(write.len());
                    for i in 0..len {
                        let mosi = write.get(i).copied().unwrap_or(0x00);
                        let miso = self.exchange(mosi);
                        if let Some(slot) = read.get_mut(i) {
                            *slot = miso;
                        }
                    }
                }
                Operation::TransferInPlace(buf) => {
                    for slot in buf.iter_mut() {
                        *slot = self.exchange(*slot);
                    }
                }
                Operation::DelayNs(_) => {}
            }
        }
        self.state = State::Command;
    }
}

impl ErrorType for SimChip {
    type Error = Infallible;
}

impl SpiDevice for SimChip {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        self.run(operations);
        Ok(())
    }
}

impl embedded_hal_async::spi::SpiDevice for SimChip {
    async fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        self.run(operations);
        Ok(())
    }
}
