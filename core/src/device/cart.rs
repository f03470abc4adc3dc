//! Cartridge port with its shift-register address generator.
//!
//! The cart has no address bus of its own. Mikey drives an 8-bit shift
//! register through the SYSCTL1 address strobe, with the data bit taken
//! from IODAT; the shifted value selects a page, and a ripple counter
//! supplies the low address bits, incrementing on every RCART read.
//! Raising the strobe also clears the ripple counter, so software
//! positions the cart by clocking in a page number and then streaming
//! bytes out of RCART.

use crate::core::snapshot::Snapshot;

pub struct Cartridge {
    rom: Vec<u8>,
    /// Bytes addressed per shift-register page.
    page_size: usize,
    /// Second-bank page size (zero when the cart has a single bank).
    page_size_bank1: usize,
    /// Bank selected through the SWITCHES cart lines.
    pub current_bank: u8,

    /// 8-bit page shift register, MSB-first.
    shift_register: u8,
    /// Ripple counter for the low address bits.
    counter: u16,
    /// Last seen strobe level, for edge detection.
    strobe_level: bool,
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Cartridge {
    pub fn new() -> Self {
        Self {
            rom: Vec::new(),
            page_size: 1024,
            page_size_bank1: 0,
            current_bank: 0,
            shift_register: 0,
            counter: 0,
            strobe_level: false,
        }
    }

    pub fn load(&mut self, rom: Vec<u8>, page_size: usize, page_size_bank1: usize) {
        self.rom = rom;
        self.page_size = page_size.max(1);
        self.page_size_bank1 = page_size_bank1;
        self.shift_register = 0;
        self.counter = 0;
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn is_loaded(&self) -> bool {
        !self.rom.is_empty()
    }

    /// Drive the address strobe. On a rising edge the shift register
    /// takes `data_bit` into bit 0 (MSB-first overall) and the ripple
    /// counter clears.
    pub fn set_strobe(&mut self, level: bool, data_bit: bool) {
        if level && !self.strobe_level {
            self.shift_register = (self.shift_register << 1) | data_bit as u8;
            self.counter = 0;
        }
        self.strobe_level = level;
    }

    fn offset(&self) -> usize {
        let bank_base = if self.current_bank != 0 && self.page_size_bank1 != 0 {
            256 * self.page_size
        } else {
            0
        };
        let page = if self.current_bank != 0 && self.page_size_bank1 != 0 {
            self.page_size_bank1
        } else {
            self.page_size
        };
        bank_base + self.shift_register as usize * page + (self.counter as usize % page)
    }

    /// Read the byte at the current shift-register/counter address and
    /// advance the counter. Unfitted carts float the bus high.
    pub fn read_next(&mut self) -> u8 {
        let value = self.peek();
        self.counter = self.counter.wrapping_add(1);
        value
    }

    /// Same byte without advancing the counter (debugger path).
    pub fn peek(&self) -> u8 {
        self.rom.get(self.offset()).copied().unwrap_or(0xFF)
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        s.u8(&mut self.current_bank);
        s.u8(&mut self.shift_register);
        s.u16(&mut self.counter);
        s.bool(&mut self.strobe_level);
    }
}
