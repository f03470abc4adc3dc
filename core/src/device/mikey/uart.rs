//! Mikey's ComLynx UART.
//!
//! Half-duplex serial port clocked by Timer 4's borrow-out (one borrow =
//! one bit time; a frame is 11 bit times: start, 8 data, parity, stop).
//! The ComLynx cable is a single open-collector wire, so every
//! transmitted byte is also received locally — the loopback here is the
//! physical wiring, not a shortcut. The serial interrupt is
//! level-sensitive: it holds while the ready conditions hold, unlike the
//! edge-following timer interrupts.

use crate::core::snapshot::Snapshot;

// SERCTL write bits
pub const SERCTL_TX_IRQ_ENABLE: u8 = 0x80;
pub const SERCTL_RX_IRQ_ENABLE: u8 = 0x40;
pub const SERCTL_PARITY_ENABLE: u8 = 0x10;
pub const SERCTL_RESET_ERRORS: u8 = 0x08;
pub const SERCTL_TX_OPEN: u8 = 0x04;
pub const SERCTL_TX_BREAK: u8 = 0x02;
pub const SERCTL_PARITY_EVEN: u8 = 0x01;

// SERCTL read bits
pub const SERCTL_TX_READY: u8 = 0x80;
pub const SERCTL_RX_READY: u8 = 0x40;
pub const SERCTL_TX_EMPTY: u8 = 0x20;
pub const SERCTL_PARITY_ERROR: u8 = 0x10;
pub const SERCTL_OVERRUN_ERROR: u8 = 0x08;
pub const SERCTL_FRAMING_ERROR: u8 = 0x04;
pub const SERCTL_RX_BREAK: u8 = 0x02;
pub const SERCTL_PARITY_BIT: u8 = 0x01;

/// Bit times per frame: start + 8 data + parity + stop.
const BITS_PER_FRAME: u8 = 11;

pub struct Uart {
    // Write-side control latches
    tx_irq_enable: bool,
    rx_irq_enable: bool,
    parity_enable: bool,
    parity_even: bool,
    tx_break: bool,

    // Transmit state
    tx_shift: u8,     // byte currently on the wire
    tx_data: u8,      // holding register behind the shifter
    tx_bits_remaining: u8,
    tx_holding: bool, // a byte is waiting in the holding register

    // Receive state
    rx_data: u8,
    rx_ready: bool,
    rx_parity_bit: bool,

    // Sticky error flags, cleared by SERCTL_RESET_ERRORS
    parity_error: bool,
    overrun_error: bool,
    framing_error: bool,
    rx_break: bool,
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}

impl Uart {
    pub fn new() -> Self {
        Self {
            tx_irq_enable: false,
            rx_irq_enable: false,
            parity_enable: false,
            parity_even: false,
            tx_break: false,
            tx_shift: 0,
            tx_data: 0,
            tx_bits_remaining: 0,
            tx_holding: false,
            rx_data: 0,
            rx_ready: false,
            rx_parity_bit: false,
            parity_error: false,
            overrun_error: false,
            framing_error: false,
            rx_break: false,
        }
    }

    pub fn write_control(&mut self, value: u8) {
        self.tx_irq_enable = value & SERCTL_TX_IRQ_ENABLE != 0;
        self.rx_irq_enable = value & SERCTL_RX_IRQ_ENABLE != 0;
        self.parity_enable = value & SERCTL_PARITY_ENABLE != 0;
        self.parity_even = value & SERCTL_PARITY_EVEN != 0;
        self.tx_break = value & SERCTL_TX_BREAK != 0;
        if value & SERCTL_RESET_ERRORS != 0 {
            self.parity_error = false;
            self.overrun_error = false;
            self.framing_error = false;
        }
    }

    pub fn read_control(&self) -> u8 {
        let mut value = 0;
        if !self.tx_holding {
            value |= SERCTL_TX_READY;
        }
        if self.rx_ready {
            value |= SERCTL_RX_READY;
        }
        if self.tx_bits_remaining == 0 && !self.tx_holding {
            value |= SERCTL_TX_EMPTY;
        }
        if self.parity_error {
            value |= SERCTL_PARITY_ERROR;
        }
        if self.overrun_error {
            value |= SERCTL_OVERRUN_ERROR;
        }
        if self.framing_error {
            value |= SERCTL_FRAMING_ERROR;
        }
        if self.rx_break {
            value |= SERCTL_RX_BREAK;
        }
        if self.rx_parity_bit {
            value |= SERCTL_PARITY_BIT;
        }
        value
    }

    /// Queue a byte for transmission. A byte already in the shifter
    /// finishes first; the holding register then feeds the shifter.
    pub fn write_data(&mut self, value: u8) {
        if self.tx_bits_remaining > 0 {
            self.tx_data = value;
            self.tx_holding = true;
        } else {
            self.tx_shift = value;
            self.tx_bits_remaining = BITS_PER_FRAME;
        }
    }

    /// Read the received byte and release the receiver.
    pub fn read_data(&mut self) -> u8 {
        self.rx_ready = false;
        self.rx_data
    }

    /// Peek the receive buffer without side effects (debugger path).
    pub fn peek_data(&self) -> u8 {
        self.rx_data
    }

    /// Advance the UART by `bit_clocks` Timer-4 borrow pulses.
    pub fn tick_bits(&mut self, bit_clocks: u64) {
        for _ in 0..bit_clocks {
            if self.tx_bits_remaining == 0 {
                continue;
            }
            self.tx_bits_remaining -= 1;
            if self.tx_bits_remaining == 0 {
                // Frame complete: the wire loops every byte back.
                self.receive_byte(self.tx_shift, true, true);
                if self.tx_holding {
                    self.tx_holding = false;
                    self.tx_shift = self.tx_data;
                    self.tx_bits_remaining = BITS_PER_FRAME;
                }
            }
        }
    }

    /// Deliver a frame to the receiver (loopback or a ComLynx peer).
    pub fn receive_byte(&mut self, value: u8, parity_ok: bool, framing_ok: bool) {
        if self.rx_ready {
            self.overrun_error = true;
        }
        self.rx_data = value;
        self.rx_ready = true;
        self.rx_parity_bit = self.compute_parity_bit(value);
        if !parity_ok {
            self.parity_error = true;
        }
        if !framing_ok {
            self.framing_error = true;
        }
    }

    /// The 9th bit on the wire: computed parity when enabled, otherwise
    /// the even/odd select bit is sent directly.
    fn compute_parity_bit(&self, value: u8) -> bool {
        if self.parity_enable {
            (value.count_ones() & 1 == 1) ^ self.parity_even
        } else {
            self.parity_even
        }
    }

    /// Level-sensitive interrupt condition: holds while enabled and ready.
    pub fn irq_asserted(&self) -> bool {
        (self.tx_irq_enable && !self.tx_holding && self.tx_bits_remaining == 0)
            || (self.rx_irq_enable && self.rx_ready)
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        s.bool(&mut self.tx_irq_enable);
        s.bool(&mut self.rx_irq_enable);
        s.bool(&mut self.parity_enable);
        s.bool(&mut self.parity_even);
        s.bool(&mut self.tx_break);
        s.u8(&mut self.tx_shift);
        s.u8(&mut self.tx_data);
        s.u8(&mut self.tx_bits_remaining);
        s.bool(&mut self.tx_holding);
        s.u8(&mut self.rx_data);
        s.bool(&mut self.rx_ready);
        s.bool(&mut self.rx_parity_bit);
        s.bool(&mut self.parity_error);
        s.bool(&mut self.overrun_error);
        s.bool(&mut self.framing_error);
        s.bool(&mut self.rx_break);
    }
}
