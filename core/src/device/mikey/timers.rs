//! Mikey's eight cascadable 16-bit-effective timers.
//!
//! Each timer counts down on a prescaler clock (1 MHz .. 15.625 kHz) or,
//! with clock source 7, on the previous timer's borrow-out pulse. A timer
//! whose count is zero underflows on its next clocking: TimerDone sets,
//! the count reloads from the backup value when reload is enabled, the
//! borrow-out pulse propagates, and the pending-interrupt bit asserts
//! when the IRQ enable is on. The effective period is backup + 1 ticks.

use crate::core::snapshot::Snapshot;

// Control A bits
pub const CTLA_IRQ_ENABLE: u8 = 0x80;
/// Self-clearing strobe: clears TimerDone, never stored.
pub const CTLA_RESET_DONE: u8 = 0x40;
pub const CTLA_RELOAD_ENABLE: u8 = 0x10;
pub const CTLA_COUNT_ENABLE: u8 = 0x08;
pub const CTLA_CLOCK_SELECT: u8 = 0x07;
/// Clock source 7: count borrow-out pulses from the previous timer.
pub const CLOCK_LINKED: u8 = 7;

// Control B bits
pub const CTLB_TIMER_DONE: u8 = 0x08;
pub const CTLB_BORROW_IN: u8 = 0x02;
pub const CTLB_BORROW_OUT: u8 = 0x01;

#[derive(Clone)]
pub struct Timer {
    pub backup: u8,
    pub control_a: u8,
    pub count: u8,
    pub control_b: u8,
    /// CPU-cycle timestamp of the last prescaler tick consumed.
    pub last_tick: u64,
    pub timer_done: bool,
    pub linked: bool,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            backup: 0,
            control_a: 0,
            count: 0,
            control_b: 0,
            last_tick: 0,
            timer_done: false,
            linked: false,
        }
    }

    /// Prescaler period in CPU cycles, or None when linked (source 7).
    pub fn period(&self) -> Option<u64> {
        let source = self.control_a & CTLA_CLOCK_SELECT;
        if source == CLOCK_LINKED {
            None
        } else {
            // Source 0 = 4 CPU cycles (1 MHz), each step doubles.
            Some(4u64 << source)
        }
    }

    pub fn counting_enabled(&self) -> bool {
        self.control_a & CTLA_COUNT_ENABLE != 0
    }

    pub fn irq_enabled(&self) -> bool {
        self.control_a & CTLA_IRQ_ENABLE != 0
    }

    /// Write Control A. The reset-done strobe (bit 6) acts immediately
    /// and is stored masked off; the silicon never latches it.
    pub fn write_control_a(&mut self, value: u8) {
        if value & CTLA_RESET_DONE != 0 {
            self.timer_done = false;
            self.control_b &= !CTLB_TIMER_DONE;
        }
        self.control_a = value & !CTLA_RESET_DONE;
        self.linked = value & CTLA_CLOCK_SELECT == CLOCK_LINKED;
    }

    /// Write Control B. Only the TimerDone bit is writable, and a write
    /// clears it; the remaining bits are hardware status.
    pub fn write_control_b(&mut self, _value: u8) {
        self.control_b &= !CTLB_TIMER_DONE;
        self.timer_done = false;
    }

    pub fn read_control_b(&self) -> u8 {
        self.control_b
    }

    /// Clock the timer `ticks` times. Returns the number of borrow-out
    /// pulses (underflows) produced.
    ///
    /// While TimerDone is set the counter holds: only a Control B write
    /// (or the Control A strobe) re-arms it.
    pub fn clock(&mut self, ticks: u64) -> u64 {
        if !self.counting_enabled() || ticks == 0 {
            return 0;
        }

        let mut borrows = 0;
        for _ in 0..ticks {
            if self.timer_done {
                break;
            }
            self.control_b |= CTLB_BORROW_IN;
            if self.count == 0 {
                // Underflow. The done status bit always latches in CTLB;
                // the counter only freezes in one-shot (no-reload) mode.
                self.control_b |= CTLB_TIMER_DONE | CTLB_BORROW_OUT;
                if self.control_a & CTLA_RELOAD_ENABLE != 0 {
                    self.count = self.backup;
                } else {
                    self.timer_done = true;
                }
                borrows += 1;
            } else {
                self.count -= 1;
                self.control_b &= !CTLB_BORROW_OUT;
            }
        }
        borrows
    }

    /// Advance a prescaler-clocked timer to the absolute CPU-cycle time
    /// `now`. Returns borrow-out pulses. Linked timers are clocked by
    /// their feeder's borrows instead.
    pub fn advance_to(&mut self, now: u64) -> u64 {
        let Some(period) = self.period() else {
            return 0;
        };
        if !self.counting_enabled() {
            // Keep the timebase current so enabling later doesn't replay
            // the idle period as a burst of ticks.
            self.last_tick = now - (now % period);
            return 0;
        }
        let ticks = (now - self.last_tick) / period;
        self.last_tick += ticks * period;
        self.clock(ticks)
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        s.u8(&mut self.backup);
        s.u8(&mut self.control_a);
        s.u8(&mut self.count);
        s.u8(&mut self.control_b);
        s.u64(&mut self.last_tick);
        s.bool(&mut self.timer_done);
        if s.is_reading() {
            self.linked = self.control_a & CTLA_CLOCK_SELECT == CLOCK_LINKED;
        }
    }
}
