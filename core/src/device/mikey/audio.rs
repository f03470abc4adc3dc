//! Mikey's four-channel LFSR audio engine.
//!
//! Each channel owns a countdown timer (same silicon block as the system
//! timers) and a 12-bit linear-feedback shift register. On timer
//! underflow the LFSR shifts; bit 0 selects between +volume and -volume,
//! or accumulates into the output in integrate mode. Channel 0 can take
//! its clock from Timer 4's borrow-out; channels 1-3 can cascade from
//! their predecessor. The mixed output is resampled to the host rate
//! with a fractional accumulator and a box filter.

use super::CPU_CLOCK_HZ;
use super::timers::{CLOCK_LINKED, CTLA_CLOCK_SELECT, Timer};
use crate::core::snapshot::Snapshot;

/// LFSR feedback tap positions, selected per-bit by the FEEDBACK
/// register. Bits 6, 8, and 9 of the shift register have no taps.
const TAPS: [u8; 8] = [0, 1, 2, 3, 4, 5, 7, 10];

/// Control bit: accumulate into OUTPUT instead of replacing it.
pub const AUDCTL_INTEGRATE: u8 = 0x20;
/// Control bit: OUTPUT is a host-written PCM sample (honored on channel
/// 3 only); the LFSR is not clocked.
pub const AUDCTL_DAC: u8 = 0x80;

#[derive(Clone)]
pub struct AudioChannel {
    /// 7-bit volume magnitude.
    pub volume: u8,
    /// Feedback tap enables, one bit per entry of `TAPS`.
    pub feedback: u8,
    /// Current signed sample.
    pub output: i8,
    /// 12-bit shift register. All-zero latches forever, so reset seeds
    /// bit 0; games overwrite it through SHIFT/OTHER anyway.
    pub lfsr: u16,
    /// Countdown timer: BKUP/CTL/COUNT share the system timer semantics.
    pub timer: Timer,
}

impl Default for AudioChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioChannel {
    pub fn new() -> Self {
        Self {
            volume: 0,
            feedback: 0,
            output: 0,
            lfsr: 0x001,
            timer: Timer::new(),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.timer.control_a & CTLA_CLOCK_SELECT == CLOCK_LINKED
    }

    /// Shift the LFSR once and derive the new output sample.
    fn clock_lfsr(&mut self) {
        let mut new_bit = 0u16;
        for (i, tap) in TAPS.iter().enumerate() {
            if self.feedback & (1 << i) != 0 {
                new_bit ^= (self.lfsr >> tap) & 1;
            }
        }
        self.lfsr = ((self.lfsr >> 1) | (new_bit << 11)) & 0x0FFF;

        let vol = (self.volume & 0x7F) as i16;
        let sample = if self.lfsr & 1 != 0 { vol } else { -vol };
        if self.timer.control_a & AUDCTL_INTEGRATE != 0 {
            let sum = self.output as i16 + sample;
            self.output = sum.clamp(-128, 127) as i8;
        } else {
            self.output = sample as i8;
        }
    }

    /// Run `underflows` LFSR steps (one per timer borrow).
    fn apply_underflows(&mut self, underflows: u64, dac: bool) {
        if dac {
            // PCM mode: the host drives OUTPUT directly.
            return;
        }
        for _ in 0..underflows {
            self.clock_lfsr();
        }
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        s.u8(&mut self.volume);
        s.u8(&mut self.feedback);
        let mut out = self.output as u8;
        s.u8(&mut out);
        if s.is_reading() {
            self.output = out as i8;
        }
        s.u16(&mut self.lfsr);
        self.timer.serialize(s);
    }
}

pub struct Apu {
    pub channels: [AudioChannel; 4],
    /// Per-channel stereo attenuation: high nibble left, low nibble right.
    pub attenuation: [u8; 4],
    /// MSTEREO: low nibble mutes channels on the left, high nibble on
    /// the right (bit set = muted).
    pub stereo_disable: u8,

    // Resampler (CPU-cycle domain in, host sample rate out)
    sample_buffer: Vec<(i16, i16)>,
    accum_left: i64,
    accum_right: i64,
    accum_cycles: u32,
    sample_phase: u64,
    sample_rate: u32,
}

impl Apu {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            channels: std::array::from_fn(|_| AudioChannel::new()),
            attenuation: [0xFF; 4],
            stereo_disable: 0,
            sample_buffer: Vec::new(),
            accum_left: 0,
            accum_right: 0,
            accum_cycles: 0,
            sample_phase: 0,
            sample_rate,
        }
    }

    /// Register write within the audio block. `ch` is the channel index,
    /// `reg` the register index within the channel (0-7).
    pub fn write(&mut self, ch: usize, reg: u8, value: u8) {
        let channel = &mut self.channels[ch];
        match reg {
            0 => channel.volume = value,
            1 => channel.feedback = value,
            2 => channel.output = value as i8,
            3 => channel.lfsr = (channel.lfsr & 0x0F00) | value as u16,
            4 => channel.timer.backup = value,
            5 => channel.timer.write_control_a(value),
            6 => channel.timer.count = value,
            7 => channel.lfsr = (channel.lfsr & 0x00FF) | (((value & 0x0F) as u16) << 8),
            _ => unreachable!(),
        }
    }

    pub fn read(&self, ch: usize, reg: u8) -> u8 {
        let channel = &self.channels[ch];
        match reg {
            0 => channel.volume,
            1 => channel.feedback,
            2 => channel.output as u8,
            3 => (channel.lfsr & 0xFF) as u8,
            4 => channel.timer.backup,
            5 => channel.timer.control_a,
            6 => channel.timer.count,
            7 => ((channel.lfsr >> 8) & 0x0F) as u8,
            _ => unreachable!(),
        }
    }

    /// Advance the audio engine to CPU-cycle time `now`.
    ///
    /// `timer4_borrows` feeds channel 0 when it is in linked mode; each
    /// channel's borrows feed the next linked channel. `cycles` is the
    /// CPU-cycle delta for the resampler.
    pub fn tick(&mut self, now: u64, cycles: u64, timer4_borrows: u64) {
        let mut feed = timer4_borrows;
        for i in 0..4 {
            let dac = i == 3 && self.channels[3].timer.control_a & AUDCTL_DAC != 0;
            let underflows = if self.channels[i].is_linked() {
                self.channels[i].timer.clock(feed)
            } else {
                self.channels[i].timer.advance_to(now)
            };
            self.channels[i].apply_underflows(underflows, dac);
            feed = underflows;
        }

        // Resample: box-filter average over the cycles between host
        // sample points.
        let (left, right) = self.mix();
        for _ in 0..cycles {
            self.accum_left += left as i64;
            self.accum_right += right as i64;
            self.accum_cycles += 1;
            self.sample_phase += self.sample_rate as u64;
            if self.sample_phase >= CPU_CLOCK_HZ as u64 {
                self.sample_phase -= CPU_CLOCK_HZ as u64;
                let n = self.accum_cycles.max(1) as i64;
                self.sample_buffer
                    .push(((self.accum_left / n) as i16, (self.accum_right / n) as i16));
                self.accum_left = 0;
                self.accum_right = 0;
                self.accum_cycles = 0;
            }
        }
    }

    /// Current mixed stereo output as signed 16-bit.
    fn mix(&self) -> (i16, i16) {
        let mut left = 0i32;
        let mut right = 0i32;
        for (i, channel) in self.channels.iter().enumerate() {
            let sample = channel.output as i32;
            let att = self.attenuation[i];
            if self.stereo_disable & (1 << i) == 0 {
                left += sample * ((att >> 4) & 0x0F) as i32 / 15;
            }
            if self.stereo_disable & (1 << (i + 4)) == 0 {
                right += sample * (att & 0x0F) as i32 / 15;
            }
        }
        // Four channels of +/-127 scaled into the 16-bit range.
        (
            (left * 64).clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            (right * 64).clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        )
    }

    /// Take the resampled stereo batch accumulated since the last drain.
    pub fn drain(&mut self) -> Vec<(i16, i16)> {
        std::mem::take(&mut self.sample_buffer)
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        for channel in &mut self.channels {
            channel.serialize(s);
        }
        s.bytes(&mut self.attenuation);
        s.u8(&mut self.stereo_disable);
        s.u64(&mut self.sample_phase);
        let mut left = self.accum_left as u64;
        let mut right = self.accum_right as u64;
        s.u64(&mut left);
        s.u64(&mut right);
        s.u32(&mut self.accum_cycles);
        if s.is_reading() {
            self.accum_left = left as i64;
            self.accum_right = right as i64;
        }
    }
}
