//! Mikey — the Lynx's timer, interrupt, video, audio, and serial chip.
//!
//! Mikey owns the eight system timers, the interrupt controller, the
//! 16-entry RGB444 palette, the display DMA engine, the four-channel
//! audio engine, and the ComLynx UART. It is mapped at $FD00-$FDFF.
//!
//! # Register map (offsets within the Mikey page)
//!
//! | Offset      | Name          | Description                             |
//! |-------------|---------------|-----------------------------------------|
//! | $00-$1F     | TIMn*         | 8 timers x (BKUP, CTLA, CNT, CTLB)      |
//! | $20-$3F     | AUDn*         | 4 channels x (VOL, FEEDBACK, OUTPUT,    |
//! |             |               | SHIFT, BKUP, CTL, COUNT, OTHER)         |
//! | $40-$43     | ATTEN_A-D     | Stereo attenuation (hi=left, lo=right)  |
//! | $44         | MPAN          | Pan control latch                       |
//! | $50         | MSTEREO       | Per-channel stereo mute bits            |
//! | $80         | INTRST        | IRQ pending; write clears written bits  |
//! | $81         | INTSET        | IRQ pending; write sets written bits    |
//! | $86         | AUDIN         | Audio/EEPROM data input pin             |
//! | $87         | SYSCTL1       | Cart address strobe, power              |
//! | $88         | MIKEYHREV     | Hardware revision (1 = Lynx I)          |
//! | $89         | MIKEYSREV     | Software revision latch                 |
//! | $8A / $8B   | IODIR / IODAT | Parallel I/O direction and data         |
//! | $8C / $8D   | SERCTL/SERDAT | UART control and data                   |
//! | $90         | SDONEACK      | Suzy-done acknowledge strobe            |
//! | $91         | CPUSLEEP      | CPU bus-request strobe                  |
//! | $92         | DISPCTL       | Display control (bit 0 = DMA enable)    |
//! | $93         | PBKUP         | Display line timing backup              |
//! | $94 / $95   | DISPADR       | Frame buffer base, low / high           |
//! | $A0-$AF     | GREEN0-F      | Palette green nibbles                   |
//! | $B0-$BF     | BLUERED0-F    | Palette blue (hi) / red (lo) nibbles    |
//!
//! Anything else in the page is reserved: writes are accepted and
//! dropped, reads come back as the open-bus byte (both surfaced to the
//! caller as unmapped so the console can log them).

pub mod audio;
pub mod timers;
pub mod uart;

use crate::core::snapshot::Snapshot;
use crate::device::RegAccess;
use audio::Apu;
use timers::Timer;
use uart::Uart;

// Clock tree. Everything below derives from the 16 MHz crystal.
pub const MASTER_CLOCK_HZ: u32 = 16_000_000;
pub const CPU_CLOCK_HZ: u32 = MASTER_CLOCK_HZ / 4;
pub const FRAME_RATE_HZ: u32 = 75;

/// CPU cycles per frame, derived from the clock tree: 4 MHz / 75 Hz.
/// The scanline product (105 lines x 507 cycles = 53,235) is 98 cycles
/// short and drifts audio against video over minutes.
pub const CPU_CYCLES_PER_FRAME: u32 = CPU_CLOCK_HZ / FRAME_RATE_HZ;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 102;
pub const BYTES_PER_LINE: usize = SCREEN_WIDTH / 2;
/// 102 visible lines plus 3 of vertical blank.
pub const TOTAL_LINES: usize = SCREEN_HEIGHT + 3;

/// Timer roles fixed by the board wiring.
pub const TIMER_HBLANK: usize = 0;
pub const TIMER_VBLANK: usize = 2;
pub const TIMER_SERIAL: usize = 4;

// DISPCTL bits
pub const DISPCTL_DMA_ENABLE: u8 = 0x01;

pub struct Mikey {
    pub timers: [Timer; 8],
    /// One pending bit per timer. Any set bit asserts IRQ to the CPU;
    /// per-timer enable gating already happened when the bit was set.
    irq_pending: u8,
    /// Mirror of each timer's CTLA IRQ-enable bit, kept for debugger
    /// display. Derived state: rebuilt on restore, never serialized.
    irq_enabled: u8,

    pub apu: Apu,
    pub uart: Uart,

    // Palette: 12-bit RGB444 split across two register banks.
    green: [u8; 16],
    bluered: [u8; 16],

    // Latches
    mpan: u8,
    sysctl1: u8,
    iodir: u8,
    iodat: u8,
    sdoneack: u8,
    dispctl: u8,
    pbkup: u8,
    disp_addr: u16,
    hw_revision: u8,
    /// Level of the AUDIN pin (EEPROM data out on carts that have one).
    pub audin: bool,

    // Display DMA state
    current_line: usize,
    video: Vec<u8>, // SCREEN_WIDTH * SCREEN_HEIGHT indexed pixels

    /// CPU-cycle timebase for the prescalers.
    now: u64,
}

impl Mikey {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            timers: std::array::from_fn(|_| Timer::new()),
            irq_pending: 0,
            irq_enabled: 0,
            apu: Apu::new(sample_rate),
            uart: Uart::new(),
            green: [0; 16],
            bluered: [0; 16],
            mpan: 0,
            sysctl1: 0,
            iodir: 0,
            iodat: 0,
            sdoneack: 0,
            dispctl: 0,
            pbkup: 0,
            disp_addr: 0,
            hw_revision: 1,
            audin: false,
            current_line: 0,
            video: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            now: 0,
        }
    }

    /// IRQ line to the CPU: any pending bit asserts. The per-timer
    /// enable is applied when the underflow sets the bit, not here —
    /// gating this on the enable mask as well drops interrupts that
    /// software set manually through INTSET.
    pub fn irq_asserted(&self) -> bool {
        self.irq_pending != 0
    }

    pub fn irq_pending(&self) -> u8 {
        self.irq_pending
    }

    pub fn irq_enabled_mask(&self) -> u8 {
        self.irq_enabled
    }

    /// Advance Mikey by `cpu_cycles`. `ram` is needed for display DMA:
    /// each HBlank copies one scanline out of the frame buffer region.
    pub fn tick(&mut self, cpu_cycles: u64, ram: &[u8]) {
        self.now += cpu_cycles;

        let mut borrows = [0u64; 8];
        for i in 0..8 {
            borrows[i] = if self.timers[i].linked {
                // Clock source 7: fed by the previous timer's borrow-out.
                let feed = if i == 0 { 0 } else { borrows[i - 1] };
                self.timers[i].clock(feed)
            } else {
                self.timers[i].advance_to(self.now)
            };
            if borrows[i] > 0 && self.timers[i].irq_enabled() {
                self.irq_pending |= 1 << i;
            }
        }

        // HBlank: one scanline of display DMA per Timer 0 underflow.
        for _ in 0..borrows[TIMER_HBLANK] {
            self.scanline_dma(ram);
        }

        // Timer 4 borrow-out is the UART bit clock and the audio base.
        self.uart.tick_bits(borrows[TIMER_SERIAL]);
        self.apu.tick(self.now, cpu_cycles, borrows[TIMER_SERIAL]);

        // The serial interrupt is level-sensitive on Timer 4's slot:
        // it re-asserts as long as the ready conditions hold.
        if self.uart.irq_asserted() {
            self.irq_pending |= 1 << TIMER_SERIAL;
        }
    }

    fn scanline_dma(&mut self, ram: &[u8]) {
        if self.dispctl & DISPCTL_DMA_ENABLE != 0 && self.current_line < SCREEN_HEIGHT {
            let base = self.disp_addr as usize + self.current_line * BYTES_PER_LINE;
            for i in 0..BYTES_PER_LINE {
                let byte = ram[(base + i) & 0xFFFF];
                let x = i * 2;
                let row = self.current_line * SCREEN_WIDTH;
                self.video[row + x] = byte >> 4;
                self.video[row + x + 1] = byte & 0x0F;
            }
        }
        self.current_line += 1;
        if self.current_line >= TOTAL_LINES {
            self.current_line = 0;
        }
    }

    /// Copy the rendered indexed frame into the host's back buffer.
    pub fn copy_frame(&self, out: &mut [u8]) {
        out[..self.video.len()].copy_from_slice(&self.video);
    }

    /// Palette entry expanded to 8-bit RGB by nibble replication.
    pub fn palette_rgb(&self, index: usize) -> (u8, u8, u8) {
        let g = self.green[index & 0x0F] & 0x0F;
        let br = self.bluered[index & 0x0F];
        let b = (br >> 4) & 0x0F;
        let r = br & 0x0F;
        ((r << 4) | r, (g << 4) | g, (b << 4) | b)
    }

    pub fn drain_audio(&mut self) -> Vec<(i16, i16)> {
        self.apu.drain()
    }

    pub fn write(&mut self, offset: u8, value: u8) -> bool {
        match offset {
            0x00..=0x1F => {
                let idx = (offset / 4) as usize;
                match offset % 4 {
                    0 => self.timers[idx].backup = value,
                    1 => {
                        self.timers[idx].write_control_a(value);
                        if self.timers[idx].irq_enabled() {
                            self.irq_enabled |= 1 << idx;
                        } else {
                            self.irq_enabled &= !(1 << idx);
                        }
                    }
                    2 => self.timers[idx].count = value,
                    _ => self.timers[idx].write_control_b(value),
                }
                true
            }
            0x20..=0x3F => {
                let off = offset - 0x20;
                self.apu.write((off / 8) as usize, off % 8, value);
                true
            }
            0x40..=0x43 => {
                self.apu.attenuation[(offset - 0x40) as usize] = value;
                true
            }
            0x44 => {
                self.mpan = value;
                true
            }
            0x50 => {
                self.apu.stereo_disable = value;
                true
            }
            0x80 => {
                self.irq_pending &= !value;
                true
            }
            0x81 => {
                self.irq_pending |= value;
                true
            }
            0x87 => {
                self.sysctl1 = value;
                true
            }
            0x88 | 0x89 => true, // revision latches: accepted, read-only
            0x8A => {
                self.iodir = value;
                true
            }
            0x8B => {
                self.iodat = value;
                true
            }
            0x8C => {
                self.uart.write_control(value);
                true
            }
            0x8D => {
                self.uart.write_data(value);
                true
            }
            0x90 => {
                self.sdoneack = value;
                true
            }
            0x91 => true, // CPUSLEEP strobe: bus request handled by Suzy
            0x92 => {
                self.dispctl = value;
                true
            }
            0x93 => {
                self.pbkup = value;
                true
            }
            0x94 => {
                self.disp_addr = (self.disp_addr & 0xFF00) | value as u16;
                true
            }
            0x95 => {
                self.disp_addr = (self.disp_addr & 0x00FF) | ((value as u16) << 8);
                true
            }
            0xA0..=0xAF => {
                self.green[(offset - 0xA0) as usize] = value & 0x0F;
                true
            }
            0xB0..=0xBF => {
                self.bluered[(offset - 0xB0) as usize] = value;
                true
            }
            _ => false,
        }
    }

    pub fn read(&mut self, offset: u8) -> RegAccess {
        match offset {
            0x8D => RegAccess::Value(self.uart.read_data()),
            _ => self.peek(offset),
        }
    }

    /// Side-effect-free register read (debugger path; also the common
    /// case for everything except SERDAT).
    pub fn peek(&self, offset: u8) -> RegAccess {
        use RegAccess::*;
        match offset {
            0x00..=0x1F => {
                let timer = &self.timers[(offset / 4) as usize];
                Value(match offset % 4 {
                    0 => timer.backup,
                    1 => timer.control_a,
                    2 => timer.count,
                    _ => timer.read_control_b(),
                })
            }
            0x20..=0x3F => {
                let off = offset - 0x20;
                Value(self.apu.read((off / 8) as usize, off % 8))
            }
            0x40..=0x43 => Value(self.apu.attenuation[(offset - 0x40) as usize]),
            0x44 => Value(self.mpan),
            0x50 => Value(self.apu.stereo_disable),
            0x80 | 0x81 => Value(self.irq_pending),
            0x86 => Value(self.audin as u8),
            0x87 => Value(self.sysctl1),
            0x88 => Value(self.hw_revision),
            0x89 => Value(0),
            0x8A => Value(self.iodir),
            0x8B => Value(self.iodat),
            0x8C => Value(self.uart.read_control()),
            0x8D => Value(self.uart.peek_data()),
            0x90 => Value(self.sdoneack),
            0x91 => Value(0),
            0x92 => Value(self.dispctl),
            0x93 => Value(self.pbkup),
            0x94 => Value(self.disp_addr as u8),
            0x95 => Value((self.disp_addr >> 8) as u8),
            0xA0..=0xAF => Value(self.green[(offset - 0xA0) as usize]),
            0xB0..=0xBF => Value(self.bluered[(offset - 0xB0) as usize]),
            _ => Unmapped,
        }
    }

    pub fn sysctl1(&self) -> u8 {
        self.sysctl1
    }

    pub fn iodat(&self) -> u8 {
        self.iodat
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        for timer in &mut self.timers {
            timer.serialize(s);
        }
        s.u8(&mut self.irq_pending);
        self.apu.serialize(s);
        self.uart.serialize(s);
        s.bytes(&mut self.green);
        s.bytes(&mut self.bluered);
        s.u8(&mut self.mpan);
        s.u8(&mut self.sysctl1);
        s.u8(&mut self.iodir);
        s.u8(&mut self.iodat);
        s.u8(&mut self.sdoneack);
        s.u8(&mut self.dispctl);
        s.u8(&mut self.pbkup);
        s.u16(&mut self.disp_addr);
        s.u8(&mut self.hw_revision);
        s.bool(&mut self.audin);
        let mut line = self.current_line as u16;
        s.u16(&mut line);
        s.u64(&mut self.now);
        if s.is_reading() {
            self.current_line = (line as usize).min(TOTAL_LINES - 1);
            // Rebuild the derived IRQ-enable mirror from CTLA bits.
            self.irq_enabled = 0;
            for (i, timer) in self.timers.iter().enumerate() {
                if timer.irq_enabled() {
                    self.irq_enabled |= 1 << i;
                }
            }
        }
    }
}
