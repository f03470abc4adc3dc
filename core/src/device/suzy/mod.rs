//! Suzy — the Lynx's sprite engine, math coprocessor, and input port.
//!
//! Mapped at $FC00-$FCFF. The sprite engine walks a linked list of
//! Sprite Control Blocks in RAM, painting into the frame buffer region
//! while the CPU is halted; the math unit provides hardware multiply and
//! divide; the joystick and switch registers latch controller state.
//!
//! # Register map (offsets within the Suzy page)
//!
//! | Offset    | Name           | Description                            |
//! |-----------|----------------|----------------------------------------|
//! | $00-$2F   | engine block   | Sprite pointers/offsets (VIDBAS $08,   |
//! |           |                | COLLBAS $0A, SCBNEXT $10, ...)         |
//! | $52-$57   | MATHD..MATHN   | Multiply operands, divisor             |
//! | $60-$63   | MATHH..MATHE   | Product / dividend                     |
//! | $6C-$6F   | MATHM..MATHJ   | Division remainder                     |
//! | $80-$83   | SPRCTL0/1, SPRCOLL, SPRINIT | Sprite control latches    |
//! | $88       | SUZYHREV       | Hardware revision (reads 1)            |
//! | $90       | SUZYBUSEN      | Bus grant enable (bit 0)               |
//! | $91       | SPRGO          | Start sprite chain (bit 0)             |
//! | $92       | SPRSYS         | Math/engine flags, VStretch, LeftHand  |
//! | $B0 / $B1 | JOYSTICK / SWITCHES | Controller state (active-low)     |
//!
//! RCART0/RCART1 ($B2/$B3) belong to this page but are serviced by the
//! memory manager, which owns the cartridge.

pub mod math;
mod sprite;

use crate::core::snapshot::Snapshot;
use crate::device::RegAccess;
use math::MathUnit;

// JOYSTICK bit positions (active-low register)
pub const JOY_RIGHT: u8 = 0x01;
pub const JOY_LEFT: u8 = 0x02;
pub const JOY_DOWN: u8 = 0x04;
pub const JOY_UP: u8 = 0x08;
pub const JOY_OPTION1: u8 = 0x10;
pub const JOY_OPTION2: u8 = 0x20;
pub const JOY_B: u8 = 0x40;
pub const JOY_A: u8 = 0x80;

// SWITCHES bit positions
pub const SWITCH_PAUSE: u8 = 0x01;

// SPRSYS write bits
pub const SPRSYS_SIGN_MATH: u8 = 0x80;
pub const SPRSYS_ACCUMULATE: u8 = 0x40;
pub const SPRSYS_NO_COLLIDE: u8 = 0x20;
pub const SPRSYS_VSTRETCH: u8 = 0x10;
pub const SPRSYS_LEFTHAND: u8 = 0x08;

// SPRSYS read bits
pub const SPRSYS_MATH_IN_PROGRESS: u8 = 0x80;
pub const SPRSYS_MATH_OVERFLOW: u8 = 0x40;
pub const SPRSYS_SPRITE_BUSY: u8 = 0x01;

/// Sprite rendering styles, from SPRCTL0 bits 2:0. The type picks which
/// pens are transparent, whether pixels XOR into the frame buffer, and
/// which pens participate in collision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SpriteType {
    BackgroundShadow = 0,
    BackgroundNonCollide = 1,
    BoundaryShadow = 2,
    Boundary = 3,
    Normal = 4,
    NonCollidable = 5,
    XorShadow = 6,
    Shadow = 7,
}

impl SpriteType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => SpriteType::BackgroundShadow,
            1 => SpriteType::BackgroundNonCollide,
            2 => SpriteType::BoundaryShadow,
            3 => SpriteType::Boundary,
            4 => SpriteType::Normal,
            5 => SpriteType::NonCollidable,
            6 => SpriteType::XorShadow,
            _ => SpriteType::Shadow,
        }
    }
}

/// Pixel depth, from SPRCTL0 bits 7:6.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Bpp {
    Bpp1 = 0,
    Bpp2 = 1,
    Bpp3 = 2,
    Bpp4 = 3,
}

impl Bpp {
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => Bpp::Bpp1,
            1 => Bpp::Bpp2,
            2 => Bpp::Bpp3,
            _ => Bpp::Bpp4,
        }
    }

    pub fn bits_per_pixel(self) -> u8 {
        self as u8 + 1
    }
}

pub struct Suzy {
    /// Sprite engine pointer/offset block ($00-$2F), byte-addressed.
    /// VIDBAS ($08/$09) and SCBNEXT ($10/$11) are the load-bearing pairs.
    engine: [u8; 0x30],

    pub math: MathUnit,

    // Sprite control latches (also updated from each processed SCB)
    sprctl0: u8,
    sprctl1: u8,
    sprcoll: u8,
    sprinit: u8,
    bus_enable: bool,
    sprgo: u8,
    sprite_go: bool,

    /// Global sprite flags from SPRSYS.
    pub vstretch: bool,
    pub lefthand: bool,
    no_collide_global: bool,

    /// Per-color collision registry; see the sprite module for the
    /// mutual-recording rule.
    pub collision: [u8; 16],

    // Input latches (active-low)
    joystick: u8,
    switches: u8,

    /// CPU cycles owed for the last sprite chain (the CPU is halted
    /// while Suzy owns the bus).
    busy_cycles: u64,
}

impl Default for Suzy {
    fn default() -> Self {
        Self::new()
    }
}

impl Suzy {
    pub fn new() -> Self {
        Self {
            engine: [0; 0x30],
            math: MathUnit::new(),
            sprctl0: 0,
            sprctl1: 0,
            sprcoll: 0,
            sprinit: 0,
            bus_enable: false,
            sprgo: 0,
            sprite_go: false,
            vstretch: false,
            lefthand: false,
            no_collide_global: false,
            collision: [0; 16],
            joystick: 0xFF,
            switches: 0xFF,
            busy_cycles: 0,
        }
    }

    // ---- Engine block word accessors ----

    pub(crate) fn engine_word(&self, offset: usize) -> u16 {
        self.engine[offset] as u16 | ((self.engine[offset + 1] as u16) << 8)
    }

    pub(crate) fn set_engine_word(&mut self, offset: usize, value: u16) {
        self.engine[offset] = value as u8;
        self.engine[offset + 1] = (value >> 8) as u8;
    }

    /// Frame buffer base used by the sprite painters.
    pub fn video_base(&self) -> u16 {
        self.engine_word(0x08)
    }

    /// Head of the SCB chain.
    pub fn scb_next(&self) -> u16 {
        self.engine_word(0x10)
    }

    // ---- Input ----

    /// Latch controller state. `pressed` uses the JOY_* masks; the
    /// register itself is active-low.
    pub fn set_joystick(&mut self, pressed: u8) {
        self.joystick = !pressed;
    }

    /// Latch switch state. `pressed` uses the SWITCH_* masks.
    pub fn set_switches(&mut self, pressed: u8) {
        self.switches = !pressed;
    }

    // ---- Sprite chain control ----

    /// True once a SPRGO write armed the engine; the memory manager
    /// observes this and lends Suzy the bus.
    pub fn take_sprite_go(&mut self) -> bool {
        let go = self.sprite_go && self.bus_enable;
        self.sprite_go = false;
        go
    }

    /// CPU cycles consumed by the last sprite chain, reported once.
    pub fn take_busy_cycles(&mut self) -> u64 {
        std::mem::take(&mut self.busy_cycles)
    }

    /// True while sprite-chain cycles remain to be charged to the CPU.
    pub fn cpu_halted(&self) -> bool {
        self.busy_cycles > 0
    }

    pub(crate) fn add_busy_cycles(&mut self, cycles: u64) {
        self.busy_cycles += cycles;
    }

    // ---- Registers ----

    pub fn write(&mut self, offset: u8, value: u8) -> bool {
        if (offset as usize) < 0x30 {
            self.engine[offset as usize] = value;
            return true;
        }
        if self.math.write(offset, value) {
            return true;
        }
        match offset {
            0x80 => self.sprctl0 = value,
            0x81 => self.sprctl1 = value,
            0x82 => self.sprcoll = value,
            0x83 => self.sprinit = value,
            0x88 | 0x89 => {} // revision latches: accepted, read-only
            0x90 => self.bus_enable = value & 0x01 != 0,
            0x91 => {
                self.sprgo = value;
                if value & 0x01 != 0 {
                    self.sprite_go = true;
                }
            }
            0x92 => {
                self.math.sign_mode = value & SPRSYS_SIGN_MATH != 0;
                self.math.accumulate = value & SPRSYS_ACCUMULATE != 0;
                self.no_collide_global = value & SPRSYS_NO_COLLIDE != 0;
                self.vstretch = value & SPRSYS_VSTRETCH != 0;
                self.lefthand = value & SPRSYS_LEFTHAND != 0;
            }
            0xB0 | 0xB1 => {} // input registers: writes accepted, ignored
            _ => return false,
        }
        true
    }

    pub fn read(&mut self, offset: u8) -> RegAccess {
        self.peek(offset)
    }

    /// Side-effect-free register read; Suzy has no read-sensitive
    /// registers, so the debugger path and the CPU path coincide.
    pub fn peek(&self, offset: u8) -> RegAccess {
        use RegAccess::*;
        if (offset as usize) < 0x30 {
            return Value(self.engine[offset as usize]);
        }
        if let Some(v) = self.math.read(offset) {
            return Value(v);
        }
        match offset {
            0x80 => Value(self.sprctl0),
            0x81 => Value(self.sprctl1),
            0x82 => Value(self.sprcoll),
            0x83 => Value(self.sprinit),
            0x88 => Value(1), // Suzy hardware revision
            0x89 => Value(0),
            0x90 => Value(self.bus_enable as u8),
            0x91 => Value(self.sprgo),
            0x92 => {
                let mut v = 0;
                if self.math.in_progress {
                    v |= SPRSYS_MATH_IN_PROGRESS;
                }
                if self.math.overflow {
                    v |= SPRSYS_MATH_OVERFLOW;
                }
                if self.vstretch {
                    v |= SPRSYS_VSTRETCH;
                }
                if self.lefthand {
                    v |= SPRSYS_LEFTHAND;
                }
                // Sprite chains run to completion within the register
                // write, so the busy bit (bit 0) always reads clear.
                Value(v)
            }
            0xB0 => Value(self.joystick),
            0xB1 => Value(self.switches),
            _ => Unmapped,
        }
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        s.bytes(&mut self.engine);
        self.math.serialize(s);
        s.u8(&mut self.sprctl0);
        s.u8(&mut self.sprctl1);
        s.u8(&mut self.sprcoll);
        s.u8(&mut self.sprinit);
        s.bool(&mut self.bus_enable);
        s.u8(&mut self.sprgo);
        s.bool(&mut self.sprite_go);
        s.bool(&mut self.vstretch);
        s.bool(&mut self.lefthand);
        s.bool(&mut self.no_collide_global);
        s.bytes(&mut self.collision);
        s.u8(&mut self.joystick);
        s.u8(&mut self.switches);
        s.u64(&mut self.busy_cycles);
    }
}
