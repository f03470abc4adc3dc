//! The Lynx console: component wiring and the per-frame step loop.
//!
//! `LynxSystem` owns the CPU and the bus (RAM, Mikey, Suzy, cartridge,
//! EEPROM) and exposes the narrow interface the host consumes: run one
//! frame, read the 160x102 indexed frame buffer, drain the stereo
//! sample batch, latch controller state, serialize everything.

use caracal_core::core::bus::BusMaster;
use caracal_core::core::machine::{InputButton, Machine};
use caracal_core::core::snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};
use caracal_core::cpu::state::CpuStateTrait;
use caracal_core::cpu::w65c02::{W65c02, disasm};
use caracal_core::debug::{TimelineEntry, TraceSink};
use caracal_core::device::mikey::{CPU_CYCLES_PER_FRAME, SCREEN_HEIGHT, SCREEN_WIDTH};
use caracal_core::device::suzy::{
    JOY_A, JOY_B, JOY_DOWN, JOY_LEFT, JOY_OPTION1, JOY_OPTION2, JOY_RIGHT, JOY_UP, SWITCH_PAUSE,
};
use caracal_core::device::{Eeprom, EepromType};
use caracal_core::rsa;

use crate::bus::LynxBus;
use crate::game_db::{self, Rotation};
use crate::input::TasInput;
use crate::rom_loader::{BS93_LOAD_ADDRESS, RomFormat, RomImage, RomLoadError};

/// Snapshot stream discriminator for this console.
pub const CONSOLE_TYPE_LYNX: u8 = 1;

// Input button IDs for the Machine interface
pub const INPUT_UP: u8 = 0;
pub const INPUT_DOWN: u8 = 1;
pub const INPUT_LEFT: u8 = 2;
pub const INPUT_RIGHT: u8 = 3;
pub const INPUT_OPTION1: u8 = 4;
pub const INPUT_OPTION2: u8 = 5;
pub const INPUT_A: u8 = 6;
pub const INPUT_B: u8 = 7;
pub const INPUT_PAUSE: u8 = 8;

const LYNX_INPUT_MAP: &[InputButton] = &[
    InputButton {
        id: INPUT_UP,
        name: "Up",
    },
    InputButton {
        id: INPUT_DOWN,
        name: "Down",
    },
    InputButton {
        id: INPUT_LEFT,
        name: "Left",
    },
    InputButton {
        id: INPUT_RIGHT,
        name: "Right",
    },
    InputButton {
        id: INPUT_OPTION1,
        name: "Option 1",
    },
    InputButton {
        id: INPUT_OPTION2,
        name: "Option 2",
    },
    InputButton {
        id: INPUT_A,
        name: "A",
    },
    InputButton {
        id: INPUT_B,
        name: "B",
    },
    InputButton {
        id: INPUT_PAUSE,
        name: "Pause",
    },
];

/// How the console gets from power-on to running code.
#[derive(Clone, Debug, PartialEq)]
enum BootPlan {
    /// Nothing loaded; the CPU spins over open RAM.
    None,
    /// A real 512-byte boot ROM is present: start at its reset vector
    /// and let it do the cartridge decryption itself.
    BootRom,
    /// High-level emulation: the decrypted (or BS93) loader image is
    /// placed at its load address and the CPU starts there with a
    /// synthetic post-boot state.
    Hle { entry: u16 },
}

/// What `load_rom` learned about the cartridge.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGame {
    pub name: String,
    pub rotation: Rotation,
    pub eeprom: EepromType,
    pub players: u8,
    pub encrypted_loader_valid: Option<bool>,
}

pub struct LynxSystem {
    cpu: W65c02,
    pub bus: LynxBus,
    sample_rate: u32,

    rotation: Rotation,
    players: u8,

    boot_plan: BootPlan,
    /// Loader bytes the HLE boot path copies into RAM on reset.
    hle_image: Vec<u8>,

    /// Front buffer: indexed pixels, swapped in at the end of each frame.
    frame_buffer: Vec<u8>,
    audio_frame: Vec<(i16, i16)>,

    joystick_latch: u8,
    switches_latch: u8,
}

impl LynxSystem {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            cpu: W65c02::new(),
            bus: LynxBus::new(sample_rate),
            sample_rate,
            rotation: Rotation::None,
            players: 1,
            boot_plan: BootPlan::None,
            hle_image: Vec::new(),
            frame_buffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            audio_frame: Vec::new(),
            joystick_latch: 0,
            switches_latch: 0,
        }
    }

    /// Install a dumped 512-byte boot ROM. Subsequent resets start at
    /// its reset vector instead of the high-level boot path.
    pub fn set_boot_rom(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(self.bus.boot_rom.len());
        self.bus.boot_rom[..len].copy_from_slice(&bytes[..len]);
        self.boot_plan = BootPlan::BootRom;
    }

    /// Detect the ROM format, mount the cartridge, identify the game,
    /// and prepare the boot path. Call `reset()` afterwards to start.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<LoadedGame, RomLoadError> {
        let rom = RomImage::parse(bytes)?;

        let mut loader_valid = None;
        match &rom.format {
            RomFormat::Bs93 => {
                // Homebrew: unencrypted program, loaded directly.
                self.hle_image = rom.image.clone();
                self.boot_plan = BootPlan::Hle {
                    entry: BS93_LOAD_ADDRESS,
                };
                self.rotation = Rotation::None;
                self.players = 1;
                self.reset();
                return Ok(LoadedGame {
                    name: "BS93 homebrew".to_string(),
                    rotation: Rotation::None,
                    eeprom: EepromType::None,
                    players: 1,
                    encrypted_loader_valid: None,
                });
            }
            RomFormat::Lnx(header) => {
                let (page0, page1) = rom.page_sizes();
                self.bus.cart.load(rom.image.clone(), page0, page1);
                let db = game_db::find(rom.crc32);
                // The database wins over the header when it knows the game.
                self.rotation = db.map(|e| e.rotation).unwrap_or(header.rotation);
                self.players = db.map(|e| e.players).unwrap_or(1);
                let eeprom = db.map(|e| e.eeprom).unwrap_or(EepromType::None);
                self.bus.eeprom = Eeprom::new(eeprom);

                if self.boot_plan != BootPlan::BootRom {
                    loader_valid = Some(self.prepare_hle_loader()?);
                }
                let name = db
                    .map(|e| e.name.to_string())
                    .unwrap_or_else(|| header.cart_name.clone());
                self.reset();
                return Ok(LoadedGame {
                    name,
                    rotation: self.rotation,
                    eeprom,
                    players: self.players,
                    encrypted_loader_valid: loader_valid,
                });
            }
            RomFormat::Raw => {
                self.bus.cart.load(rom.image.clone(), 1024, 0);
                let db = game_db::find(rom.crc32);
                self.rotation = db.map(|e| e.rotation).unwrap_or(Rotation::None);
                self.players = db.map(|e| e.players).unwrap_or(1);
                let eeprom = db.map(|e| e.eeprom).unwrap_or(EepromType::None);
                self.bus.eeprom = Eeprom::new(eeprom);
                if self.boot_plan != BootPlan::BootRom {
                    loader_valid = Some(self.prepare_hle_loader()?);
                }
                self.reset();
                Ok(LoadedGame {
                    name: db
                        .map(|e| e.name.to_string())
                        .unwrap_or_else(|| game_db::UNKNOWN_GAME.name.to_string()),
                    rotation: self.rotation,
                    eeprom,
                    players: self.players,
                    encrypted_loader_valid: loader_valid,
                })
            }
        }
    }

    /// Decrypt the cartridge's boot payload in the host, standing in
    /// for the missing boot ROM. The decrypted bytes still load even
    /// when the checksum fails, mirroring the structured decrypt
    /// result, so a bad dump at least reaches the debugger.
    fn prepare_hle_loader(&mut self) -> Result<bool, RomLoadError> {
        let rom = self.bus.cart.rom();
        let result = rsa::decrypt(rom).map_err(|_| RomLoadError::BadEncryptedLoader)?;
        self.hle_image = result.data.clone();
        self.boot_plan = BootPlan::Hle { entry: 0x0200 };
        Ok(result.valid)
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn players(&self) -> u8 {
        self.players
    }

    /// Latch controller state for the next frame.
    pub fn set_controller_state(&mut self, joystick: u8, switches: u8) {
        self.joystick_latch = joystick;
        self.switches_latch = switches;
    }

    /// Latch a decoded TAS frame.
    pub fn set_tas_input(&mut self, input: TasInput) {
        self.set_controller_state(input.joystick, input.switches);
    }

    /// Stereo samples produced by the most recent frame.
    pub fn take_audio(&mut self) -> Vec<(i16, i16)> {
        std::mem::take(&mut self.audio_frame)
    }

    /// The front frame buffer: 160x102 palette indices.
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    // ---- Debugger surface ----

    pub fn cpu_state(&self) -> caracal_core::cpu::state::W65c02State {
        self.cpu.snapshot()
    }

    /// Side-effect-free memory read.
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Disassemble the instruction at `addr` without touching state.
    pub fn disassemble_at(&self, addr: u16) -> (String, u8) {
        let mut fetch = |a: u16| self.bus.peek(a);
        disasm::disassemble(addr, &mut fetch)
    }

    pub fn timeline_entries(&self) -> Vec<TimelineEntry> {
        self.bus.timeline.entries()
    }

    pub fn set_timeline_enabled(&mut self, enabled: bool) {
        self.bus.timeline.set_enabled(enabled);
    }

    /// Mirror every CPU bus access into `sink` until it is taken back.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.bus.trace = Some(sink);
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.bus.trace.take()
    }

    // ---- Save states ----

    /// Visit every field that affects future behavior. The host's
    /// save-state envelope drives this with its own visitor; the
    /// convenience pair below wraps it in the versioned stream.
    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        self.cpu.serialize(s);
        self.bus.serialize(s);
        s.u8(&mut self.joystick_latch);
        s.u8(&mut self.switches_latch);
        s.bytes(&mut self.frame_buffer);
    }

    pub fn save_state(&mut self) -> Vec<u8> {
        let mut writer = SnapshotWriter::new(CONSOLE_TYPE_LYNX);
        self.serialize(&mut writer);
        writer.into_bytes()
    }

    /// Restore a snapshot. A corrupt stream is refused without
    /// touching this console: the bytes are replayed into a scratch
    /// console first and only committed on a clean pass.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let mut scratch = LynxSystem::new(self.sample_rate);
        let mut reader = SnapshotReader::new(bytes, CONSOLE_TYPE_LYNX)?;
        scratch.serialize(&mut reader);
        reader.finish()?;

        let mut reader = SnapshotReader::new(bytes, CONSOLE_TYPE_LYNX)?;
        self.serialize(&mut reader);
        reader.finish()
    }

    // ---- Frame stepping ----

    fn step_frame(&mut self) {
        self.bus.suzy.set_joystick(self.joystick_latch);
        self.bus.suzy.set_switches(self.switches_latch);
        // SWITCHES bit 1 drives the cartridge bank-select line.
        self.bus.cart.current_bank = (self.switches_latch >> 1) & 0x01;

        let budget = CPU_CYCLES_PER_FRAME as u64;
        let mut cycles = 0u64;
        while cycles < budget {
            let executed = self.cpu.step(&mut self.bus, BusMaster::Cpu);
            // Cycles Suzy spent painting while the CPU was stalled are
            // charged to the same clock.
            let stalled = self.bus.suzy.take_busy_cycles();
            let total = executed + stalled;
            self.bus.master_cycles += total * 4;
            self.bus.tick_mikey(total);
            cycles += total;
        }

        // Frame boundary: swap the display buffer and batch the audio.
        self.bus.mikey.copy_frame(&mut self.frame_buffer);
        self.audio_frame = self.bus.mikey.drain_audio();
    }
}

impl Default for LynxSystem {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl Machine for LynxSystem {
    fn display_size(&self) -> (u32, u32) {
        (SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
    }

    fn run_frame(&mut self) {
        self.step_frame();
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        // Expand the 16-entry RGB444 palette once, then map indices.
        let mut palette = [(0u8, 0u8, 0u8); 16];
        for (i, rgb) in palette.iter_mut().enumerate() {
            *rgb = self.bus.mikey.palette_rgb(i);
        }
        for (i, &index) in self.frame_buffer.iter().enumerate() {
            let (r, g, b) = palette[(index & 0x0F) as usize];
            let out = i * 3;
            buffer[out] = r;
            buffer[out + 1] = g;
            buffer[out + 2] = b;
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        let mask = match button {
            INPUT_UP => JOY_UP,
            INPUT_DOWN => JOY_DOWN,
            INPUT_LEFT => JOY_LEFT,
            INPUT_RIGHT => JOY_RIGHT,
            INPUT_OPTION1 => JOY_OPTION1,
            INPUT_OPTION2 => JOY_OPTION2,
            INPUT_A => JOY_A,
            INPUT_B => JOY_B,
            INPUT_PAUSE => {
                if pressed {
                    self.switches_latch |= SWITCH_PAUSE;
                } else {
                    self.switches_latch &= !SWITCH_PAUSE;
                }
                return;
            }
            _ => return,
        };
        if pressed {
            self.joystick_latch |= mask;
        } else {
            self.joystick_latch &= !mask;
        }
    }

    fn input_map(&self) -> &[InputButton] {
        LYNX_INPUT_MAP
    }

    fn reset(&mut self) {
        use caracal_core::cpu::Cpu;
        self.cpu.reset();

        // EEPROM contents survive a reset (non-volatile); everything
        // else in the bus starts over. RAM is left as-is, matching the
        // hardware.
        let nvram = self.bus.eeprom.contents().to_vec();
        let kind = self.bus.eeprom.kind();
        self.bus.mikey = caracal_core::device::Mikey::new(self.sample_rate);
        self.bus.suzy = caracal_core::device::Suzy::new();
        self.bus.eeprom = Eeprom::new(kind);
        self.bus.eeprom.load_contents(&nvram);
        self.bus.update_mapctl(0);
        self.bus.master_cycles = 0;

        match self.boot_plan.clone() {
            BootPlan::None => {}
            BootPlan::BootRom => {
                // Vector fetch through the overlay, as the silicon does.
                let lo = self.bus.peek(0xFFFC) as u16;
                let hi = self.bus.peek(0xFFFD) as u16;
                self.cpu.pc = (hi << 8) | lo;
            }
            BootPlan::Hle { entry } => {
                // Synthetic post-boot state: loader in RAM, overlays
                // enabled, stack reset, decimal mode clear.
                for (i, &byte) in self.hle_image.iter().enumerate() {
                    self.bus.ram[(entry as usize + i) & 0xFFFF] = byte;
                }
                self.cpu.sp = 0xFF;
                self.cpu.pc = entry;
            }
        }
    }

    fn save_nvram(&self) -> Option<&[u8]> {
        if self.bus.eeprom.kind() == EepromType::None {
            None
        } else {
            Some(self.bus.eeprom.contents())
        }
    }

    fn load_nvram(&mut self, data: &[u8]) {
        self.bus.eeprom.load_contents(data);
    }
}
