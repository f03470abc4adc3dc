//! The Lynx memory manager: 64 KB of RAM with the MAPCTL hardware
//! overlays, plus the glue wiring between Mikey's I/O pins, the
//! cartridge shift register, and the cart EEPROM.
//!
//! # Address map
//!
//! | Range         | Contents                                          |
//! |---------------|---------------------------------------------------|
//! | $0000-$FBFF   | RAM, always visible                               |
//! | $FC00-$FCFF   | Suzy registers while MAPCTL bit 0 is clear        |
//! | $FD00-$FDFF   | Mikey registers while MAPCTL bit 1 is clear       |
//! | $FE00-$FFF7   | Boot ROM while MAPCTL bit 3 is clear              |
//! | $FFF8         | RAM (reserved byte)                               |
//! | $FFF9         | MAPCTL itself                                     |
//! | $FFFA-$FFFF   | Vectors (boot ROM) while MAPCTL bit 2 is clear    |
//!
//! MAPCTL bits are active-low enables. Bit 2 governs the vectors and
//! bit 3 the ROM body; the pair reads like it should be swapped and is
//! not, which has cost more than one loader an afternoon. A disabled
//! overlay exposes the RAM underneath. Suzy's sprite engine always sees
//! RAM: the overlays only intercept CPU accesses.

use caracal_core::core::bus::{Bus, BusMaster, InterruptState};
use caracal_core::core::snapshot::Snapshot;
use caracal_core::debug::{AccessKind, EventTimeline, HwEvent, TraceSink};
use caracal_core::device::{Cartridge, Eeprom, EepromType, Mikey, RegAccess, Suzy};

pub const RAM_SIZE: usize = 0x10000;
pub const BOOT_ROM_SIZE: usize = 0x200;

pub const MAPCTL_ADDRESS: u16 = 0xFFF9;

// MAPCTL active-low enable bits
pub const MAPCTL_SUZY_DISABLE: u8 = 0x01;
pub const MAPCTL_MIKEY_DISABLE: u8 = 0x02;
pub const MAPCTL_VECTOR_DISABLE: u8 = 0x04;
pub const MAPCTL_ROM_DISABLE: u8 = 0x08;

// Mikey pin assignments for the cart port peripherals
const SYSCTL1_CART_STROBE: u8 = 0x01;
const IODAT_CART_DATA: u8 = 0x02;
const IODAT_EEPROM_CS: u8 = 0x08;

pub struct LynxBus {
    pub ram: Vec<u8>,
    pub boot_rom: Vec<u8>,
    pub mikey: Mikey,
    pub suzy: Suzy,
    pub cart: Cartridge,
    pub eeprom: Eeprom,

    mapctl: u8,
    // Derived visibility flags, recomputed on every MAPCTL write.
    suzy_visible: bool,
    mikey_visible: bool,
    vector_visible: bool,
    rom_visible: bool,

    /// Last byte seen on the data bus; reserved register reads return it.
    open_bus: u8,

    pub timeline: EventTimeline,
    /// Master-clock timestamp for timeline entries, maintained by the
    /// console's frame loop.
    pub master_cycles: u64,
    /// Optional mirror of every CPU bus access (debugger trace).
    /// Never serialized.
    pub trace: Option<Box<dyn TraceSink>>,
}

impl LynxBus {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            ram: vec![0xFF; RAM_SIZE],
            boot_rom: vec![0; BOOT_ROM_SIZE],
            mikey: Mikey::new(sample_rate),
            suzy: Suzy::new(),
            cart: Cartridge::new(),
            eeprom: Eeprom::new(EepromType::None),
            mapctl: 0,
            suzy_visible: true,
            mikey_visible: true,
            vector_visible: true,
            rom_visible: true,
            open_bus: 0,
            timeline: EventTimeline::default(),
            master_cycles: 0,
            trace: None,
        }
    }

    /// Replace the MAPCTL byte and rederive the visibility flags.
    pub fn update_mapctl(&mut self, value: u8) {
        self.mapctl = value;
        self.suzy_visible = value & MAPCTL_SUZY_DISABLE == 0;
        self.mikey_visible = value & MAPCTL_MIKEY_DISABLE == 0;
        self.vector_visible = value & MAPCTL_VECTOR_DISABLE == 0;
        self.rom_visible = value & MAPCTL_ROM_DISABLE == 0;
    }

    pub fn mapctl(&self) -> u8 {
        self.mapctl
    }

    /// Advance Mikey's clock domain (display DMA reads RAM at HBlank).
    pub fn tick_mikey(&mut self, cpu_cycles: u64) {
        self.mikey.tick(cpu_cycles, &self.ram);
    }

    /// Side-effect-free read for the debugger: no open-bus update, no
    /// receiver clears, no cartridge counter advance.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0xFC00..=0xFCFF if self.suzy_visible => match addr as u8 {
                0xB2 | 0xB3 => self.cart.peek(),
                off => match self.suzy.peek(off) {
                    RegAccess::Value(v) => v,
                    RegAccess::Unmapped => self.open_bus,
                },
            },
            0xFD00..=0xFDFF if self.mikey_visible => match self.mikey.peek(addr as u8) {
                RegAccess::Value(v) => v,
                RegAccess::Unmapped => self.open_bus,
            },
            0xFE00..=0xFFF7 if self.rom_visible => self.boot_rom[(addr - 0xFE00) as usize],
            MAPCTL_ADDRESS => self.mapctl,
            0xFFFA..=0xFFFF if self.vector_visible => self.boot_rom[(addr - 0xFE00) as usize],
            _ => self.ram[addr as usize],
        }
    }

    /// Run the sprite chain if a SPRGO write armed it. The chain is
    /// atomic: the CPU never observes partial sprite output, it just
    /// loses the cycles Suzy spent on the bus.
    fn service_sprite_go(&mut self) {
        if !self.suzy.take_sprite_go() {
            return;
        }
        let scb = self.suzy.scb_next();
        self.timeline
            .record(self.master_cycles, HwEvent::SpriteChainStart { scb });
        let painted = self.suzy.run_sprite_chain(&mut self.ram);
        self.timeline
            .record(self.master_cycles, HwEvent::SpriteChainEnd { sprites: painted });
    }

    /// Propagate Mikey pin writes to the cart port peripherals. The
    /// cart address strobe doubles as the EEPROM serial clock; IODAT
    /// carries the data and chip-select lines; the EEPROM's output pin
    /// feeds back through AUDIN.
    fn sync_cart_pins(&mut self) {
        let strobe = self.mikey.sysctl1() & SYSCTL1_CART_STROBE != 0;
        let iodat = self.mikey.iodat();
        let data_bit = iodat & IODAT_CART_DATA != 0;
        self.cart.set_strobe(strobe, data_bit);
        let cs = iodat & IODAT_EEPROM_CS != 0;
        self.mikey.audin = self.eeprom.tick_clock_edge(cs, strobe, data_bit);
    }

    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        s.bytes(&mut self.ram);
        s.bytes(&mut self.boot_rom);
        self.mikey.serialize(s);
        self.suzy.serialize(s);
        self.cart.serialize(s);
        self.eeprom.serialize(s);
        let mut mapctl = self.mapctl;
        s.u8(&mut mapctl);
        s.u8(&mut self.open_bus);
        s.u64(&mut self.master_cycles);
        if s.is_reading() {
            // Visibility flags are derived; rebuild them.
            self.update_mapctl(mapctl);
        }
    }
}

impl Bus for LynxBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, master: BusMaster, addr: u16) -> u8 {
        if master == BusMaster::Debugger {
            return self.peek(addr);
        }
        let value = match addr {
            0xFC00..=0xFCFF if self.suzy_visible && master != BusMaster::SpriteDma => {
                match addr as u8 {
                    // RCART: cartridge byte stream, counter advances
                    0xB2 | 0xB3 => self.cart.read_next(),
                    off => match self.suzy.read(off) {
                        RegAccess::Value(v) => v,
                        RegAccess::Unmapped => {
                            self.timeline
                                .record(self.master_cycles, HwEvent::UnmappedRead { addr });
                            self.open_bus
                        }
                    },
                }
            }
            0xFD00..=0xFDFF if self.mikey_visible && master != BusMaster::SpriteDma => {
                match self.mikey.read(addr as u8) {
                    RegAccess::Value(v) => v,
                    RegAccess::Unmapped => {
                        self.timeline
                            .record(self.master_cycles, HwEvent::UnmappedRead { addr });
                        self.open_bus
                    }
                }
            }
            0xFE00..=0xFFF7 if self.rom_visible && master != BusMaster::SpriteDma => {
                self.boot_rom[(addr - 0xFE00) as usize]
            }
            MAPCTL_ADDRESS => self.mapctl,
            0xFFFA..=0xFFFF if self.vector_visible && master != BusMaster::SpriteDma => {
                self.boot_rom[(addr - 0xFE00) as usize]
            }
            _ => self.ram[addr as usize],
        };
        self.open_bus = value;
        if master == BusMaster::Cpu
            && let Some(trace) = self.trace.as_mut()
        {
            trace.access(AccessKind::Read, addr, value);
        }
        value
    }

    fn write(&mut self, master: BusMaster, addr: u16, data: u8) {
        if master == BusMaster::Debugger {
            self.ram[addr as usize] = data;
            return;
        }
        self.open_bus = data;
        if master == BusMaster::Cpu
            && let Some(trace) = self.trace.as_mut()
        {
            trace.access(AccessKind::Write, addr, data);
        }
        match addr {
            0xFC00..=0xFCFF if self.suzy_visible && master != BusMaster::SpriteDma => {
                let off = addr as u8;
                if !self.suzy.write(off, data) {
                    self.timeline
                        .record(self.master_cycles, HwEvent::UnmappedWrite { addr, data });
                }
                self.service_sprite_go();
            }
            0xFD00..=0xFDFF if self.mikey_visible && master != BusMaster::SpriteDma => {
                let off = addr as u8;
                if !self.mikey.write(off, data) {
                    self.timeline
                        .record(self.master_cycles, HwEvent::UnmappedWrite { addr, data });
                }
                // SYSCTL1 and IODAT drive the cart port pins.
                if off == 0x87 || off == 0x8B {
                    self.sync_cart_pins();
                }
            }
            MAPCTL_ADDRESS => self.update_mapctl(data),
            // ROM and vector space have no write side: the store lands
            // in the RAM underneath, overlay or not.
            _ => self.ram[addr as usize] = data,
        }
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        // Sprite chains run atomically between instructions; the stall
        // is charged as cycles instead of a halted bus.
        false
    }

    fn check_interrupts(&self, target: BusMaster) -> InterruptState {
        match target {
            BusMaster::Cpu => InterruptState {
                nmi: false,
                irq: self.mikey.irq_asserted(),
            },
            _ => InterruptState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> LynxBus {
        LynxBus::new(44_100)
    }

    #[test]
    fn ram_visible_below_overlays() {
        let mut b = bus();
        b.write(BusMaster::Cpu, 0x1234, 0xAB);
        assert_eq!(b.read(BusMaster::Cpu, 0x1234), 0xAB);
    }

    #[test]
    fn mapctl_bit2_is_vectors_bit3_is_rom() {
        let mut b = bus();
        b.boot_rom[0x1FE] = 0x34; // $FFFC reset vector low
        b.boot_rom[0x000] = 0x77; // $FE00
        b.ram[0xFFFC] = 0x99;
        b.ram[0xFE00] = 0x11;

        // Both overlays on: ROM and vectors both come from boot ROM.
        b.update_mapctl(0);
        assert_eq!(b.read(BusMaster::Cpu, 0xFE00), 0x77);
        assert_eq!(b.read(BusMaster::Cpu, 0xFFFC), 0x34);

        // Bit 3 disables the ROM body but NOT the vectors.
        b.update_mapctl(MAPCTL_ROM_DISABLE);
        assert_eq!(b.read(BusMaster::Cpu, 0xFE00), 0x11);
        assert_eq!(b.read(BusMaster::Cpu, 0xFFFC), 0x34);

        // Bit 2 disables the vectors but NOT the ROM body.
        b.update_mapctl(MAPCTL_VECTOR_DISABLE);
        assert_eq!(b.read(BusMaster::Cpu, 0xFE00), 0x77);
        assert_eq!(b.read(BusMaster::Cpu, 0xFFFC), 0x99);
    }

    #[test]
    fn mapctl_reads_back_at_fff9() {
        let mut b = bus();
        b.write(BusMaster::Cpu, MAPCTL_ADDRESS, 0x0F);
        assert_eq!(b.read(BusMaster::Cpu, MAPCTL_ADDRESS), 0x0F);
        // And the byte never lands in RAM.
        assert_eq!(b.ram[MAPCTL_ADDRESS as usize], 0xFF);
    }

    #[test]
    fn suzy_overlay_disable_exposes_ram() {
        let mut b = bus();
        b.ram[0xFCB0] = 0x5C;
        b.update_mapctl(MAPCTL_SUZY_DISABLE);
        assert_eq!(b.read(BusMaster::Cpu, 0xFCB0), 0x5C);
        b.update_mapctl(0);
        // Joystick register, all released (active-low)
        assert_eq!(b.read(BusMaster::Cpu, 0xFCB0), 0xFF);
    }

    #[test]
    fn rom_region_write_lands_in_underlying_ram() {
        let mut b = bus();
        b.update_mapctl(0); // ROM overlay visible
        b.write(BusMaster::Cpu, 0xFE10, 0x42);
        assert_eq!(b.ram[0xFE10], 0x42);
        // Read still sees the ROM overlay.
        assert_eq!(b.read(BusMaster::Cpu, 0xFE10), b.boot_rom[0x10]);
    }

    #[test]
    fn unmapped_mikey_read_returns_open_bus() {
        let mut b = bus();
        // Seed the open bus with a known value.
        b.ram[0x2000] = 0x6D;
        b.read(BusMaster::Cpu, 0x2000);
        // $FD70 is a reserved Mikey offset.
        assert_eq!(b.read(BusMaster::Cpu, 0xFD70), 0x6D);
    }

    #[test]
    fn unmapped_register_write_is_accepted_and_logged() {
        let mut b = bus();
        b.timeline.set_enabled(true);
        b.write(BusMaster::Cpu, 0xFD70, 0x12);
        let events = b.timeline.entries();
        assert!(events.iter().any(|e| matches!(
            e.event,
            HwEvent::UnmappedWrite { addr: 0xFD70, data: 0x12 }
        )));
    }

    #[test]
    fn peek_does_not_disturb_open_bus() {
        let b_open = {
            let mut b = bus();
            b.ram[0x2000] = 0x6D;
            b.read(BusMaster::Cpu, 0x2000);
            let _ = b.peek(0xFD70);
            b.peek(0xFD70)
        };
        assert_eq!(b_open, 0x6D);
    }

    #[test]
    fn sprite_dma_always_sees_ram() {
        let mut b = bus();
        b.ram[0xFC10] = 0x3C;
        // Overlay enabled for the CPU, but sprite fetches bypass it.
        assert_eq!(b.read(BusMaster::SpriteDma, 0xFC10), 0x3C);
    }
}
