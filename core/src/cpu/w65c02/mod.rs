mod alu;
mod branch;
pub mod disasm;
mod load_store;
mod shift;
mod stack;
mod unary;

use crate::core::snapshot::Snapshot;
use crate::core::{
    Bus, BusMaster,
    bus::InterruptState,
    component::{BusMasterComponent, Component},
};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, StopState, W65c02State},
};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break
    U = 0x20, // Unused (always 1)
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

/// Interrupt vectors. NMI is wired on the 65C02 but unused on the Lynx.
pub const VECTOR_NMI: u16 = 0xFFFA;
pub const VECTOR_RESET: u16 = 0xFFFC;
pub const VECTOR_IRQ: u16 = 0xFFFE;

/// Addressing mode of a data operand.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum AddrMode {
    Imm,
    Zp,
    ZpX,
    ZpY,
    Abs,
    AbsX,
    AbsY,
    IndX,
    IndY,
    ZpInd, // (zp) — CMOS addition
}

/// WDC 65C02 (CMOS, with the Rockwell bit-manipulation extensions).
///
/// Instruction-stepped: `step()` executes one whole instruction (or one
/// interrupt sequence) and returns the CPU cycles it consumed. The Lynx
/// charges four master-clock cycles per CPU cycle.
pub struct W65c02 {
    // Registers
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,

    /// Total CPU cycles executed since reset.
    pub cycles: u64,

    /// Running / WaitingForIrq (WAI) / Stopped (STP).
    pub stop: StopState,

    /// Level of the IRQ input pin, refreshed from the bus each step.
    pub irq_line: bool,
}

impl Default for W65c02 {
    fn default() -> Self {
        Self::new()
    }
}

impl W65c02 {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            p: 0x24, // I=1, U=1
            cycles: 0,
            stop: StopState::Running,
            irq_line: false,
        }
    }

    #[inline]
    pub fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        // Branchless form; proven equal to the if/else form for all
        // 256 x 8 x 2 inputs by the exhaustive flag test.
        let mask = flag as u8;
        self.p = (self.p & !mask) | ((set as u8).wrapping_neg() & mask);
    }

    #[inline]
    pub fn flag(&self, flag: StatusFlag) -> bool {
        self.p & (flag as u8) != 0
    }

    /// Set N, Z flags from result (loads, transfers, logical ops).
    #[inline]
    pub(crate) fn set_nz(&mut self, result: u8) {
        self.set_flag(StatusFlag::N, result & 0x80 != 0);
        self.set_flag(StatusFlag::Z, result == 0);
    }

    /// Drive the IRQ input pin directly (the console mirrors Mikey's
    /// interrupt output here; tests use it standalone).
    pub fn assert_irq(&mut self, level: bool) {
        self.irq_line = level;
    }

    // ---- Operand fetch ----

    #[inline]
    pub(crate) fn fetch8<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u8 {
        let v = bus.read(master, self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    #[inline]
    pub(crate) fn fetch16<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u16 {
        let lo = self.fetch8(bus, master) as u16;
        let hi = self.fetch8(bus, master) as u16;
        (hi << 8) | lo
    }

    /// Resolve a data operand's effective address. Returns the address and
    /// whether an indexed access crossed a page boundary (the read classes
    /// pay one extra cycle for the crossing; stores pay it always).
    pub(crate) fn ea<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> (u16, bool) {
        match mode {
            AddrMode::Imm => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            AddrMode::Zp => (self.fetch8(bus, master) as u16, false),
            AddrMode::ZpX => ((self.fetch8(bus, master).wrapping_add(self.x)) as u16, false),
            AddrMode::ZpY => ((self.fetch8(bus, master).wrapping_add(self.y)) as u16, false),
            AddrMode::Abs => (self.fetch16(bus, master), false),
            AddrMode::AbsX => {
                let base = self.fetch16(bus, master);
                let addr = base.wrapping_add(self.x as u16);
                (addr, (base ^ addr) & 0xFF00 != 0)
            }
            AddrMode::AbsY => {
                let base = self.fetch16(bus, master);
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base ^ addr) & 0xFF00 != 0)
            }
            AddrMode::IndX => {
                let zp = self.fetch8(bus, master).wrapping_add(self.x);
                let lo = bus.read(master, zp as u16) as u16;
                let hi = bus.read(master, zp.wrapping_add(1) as u16) as u16;
                ((hi << 8) | lo, false)
            }
            AddrMode::IndY => {
                let zp = self.fetch8(bus, master);
                let lo = bus.read(master, zp as u16) as u16;
                let hi = bus.read(master, zp.wrapping_add(1) as u16) as u16;
                let base = (hi << 8) | lo;
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base ^ addr) & 0xFF00 != 0)
            }
            AddrMode::ZpInd => {
                let zp = self.fetch8(bus, master);
                let lo = bus.read(master, zp as u16) as u16;
                let hi = bus.read(master, zp.wrapping_add(1) as u16) as u16;
                ((hi << 8) | lo, false)
            }
        }
    }

    /// Read an operand and return (value, cycles) for the read class
    /// (loads, ALU, compares): page crossings cost one extra cycle.
    pub(crate) fn read_operand<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> (u8, u64) {
        let (addr, crossed) = self.ea(bus, master, mode);
        let value = bus.read(master, addr);
        let base = match mode {
            AddrMode::Imm => 2,
            AddrMode::Zp => 3,
            AddrMode::ZpX | AddrMode::ZpY | AddrMode::Abs => 4,
            AddrMode::AbsX | AddrMode::AbsY => 4,
            AddrMode::IndX => 6,
            AddrMode::IndY | AddrMode::ZpInd => 5,
        };
        (value, base + crossed as u64)
    }

    /// Resolve a store destination and return (addr, cycles). Stores
    /// always pay the indexed fix-up cycle.
    pub(crate) fn store_addr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> (u16, u64) {
        let (addr, _) = self.ea(bus, master, mode);
        let cycles = match mode {
            AddrMode::Zp => 3,
            AddrMode::ZpX | AddrMode::ZpY | AddrMode::Abs => 4,
            AddrMode::AbsX | AddrMode::AbsY => 5,
            AddrMode::IndX => 6,
            AddrMode::IndY => 6,
            AddrMode::ZpInd => 5,
            AddrMode::Imm => unreachable!("store to immediate"),
        };
        (addr, cycles)
    }

    // ---- Stack primitives ----

    #[inline]
    pub(crate) fn push<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        value: u8,
    ) {
        bus.write(master, 0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub(crate) fn pop<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(master, 0x0100 | self.sp as u16)
    }

    // ---- Execution ----

    /// Execute one instruction (or service one interrupt) and return the
    /// CPU cycles consumed. While halted by WAI/STP the CPU idles one
    /// cycle per call.
    pub fn step<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        // The pin follows the bus level; assert_irq() covers one step
        // for callers driving the line directly.
        let ints = bus.check_interrupts(master);
        let irq_pending = ints.irq || self.irq_line;
        self.irq_line = ints.irq;

        match self.stop {
            StopState::Stopped => {
                // STP: dead until hardware reset.
                self.cycles += 1;
                return 1;
            }
            StopState::WaitingForIrq => {
                if !irq_pending {
                    self.cycles += 1;
                    return 1;
                }
                // Any pending IRQ wakes WAI, even with I set; when masked,
                // execution resumes after the WAI without vectoring.
                self.stop = StopState::Running;
            }
            StopState::Running => {}
        }

        if irq_pending && !self.flag(StatusFlag::I) {
            let c = self.service_irq(bus, master);
            self.cycles += c;
            return c;
        }

        let opcode = self.fetch8(bus, master);
        let c = self.execute(opcode, bus, master);
        self.cycles += c;
        c
    }

    /// Hardware interrupt entry: 7 cycles. Pushes PC then PS with the
    /// Break bit cleared and Reserved set — `(PS & ~B) | U`, fully
    /// parenthesized: `&` binds tighter than `|`, and the unparenthesized
    /// form degenerates to `PS | U`.
    fn service_irq<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        self.push(bus, master, (self.pc >> 8) as u8);
        self.push(bus, master, self.pc as u8);
        let pushed = (self.p & !(StatusFlag::B as u8)) | (StatusFlag::U as u8);
        self.push(bus, master, pushed);
        self.set_flag(StatusFlag::I, true);
        self.set_flag(StatusFlag::D, false); // CMOS clears D on interrupt entry
        let lo = bus.read(master, VECTOR_IRQ) as u16;
        let hi = bus.read(master, VECTOR_IRQ + 1) as u16;
        self.pc = (hi << 8) | lo;
        7
    }

    fn execute<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        use AddrMode::*;
        match opcode {
            // --- LDA ---
            0xA9 => self.op_lda(bus, master, Imm),
            0xA5 => self.op_lda(bus, master, Zp),
            0xB5 => self.op_lda(bus, master, ZpX),
            0xAD => self.op_lda(bus, master, Abs),
            0xBD => self.op_lda(bus, master, AbsX),
            0xB9 => self.op_lda(bus, master, AbsY),
            0xA1 => self.op_lda(bus, master, IndX),
            0xB1 => self.op_lda(bus, master, IndY),
            0xB2 => self.op_lda(bus, master, ZpInd),

            // --- LDX ---
            0xA2 => self.op_ldx(bus, master, Imm),
            0xA6 => self.op_ldx(bus, master, Zp),
            0xB6 => self.op_ldx(bus, master, ZpY),
            0xAE => self.op_ldx(bus, master, Abs),
            0xBE => self.op_ldx(bus, master, AbsY),

            // --- LDY ---
            0xA0 => self.op_ldy(bus, master, Imm),
            0xA4 => self.op_ldy(bus, master, Zp),
            0xB4 => self.op_ldy(bus, master, ZpX),
            0xAC => self.op_ldy(bus, master, Abs),
            0xBC => self.op_ldy(bus, master, AbsX),

            // --- STA ---
            0x85 => self.op_sta(bus, master, Zp),
            0x95 => self.op_sta(bus, master, ZpX),
            0x8D => self.op_sta(bus, master, Abs),
            0x9D => self.op_sta(bus, master, AbsX),
            0x99 => self.op_sta(bus, master, AbsY),
            0x81 => self.op_sta(bus, master, IndX),
            0x91 => self.op_sta(bus, master, IndY),
            0x92 => self.op_sta(bus, master, ZpInd),

            // --- STX / STY / STZ ---
            0x86 => self.op_stx(bus, master, Zp),
            0x96 => self.op_stx(bus, master, ZpY),
            0x8E => self.op_stx(bus, master, Abs),
            0x84 => self.op_sty(bus, master, Zp),
            0x94 => self.op_sty(bus, master, ZpX),
            0x8C => self.op_sty(bus, master, Abs),
            0x64 => self.op_stz(bus, master, Zp),
            0x74 => self.op_stz(bus, master, ZpX),
            0x9C => self.op_stz(bus, master, Abs),
            0x9E => self.op_stz(bus, master, AbsX),

            // --- ADC ---
            0x69 => self.op_adc(bus, master, Imm),
            0x65 => self.op_adc(bus, master, Zp),
            0x75 => self.op_adc(bus, master, ZpX),
            0x6D => self.op_adc(bus, master, Abs),
            0x7D => self.op_adc(bus, master, AbsX),
            0x79 => self.op_adc(bus, master, AbsY),
            0x61 => self.op_adc(bus, master, IndX),
            0x71 => self.op_adc(bus, master, IndY),
            0x72 => self.op_adc(bus, master, ZpInd),

            // --- SBC ---
            0xE9 => self.op_sbc(bus, master, Imm),
            0xE5 => self.op_sbc(bus, master, Zp),
            0xF5 => self.op_sbc(bus, master, ZpX),
            0xED => self.op_sbc(bus, master, Abs),
            0xFD => self.op_sbc(bus, master, AbsX),
            0xF9 => self.op_sbc(bus, master, AbsY),
            0xE1 => self.op_sbc(bus, master, IndX),
            0xF1 => self.op_sbc(bus, master, IndY),
            0xF2 => self.op_sbc(bus, master, ZpInd),

            // --- CMP ---
            0xC9 => self.op_cmp(bus, master, Imm),
            0xC5 => self.op_cmp(bus, master, Zp),
            0xD5 => self.op_cmp(bus, master, ZpX),
            0xCD => self.op_cmp(bus, master, Abs),
            0xDD => self.op_cmp(bus, master, AbsX),
            0xD9 => self.op_cmp(bus, master, AbsY),
            0xC1 => self.op_cmp(bus, master, IndX),
            0xD1 => self.op_cmp(bus, master, IndY),
            0xD2 => self.op_cmp(bus, master, ZpInd),

            // --- CPX / CPY ---
            0xE0 => self.op_cpx(bus, master, Imm),
            0xE4 => self.op_cpx(bus, master, Zp),
            0xEC => self.op_cpx(bus, master, Abs),
            0xC0 => self.op_cpy(bus, master, Imm),
            0xC4 => self.op_cpy(bus, master, Zp),
            0xCC => self.op_cpy(bus, master, Abs),

            // --- AND ---
            0x29 => self.op_and(bus, master, Imm),
            0x25 => self.op_and(bus, master, Zp),
            0x35 => self.op_and(bus, master, ZpX),
            0x2D => self.op_and(bus, master, Abs),
            0x3D => self.op_and(bus, master, AbsX),
            0x39 => self.op_and(bus, master, AbsY),
            0x21 => self.op_and(bus, master, IndX),
            0x31 => self.op_and(bus, master, IndY),
            0x32 => self.op_and(bus, master, ZpInd),

            // --- ORA ---
            0x09 => self.op_ora(bus, master, Imm),
            0x05 => self.op_ora(bus, master, Zp),
            0x15 => self.op_ora(bus, master, ZpX),
            0x0D => self.op_ora(bus, master, Abs),
            0x1D => self.op_ora(bus, master, AbsX),
            0x19 => self.op_ora(bus, master, AbsY),
            0x01 => self.op_ora(bus, master, IndX),
            0x11 => self.op_ora(bus, master, IndY),
            0x12 => self.op_ora(bus, master, ZpInd),

            // --- EOR ---
            0x49 => self.op_eor(bus, master, Imm),
            0x45 => self.op_eor(bus, master, Zp),
            0x55 => self.op_eor(bus, master, ZpX),
            0x4D => self.op_eor(bus, master, Abs),
            0x5D => self.op_eor(bus, master, AbsX),
            0x59 => self.op_eor(bus, master, AbsY),
            0x41 => self.op_eor(bus, master, IndX),
            0x51 => self.op_eor(bus, master, IndY),
            0x52 => self.op_eor(bus, master, ZpInd),

            // --- BIT ---
            0x89 => self.op_bit_imm(bus, master),
            0x24 => self.op_bit(bus, master, Zp),
            0x34 => self.op_bit(bus, master, ZpX),
            0x2C => self.op_bit(bus, master, Abs),
            0x3C => self.op_bit(bus, master, AbsX),

            // --- TRB / TSB ---
            0x14 => self.op_trb(bus, master, Zp),
            0x1C => self.op_trb(bus, master, Abs),
            0x04 => self.op_tsb(bus, master, Zp),
            0x0C => self.op_tsb(bus, master, Abs),

            // --- ASL ---
            0x0A => self.op_asl_a(),
            0x06 => self.op_asl(bus, master, Zp),
            0x16 => self.op_asl(bus, master, ZpX),
            0x0E => self.op_asl(bus, master, Abs),
            0x1E => self.op_asl(bus, master, AbsX),

            // --- LSR ---
            0x4A => self.op_lsr_a(),
            0x46 => self.op_lsr(bus, master, Zp),
            0x56 => self.op_lsr(bus, master, ZpX),
            0x4E => self.op_lsr(bus, master, Abs),
            0x5E => self.op_lsr(bus, master, AbsX),

            // --- ROL ---
            0x2A => self.op_rol_a(),
            0x26 => self.op_rol(bus, master, Zp),
            0x36 => self.op_rol(bus, master, ZpX),
            0x2E => self.op_rol(bus, master, Abs),
            0x3E => self.op_rol(bus, master, AbsX),

            // --- ROR ---
            0x6A => self.op_ror_a(),
            0x66 => self.op_ror(bus, master, Zp),
            0x76 => self.op_ror(bus, master, ZpX),
            0x6E => self.op_ror(bus, master, Abs),
            0x7E => self.op_ror(bus, master, AbsX),

            // --- INC / DEC ---
            0x1A => self.op_inc_a(),
            0x3A => self.op_dec_a(),
            0xE6 => self.op_inc(bus, master, Zp),
            0xF6 => self.op_inc(bus, master, ZpX),
            0xEE => self.op_inc(bus, master, Abs),
            0xFE => self.op_inc(bus, master, AbsX),
            0xC6 => self.op_dec(bus, master, Zp),
            0xD6 => self.op_dec(bus, master, ZpX),
            0xCE => self.op_dec(bus, master, Abs),
            0xDE => self.op_dec(bus, master, AbsX),

            // --- RMB / SMB (Rockwell) ---
            0x07 | 0x17 | 0x27 | 0x37 | 0x47 | 0x57 | 0x67 | 0x77 => {
                self.op_rmb(bus, master, opcode >> 4)
            }
            0x87 | 0x97 | 0xA7 | 0xB7 | 0xC7 | 0xD7 | 0xE7 | 0xF7 => {
                self.op_smb(bus, master, (opcode >> 4) & 0x07)
            }

            // --- Flag instructions (2-cycle implied) ---
            0x18 => self.op_set_flag(StatusFlag::C, false),
            0x38 => self.op_set_flag(StatusFlag::C, true),
            0x58 => self.op_set_flag(StatusFlag::I, false),
            0x78 => self.op_set_flag(StatusFlag::I, true),
            0xB8 => self.op_set_flag(StatusFlag::V, false),
            0xD8 => self.op_set_flag(StatusFlag::D, false),
            0xF8 => self.op_set_flag(StatusFlag::D, true),

            // --- Transfers (2-cycle implied) ---
            0xAA => self.op_transfer(TransferKind::Tax),
            0xA8 => self.op_transfer(TransferKind::Tay),
            0x8A => self.op_transfer(TransferKind::Txa),
            0x98 => self.op_transfer(TransferKind::Tya),
            0xBA => self.op_transfer(TransferKind::Tsx),
            0x9A => self.op_transfer(TransferKind::Txs),

            // --- Register inc/dec (2-cycle implied) ---
            0xE8 => {
                self.x = self.x.wrapping_add(1);
                self.set_nz(self.x);
                2
            }
            0xC8 => {
                self.y = self.y.wrapping_add(1);
                self.set_nz(self.y);
                2
            }
            0xCA => {
                self.x = self.x.wrapping_sub(1);
                self.set_nz(self.x);
                2
            }
            0x88 => {
                self.y = self.y.wrapping_sub(1);
                self.set_nz(self.y);
                2
            }

            // --- Branches ---
            0x10 => self.op_branch(bus, master, !self.flag(StatusFlag::N)),
            0x30 => self.op_branch(bus, master, self.flag(StatusFlag::N)),
            0x50 => self.op_branch(bus, master, !self.flag(StatusFlag::V)),
            0x70 => self.op_branch(bus, master, self.flag(StatusFlag::V)),
            0x90 => self.op_branch(bus, master, !self.flag(StatusFlag::C)),
            0xB0 => self.op_branch(bus, master, self.flag(StatusFlag::C)),
            0xD0 => self.op_branch(bus, master, !self.flag(StatusFlag::Z)),
            0xF0 => self.op_branch(bus, master, self.flag(StatusFlag::Z)),
            0x80 => self.op_branch(bus, master, true), // BRA

            // --- Bit branches (Rockwell) ---
            0x0F | 0x1F | 0x2F | 0x3F | 0x4F | 0x5F | 0x6F | 0x7F => {
                self.op_bbr(bus, master, opcode >> 4)
            }
            0x8F | 0x9F | 0xAF | 0xBF | 0xCF | 0xDF | 0xEF | 0xFF => {
                self.op_bbs(bus, master, (opcode >> 4) & 0x07)
            }

            // --- Jumps ---
            0x4C => self.op_jmp_abs(bus, master),
            0x6C => self.op_jmp_ind(bus, master),
            0x7C => self.op_jmp_abs_x_ind(bus, master),
            0x20 => self.op_jsr(bus, master),
            0x60 => self.op_rts(bus, master),
            0x40 => self.op_rti(bus, master),

            // --- Stack ---
            0x48 => self.op_push_reg(bus, master, self.a),
            0xDA => self.op_push_reg(bus, master, self.x),
            0x5A => self.op_push_reg(bus, master, self.y),
            0x08 => self.op_php(bus, master),
            0x68 => self.op_pla(bus, master),
            0xFA => self.op_plx(bus, master),
            0x7A => self.op_ply(bus, master),
            0x28 => self.op_plp(bus, master),

            // --- BRK ---
            0x00 => self.op_brk(bus, master),

            // --- WAI / STP ---
            0xCB => {
                self.stop = StopState::WaitingForIrq;
                3
            }
            0xDB => {
                self.stop = StopState::Stopped;
                3
            }

            // --- NOPs, documented multi-byte forms first ---
            0xEA => 2,
            0x5C => {
                // 3 bytes, 8 cycles
                self.pc = self.pc.wrapping_add(2);
                8
            }
            0xDC | 0xFC => {
                // 3 bytes, 4 cycles
                self.pc = self.pc.wrapping_add(2);
                4
            }
            0x02 | 0x22 | 0x42 | 0x62 | 0x82 | 0xC2 | 0xE2 => {
                // 2 bytes, 2 cycles
                self.pc = self.pc.wrapping_add(1);
                2
            }
            0x44 => {
                self.pc = self.pc.wrapping_add(1);
                3
            }
            0x54 | 0xD4 | 0xF4 => {
                self.pc = self.pc.wrapping_add(1);
                4
            }

            // Remaining undefined opcodes are 1-byte, 1-cycle NOPs on CMOS
            _ => 1,
        }
    }

    fn op_set_flag(&mut self, flag: StatusFlag, value: bool) -> u64 {
        self.set_flag(flag, value);
        2
    }

    fn op_transfer(&mut self, kind: TransferKind) -> u64 {
        match kind {
            TransferKind::Tax => {
                self.x = self.a;
                self.set_nz(self.x);
            }
            TransferKind::Tay => {
                self.y = self.a;
                self.set_nz(self.y);
            }
            TransferKind::Txa => {
                self.a = self.x;
                self.set_nz(self.a);
            }
            TransferKind::Tya => {
                self.a = self.y;
                self.set_nz(self.a);
            }
            TransferKind::Tsx => {
                self.x = self.sp;
                self.set_nz(self.x);
            }
            // TXS does not touch flags
            TransferKind::Txs => self.sp = self.x,
        }
        2
    }

    /// Visit every field that affects future behavior, in fixed order.
    pub fn serialize<S: Snapshot>(&mut self, s: &mut S) {
        s.u8(&mut self.a);
        s.u8(&mut self.x);
        s.u8(&mut self.y);
        s.u16(&mut self.pc);
        s.u8(&mut self.sp);
        s.u8(&mut self.p);
        s.u64(&mut self.cycles);
        let mut stop = self.stop.to_u8();
        s.u8(&mut stop);
        if s.is_reading() {
            self.stop = StopState::from_u8(stop).unwrap_or(StopState::Running);
        }
        s.bool(&mut self.irq_line);
    }
}

#[derive(Copy, Clone)]
enum TransferKind {
    Tax,
    Tay,
    Txa,
    Tya,
    Tsx,
    Txs,
}

impl Component for W65c02 {
    fn tick(&mut self) -> bool {
        false
    }

    fn clock_divider(&self) -> u64 {
        // The Lynx master clock runs at 16 MHz; the CPU at 4 MHz.
        4
    }
}

impl BusMasterComponent for W65c02 {
    type Bus = dyn Bus<Address = u16, Data = u8>;

    fn step_with_bus(&mut self, bus: &mut Self::Bus, master: BusMaster) -> u64 {
        self.step(bus, master)
    }
}

impl Cpu for W65c02 {
    fn reset(&mut self) {
        self.sp = 0xFD;
        self.p = 0x24;
        self.pc = 0;
        self.cycles = 0;
        self.stop = StopState::Running;
        self.irq_line = false;
    }

    fn signal_interrupt(&mut self, int: InterruptState) {
        self.irq_line = int.irq;
    }

    fn is_sleeping(&self) -> bool {
        self.stop != StopState::Running
    }
}

impl W65c02 {
    /// Overwrite the register file from a snapshot (debugger poke path,
    /// the inverse of `snapshot()`).
    pub fn restore(&mut self, state: &W65c02State) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.pc = state.pc;
        self.sp = state.sp;
        self.p = state.p;
        self.cycles = state.cycles;
        self.stop = state.stop;
        self.irq_line = state.irq_line;
    }
}

impl CpuStateTrait for W65c02 {
    type Snapshot = W65c02State;

    fn snapshot(&self) -> W65c02State {
        W65c02State {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.p,
            cycles: self.cycles,
            stop: self.stop,
            irq_line: self.irq_line,
        }
    }
}
