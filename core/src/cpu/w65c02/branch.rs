use super::W65c02;
use crate::core::{Bus, BusMaster};

impl W65c02 {
    /// Conditional branch (also BRA with `condition = true`). Timing:
    /// 2 cycles not taken, 3 taken, 4 taken across a page boundary.
    pub(crate) fn op_branch<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        condition: bool,
    ) -> u64 {
        let offset = self.fetch8(bus, master) as i8;
        if !condition {
            return 2;
        }
        let target = self.pc.wrapping_add(offset as u16);
        let crossed = (self.pc ^ target) & 0xFF00 != 0;
        self.pc = target;
        3 + crossed as u64
    }

    /// BBR n: branch if bit n of a zero-page byte is clear (Rockwell).
    /// 5 cycles, plus the taken/page-cross adjustments.
    pub(crate) fn op_bbr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        bit: u8,
    ) -> u64 {
        let zp = self.fetch8(bus, master) as u16;
        let value = bus.read(master, zp);
        3 + self.op_branch(bus, master, value & (1 << bit) == 0)
    }

    /// BBS n: branch if bit n of a zero-page byte is set (Rockwell).
    pub(crate) fn op_bbs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        bit: u8,
    ) -> u64 {
        let zp = self.fetch8(bus, master) as u16;
        let value = bus.read(master, zp);
        3 + self.op_branch(bus, master, value & (1 << bit) != 0)
    }

    /// JMP absolute — 3 cycles.
    pub(crate) fn op_jmp_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        self.pc = self.fetch16(bus, master);
        3
    }

    /// JMP (indirect) — 6 cycles. The CMOS part reads the high pointer
    /// byte from the next sequential address, fixing the NMOS $xxFF
    /// page-wrap bug.
    pub(crate) fn op_jmp_ind<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let ptr = self.fetch16(bus, master);
        let lo = bus.read(master, ptr) as u16;
        let hi = bus.read(master, ptr.wrapping_add(1)) as u16;
        self.pc = (hi << 8) | lo;
        6
    }

    /// JMP (absolute,X) — 6 cycles (CMOS addition, used for jump tables).
    pub(crate) fn op_jmp_abs_x_ind<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let ptr = self.fetch16(bus, master).wrapping_add(self.x as u16);
        let lo = bus.read(master, ptr) as u16;
        let hi = bus.read(master, ptr.wrapping_add(1)) as u16;
        self.pc = (hi << 8) | lo;
        6
    }
}
