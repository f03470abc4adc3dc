use super::{StatusFlag, VECTOR_IRQ, W65c02};
use crate::core::{Bus, BusMaster};

impl W65c02 {
    /// PHA/PHX/PHY — 3 cycles, no flags.
    pub(crate) fn op_push_reg<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        value: u8,
    ) -> u64 {
        self.push(bus, master, value);
        3
    }

    /// PHP — 3 cycles. Software pushes always show B and U set.
    pub(crate) fn op_php<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let value = self.p | (StatusFlag::B as u8) | (StatusFlag::U as u8);
        self.push(bus, master, value);
        3
    }

    /// PLA — 4 cycles, sets N and Z.
    pub(crate) fn op_pla<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        self.a = self.pop(bus, master);
        self.set_nz(self.a);
        4
    }

    /// PLX — 4 cycles, sets N and Z (CMOS addition).
    pub(crate) fn op_plx<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        self.x = self.pop(bus, master);
        self.set_nz(self.x);
        4
    }

    /// PLY — 4 cycles, sets N and Z (CMOS addition).
    pub(crate) fn op_ply<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        self.y = self.pop(bus, master);
        self.set_nz(self.y);
        4
    }

    /// PLP — 4 cycles. B has no storage in the register; U reads as 1.
    pub(crate) fn op_plp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let value = self.pop(bus, master);
        self.p = (value & !(StatusFlag::B as u8)) | (StatusFlag::U as u8);
        4
    }

    /// JSR — 6 cycles. Pushes the address of the last byte of the JSR.
    pub(crate) fn op_jsr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let target = self.fetch16(bus, master);
        let ret = self.pc.wrapping_sub(1);
        self.push(bus, master, (ret >> 8) as u8);
        self.push(bus, master, ret as u8);
        self.pc = target;
        6
    }

    /// RTS — 6 cycles. Pops return address and resumes past it.
    pub(crate) fn op_rts<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let lo = self.pop(bus, master) as u16;
        let hi = self.pop(bus, master) as u16;
        self.pc = ((hi << 8) | lo).wrapping_add(1);
        6
    }

    /// RTI — 6 cycles. Pops P (B squashed, U forced), then PC.
    pub(crate) fn op_rti<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let p = self.pop(bus, master);
        self.p = (p & !(StatusFlag::B as u8)) | (StatusFlag::U as u8);
        let lo = self.pop(bus, master) as u16;
        let hi = self.pop(bus, master) as u16;
        self.pc = (hi << 8) | lo;
        6
    }

    /// BRK — 7 cycles. Pushes PC+2 and P with both B and U set, then
    /// vectors through $FFFE with I set and D cleared (CMOS).
    pub(crate) fn op_brk<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        // Padding byte after the opcode is fetched and discarded
        let _ = self.fetch8(bus, master);
        self.push(bus, master, (self.pc >> 8) as u8);
        self.push(bus, master, self.pc as u8);
        let pushed = self.p | (StatusFlag::B as u8) | (StatusFlag::U as u8);
        self.push(bus, master, pushed);
        self.set_flag(StatusFlag::I, true);
        self.set_flag(StatusFlag::D, false);
        let lo = bus.read(master, VECTOR_IRQ) as u16;
        let hi = bus.read(master, VECTOR_IRQ + 1) as u16;
        self.pc = (hi << 8) | lo;
        7
    }
}
