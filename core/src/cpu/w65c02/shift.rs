use super::{AddrMode, StatusFlag, W65c02};
use crate::core::{Bus, BusMaster};

impl W65c02 {
    // ---- Shift/rotate primitives ----

    #[inline]
    pub(crate) fn perform_asl(&mut self, value: u8) -> u8 {
        let result = value << 1;
        self.set_flag(StatusFlag::C, value & 0x80 != 0);
        self.set_nz(result);
        result
    }

    #[inline]
    pub(crate) fn perform_lsr(&mut self, value: u8) -> u8 {
        let result = value >> 1;
        self.set_flag(StatusFlag::C, value & 0x01 != 0);
        self.set_nz(result);
        result
    }

    #[inline]
    pub(crate) fn perform_rol(&mut self, value: u8) -> u8 {
        let carry_in = self.flag(StatusFlag::C) as u8;
        let result = (value << 1) | carry_in;
        self.set_flag(StatusFlag::C, value & 0x80 != 0);
        self.set_nz(result);
        result
    }

    #[inline]
    pub(crate) fn perform_ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.flag(StatusFlag::C) as u8) << 7;
        let result = (value >> 1) | carry_in;
        self.set_flag(StatusFlag::C, value & 0x01 != 0);
        self.set_nz(result);
        result
    }

    /// Shift read-modify-write cycle counts: zp 5, zp,X 6, abs 6,
    /// abs,X 6 plus one for a page crossing (CMOS timing).
    fn shift_rmw<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
        f: fn(&mut Self, u8) -> u8,
    ) -> u64 {
        let (addr, crossed) = self.ea(bus, master, mode);
        let value = bus.read(master, addr);
        let result = f(self, value);
        bus.write(master, addr, result);
        match mode {
            AddrMode::Zp => 5,
            AddrMode::ZpX | AddrMode::Abs => 6,
            AddrMode::AbsX => 6 + crossed as u64,
            _ => unreachable!("shift addressing mode"),
        }
    }

    // ---- Dispatch targets ----

    pub(crate) fn op_asl_a(&mut self) -> u64 {
        self.a = self.perform_asl(self.a);
        2
    }

    pub(crate) fn op_lsr_a(&mut self) -> u64 {
        self.a = self.perform_lsr(self.a);
        2
    }

    pub(crate) fn op_rol_a(&mut self) -> u64 {
        self.a = self.perform_rol(self.a);
        2
    }

    pub(crate) fn op_ror_a(&mut self) -> u64 {
        self.a = self.perform_ror(self.a);
        2
    }

    pub(crate) fn op_asl<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        self.shift_rmw(bus, master, mode, Self::perform_asl)
    }

    pub(crate) fn op_lsr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        self.shift_rmw(bus, master, mode, Self::perform_lsr)
    }

    pub(crate) fn op_rol<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        self.shift_rmw(bus, master, mode, Self::perform_rol)
    }

    pub(crate) fn op_ror<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        self.shift_rmw(bus, master, mode, Self::perform_ror)
    }
}
