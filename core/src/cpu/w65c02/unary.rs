use super::{AddrMode, W65c02};
use crate::core::{Bus, BusMaster};

impl W65c02 {
    pub(crate) fn op_inc_a(&mut self) -> u64 {
        self.a = self.a.wrapping_add(1);
        self.set_nz(self.a);
        2
    }

    pub(crate) fn op_dec_a(&mut self) -> u64 {
        self.a = self.a.wrapping_sub(1);
        self.set_nz(self.a);
        2
    }

    /// INC/DEC memory cycle counts: zp 5, zp,X 6, abs 6, abs,X 7
    /// (no page-cross discount for these two, unlike the shifts).
    fn inc_dec_cycles(mode: AddrMode) -> u64 {
        match mode {
            AddrMode::Zp => 5,
            AddrMode::ZpX | AddrMode::Abs => 6,
            AddrMode::AbsX => 7,
            _ => unreachable!("inc/dec addressing mode"),
        }
    }

    pub(crate) fn op_inc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, _) = self.ea(bus, master, mode);
        let result = bus.read(master, addr).wrapping_add(1);
        bus.write(master, addr, result);
        self.set_nz(result);
        Self::inc_dec_cycles(mode)
    }

    pub(crate) fn op_dec<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, _) = self.ea(bus, master, mode);
        let result = bus.read(master, addr).wrapping_sub(1);
        bus.write(master, addr, result);
        self.set_nz(result);
        Self::inc_dec_cycles(mode)
    }

    /// RMB n: clear bit n of a zero-page byte. No flags. 5 cycles.
    pub(crate) fn op_rmb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        bit: u8,
    ) -> u64 {
        let addr = self.fetch8(bus, master) as u16;
        let value = bus.read(master, addr);
        bus.write(master, addr, value & !(1 << bit));
        5
    }

    /// SMB n: set bit n of a zero-page byte. No flags. 5 cycles.
    pub(crate) fn op_smb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        bit: u8,
    ) -> u64 {
        let addr = self.fetch8(bus, master) as u16;
        let value = bus.read(master, addr);
        bus.write(master, addr, value | (1 << bit));
        5
    }
}
