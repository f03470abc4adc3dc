use super::{AddrMode, W65c02};
use crate::core::{Bus, BusMaster};

impl W65c02 {
    pub(crate) fn op_lda<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.a = value;
        self.set_nz(value);
        cycles
    }

    pub(crate) fn op_ldx<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.x = value;
        self.set_nz(value);
        cycles
    }

    pub(crate) fn op_ldy<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.y = value;
        self.set_nz(value);
        cycles
    }

    pub(crate) fn op_sta<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, cycles) = self.store_addr(bus, master, mode);
        bus.write(master, addr, self.a);
        cycles
    }

    pub(crate) fn op_stx<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, cycles) = self.store_addr(bus, master, mode);
        bus.write(master, addr, self.x);
        cycles
    }

    pub(crate) fn op_sty<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, cycles) = self.store_addr(bus, master, mode);
        bus.write(master, addr, self.y);
        cycles
    }

    /// STZ: store zero (CMOS addition). No flags.
    pub(crate) fn op_stz<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, cycles) = self.store_addr(bus, master, mode);
        bus.write(master, addr, 0);
        cycles
    }
}
