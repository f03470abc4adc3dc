use super::{AddrMode, StatusFlag, W65c02};
use crate::core::{Bus, BusMaster};

impl W65c02 {
    // ---- ALU operation helpers ----

    /// ADC (Add with Carry). Sets N, Z, C, V. Handles CMOS decimal mode:
    /// N and Z come from the corrected BCD result (unlike the NMOS part),
    /// at the cost of one extra cycle.
    #[inline]
    pub(crate) fn perform_adc(&mut self, operand: u8) {
        let a = self.a;
        let c = self.flag(StatusFlag::C) as u16;

        if self.flag(StatusFlag::D) {
            let mut lo = (a & 0x0F) as u16 + (operand & 0x0F) as u16 + c;
            let mut hi = (a >> 4) as u16 + (operand >> 4) as u16;
            if lo > 9 {
                lo += 6;
                hi += 1;
            }

            // V from the binary interpretation of the intermediate sum
            let bin = ((hi << 4) | (lo & 0x0F)) as u8;
            self.set_flag(
                StatusFlag::V,
                (!(a ^ operand) & (a ^ bin)) & 0x80 != 0,
            );

            if hi > 9 {
                hi += 6;
            }
            self.set_flag(StatusFlag::C, hi > 15);

            let result = (((hi & 0x0F) << 4) | (lo & 0x0F)) as u8;
            self.a = result;
            self.set_nz(result);
        } else {
            let sum = a as u16 + operand as u16 + c;
            let result = sum as u8;
            self.set_flag(StatusFlag::C, sum > 0xFF);
            self.set_flag(StatusFlag::V, ((!(a ^ operand)) & (a ^ result)) & 0x80 != 0);
            self.a = result;
            self.set_nz(result);
        }
    }

    /// SBC (Subtract with Carry/Borrow): A = A - M - !C. In CMOS decimal
    /// mode N and Z reflect the corrected result; C and V always come
    /// from the binary subtraction.
    #[inline]
    pub(crate) fn perform_sbc(&mut self, operand: u8) {
        let a = self.a;
        let c = self.flag(StatusFlag::C) as u16;

        let diff = a as u16 + (operand ^ 0xFF) as u16 + c;
        let bin = diff as u8;
        self.set_flag(StatusFlag::C, diff > 0xFF);
        self.set_flag(StatusFlag::V, ((a ^ operand) & (a ^ bin)) & 0x80 != 0);

        if self.flag(StatusFlag::D) {
            let borrow = 1 - c as i16;
            let mut lo = (a & 0x0F) as i16 - (operand & 0x0F) as i16 - borrow;
            let mut hi = (a >> 4) as i16 - (operand >> 4) as i16;
            if lo < 0 {
                lo += 10;
                hi -= 1;
            }
            if hi < 0 {
                hi += 10;
            }
            let result = (((hi as u8) & 0x0F) << 4) | ((lo as u8) & 0x0F);
            self.a = result;
            self.set_nz(result);
        } else {
            self.a = bin;
            self.set_nz(bin);
        }
    }

    /// Compare (CMP/CPX/CPY). Sets N, Z, C; no register or V change.
    #[inline]
    pub(crate) fn perform_compare(&mut self, register: u8, operand: u8) {
        let result = register.wrapping_sub(operand);
        self.set_flag(StatusFlag::C, register >= operand);
        self.set_nz(result);
    }

    // ---- Dispatch targets ----

    /// Extra cycle charged by ADC/SBC when the decimal flag is set (CMOS).
    #[inline]
    fn decimal_penalty(&self) -> u64 {
        self.flag(StatusFlag::D) as u64
    }

    pub(crate) fn op_adc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.perform_adc(value);
        cycles + self.decimal_penalty()
    }

    pub(crate) fn op_sbc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.perform_sbc(value);
        cycles + self.decimal_penalty()
    }

    pub(crate) fn op_cmp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.perform_compare(self.a, value);
        cycles
    }

    pub(crate) fn op_cpx<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.perform_compare(self.x, value);
        cycles
    }

    pub(crate) fn op_cpy<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.perform_compare(self.y, value);
        cycles
    }

    pub(crate) fn op_and<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.a &= value;
        self.set_nz(self.a);
        cycles
    }

    pub(crate) fn op_ora<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.a |= value;
        self.set_nz(self.a);
        cycles
    }

    pub(crate) fn op_eor<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.a ^= value;
        self.set_nz(self.a);
        cycles
    }

    /// BIT: N = M bit 7, V = M bit 6, Z = (A & M) == 0. A unchanged.
    pub(crate) fn op_bit<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (value, cycles) = self.read_operand(bus, master, mode);
        self.set_flag(StatusFlag::N, value & 0x80 != 0);
        self.set_flag(StatusFlag::V, value & 0x40 != 0);
        self.set_flag(StatusFlag::Z, (self.a & value) == 0);
        cycles
    }

    /// BIT #imm only updates Z; N and V are untouched (CMOS quirk).
    pub(crate) fn op_bit_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) -> u64 {
        let value = self.fetch8(bus, master);
        self.set_flag(StatusFlag::Z, (self.a & value) == 0);
        2
    }

    /// TRB: test-and-reset bits. Z = (A & M) == 0, M &= !A.
    pub(crate) fn op_trb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, _) = self.ea(bus, master, mode);
        let value = bus.read(master, addr);
        self.set_flag(StatusFlag::Z, (self.a & value) == 0);
        bus.write(master, addr, value & !self.a);
        if mode == AddrMode::Zp { 5 } else { 6 }
    }

    /// TSB: test-and-set bits. Z = (A & M) == 0, M |= A.
    pub(crate) fn op_tsb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        mode: AddrMode,
    ) -> u64 {
        let (addr, _) = self.ea(bus, master, mode);
        let value = bus.read(master, addr);
        self.set_flag(StatusFlag::Z, (self.a & value) == 0);
        bus.write(master, addr, value | self.a);
        if mode == AddrMode::Zp { 5 } else { 6 }
    }
}
