//! One-instruction 65C02 disassembler for the debugger's trace view.

/// Addressing mode of a decoded instruction, for operand formatting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    ZeroPageIndirect,
    AbsoluteIndexedIndirect,
    Relative,
    /// Rockwell BBR/BBS: zero-page operand plus relative target.
    ZeroPageRelative,
}

impl Mode {
    /// Instruction length in bytes, opcode included.
    pub fn length(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator => 1,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndirectX
            | Mode::IndirectY
            | Mode::ZeroPageIndirect
            | Mode::Relative => 2,
            Mode::Absolute
            | Mode::AbsoluteX
            | Mode::AbsoluteY
            | Mode::Indirect
            | Mode::AbsoluteIndexedIndirect
            | Mode::ZeroPageRelative => 3,
        }
    }
}

/// Decode an opcode byte into (mnemonic, addressing mode).
pub fn decode(opcode: u8) -> (&'static str, Mode) {
    use Mode::*;
    match opcode {
        0x00 => ("BRK", Implied),
        0x01 => ("ORA", IndirectX),
        0x04 => ("TSB", ZeroPage),
        0x05 => ("ORA", ZeroPage),
        0x06 => ("ASL", ZeroPage),
        0x07 => ("RMB0", ZeroPage),
        0x08 => ("PHP", Implied),
        0x09 => ("ORA", Immediate),
        0x0A => ("ASL", Accumulator),
        0x0C => ("TSB", Absolute),
        0x0D => ("ORA", Absolute),
        0x0E => ("ASL", Absolute),
        0x0F => ("BBR0", ZeroPageRelative),
        0x10 => ("BPL", Relative),
        0x11 => ("ORA", IndirectY),
        0x12 => ("ORA", ZeroPageIndirect),
        0x14 => ("TRB", ZeroPage),
        0x15 => ("ORA", ZeroPageX),
        0x16 => ("ASL", ZeroPageX),
        0x17 => ("RMB1", ZeroPage),
        0x18 => ("CLC", Implied),
        0x19 => ("ORA", AbsoluteY),
        0x1A => ("INC", Accumulator),
        0x1C => ("TRB", Absolute),
        0x1D => ("ORA", AbsoluteX),
        0x1E => ("ASL", AbsoluteX),
        0x1F => ("BBR1", ZeroPageRelative),
        0x20 => ("JSR", Absolute),
        0x21 => ("AND", IndirectX),
        0x24 => ("BIT", ZeroPage),
        0x25 => ("AND", ZeroPage),
        0x26 => ("ROL", ZeroPage),
        0x27 => ("RMB2", ZeroPage),
        0x28 => ("PLP", Implied),
        0x29 => ("AND", Immediate),
        0x2A => ("ROL", Accumulator),
        0x2C => ("BIT", Absolute),
        0x2D => ("AND", Absolute),
        0x2E => ("ROL", Absolute),
        0x2F => ("BBR2", ZeroPageRelative),
        0x30 => ("BMI", Relative),
        0x31 => ("AND", IndirectY),
        0x32 => ("AND", ZeroPageIndirect),
        0x34 => ("BIT", ZeroPageX),
        0x35 => ("AND", ZeroPageX),
        0x36 => ("ROL", ZeroPageX),
        0x37 => ("RMB3", ZeroPage),
        0x38 => ("SEC", Implied),
        0x39 => ("AND", AbsoluteY),
        0x3A => ("DEC", Accumulator),
        0x3C => ("BIT", AbsoluteX),
        0x3D => ("AND", AbsoluteX),
        0x3E => ("ROL", AbsoluteX),
        0x3F => ("BBR3", ZeroPageRelative),
        0x40 => ("RTI", Implied),
        0x41 => ("EOR", IndirectX),
        0x45 => ("EOR", ZeroPage),
        0x46 => ("LSR", ZeroPage),
        0x47 => ("RMB4", ZeroPage),
        0x48 => ("PHA", Implied),
        0x49 => ("EOR", Immediate),
        0x4A => ("LSR", Accumulator),
        0x4C => ("JMP", Absolute),
        0x4D => ("EOR", Absolute),
        0x4E => ("LSR", Absolute),
        0x4F => ("BBR4", ZeroPageRelative),
        0x50 => ("BVC", Relative),
        0x51 => ("EOR", IndirectY),
        0x52 => ("EOR", ZeroPageIndirect),
        0x55 => ("EOR", ZeroPageX),
        0x56 => ("LSR", ZeroPageX),
        0x57 => ("RMB5", ZeroPage),
        0x58 => ("CLI", Implied),
        0x59 => ("EOR", AbsoluteY),
        0x5A => ("PHY", Implied),
        0x5C => ("NOP", Absolute),
        0x5D => ("EOR", AbsoluteX),
        0x5E => ("LSR", AbsoluteX),
        0x5F => ("BBR5", ZeroPageRelative),
        0x60 => ("RTS", Implied),
        0x61 => ("ADC", IndirectX),
        0x64 => ("STZ", ZeroPage),
        0x65 => ("ADC", ZeroPage),
        0x66 => ("ROR", ZeroPage),
        0x67 => ("RMB6", ZeroPage),
        0x68 => ("PLA", Implied),
        0x69 => ("ADC", Immediate),
        0x6A => ("ROR", Accumulator),
        0x6C => ("JMP", Indirect),
        0x6D => ("ADC", Absolute),
        0x6E => ("ROR", Absolute),
        0x6F => ("BBR6", ZeroPageRelative),
        0x70 => ("BVS", Relative),
        0x71 => ("ADC", IndirectY),
        0x72 => ("ADC", ZeroPageIndirect),
        0x74 => ("STZ", ZeroPageX),
        0x75 => ("ADC", ZeroPageX),
        0x76 => ("ROR", ZeroPageX),
        0x77 => ("RMB7", ZeroPage),
        0x78 => ("SEI", Implied),
        0x79 => ("ADC", AbsoluteY),
        0x7A => ("PLY", Implied),
        0x7C => ("JMP", AbsoluteIndexedIndirect),
        0x7D => ("ADC", AbsoluteX),
        0x7E => ("ROR", AbsoluteX),
        0x7F => ("BBR7", ZeroPageRelative),
        0x80 => ("BRA", Relative),
        0x81 => ("STA", IndirectX),
        0x84 => ("STY", ZeroPage),
        0x85 => ("STA", ZeroPage),
        0x86 => ("STX", ZeroPage),
        0x87 => ("SMB0", ZeroPage),
        0x88 => ("DEY", Implied),
        0x89 => ("BIT", Immediate),
        0x8A => ("TXA", Implied),
        0x8C => ("STY", Absolute),
        0x8D => ("STA", Absolute),
        0x8E => ("STX", Absolute),
        0x8F => ("BBS0", ZeroPageRelative),
        0x90 => ("BCC", Relative),
        0x91 => ("STA", IndirectY),
        0x92 => ("STA", ZeroPageIndirect),
        0x94 => ("STY", ZeroPageX),
        0x95 => ("STA", ZeroPageX),
        0x96 => ("STX", ZeroPageY),
        0x97 => ("SMB1", ZeroPage),
        0x98 => ("TYA", Implied),
        0x99 => ("STA", AbsoluteY),
        0x9A => ("TXS", Implied),
        0x9C => ("STZ", Absolute),
        0x9D => ("STA", AbsoluteX),
        0x9E => ("STZ", AbsoluteX),
        0x9F => ("BBS1", ZeroPageRelative),
        0xA0 => ("LDY", Immediate),
        0xA1 => ("LDA", IndirectX),
        0xA2 => ("LDX", Immediate),
        0xA4 => ("LDY", ZeroPage),
        0xA5 => ("LDA", ZeroPage),
        0xA6 => ("LDX", ZeroPage),
        0xA7 => ("SMB2", ZeroPage),
        0xA8 => ("TAY", Implied),
        0xA9 => ("LDA", Immediate),
        0xAA => ("TAX", Implied),
        0xAC => ("LDY", Absolute),
        0xAD => ("LDA", Absolute),
        0xAE => ("LDX", Absolute),
        0xAF => ("BBS2", ZeroPageRelative),
        0xB0 => ("BCS", Relative),
        0xB1 => ("LDA", IndirectY),
        0xB2 => ("LDA", ZeroPageIndirect),
        0xB4 => ("LDY", ZeroPageX),
        0xB5 => ("LDA", ZeroPageX),
        0xB6 => ("LDX", ZeroPageY),
        0xB7 => ("SMB3", ZeroPage),
        0xB8 => ("CLV", Implied),
        0xB9 => ("LDA", AbsoluteY),
        0xBA => ("TSX", Implied),
        0xBC => ("LDY", AbsoluteX),
        0xBD => ("LDA", AbsoluteX),
        0xBE => ("LDX", AbsoluteY),
        0xBF => ("BBS3", ZeroPageRelative),
        0xC0 => ("CPY", Immediate),
        0xC1 => ("CMP", IndirectX),
        0xC4 => ("CPY", ZeroPage),
        0xC5 => ("CMP", ZeroPage),
        0xC6 => ("DEC", ZeroPage),
        0xC7 => ("SMB4", ZeroPage),
        0xC8 => ("INY", Implied),
        0xC9 => ("CMP", Immediate),
        0xCA => ("DEX", Implied),
        0xCB => ("WAI", Implied),
        0xCC => ("CPY", Absolute),
        0xCD => ("CMP", Absolute),
        0xCE => ("DEC", Absolute),
        0xCF => ("BBS4", ZeroPageRelative),
        0xD0 => ("BNE", Relative),
        0xD1 => ("CMP", IndirectY),
        0xD2 => ("CMP", ZeroPageIndirect),
        0xD5 => ("CMP", ZeroPageX),
        0xD6 => ("DEC", ZeroPageX),
        0xD7 => ("SMB5", ZeroPage),
        0xD8 => ("CLD", Implied),
        0xD9 => ("CMP", AbsoluteY),
        0xDA => ("PHX", Implied),
        0xDB => ("STP", Implied),
        0xDC => ("NOP", Absolute),
        0xDD => ("CMP", AbsoluteX),
        0xDE => ("DEC", AbsoluteX),
        0xDF => ("BBS5", ZeroPageRelative),
        0xE0 => ("CPX", Immediate),
        0xE1 => ("SBC", IndirectX),
        0xE4 => ("CPX", ZeroPage),
        0xE5 => ("SBC", ZeroPage),
        0xE6 => ("INC", ZeroPage),
        0xE7 => ("SMB6", ZeroPage),
        0xE8 => ("INX", Implied),
        0xE9 => ("SBC", Immediate),
        0xEA => ("NOP", Implied),
        0xEC => ("CPX", Absolute),
        0xED => ("SBC", Absolute),
        0xEE => ("INC", Absolute),
        0xEF => ("BBS6", ZeroPageRelative),
        0xF0 => ("BEQ", Relative),
        0xF1 => ("SBC", IndirectY),
        0xF2 => ("SBC", ZeroPageIndirect),
        0xF4 => ("NOP", ZeroPageX),
        0xF5 => ("SBC", ZeroPageX),
        0xF6 => ("INC", ZeroPageX),
        0xF7 => ("SMB7", ZeroPage),
        0xF8 => ("SED", Implied),
        0xF9 => ("SBC", AbsoluteY),
        0xFA => ("PLX", Implied),
        0xFC => ("NOP", Absolute),
        0xFD => ("SBC", AbsoluteX),
        0xFE => ("INC", AbsoluteX),
        0xFF => ("BBS7", ZeroPageRelative),
        // Undefined opcodes run as NOPs of varying width
        0x02 | 0x22 | 0x42 | 0x62 | 0x82 | 0xC2 | 0xE2 => ("NOP", Immediate),
        0x44 => ("NOP", ZeroPage),
        0x54 | 0xD4 => ("NOP", ZeroPageX),
        _ => ("NOP", Implied),
    }
}

/// Disassemble the instruction at `addr`, fetching bytes through the
/// side-effect-free `peek` closure. Returns the formatted line and the
/// instruction length.
pub fn disassemble(addr: u16, peek: &mut dyn FnMut(u16) -> u8) -> (String, u8) {
    let opcode = peek(addr);
    let (mnemonic, mode) = decode(opcode);
    let b1 = peek(addr.wrapping_add(1));
    let b2 = peek(addr.wrapping_add(2));
    let word = ((b2 as u16) << 8) | b1 as u16;

    let text = match mode {
        Mode::Implied => mnemonic.to_string(),
        Mode::Accumulator => format!("{mnemonic} A"),
        Mode::Immediate => format!("{mnemonic} #${b1:02X}"),
        Mode::ZeroPage => format!("{mnemonic} ${b1:02X}"),
        Mode::ZeroPageX => format!("{mnemonic} ${b1:02X},X"),
        Mode::ZeroPageY => format!("{mnemonic} ${b1:02X},Y"),
        Mode::Absolute => format!("{mnemonic} ${word:04X}"),
        Mode::AbsoluteX => format!("{mnemonic} ${word:04X},X"),
        Mode::AbsoluteY => format!("{mnemonic} ${word:04X},Y"),
        Mode::Indirect => format!("{mnemonic} (${word:04X})"),
        Mode::IndirectX => format!("{mnemonic} (${b1:02X},X)"),
        Mode::IndirectY => format!("{mnemonic} (${b1:02X}),Y"),
        Mode::ZeroPageIndirect => format!("{mnemonic} (${b1:02X})"),
        Mode::AbsoluteIndexedIndirect => format!("{mnemonic} (${word:04X},X)"),
        Mode::Relative => {
            let target = addr.wrapping_add(2).wrapping_add(b1 as i8 as u16);
            format!("{mnemonic} ${target:04X}")
        }
        Mode::ZeroPageRelative => {
            let target = addr.wrapping_add(3).wrapping_add(b2 as i8 as u16);
            format!("{mnemonic} ${b1:02X},${target:04X}")
        }
    };
    (text, mode.length())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disasm_bytes(bytes: &[u8]) -> (String, u8) {
        let mut peek = |addr: u16| bytes.get(addr as usize).copied().unwrap_or(0);
        disassemble(0, &mut peek)
    }

    #[test]
    fn implied_and_accumulator() {
        assert_eq!(disasm_bytes(&[0xEA]), ("NOP".to_string(), 1));
        assert_eq!(disasm_bytes(&[0x1A]), ("INC A".to_string(), 1));
    }

    #[test]
    fn immediate_and_absolute() {
        assert_eq!(disasm_bytes(&[0xA9, 0x42]), ("LDA #$42".to_string(), 2));
        assert_eq!(
            disasm_bytes(&[0x8D, 0x34, 0x12]),
            ("STA $1234".to_string(), 3)
        );
    }

    #[test]
    fn relative_target_resolution() {
        // BNE +4 from address 0: target = 2 + 4 = $0006
        assert_eq!(disasm_bytes(&[0xD0, 0x04]), ("BNE $0006".to_string(), 2));
        // Backward branch: BRA -2 loops onto itself
        assert_eq!(disasm_bytes(&[0x80, 0xFE]), ("BRA $0000".to_string(), 2));
    }

    #[test]
    fn rockwell_bit_branch_format() {
        // BBS3 $12, +5 from address 0: target = 3 + 5 = $0008
        assert_eq!(
            disasm_bytes(&[0xBF, 0x12, 0x05]),
            ("BBS3 $12,$0008".to_string(), 3)
        );
    }

    #[test]
    fn cmos_modes() {
        assert_eq!(disasm_bytes(&[0xB2, 0x20]), ("LDA ($20)".to_string(), 2));
        assert_eq!(
            disasm_bytes(&[0x7C, 0x00, 0x30]),
            ("JMP ($3000,X)".to_string(), 3)
        );
    }

    #[test]
    fn every_opcode_decodes() {
        for op in 0..=255u8 {
            let (mnemonic, mode) = decode(op);
            assert!(!mnemonic.is_empty());
            assert!(mode.length() >= 1 && mode.length() <= 3);
        }
    }
}
