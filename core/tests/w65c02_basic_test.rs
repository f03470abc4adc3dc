use caracal_core::core::BusMaster;
use caracal_core::cpu::w65c02::{StatusFlag, W65c02};
mod common;
use common::TestBus;

fn step(cpu: &mut W65c02, bus: &mut TestBus) -> u64 {
    cpu.step(bus, BusMaster::Cpu)
}

// =============================================================================
// Loads
// =============================================================================

#[test]
fn test_lda_immediate() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA9, 0x42]); // LDA #$42
    assert_eq!(step(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.pc, 2);
    assert!(!cpu.flag(StatusFlag::Z));
    assert!(!cpu.flag(StatusFlag::N));
}

#[test]
fn test_lda_zero_sets_z() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA9, 0x00]);
    step(&mut cpu, &mut bus);
    assert!(cpu.flag(StatusFlag::Z));
}

#[test]
fn test_lda_negative_sets_n() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA9, 0x80]);
    step(&mut cpu, &mut bus);
    assert!(cpu.flag(StatusFlag::N));
}

#[test]
fn test_lda_absolute_x_page_cross_penalty() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    cpu.x = 0x10;
    bus.memory[0x1100 + 0x0F] = 0;
    bus.load(0, &[0xBD, 0xFF, 0x10]); // LDA $10FF,X -> $110F crosses
    assert_eq!(step(&mut cpu, &mut bus), 5);

    let mut cpu2 = W65c02::new();
    let mut bus2 = TestBus::new();
    cpu2.x = 0x01;
    bus2.load(0, &[0xBD, 0x00, 0x11]); // LDA $1100,X -> no cross
    assert_eq!(step(&mut cpu2, &mut bus2), 4);
}

#[test]
fn test_lda_zero_page_indirect() {
    // (zp) without indexing is a CMOS addition
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.memory[0x20] = 0x34;
    bus.memory[0x21] = 0x12;
    bus.memory[0x1234] = 0x99;
    bus.load(0, &[0xB2, 0x20]); // LDA ($20)
    assert_eq!(step(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.a, 0x99);
}

#[test]
fn test_ldx_ldy() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA2, 0x11, 0xA0, 0x22]); // LDX #$11; LDY #$22
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.x, 0x11);
    assert_eq!(cpu.y, 0x22);
}

// =============================================================================
// Stores
// =============================================================================

#[test]
fn test_sta_absolute() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    cpu.a = 0x5A;
    bus.load(0, &[0x8D, 0x00, 0x20]); // STA $2000
    assert_eq!(step(&mut cpu, &mut bus), 4);
    assert_eq!(bus.memory[0x2000], 0x5A);
}

#[test]
fn test_sta_absolute_x_no_page_cross_discount() {
    // Stores always pay the indexed fix-up cycle
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    cpu.a = 0x77;
    cpu.x = 0x01;
    bus.load(0, &[0x9D, 0x00, 0x20]); // STA $2000,X
    assert_eq!(step(&mut cpu, &mut bus), 5);
    assert_eq!(bus.memory[0x2001], 0x77);
}

#[test]
fn test_stz_clears_memory() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.memory[0x0030] = 0xFF;
    bus.memory[0x2040] = 0xFF;
    bus.load(0, &[0x64, 0x30, 0x9C, 0x40, 0x20]); // STZ $30; STZ $2040
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x0030], 0x00);
    assert_eq!(bus.memory[0x2040], 0x00);
}

// =============================================================================
// Transfers and register inc/dec
// =============================================================================

#[test]
fn test_transfers_set_flags_except_txs() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    cpu.a = 0x80;
    bus.load(0, &[0xAA]); // TAX
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.x, 0x80);
    assert!(cpu.flag(StatusFlag::N));

    let mut cpu2 = W65c02::new();
    let mut bus2 = TestBus::new();
    cpu2.x = 0x00;
    cpu2.p = 0x24;
    bus2.load(0, &[0x9A]); // TXS: no flags
    step(&mut cpu2, &mut bus2);
    assert_eq!(cpu2.sp, 0x00);
    assert!(!cpu2.flag(StatusFlag::Z));
}

#[test]
fn test_inc_dec_accumulator() {
    // INC A / DEC A are CMOS additions
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    cpu.a = 0xFF;
    bus.load(0, &[0x1A, 0x3A, 0x3A]); // INC A; DEC A; DEC A
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flag(StatusFlag::Z));
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0xFF);
    assert!(cpu.flag(StatusFlag::N));
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0xFE);
}

#[test]
fn test_inx_wraps() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    cpu.x = 0xFF;
    bus.load(0, &[0xE8]); // INX
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.x, 0x00);
    assert!(cpu.flag(StatusFlag::Z));
}

// =============================================================================
// NOPs with documented sizes and cycle counts
// =============================================================================

#[test]
fn test_nop_ea_one_byte_two_cycles() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xEA]);
    assert_eq!(step(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_nop_5c_three_bytes_eight_cycles() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x5C, 0x12, 0x34]);
    assert_eq!(step(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.pc, 3);
}

#[test]
fn test_nop_dc_fc_three_bytes_four_cycles() {
    for opcode in [0xDC, 0xFC] {
        let mut cpu = W65c02::new();
        let mut bus = TestBus::new();
        bus.load(0, &[opcode, 0x12, 0x34]);
        assert_eq!(step(&mut cpu, &mut bus), 4, "opcode {opcode:02X}");
        assert_eq!(cpu.pc, 3, "opcode {opcode:02X}");
    }
}

#[test]
fn test_undefined_opcode_is_one_byte_one_cycle() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x03, 0xEA]); // $03 is undefined on the 65C02
    assert_eq!(step(&mut cpu, &mut bus), 1);
    assert_eq!(cpu.pc, 1);
}

// =============================================================================
// Cycle accounting
// =============================================================================

#[test]
fn test_cycle_counter_accumulates() {
    let mut cpu = W65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA9, 0x01, 0xEA, 0x8D, 0x00, 0x20]); // 2 + 2 + 4
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.cycles, 8);
}
