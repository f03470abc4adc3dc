//! Exhaustive equivalence proofs for the branchless flag updates.
//!
//! The hot flag helpers use `(flags & !mask) | (wrapping_neg(state) &
//! mask)` instead of an if/else. These run millions of times per frame,
//! so the replacement is only admissible with an exhaustive comparison
//! against the branching form: all 256 flag bytes x all 8 masks x both
//! states, plus the full 256-value N/Z table.

use caracal_core::core::BusMaster;
use caracal_core::cpu::w65c02::{StatusFlag, W65c02};
mod common;
use common::TestBus;

const ALL_FLAGS: [StatusFlag; 8] = [
    StatusFlag::C,
    StatusFlag::Z,
    StatusFlag::I,
    StatusFlag::D,
    StatusFlag::B,
    StatusFlag::U,
    StatusFlag::V,
    StatusFlag::N,
];

/// The branching reference implementation.
fn set_flag_branching(flags: u8, mask: u8, state: bool) -> u8 {
    if state { flags | mask } else { flags & !mask }
}

/// The branchless form under test, spelled out the same way the core
/// spells it.
fn set_flag_branchless(flags: u8, mask: u8, state: bool) -> u8 {
    (flags & !mask) | ((state as u8).wrapping_neg() & mask)
}

#[test]
fn test_branchless_equals_branching_exhaustive() {
    for flags in 0..=255u8 {
        for flag in ALL_FLAGS {
            let mask = flag as u8;
            for state in [false, true] {
                assert_eq!(
                    set_flag_branchless(flags, mask, state),
                    set_flag_branching(flags, mask, state),
                    "flags={flags:02X} mask={mask:02X} state={state}"
                );
            }
        }
    }
}

#[test]
fn test_cpu_set_flag_matches_reference_exhaustive() {
    for flags in 0..=255u8 {
        for flag in ALL_FLAGS {
            for state in [false, true] {
                let mut cpu = W65c02::new();
                cpu.p = flags;
                cpu.set_flag(flag, state);
                assert_eq!(
                    cpu.p,
                    set_flag_branching(flags, flag as u8, state),
                    "flags={flags:02X} flag={flag:?} state={state}"
                );
            }
        }
    }
}

#[test]
fn test_nz_update_all_256_values() {
    // LDA #v must produce N = bit 7 and Z = (v == 0) for every value,
    // leaving the other flags alone.
    for value in 0..=255u8 {
        let mut cpu = W65c02::new();
        let mut bus = TestBus::new();
        cpu.p = StatusFlag::U as u8 | StatusFlag::C as u8 | StatusFlag::I as u8;
        bus.load(0, &[0xA9, value]);
        cpu.step(&mut bus, BusMaster::Cpu);
        assert_eq!(cpu.flag(StatusFlag::N), value & 0x80 != 0, "value={value:02X}");
        assert_eq!(cpu.flag(StatusFlag::Z), value == 0, "value={value:02X}");
        assert!(cpu.flag(StatusFlag::C), "C must survive, value={value:02X}");
    }
}
