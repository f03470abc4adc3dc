use caracal_core::core::machine::Machine;
use caracal_core::core::snapshot::SnapshotError;
use caracal_core::cpu::state::StopState;
use caracal_core::device::mikey::{CPU_CYCLES_PER_FRAME, SCREEN_HEIGHT, SCREEN_WIDTH};
use caracal_core::device::suzy::{JOY_A, JOY_UP, SWITCH_PAUSE};
use caracal_core::rsa;
use caracal_system::input::TasInput;
use caracal_system::lynx::LynxSystem;
use caracal_system::rom_loader::{BS93_HEADER_SIZE, RomLoadError};

/// Wrap a program in a BS93 container that loads at $0200.
fn bs93(program: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; BS93_HEADER_SIZE];
    bytes[6..10].copy_from_slice(b"BS93");
    bytes.extend_from_slice(program);
    bytes
}

fn loaded_system(program: &[u8]) -> LynxSystem {
    let mut sys = LynxSystem::new(44_100);
    sys.load_rom(&bs93(program)).unwrap();
    sys
}

// =============================================================================
// Machine trait surface
// =============================================================================

#[test]
fn test_display_size() {
    let sys = LynxSystem::new(44_100);
    assert_eq!(sys.display_size(), (160, 102));
}

#[test]
fn test_input_map_has_all_buttons() {
    let sys = LynxSystem::new(44_100);
    let map = sys.input_map();
    assert_eq!(map.len(), 9); // D-pad, two options, A, B, Pause
    for button in map {
        assert!(!button.name.is_empty());
    }
}

#[test]
fn test_render_frame_correct_size() {
    let sys = LynxSystem::new(44_100);
    let (w, h) = sys.display_size();
    let mut buffer = vec![0u8; (w * h * 3) as usize];
    sys.render_frame(&mut buffer); // must not panic
}

// =============================================================================
// Boot paths
// =============================================================================

#[test]
fn test_bs93_boots_at_0200() {
    let sys = loaded_system(&[0xEA, 0xEA]);
    assert_eq!(sys.cpu_state().pc, 0x0200);
    assert_eq!(sys.peek(0x0200), 0xEA);
}

#[test]
fn test_encrypted_cart_hle_boot() {
    // Build a cart whose boot payload decrypts to a STP at $0200.
    let mut loader = vec![0xDB]; // STP
    loader.resize(50, 0);
    let encrypted = rsa::encrypt(&loader).unwrap();

    let mut sys = LynxSystem::new(44_100);
    let info = sys.load_rom(&encrypted.data).unwrap();
    assert_eq!(info.encrypted_loader_valid, Some(true));
    assert_eq!(sys.cpu_state().pc, 0x0200);
    assert_eq!(sys.peek(0x0200), 0xDB);

    sys.run_frame();
    assert_eq!(sys.cpu_state().stop, StopState::Stopped);
}

#[test]
fn test_undecryptable_cart_rejected() {
    // Raw image whose header byte claims 200 blocks.
    let mut sys = LynxSystem::new(44_100);
    let bogus = vec![0x38u8; 4096];
    assert_eq!(
        sys.load_rom(&bogus),
        Err(RomLoadError::BadEncryptedLoader)
    );
}

// =============================================================================
// Frame stepping
// =============================================================================

#[test]
fn test_run_frame_advances_full_budget() {
    let mut sys = loaded_system(&[0x80, 0xFE]); // BRA -2: spin forever
    sys.run_frame();
    let cycles = sys.cpu_state().cycles;
    assert!(
        cycles >= CPU_CYCLES_PER_FRAME as u64,
        "frame ran only {cycles} cycles"
    );
    // Within one instruction of the budget.
    assert!(cycles < CPU_CYCLES_PER_FRAME as u64 + 8);
}

#[test]
fn test_frames_are_deterministic() {
    let program = [0xA9, 0x55, 0x8D, 0x00, 0x20, 0x80, 0xF9]; // store loop
    let mut a = loaded_system(&program);
    let mut b = loaded_system(&program);
    for _ in 0..3 {
        a.run_frame();
        b.run_frame();
    }
    assert_eq!(a.cpu_state(), b.cpu_state());
    assert_eq!(a.frame_buffer(), b.frame_buffer());
}

#[test]
fn test_audio_batch_near_sample_rate() {
    // Audio timer 4 free-running: the resampler should emit about
    // sample_rate / 75 stereo frames per video frame.
    let program = [
        0xA9, 0x00, // LDA #0      (backup 0: borrow every tick)
        0x8D, 0x10, 0xFD, // STA $FD10  TIM4BKUP
        0xA9, 0x19, // LDA #%00011001 (enable, reload, source 1)
        0x8D, 0x11, 0xFD, // STA $FD11  TIM4CTLA
        0x80, 0xFE, // BRA -2
    ];
    let mut sys = loaded_system(&program);
    sys.run_frame();
    let samples = sys.take_audio();
    let expected = 44_100 / 75;
    assert!(
        (samples.len() as i64 - expected as i64).abs() <= 2,
        "got {} samples, expected ~{expected}",
        samples.len()
    );
}

// =============================================================================
// Memory map through the CPU
// =============================================================================

#[test]
fn test_cpu_can_flip_mapctl() {
    // STA $FFF9 from code: the write must hit MAPCTL, not RAM.
    let program = [
        0xA9, 0x0F, // LDA #$0F: disable all overlays
        0x8D, 0xF9, 0xFF, // STA $FFF9
        0xDB, // STP
    ];
    let mut sys = loaded_system(&program);
    sys.run_frame();
    assert_eq!(sys.bus.mapctl(), 0x0F);
    assert_eq!(sys.peek(0xFFF9), 0x0F);
}

#[test]
fn test_controller_reaches_joystick_register() {
    // LDA $FCB0; STA $20; STP
    let program = [0xAD, 0xB0, 0xFC, 0x85, 0x20, 0xDB];
    let mut sys = loaded_system(&program);
    sys.set_controller_state(JOY_UP | JOY_A, 0);
    sys.run_frame();
    // Active-low: pressed bits read 0.
    assert_eq!(sys.peek(0x20), !(JOY_UP | JOY_A));
}

#[test]
fn test_tas_input_latches() {
    let program = [0xAD, 0xB1, 0xFC, 0x85, 0x21, 0xDB]; // LDA SWITCHES
    let mut sys = loaded_system(&program);
    sys.set_tas_input(TasInput::parse("........P"));
    sys.run_frame();
    assert_eq!(sys.peek(0x21), !SWITCH_PAUSE);
}

// =============================================================================
// Sprites end to end
// =============================================================================

#[test]
fn test_sprgo_write_runs_sprite_chain() {
    // The CPU points SCBNEXT at a block in RAM, enables the bus, and
    // writes SPRGO; Suzy paints into the frame buffer region while the
    // CPU is stalled.
    let program = [
        0xA9, 0x00, 0x8D, 0x08, 0xFC, // VIDBAS = $2000
        0xA9, 0x20, 0x8D, 0x09, 0xFC, //
        0xA9, 0x00, 0x8D, 0x10, 0xFC, // SCBNEXT = $3000
        0xA9, 0x30, 0x8D, 0x11, 0xFC, //
        0xA9, 0x01, 0x8D, 0x90, 0xFC, // SUZYBUSEN
        0x8D, 0x91, 0xFC, // SPRGO (A is still 1)
        0xDB, // STP
    ];
    let mut sys = loaded_system(&program);

    // SCB at $3000: 4bpp Normal sprite at (10, 20), identity matrix,
    // chain ends (NEXT upper byte zero). Data at $3100: 1x1, pen 7.
    let scb = [
        0xC4, 0x00, 0x00, // ctl0, ctl1, coll
        0x00, 0x00, // next = $0000
        0x00, 0x31, // data = $3100
        0x0A, 0x00, // hpos = 10
        0x14, 0x00, // vpos = 20
        0x00, 0x01, 0x00, 0x00, // PA = $0100, PB = 0
        0x00, 0x00, 0x00, 0x01, // PC = 0, PD = $0100
    ];
    sys.bus.ram[0x3000..0x3000 + scb.len()].copy_from_slice(&scb);
    sys.bus.ram[0x3100] = 1; // width
    sys.bus.ram[0x3101] = 1; // height
    sys.bus.ram[0x3102] = 0x70; // pen 7 in the high nibble

    sys.run_frame();

    // Pixel (10, 20): byte $2000 + 20*80 + 5, high nibble.
    assert_eq!(sys.bus.ram[0x2000 + 20 * 80 + 5] >> 4, 7);
}

// =============================================================================
// Display end to end
// =============================================================================

#[test]
fn test_video_pipeline_renders_palette_color() {
    // Program the palette, point DISPADR at $3000, paint one byte,
    // arm the HBlank timer, enable DMA, and spin.
    let program = [
        0xA9, 0x0F, // LDA #$0F (green max)
        0x8D, 0xA1, 0xFD, // STA GREEN1
        0xA9, 0x00, // LDA #0 (no blue/red)
        0x8D, 0xB1, 0xFD, // STA BLUERED1
        0xA9, 0x11, // LDA #$11 (pen 1 in both nibbles)
        0x8D, 0x00, 0x30, // STA $3000
        0xA9, 0x00, 0x8D, 0x94, 0xFD, // DISPADR low = 0
        0xA9, 0x30, 0x8D, 0x95, 0xFD, // DISPADR high = $30
        0xA9, 0x01, 0x8D, 0x92, 0xFD, // DISPCTL = DMA enable
        0xA9, 0x00, 0x8D, 0x00, 0xFD, // TIM0BKUP = 0
        0xA9, 0x19, 0x8D, 0x01, 0xFD, // TIM0CTLA = enable|reload|source 1
        0x80, 0xFE, // BRA -2
    ];
    let mut sys = loaded_system(&program);
    sys.run_frame();
    sys.run_frame(); // second frame: buffer swapped after DMA ran

    assert_eq!(sys.frame_buffer()[0], 1);
    let mut rgb = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT * 3];
    sys.render_frame(&mut rgb);
    assert_eq!(&rgb[0..3], &[0x00, 0xFF, 0x00]); // pure green
}

// =============================================================================
// Save states
// =============================================================================

#[test]
fn test_save_state_round_trip() {
    let program = [0xA9, 0x42, 0x85, 0x10, 0xE6, 0x10, 0x80, 0xFC];
    let mut sys = loaded_system(&program);
    sys.run_frame();

    let saved = sys.save_state();
    let state_at_save = sys.cpu_state();
    let ram_at_save = sys.peek(0x10);

    // Diverge, then restore.
    sys.run_frame();
    sys.run_frame();
    assert_ne!(sys.peek(0x10), ram_at_save);

    sys.load_state(&saved).unwrap();
    assert_eq!(sys.cpu_state(), state_at_save);
    assert_eq!(sys.peek(0x10), ram_at_save);

    // And the restored console keeps running deterministically.
    let mut fresh = loaded_system(&program);
    fresh.run_frame();
    fresh.run_frame();
    sys.run_frame();
    assert_eq!(sys.cpu_state(), fresh.cpu_state());
}

#[test]
fn test_corrupt_save_state_refused() {
    let mut sys = loaded_system(&[0xEA]);
    let mut saved = sys.save_state();

    // Bad magic
    let mut bad_magic = saved.clone();
    bad_magic[0] = b'X';
    assert_eq!(sys.load_state(&bad_magic), Err(SnapshotError::BadMagic));

    // Version mismatch
    let mut bad_version = saved.clone();
    bad_version[4] = 0xEE;
    assert!(matches!(
        sys.load_state(&bad_version),
        Err(SnapshotError::VersionMismatch { .. })
    ));

    // Truncation
    saved.truncate(saved.len() / 2);
    assert_eq!(sys.load_state(&saved), Err(SnapshotError::Truncated));
}

#[test]
fn test_refused_restore_leaves_console_untouched() {
    let mut sys = loaded_system(&[0x80, 0xFE]);
    sys.run_frame();
    let before = sys.cpu_state();

    let mut corrupt = sys.save_state();
    corrupt.truncate(100);
    assert!(sys.load_state(&corrupt).is_err());
    assert_eq!(sys.cpu_state(), before);
}

#[test]
fn test_wrong_console_type_refused() {
    let mut sys = loaded_system(&[0xEA]);
    let mut saved = sys.save_state();
    saved[6] = 9; // not a Lynx
    assert!(matches!(
        sys.load_state(&saved),
        Err(SnapshotError::ConsoleTypeMismatch { .. })
    ));
}

// =============================================================================
// Debugger surface
// =============================================================================

#[test]
fn test_disassemble_at_boot() {
    let sys = loaded_system(&[0xA9, 0x42]);
    let (text, len) = sys.disassemble_at(0x0200);
    assert_eq!(text, "LDA #$42");
    assert_eq!(len, 2);
}

#[test]
fn test_trace_sink_mirrors_cpu_accesses() {
    use caracal_core::debug::{AccessKind, TraceSink};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct SharedTrace(Rc<RefCell<Vec<(AccessKind, u16, u8)>>>);
    impl TraceSink for SharedTrace {
        fn access(&mut self, kind: AccessKind, addr: u16, data: u8) {
            self.0.borrow_mut().push((kind, addr, data));
        }
    }

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sys = loaded_system(&[0xA9, 0x42, 0x85, 0x10, 0xDB]); // LDA/STA/STP
    sys.set_trace_sink(Box::new(SharedTrace(log.clone())));
    sys.run_frame();
    sys.take_trace_sink();

    let accesses = log.borrow();
    // The opcode fetch at $0200 and the zero-page store both appear.
    assert!(accesses.contains(&(AccessKind::Read, 0x0200, 0xA9)));
    assert!(accesses.contains(&(AccessKind::Write, 0x0010, 0x42)));
}

#[test]
fn test_timeline_records_unmapped_writes() {
    // STA to a reserved Mikey register is accepted but logged.
    let program = [0xA9, 0x01, 0x8D, 0x70, 0xFD, 0xDB];
    let mut sys = loaded_system(&program);
    sys.set_timeline_enabled(true);
    sys.run_frame();
    assert!(!sys.timeline_entries().is_empty());
}
