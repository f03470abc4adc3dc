//! Debugger hooks: memory-access tracing and the hardware event timeline.
//!
//! The core never prints. Anything a debugger UI might care about —
//! unmapped register pokes, timer underflows, sprite chain starts — is
//! pushed into an [`EventTimeline`] owned by the console, and bus traffic
//! can be mirrored to a [`TraceSink`].

/// Kind of a traced memory access.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AccessKind {
    Read,
    Write,
    /// Instruction opcode fetch (a read, flagged for disassembly traces).
    Fetch,
}

/// Receives every bus access the console makes while tracing is enabled.
pub trait TraceSink {
    fn access(&mut self, kind: AccessKind, addr: u16, data: u8);
}

/// A `TraceSink` that records accesses into a vector, for tests and for
/// the debugger's memory-access log.
#[derive(Default)]
pub struct RecordingTrace {
    pub accesses: Vec<(AccessKind, u16, u8)>,
}

impl TraceSink for RecordingTrace {
    fn access(&mut self, kind: AccessKind, addr: u16, data: u8) {
        self.accesses.push((kind, addr, data));
    }
}

/// Hardware events worth surfacing on the debugger's timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HwEvent {
    /// A write to a reserved/unmapped hardware register (accepted and
    /// dropped, as the silicon does).
    UnmappedWrite { addr: u16, data: u8 },
    /// A read from a reserved/unmapped hardware register (returned the
    /// open-bus byte).
    UnmappedRead { addr: u16 },
    TimerUnderflow { timer: u8 },
    IrqRaised { timer: u8 },
    SpriteChainStart { scb: u16 },
    SpriteChainEnd { sprites: u32 },
    SerialRxOverrun,
}

/// Timestamped entry in the event timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineEntry {
    /// Master-clock cycle at which the event occurred.
    pub cycle: u64,
    pub event: HwEvent,
}

/// Fixed-capacity ring of recent hardware events.
///
/// Recording is cheap enough to leave on; the ring simply overwrites the
/// oldest entry once full.
pub struct EventTimeline {
    entries: Vec<TimelineEntry>,
    head: usize,
    capacity: usize,
    enabled: bool,
}

impl EventTimeline {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            head: 0,
            capacity: capacity.max(1),
            enabled: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, cycle: u64, event: HwEvent) {
        if !self.enabled {
            return;
        }
        let entry = TimelineEntry { cycle, event };
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
        } else {
            self.entries[self.head] = entry;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Events in chronological order, oldest first.
    pub fn entries(&self) -> Vec<TimelineEntry> {
        let mut out = Vec::with_capacity(self.entries.len());
        out.extend_from_slice(&self.entries[self.head..]);
        out.extend_from_slice(&self.entries[..self.head]);
        out
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.head = 0;
    }
}

impl Default for EventTimeline {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timeline_records_nothing() {
        let mut tl = EventTimeline::new(8);
        tl.record(0, HwEvent::SerialRxOverrun);
        assert!(tl.entries().is_empty());
    }

    #[test]
    fn timeline_preserves_order() {
        let mut tl = EventTimeline::new(8);
        tl.set_enabled(true);
        for t in 0..5 {
            tl.record(t, HwEvent::TimerUnderflow { timer: t as u8 });
        }
        let cycles: Vec<u64> = tl.entries().iter().map(|e| e.cycle).collect();
        assert_eq!(cycles, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn timeline_wraps_oldest_first() {
        let mut tl = EventTimeline::new(4);
        tl.set_enabled(true);
        for t in 0..6 {
            tl.record(t, HwEvent::IrqRaised { timer: 0 });
        }
        let cycles: Vec<u64> = tl.entries().iter().map(|e| e.cycle).collect();
        assert_eq!(cycles, vec![2, 3, 4, 5]);
    }

    #[test]
    fn recording_trace_collects_accesses() {
        let mut sink = RecordingTrace::default();
        sink.access(AccessKind::Fetch, 0x0200, 0xEA);
        sink.access(AccessKind::Write, 0xFD00, 0x04);
        assert_eq!(sink.accesses.len(), 2);
        assert_eq!(sink.accesses[1], (AccessKind::Write, 0xFD00, 0x04));
    }
}
