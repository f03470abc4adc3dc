/// Identifies who is accessing the bus (for CPU-halt arbitration and
/// side-effect-free debugger peeks).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusMaster {
    Cpu,
    /// Suzy's sprite engine reading SCBs and writing pixels. The CPU is
    /// halted while a sprite chain runs; sprite accesses always see RAM,
    /// never the hardware overlays.
    SpriteDma,
    /// Debugger access: must not disturb open-bus state, serial flags,
    /// or the cartridge address counter.
    Debugger,
}

/// Generic bus interface supporting halt arbitration.
pub trait Bus {
    type Address: Copy + Into<u64>;
    type Data;

    fn read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data;
    fn write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data);

    /// Check if the bus is halted for this master. The Lynx asserts this
    /// for the CPU while Suzy owns the bus during sprite rendering.
    fn is_halted_for(&self, master: BusMaster) -> bool;

    /// Generic interrupt query. CPUs pick what they need.
    fn check_interrupts(&self, target: BusMaster) -> InterruptState;
}

#[derive(Default, Clone, Copy, Debug)]
pub struct InterruptState {
    pub nmi: bool, // wired but unused on the Lynx
    pub irq: bool,
}
