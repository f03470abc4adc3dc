pub mod core;
pub mod cpu;
pub mod debug;
pub mod device;
pub mod rsa;

pub mod prelude {
    pub use crate::core::machine::{InputButton, Machine};
    pub use crate::core::snapshot::{Snapshot, SnapshotReader, SnapshotWriter};
    pub use crate::core::{Bus, BusMaster, Component, bus::InterruptState};
    pub use crate::cpu::Cpu;
}
