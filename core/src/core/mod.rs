pub mod bus;
pub mod component;
pub mod machine;
pub mod snapshot;

pub use bus::{Bus, BusMaster, InterruptState};
pub use component::{BusMasterComponent, Component};
pub use machine::{InputButton, Machine};
pub use snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};
