pub mod bus;
pub mod game_db;
pub mod input;
pub mod lynx;
pub mod rom_loader;

pub use bus::LynxBus;
pub use game_db::{GameDbEntry, Rotation};
pub use input::TasInput;
pub use lynx::LynxSystem;
pub use rom_loader::{RomFormat, RomImage, RomLoadError};
