pub mod cart;
pub mod eeprom;
pub mod mikey;
pub mod suzy;

pub use cart::Cartridge;
pub use eeprom::{Eeprom, EepromType};
pub use mikey::Mikey;
pub use suzy::Suzy;

/// Outcome of a hardware register access. `Unmapped` lets the memory
/// manager substitute the open-bus byte and log the access; the silicon
/// itself never faults.
pub enum RegAccess {
    Value(u8),
    Unmapped,
}
