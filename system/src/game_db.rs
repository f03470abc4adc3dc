//! Game identification database.
//!
//! LNX headers in circulating dumps are frequently wrong about rotation
//! and never describe the save EEPROM, so known cartridges are keyed by
//! the CRC-32 of their program image (container header excluded) and
//! the database wins over the header. Unknown images fall back to an
//! unrotated, EEPROM-less, single-player cartridge.

use caracal_core::device::EepromType;

use crate::rom_loader::crc32;

/// Screen rotation required by the cartridge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rotation {
    None,
    Left,
    Right,
}

pub struct GameDbEntry {
    pub crc32: u32,
    pub name: &'static str,
    pub rotation: Rotation,
    pub eeprom: EepromType,
    /// ComLynx player count, 1-6.
    pub players: u8,
}

/// Known cartridges. CRC-32 of the cartridge image, header excluded.
static GAME_DB: &[GameDbEntry] = &[
    GameDbEntry {
        crc32: 0x0271_B6E9,
        name: "Battlezone 2000",
        rotation: Rotation::None,
        eeprom: EepromType::None,
        players: 4,
    },
    GameDbEntry {
        crc32: 0x9D09_392D,
        name: "California Games",
        rotation: Rotation::None,
        eeprom: EepromType::None,
        players: 4,
    },
    GameDbEntry {
        crc32: 0x9750_1709,
        name: "Centipede",
        rotation: Rotation::Left,
        eeprom: EepromType::None,
        players: 2,
    },
    GameDbEntry {
        crc32: 0xAEC4_74C8,
        name: "Checkered Flag",
        rotation: Rotation::None,
        eeprom: EepromType::None,
        players: 6,
    },
    GameDbEntry {
        crc32: 0x6A5F_53ED,
        name: "Chip's Challenge",
        rotation: Rotation::None,
        eeprom: EepromType::None,
        players: 1,
    },
    GameDbEntry {
        crc32: 0xD20A_85FC,
        name: "Gauntlet - The Third Encounter",
        rotation: Rotation::Left,
        eeprom: EepromType::None,
        players: 4,
    },
    GameDbEntry {
        crc32: 0xA938_DEF3,
        name: "Klax",
        rotation: Rotation::Right,
        eeprom: EepromType::None,
        players: 1,
    },
    GameDbEntry {
        crc32: 0x3CAB_D0BB,
        name: "Lemmings",
        rotation: Rotation::None,
        eeprom: EepromType::C46,
        players: 1,
    },
    GameDbEntry {
        crc32: 0x0F3A_8F83,
        name: "NFL Football",
        rotation: Rotation::Left,
        eeprom: EepromType::None,
        players: 2,
    },
    GameDbEntry {
        crc32: 0x0E16_6F3B,
        name: "Raiden",
        rotation: Rotation::Left,
        eeprom: EepromType::C46,
        players: 2,
    },
    GameDbEntry {
        crc32: 0x5B2B_76F4,
        name: "Todd's Adventures in Slime World",
        rotation: Rotation::None,
        eeprom: EepromType::None,
        players: 6,
    },
    GameDbEntry {
        crc32: 0x8595_C40B,
        name: "Zarlor Mercenary",
        rotation: Rotation::None,
        eeprom: EepromType::None,
        players: 4,
    },
];

/// Default properties for cartridges the database does not know.
pub const UNKNOWN_GAME: GameDbEntry = GameDbEntry {
    crc32: 0,
    name: "Unknown cartridge",
    rotation: Rotation::None,
    eeprom: EepromType::None,
    players: 1,
};

/// Look up a cartridge by image CRC-32.
pub fn find(crc: u32) -> Option<&'static GameDbEntry> {
    GAME_DB.iter().find(|entry| entry.crc32 == crc)
}

/// Look up by CRC-32 with the unknown-game fallback.
pub fn find_or_default(crc: u32) -> &'static GameDbEntry {
    find(crc).unwrap_or(&UNKNOWN_GAME)
}

/// Identify a cartridge image directly.
pub fn identify(image: &[u8]) -> &'static GameDbEntry {
    find_or_default(crc32(image))
}
