//! Controller input, including the movie-recorder key string.
//!
//! Tool-assisted playback feeds one nine-character frame at a time in
//! the key order `UDLRabOoP`: Up, Down, Left, Right, Option 1,
//! Option 2, A, B, Pause. A `.` leaves the key unpressed; any other
//! character in a position presses it.

use caracal_core::device::suzy::{
    JOY_A, JOY_B, JOY_DOWN, JOY_LEFT, JOY_OPTION1, JOY_OPTION2, JOY_RIGHT, JOY_UP, SWITCH_PAUSE,
};

/// Number of keys in one TAS frame string.
pub const TAS_FRAME_KEYS: usize = 9;

/// Joystick mask per string position (the final position is Pause,
/// which lives in the SWITCHES register instead).
const KEY_MASKS: [u8; 8] = [
    JOY_UP,
    JOY_DOWN,
    JOY_LEFT,
    JOY_RIGHT,
    JOY_OPTION1,
    JOY_OPTION2,
    JOY_A,
    JOY_B,
];

/// One frame of controller state decoded from a TAS string.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TasInput {
    /// Pressed-button mask in JOY_* encoding (1 = pressed; the
    /// hardware register itself is active-low).
    pub joystick: u8,
    /// Pressed-switch mask in SWITCH_* encoding.
    pub switches: u8,
}

impl TasInput {
    /// Decode a nine-character frame. Short frames leave the remaining
    /// keys unpressed; extra characters are ignored.
    pub fn parse(frame: &str) -> Self {
        let mut input = TasInput::default();
        for (i, ch) in frame.chars().take(TAS_FRAME_KEYS).enumerate() {
            if ch == '.' {
                continue;
            }
            if i < KEY_MASKS.len() {
                input.joystick |= KEY_MASKS[i];
            } else {
                input.switches |= SWITCH_PAUSE;
            }
        }
        input
    }

    /// Re-encode as the canonical key string.
    pub fn to_frame(self) -> String {
        let mut out = String::with_capacity(TAS_FRAME_KEYS);
        for (i, &mask) in KEY_MASKS.iter().enumerate() {
            out.push(if self.joystick & mask != 0 {
                "UDLRabOo".as_bytes()[i] as char
            } else {
                '.'
            });
        }
        out.push(if self.switches & SWITCH_PAUSE != 0 {
            'P'
        } else {
            '.'
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_presses_nothing() {
        let input = TasInput::parse(".........");
        assert_eq!(input.joystick, 0);
        assert_eq!(input.switches, 0);
    }

    #[test]
    fn each_position_maps_to_its_key() {
        assert_eq!(TasInput::parse("U........").joystick, JOY_UP);
        assert_eq!(TasInput::parse(".D.......").joystick, JOY_DOWN);
        assert_eq!(TasInput::parse("..L......").joystick, JOY_LEFT);
        assert_eq!(TasInput::parse("...R.....").joystick, JOY_RIGHT);
        assert_eq!(TasInput::parse("....a....").joystick, JOY_OPTION1);
        assert_eq!(TasInput::parse(".....b...").joystick, JOY_OPTION2);
        assert_eq!(TasInput::parse("......O..").joystick, JOY_A);
        assert_eq!(TasInput::parse(".......o.").joystick, JOY_B);
        assert_eq!(TasInput::parse("........P").switches, SWITCH_PAUSE);
    }

    #[test]
    fn combined_frame() {
        let input = TasInput::parse("U..R..O.P");
        assert_eq!(input.joystick, JOY_UP | JOY_RIGHT | JOY_A);
        assert_eq!(input.switches, SWITCH_PAUSE);
    }

    #[test]
    fn short_frame_is_padded() {
        let input = TasInput::parse("U");
        assert_eq!(input.joystick, JOY_UP);
        assert_eq!(input.switches, 0);
    }

    #[test]
    fn round_trip() {
        let frame = "UD..ab..P";
        assert_eq!(TasInput::parse(frame).to_frame(), frame);
    }
}
