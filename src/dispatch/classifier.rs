//! Source classification for key and motion events

use crate::host::SourceFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCategory {
    /// Button on a joystick, gamepad or directional pad.
    GameController,
    /// Ordinary key, including keyboards that also advertise a dpad.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionCategory {
    /// Mouse or stylus.
    Pointer,
    Touch,
}

/// Whether a key event comes from a game controller.
///
/// Most keyboards report `KEYBOARD | DPAD`; that exact combination is a text
/// source even though a dpad alone counts as a controller.
pub fn is_game_controller_source(source: SourceFlags) -> bool {
    if source == SourceFlags::KEYBOARD | SourceFlags::DPAD {
        return false;
    }

    source.contains(SourceFlags::JOYSTICK)
        || source.contains(SourceFlags::DPAD)
        || source.contains(SourceFlags::GAMEPAD)
}

/// Mouse and stylus share one path; pressure and tilt are not forwarded.
pub fn is_pointer_source(source: SourceFlags) -> bool {
    source.contains(SourceFlags::MOUSE) || source.contains(SourceFlags::STYLUS)
}

pub fn classify_key(source: SourceFlags) -> KeyCategory {
    if is_game_controller_source(source) {
        KeyCategory::GameController
    } else {
        KeyCategory::Text
    }
}

pub fn classify_motion(source: SourceFlags) -> MotionCategory {
    if is_pointer_source(source) {
        MotionCategory::Pointer
    } else {
        MotionCategory::Touch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_with_dpad_is_text() {
        assert_eq!(
            classify_key(SourceFlags::KEYBOARD | SourceFlags::DPAD),
            KeyCategory::Text
        );
        assert_eq!(classify_key(SourceFlags::DPAD), KeyCategory::GameController);
        assert_eq!(classify_key(SourceFlags::KEYBOARD), KeyCategory::Text);
    }

    #[test]
    fn keyboard_dpad_exclusion_is_exact() {
        // A gamepad that also claims keyboard and dpad is still a controller.
        let source = SourceFlags::KEYBOARD | SourceFlags::DPAD | SourceFlags::GAMEPAD;
        assert!(is_game_controller_source(source));
        assert!(is_game_controller_source(
            SourceFlags::GAMEPAD | SourceFlags::JOYSTICK
        ));
        assert!(is_game_controller_source(SourceFlags::JOYSTICK));
    }

    #[test]
    fn pointer_sources() {
        assert_eq!(classify_motion(SourceFlags::MOUSE), MotionCategory::Pointer);
        assert_eq!(classify_motion(SourceFlags::STYLUS), MotionCategory::Pointer);
        assert_eq!(
            classify_motion(SourceFlags::TOUCHSCREEN | SourceFlags::STYLUS),
            MotionCategory::Pointer
        );
        assert_eq!(
            classify_motion(SourceFlags::TOUCHSCREEN),
            MotionCategory::Touch
        );
        assert!(!is_pointer_source(SourceFlags::MOUSE_RELATIVE));
    }
}
