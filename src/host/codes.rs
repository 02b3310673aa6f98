//! Platform input constants
//!
//! Numeric values follow the Android input constants, which is the reference
//! vocabulary every host adapter translates into before handing events to the
//! dispatcher.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Input modalities a device or event claims to originate from.
    ///
    /// Each modality is a class bit plus a modality bit, so a source "has"
    /// a modality only when every bit of that constant is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct SourceFlags: u32 {
        const KEYBOARD = 0x0000_0101;
        const DPAD = 0x0000_0201;
        const GAMEPAD = 0x0000_0401;
        const TOUCHSCREEN = 0x0000_1002;
        const MOUSE = 0x0000_2002;
        const STYLUS = 0x0000_4002;
        const MOUSE_RELATIVE = 0x0002_0004;
        const TOUCHPAD = 0x0010_0008;
        const JOYSTICK = 0x0100_0010;
    }
}

bitflags! {
    /// Pointer button state carried on mouse and stylus motion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct ButtonMask: u32 {
        const PRIMARY = 1 << 0;
        const SECONDARY = 1 << 1;
        const TERTIARY = 1 << 2;
        const BACK = 1 << 3;
        const FORWARD = 1 << 4;
        const STYLUS_PRIMARY = 1 << 5;
        const STYLUS_SECONDARY = 1 << 6;
    }
}

/// Platform key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub i32);

impl KeyCode {
    pub const BACK: KeyCode = KeyCode(4);
    pub const DPAD_UP: KeyCode = KeyCode(19);
    pub const DPAD_DOWN: KeyCode = KeyCode(20);
    pub const DPAD_LEFT: KeyCode = KeyCode(21);
    pub const DPAD_RIGHT: KeyCode = KeyCode(22);
    pub const DPAD_CENTER: KeyCode = KeyCode(23);
    pub const VOLUME_UP: KeyCode = KeyCode(24);
    pub const VOLUME_DOWN: KeyCode = KeyCode(25);
    pub const A: KeyCode = KeyCode(29);
    pub const SPACE: KeyCode = KeyCode(62);
    pub const ENTER: KeyCode = KeyCode(66);
    pub const BUTTON_A: KeyCode = KeyCode(96);
    pub const BUTTON_B: KeyCode = KeyCode(97);
    pub const BUTTON_C: KeyCode = KeyCode(98);
    pub const BUTTON_X: KeyCode = KeyCode(99);
    pub const BUTTON_Y: KeyCode = KeyCode(100);
    pub const BUTTON_Z: KeyCode = KeyCode(101);
    pub const BUTTON_L1: KeyCode = KeyCode(102);
    pub const BUTTON_R1: KeyCode = KeyCode(103);
    pub const BUTTON_L2: KeyCode = KeyCode(104);
    pub const BUTTON_R2: KeyCode = KeyCode(105);
    pub const BUTTON_THUMBL: KeyCode = KeyCode(106);
    pub const BUTTON_THUMBR: KeyCode = KeyCode(107);
    pub const BUTTON_START: KeyCode = KeyCode(108);
    pub const BUTTON_SELECT: KeyCode = KeyCode(109);
    pub const BUTTON_MODE: KeyCode = KeyCode(110);
    /// First of sixteen consecutive generic numbered buttons.
    pub const BUTTON_1: KeyCode = KeyCode(188);
    pub const BUTTON_16: KeyCode = KeyCode(203);

    /// Numbered button `BUTTON_1 + n`.
    pub const fn numbered_button(n: i32) -> KeyCode {
        KeyCode(Self::BUTTON_1.0 + n)
    }

    pub fn is_volume(self) -> bool {
        self == Self::VOLUME_UP || self == Self::VOLUME_DOWN
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key#{}", self.0)
    }
}

/// Platform motion axis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AxisId(pub i32);

impl AxisId {
    pub const X: AxisId = AxisId(0);
    pub const Y: AxisId = AxisId(1);
    pub const VSCROLL: AxisId = AxisId(9);
    pub const HSCROLL: AxisId = AxisId(10);
    pub const Z: AxisId = AxisId(11);
    pub const RX: AxisId = AxisId(12);
    pub const RY: AxisId = AxisId(13);
    pub const RZ: AxisId = AxisId(14);
    pub const HAT_X: AxisId = AxisId(15);
    pub const HAT_Y: AxisId = AxisId(16);
    pub const LTRIGGER: AxisId = AxisId(17);
    pub const RTRIGGER: AxisId = AxisId(18);
    pub const GAS: AxisId = AxisId(22);
    pub const BRAKE: AxisId = AxisId(23);

    pub fn is_hat(self) -> bool {
        self == Self::HAT_X || self == Self::HAT_Y
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axis#{}", self.0)
    }
}

/// Masked motion action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionAction {
    Down,
    Up,
    Move,
    Cancel,
    Outside,
    PointerDown,
    PointerUp,
    HoverMove,
    Scroll,
    HoverEnter,
    HoverExit,
    ButtonPress,
    ButtonRelease,
    Other(i32),
}

impl MotionAction {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => MotionAction::Down,
            1 => MotionAction::Up,
            2 => MotionAction::Move,
            3 => MotionAction::Cancel,
            4 => MotionAction::Outside,
            5 => MotionAction::PointerDown,
            6 => MotionAction::PointerUp,
            7 => MotionAction::HoverMove,
            8 => MotionAction::Scroll,
            9 => MotionAction::HoverEnter,
            10 => MotionAction::HoverExit,
            11 => MotionAction::ButtonPress,
            12 => MotionAction::ButtonRelease,
            other => MotionAction::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            MotionAction::Down => 0,
            MotionAction::Up => 1,
            MotionAction::Move => 2,
            MotionAction::Cancel => 3,
            MotionAction::Outside => 4,
            MotionAction::PointerDown => 5,
            MotionAction::PointerUp => 6,
            MotionAction::HoverMove => 7,
            MotionAction::Scroll => 8,
            MotionAction::HoverEnter => 9,
            MotionAction::HoverExit => 10,
            MotionAction::ButtonPress => 11,
            MotionAction::ButtonRelease => 12,
            MotionAction::Other(code) => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_with_dpad_contains_both_but_not_gamepad() {
        let source = SourceFlags::KEYBOARD | SourceFlags::DPAD;
        assert!(source.contains(SourceFlags::KEYBOARD));
        assert!(source.contains(SourceFlags::DPAD));
        assert!(!source.contains(SourceFlags::GAMEPAD));
    }

    #[test]
    fn class_bit_alone_does_not_imply_modality() {
        // Touchscreen shares the pointer class bit with mouse.
        assert!(!SourceFlags::TOUCHSCREEN.contains(SourceFlags::MOUSE));
        assert!(!SourceFlags::MOUSE.contains(SourceFlags::STYLUS));
    }

    #[test]
    fn unknown_action_codes_survive() {
        assert_eq!(MotionAction::from_code(42), MotionAction::Other(42));
        assert_eq!(MotionAction::from_code(42).code(), 42);
        assert_eq!(MotionAction::from_code(5), MotionAction::PointerDown);
    }

    #[test]
    fn numbered_buttons_are_contiguous() {
        assert_eq!(KeyCode::numbered_button(15), KeyCode::BUTTON_16);
    }
}
