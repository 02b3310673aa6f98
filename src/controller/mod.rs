//! Controller subsystem for joystick and gamepad state
//!
//! 1. [`buttons`] - platform key code to canonical button translation
//! 2. [`registry`] - device lifecycle, logical slots, axis/hat suppression
//!
//! # Architecture
//!
//! ```text
//! device added/removed/changed ──► JoystickRegistry ──► JoyConnectionChanged
//! joystick motion ───────────────► JoystickRegistry ──► JoyAxis / JoyHat
//! controller key ──► buttons ────► JoystickRegistry ──► JoyButton
//! ```

pub mod buttons;
pub mod registry;

pub use buttons::{translate, ButtonCodeError};
pub use registry::{DeviceListener, Joystick, JoystickRegistry, HAT_SENTINEL};
