//! Platform key code to canonical controller button translation

use crate::engine::CanonicalButton;
use crate::host::KeyCode;

/// First canonical index used by the generic numbered buttons.
pub const NUMBERED_BUTTON_BASE: u8 = 20;

/// Number of generic numbered buttons the platform defines.
pub const NUMBERED_BUTTON_COUNT: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ButtonCodeError {
    /// Neither a named controller button nor a numbered button.
    #[error("No canonical controller button for {0}")]
    Unmapped(KeyCode),
}

/// Translate a platform key code into the canonical controller layout.
///
/// Face buttons follow the position convention, not the label: platform `A`
/// is the bottom button (0) and platform `X` the left one (2).
///
/// `BUTTON_1 + n` maps to `20 + n`. Anything else is rejected rather than
/// turned into an arbitrary index.
pub fn translate(key_code: KeyCode) -> Result<CanonicalButton, ButtonCodeError> {
    let index = match key_code {
        KeyCode::BUTTON_A => 0,
        KeyCode::BUTTON_B => 1,
        KeyCode::BUTTON_X => 2,
        KeyCode::BUTTON_Y => 3,
        KeyCode::BUTTON_SELECT => 4,
        KeyCode::BUTTON_MODE => 5,
        KeyCode::BUTTON_START => 6,
        KeyCode::BUTTON_THUMBL => 7,
        KeyCode::BUTTON_THUMBR => 8,
        KeyCode::BUTTON_L1 => 9,
        KeyCode::BUTTON_R1 => 10,
        KeyCode::DPAD_UP => 11,
        KeyCode::DPAD_DOWN => 12,
        KeyCode::DPAD_LEFT => 13,
        KeyCode::DPAD_RIGHT => 14,
        KeyCode::BUTTON_L2 => 15,
        KeyCode::BUTTON_R2 => 16,
        KeyCode::BUTTON_C => 17,
        KeyCode::BUTTON_Z => 18,
        other => {
            let offset = other.0 - KeyCode::BUTTON_1.0;
            if !(0..NUMBERED_BUTTON_COUNT).contains(&offset) {
                return Err(ButtonCodeError::Unmapped(other));
            }
            // Offset is below 16, the sum stays well inside u8.
            NUMBERED_BUTTON_BASE + offset as u8
        }
    };

    Ok(CanonicalButton(index))
}
