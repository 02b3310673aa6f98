//! Canonical event vocabulary delivered to the engine runtime
//!
//! The dispatcher never talks to the engine directly: every normalized event
//! is handed to an [`EngineSink`]. Two sinks ship with the crate:
//!
//! - `Vec<CanonicalEvent>` - collects events in memory
//! - `tokio::sync::mpsc::Sender<CanonicalEvent>` - forwards to another task

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::host::{ButtonMask, KeyCode, MotionAction, Pointer};

/// Controller slot as seen by the engine. Small, reused after disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalId(pub u32);

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joy{}", self.0)
    }
}

/// Button index in the canonical controller layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalButton(pub u8);

#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalEvent {
    Key {
        key_code: KeyCode,
        scan_code: i32,
        unicode_char: u32,
        pressed: bool,
    },
    JoyButton {
        joy: LogicalId,
        button: CanonicalButton,
        pressed: bool,
    },
    JoyAxis {
        joy: LogicalId,
        /// Position of the platform axis in the joystick's sorted axis list.
        axis: usize,
        value: f32,
    },
    JoyHat {
        joy: LogicalId,
        x: i32,
        y: i32,
    },
    JoyConnectionChanged {
        joy: LogicalId,
        connected: bool,
        name: String,
    },
    Mouse {
        action: MotionAction,
        buttons: ButtonMask,
        x: f32,
        y: f32,
        scroll_x: f32,
        scroll_y: f32,
        double_click: bool,
    },
    Touch {
        action: MotionAction,
        /// Id of the pointer that triggered the action.
        pointer_id: i32,
        pointers: Vec<Pointer>,
    },
}

impl CanonicalEvent {
    /// Number of pointers carried by a touch event, zero for anything else.
    pub fn pointer_count(&self) -> usize {
        match self {
            CanonicalEvent::Touch { pointers, .. } => pointers.len(),
            _ => 0,
        }
    }

    /// Logical joystick the event belongs to, if any.
    pub fn joystick(&self) -> Option<LogicalId> {
        match self {
            CanonicalEvent::JoyButton { joy, .. }
            | CanonicalEvent::JoyAxis { joy, .. }
            | CanonicalEvent::JoyHat { joy, .. }
            | CanonicalEvent::JoyConnectionChanged { joy, .. } => Some(*joy),
            _ => None,
        }
    }
}

/// Receiver of normalized events.
pub trait EngineSink {
    fn emit(&mut self, event: CanonicalEvent);
}

impl EngineSink for Vec<CanonicalEvent> {
    fn emit(&mut self, event: CanonicalEvent) {
        self.push(event);
    }
}

impl EngineSink for mpsc::Sender<CanonicalEvent> {
    fn emit(&mut self, event: CanonicalEvent) {
        // Emission happens on the input thread and must never block.
        match self.try_send(event) {
            Ok(_) => debug!("Canonical event queued for engine"),
            Err(mpsc::error::TrySendError::Full(event)) => {
                error!("Engine queue full, dropping event: {:?}", event);
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                error!("Engine queue closed, dropping event: {:?}", event);
            }
        }
    }
}

impl<S: EngineSink + ?Sized> EngineSink for &mut S {
    fn emit(&mut self, event: CanonicalEvent) {
        (**self).emit(event);
    }
}
