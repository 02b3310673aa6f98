//! Host-facing vocabulary and collaborator interfaces
//!
//! Everything the view layer hands to the dispatcher, and everything the
//! dispatcher asks of its collaborators, is declared here:
//!
//! 1. [`codes`] - platform constants (sources, buttons, keys, axes, actions)
//! 2. [`table`] - shared in-memory device table implementing [`DeviceQuery`]
//! 3. `gilrs_host` - desktop adapter feeding gilrs gamepads (feature `gilrs-host`)
//!
//! # Architecture
//!
//! ```text
//! View layer ──► RawKeyEvent / RawMotionEvent ──► InputDispatcher
//!                                                   │
//!                 DeviceQuery ◄─────────────────────┤ (device lookups)
//!                 ViewCallbacks ◄───────────────────┤ (back key)
//!                 GestureRecognizer ◄───────────────┘ (first refusal on motion)
//! ```

pub mod codes;
#[cfg(feature = "gilrs-host")]
pub mod gilrs_host;
pub mod table;

use std::collections::HashMap;
use std::fmt;

use crate::engine::EngineSink;

pub use codes::{AxisId, ButtonMask, KeyCode, MotionAction, SourceFlags};
pub use table::DeviceTable;

/// Opaque host device handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// Id the host assigns to events synthesized without a physical device.
    pub const VIRTUAL: DeviceId = DeviceId(0);
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// One motion axis a device reports, and the source it reports it under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRange {
    pub axis: AxisId,
    pub source: SourceFlags,
}

impl MotionRange {
    pub fn new(axis: AxisId, source: SourceFlags) -> Self {
        Self { axis, source }
    }

    pub fn is_from_source(&self, source: SourceFlags) -> bool {
        self.source.contains(source)
    }
}

/// Result of a host device lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub sources: SourceFlags,
    pub motion_ranges: Vec<MotionRange>,
}

/// A single active pointer in a motion event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: i32,
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub fn new(id: i32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawKeyEvent {
    pub key_code: KeyCode,
    pub source: SourceFlags,
    pub device_id: DeviceId,
    pub scan_code: i32,
    /// Unicode code point with no meta state applied, 0 when the key has none.
    pub unicode_char: u32,
    pub repeat_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawMotionEvent {
    pub source: SourceFlags,
    pub action: MotionAction,
    pub device_id: DeviceId,
    pub pointers: Vec<Pointer>,
    /// Index into `pointers` of the pointer that triggered this action.
    pub action_index: usize,
    pub button_state: ButtonMask,
    pub axis_values: HashMap<AxisId, f32>,
}

impl RawMotionEvent {
    pub fn new(source: SourceFlags, action: MotionAction) -> Self {
        Self {
            source,
            action,
            device_id: DeviceId::VIRTUAL,
            pointers: Vec::new(),
            action_index: 0,
            button_state: ButtonMask::empty(),
            axis_values: HashMap::new(),
        }
    }

    pub fn with_device(mut self, device_id: DeviceId) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn with_pointer(mut self, pointer: Pointer) -> Self {
        self.pointers.push(pointer);
        self
    }

    pub fn with_action_index(mut self, index: usize) -> Self {
        self.action_index = index;
        self
    }

    pub fn with_buttons(mut self, buttons: ButtonMask) -> Self {
        self.button_state = buttons;
        self
    }

    pub fn with_axis(mut self, axis: AxisId, value: f32) -> Self {
        self.axis_values.insert(axis, value);
        self
    }

    /// Horizontal and vertical scroll deltas.
    pub fn scroll_delta(&self) -> (f32, f32) {
        (self.axis_value(AxisId::HSCROLL), self.axis_value(AxisId::VSCROLL))
    }

    /// Position of the first pointer, origin when there is none.
    pub fn position(&self) -> (f32, f32) {
        self.pointers.first().map_or((0.0, 0.0), |p| (p.x, p.y))
    }
}

/// Per-axis value lookup. Axes the event does not carry read as zero.
pub trait AxisLookup {
    fn axis_value(&self, axis: AxisId) -> f32;
}

impl AxisLookup for RawMotionEvent {
    fn axis_value(&self, axis: AxisId) -> f32 {
        self.axis_values.get(&axis).copied().unwrap_or(0.0)
    }
}

impl AxisLookup for HashMap<AxisId, f32> {
    fn axis_value(&self, axis: AxisId) -> f32 {
        self.get(&axis).copied().unwrap_or(0.0)
    }
}

/// Outcome of one routing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Handled,
    Pass,
}

impl Verdict {
    pub fn from_consumed(consumed: bool) -> Self {
        if consumed {
            Verdict::Handled
        } else {
            Verdict::Pass
        }
    }

    pub fn is_handled(self) -> bool {
        self == Verdict::Handled
    }
}

/// Host device enumeration interface.
pub trait DeviceQuery: Send {
    fn device_ids(&self) -> Vec<DeviceId>;

    /// `None` when the host no longer knows the device.
    fn device(&self, id: DeviceId) -> Option<DeviceInfo>;
}

/// Callbacks into the view that owns the drawable surface.
pub trait ViewCallbacks: Send {
    fn on_back_pressed(&mut self);
}

/// View that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopView;

impl ViewCallbacks for NoopView {
    fn on_back_pressed(&mut self) {}
}

/// Gesture recognition collaborator.
///
/// Offered every touch and generic motion event before any other routing. A
/// recognizer that takes over an event may emit synthetic mouse or touch
/// events through the sink (see [`crate::dispatch::motion`]).
pub trait GestureRecognizer: Send {
    fn on_touch_event(&mut self, event: &RawMotionEvent, sink: &mut dyn EngineSink) -> Verdict;

    fn on_generic_motion_event(
        &mut self,
        event: &RawMotionEvent,
        sink: &mut dyn EngineSink,
    ) -> Verdict;

    fn set_long_press_enabled(&mut self, enabled: bool);

    fn set_panning_and_scaling_enabled(&mut self, enabled: bool);
}

/// Recognizer that never claims an event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGestures;

impl GestureRecognizer for NoGestures {
    fn on_touch_event(&mut self, _event: &RawMotionEvent, _sink: &mut dyn EngineSink) -> Verdict {
        Verdict::Pass
    }

    fn on_generic_motion_event(
        &mut self,
        _event: &RawMotionEvent,
        _sink: &mut dyn EngineSink,
    ) -> Verdict {
        Verdict::Pass
    }

    fn set_long_press_enabled(&mut self, _enabled: bool) {}

    fn set_panning_and_scaling_enabled(&mut self, _enabled: bool) {}
}
