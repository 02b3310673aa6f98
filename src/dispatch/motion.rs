//! Motion normalization into canonical mouse and touch events
//!
//! Two families, chosen by the event source:
//!
//! - **Pointer** (mouse, stylus): one [`CanonicalEvent::Mouse`] per event.
//!   Release and cancel always carry an empty button mask.
//! - **Touch**: one [`CanonicalEvent::Touch`] carrying every active pointer.
//!
//! The `dispatch_*` helpers are also the entry points gesture recognizers use
//! to emit synthetic events.

use tracing::{debug, warn};

use crate::dispatch::classifier::{classify_motion, MotionCategory};
use crate::engine::{CanonicalEvent, EngineSink};
use crate::host::{ButtonMask, MotionAction, Pointer, RawMotionEvent, SourceFlags};

/// Normalize a pointer event. Returns whether it was consumed.
pub fn handle_pointer_event(event: &RawMotionEvent, sink: &mut dyn EngineSink) -> bool {
    let (x, y) = event.position();
    let (scroll_x, scroll_y) = event.scroll_delta();
    dispatch_pointer(
        sink,
        event.action,
        event.button_state,
        x,
        y,
        scroll_x,
        scroll_y,
        false,
    )
}

/// Normalize a touch event. Returns whether it was consumed.
pub fn handle_touch_event(event: &RawMotionEvent, sink: &mut dyn EngineSink) -> bool {
    if event.pointers.is_empty() {
        debug!("Touch event without pointers, nothing to dispatch");
        return true;
    }

    let pointer_id = match event.pointers.get(event.action_index) {
        Some(pointer) => pointer.id,
        None => {
            warn!(
                "Action index {} out of range for {} pointers, using first pointer",
                event.action_index,
                event.pointers.len()
            );
            event.pointers[0].id
        }
    };

    dispatch_touch(sink, event.action, pointer_id, event.pointers.clone())
}

/// Route by source: pointer sources go to the mouse path, the rest to touch.
pub fn handle_motion_event(event: &RawMotionEvent, sink: &mut dyn EngineSink) -> bool {
    match classify_motion(event.source) {
        MotionCategory::Pointer => handle_pointer_event(event, sink),
        MotionCategory::Touch => handle_touch_event(event, sink),
    }
}

/// Emit a mouse event for a handled action.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_pointer(
    sink: &mut dyn EngineSink,
    action: MotionAction,
    buttons: ButtonMask,
    x: f32,
    y: f32,
    scroll_x: f32,
    scroll_y: f32,
    double_click: bool,
) -> bool {
    let buttons = match action {
        MotionAction::Up | MotionAction::Cancel => ButtonMask::empty(),
        MotionAction::Down
        | MotionAction::HoverEnter
        | MotionAction::HoverExit
        | MotionAction::HoverMove
        | MotionAction::Move
        | MotionAction::Scroll => buttons,
        other => {
            debug!("Pointer action {:?} not handled", other);
            return false;
        }
    };

    sink.emit(CanonicalEvent::Mouse {
        action,
        buttons,
        x,
        y,
        scroll_x,
        scroll_y,
        double_click,
    });
    true
}

/// Emit a touch event for a handled action.
pub fn dispatch_touch(
    sink: &mut dyn EngineSink,
    action: MotionAction,
    pointer_id: i32,
    pointers: Vec<Pointer>,
) -> bool {
    match action {
        MotionAction::Down
        | MotionAction::Up
        | MotionAction::Cancel
        | MotionAction::Move
        | MotionAction::PointerDown
        | MotionAction::PointerUp => {
            sink.emit(CanonicalEvent::Touch {
                action,
                pointer_id,
                pointers,
            });
            true
        }
        other => {
            debug!("Touch action {:?} not handled", other);
            false
        }
    }
}

/// Single-finger touch at `(x, y)` as pointer 0.
pub fn dispatch_single_touch(
    sink: &mut dyn EngineSink,
    action: MotionAction,
    x: f32,
    y: f32,
) -> bool {
    dispatch_touch(sink, action, 0, vec![Pointer::new(0, x, y)])
}

/// Synthetic event routed by source, the way a recognizer replays a tap.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_synthetic(
    sink: &mut dyn EngineSink,
    source: SourceFlags,
    action: MotionAction,
    buttons: ButtonMask,
    x: f32,
    y: f32,
    scroll_x: f32,
    scroll_y: f32,
    double_click: bool,
) -> bool {
    match classify_motion(source) {
        MotionCategory::Pointer => {
            dispatch_pointer(sink, action, buttons, x, y, scroll_x, scroll_y, double_click)
        }
        MotionCategory::Touch => dispatch_single_touch(sink, action, x, y),
    }
}
