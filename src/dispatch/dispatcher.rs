//! Input dispatcher - the façade the view layer talks to
//!
//! The dispatcher holds no per-stream state of its own; it classifies each
//! event and routes it to the joystick registry or the motion normalizer.
//! Motion routing is an ordered chain of [`Stage`]s, each answering
//! [`Verdict::Handled`] or [`Verdict::Pass`]; the first handled stage wins.
//!
//! ```text
//! touch:          Gesture ─► DragContinuation ─► Pointer ─► Touch
//! generic motion: Gesture ─► JoystickAxes ─────► Pointer
//! ```

use tracing::{debug, info};

use crate::config::DispatcherSettings;
use crate::controller::{DeviceListener, JoystickRegistry};
use crate::dispatch::classifier::{classify_key, is_pointer_source, KeyCategory};
use crate::dispatch::motion;
use crate::engine::{CanonicalEvent, EngineSink};
use crate::host::{
    AxisId, AxisLookup, DeviceId, DeviceQuery, GestureRecognizer, KeyCode, MotionAction,
    NoGestures, NoopView, RawKeyEvent, RawMotionEvent, SourceFlags, Verdict, ViewCallbacks,
};

/// Routing stage for motion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Gesture recognizer, touch entry point.
    TouchGesture,
    /// Gesture recognizer, generic motion entry point.
    GenericGesture,
    /// Moves the recognizer declined are drags it already owns.
    DragContinuation,
    /// Joystick axis and hat motion for a registered device.
    JoystickAxes,
    /// Mouse and stylus.
    Pointer,
    /// Multi-touch.
    Touch,
}

const TOUCH_CHAIN: [Stage; 4] = [
    Stage::TouchGesture,
    Stage::DragContinuation,
    Stage::Pointer,
    Stage::Touch,
];

const GENERIC_MOTION_CHAIN: [Stage; 3] = [
    Stage::GenericGesture,
    Stage::JoystickAxes,
    Stage::Pointer,
];

/// Every notification the view layer can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    KeyDown(RawKeyEvent),
    KeyUp(RawKeyEvent),
    Touch(RawMotionEvent),
    GenericMotion(RawMotionEvent),
    DeviceAdded(DeviceId),
    DeviceRemoved(DeviceId),
    DeviceChanged(DeviceId),
    InitDevices,
    SetLongPressEnabled(bool),
    SetPanningAndScalingEnabled(bool),
}

pub struct InputDispatcher<S: EngineSink> {
    registry: JoystickRegistry,
    devices: Box<dyn DeviceQuery>,
    view: Box<dyn ViewCallbacks>,
    gestures: Box<dyn GestureRecognizer>,
    sink: S,
}

impl<S: EngineSink> InputDispatcher<S> {
    /// Dispatcher with no view callbacks and no gesture recognition.
    pub fn new(devices: impl DeviceQuery + 'static, sink: S) -> Self {
        Self {
            registry: JoystickRegistry::new(),
            devices: Box::new(devices),
            view: Box::new(NoopView),
            gestures: Box::new(NoGestures),
            sink,
        }
    }

    pub fn with_view(mut self, view: impl ViewCallbacks + 'static) -> Self {
        self.view = Box::new(view);
        self
    }

    pub fn with_gestures(mut self, gestures: impl GestureRecognizer + 'static) -> Self {
        self.gestures = Box::new(gestures);
        self
    }

    pub fn apply_settings(&mut self, settings: &DispatcherSettings) {
        debug!("Applying dispatcher settings: {:?}", settings);
        self.set_long_press_enabled(settings.long_press_enabled);
        self.set_panning_and_scaling_enabled(settings.panning_and_scaling_enabled);
    }

    pub fn registry(&self) -> &JoystickRegistry {
        &self.registry
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Route any host notification. Returns whether the event was consumed;
    /// device and settings notifications always are.
    pub fn handle(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::KeyDown(key) => self.on_key_down(&key),
            HostEvent::KeyUp(key) => self.on_key_up(&key),
            HostEvent::Touch(motion) => self.on_touch_event(&motion),
            HostEvent::GenericMotion(motion) => self.on_generic_motion_event(&motion),
            HostEvent::DeviceAdded(id) => {
                self.on_device_added(id);
                true
            }
            HostEvent::DeviceRemoved(id) => {
                self.on_device_removed(id);
                true
            }
            HostEvent::DeviceChanged(id) => {
                self.on_device_changed(id);
                true
            }
            HostEvent::InitDevices => {
                self.init_devices();
                true
            }
            HostEvent::SetLongPressEnabled(enabled) => {
                self.set_long_press_enabled(enabled);
                true
            }
            HostEvent::SetPanningAndScalingEnabled(enabled) => {
                self.set_panning_and_scaling_enabled(enabled);
                true
            }
        }
    }

    pub fn on_key_event(&mut self, event: &RawKeyEvent, is_down: bool) -> bool {
        if is_down {
            self.on_key_down(event)
        } else {
            self.on_key_up(event)
        }
    }

    pub fn on_key_down(&mut self, event: &RawKeyEvent) -> bool {
        if event.key_code == KeyCode::BACK {
            // Back never terminates the app; the view decides what it means.
            self.view.on_back_pressed();
            return true;
        }

        if event.key_code.is_volume() {
            return false;
        }

        match classify_key(event.source) {
            KeyCategory::GameController => {
                if event.repeat_count > 0 {
                    debug!(
                        "Ignoring key echo {} (repeat {}) from {}",
                        event.key_code, event.repeat_count, event.device_id
                    );
                    return true;
                }
                self.registry
                    .report_button(event.device_id, event.key_code, true, &mut self.sink);
            }
            KeyCategory::Text => self.emit_key(event, true),
        }

        true
    }

    pub fn on_key_up(&mut self, event: &RawKeyEvent) -> bool {
        if event.key_code == KeyCode::BACK {
            return true;
        }

        if event.key_code.is_volume() {
            return false;
        }

        match classify_key(event.source) {
            KeyCategory::GameController => {
                self.registry
                    .report_button(event.device_id, event.key_code, false, &mut self.sink);
            }
            KeyCategory::Text => self.emit_key(event, false),
        }

        true
    }

    pub fn on_touch_event(&mut self, event: &RawMotionEvent) -> bool {
        self.run_chain(&TOUCH_CHAIN, event)
    }

    pub fn on_generic_motion_event(&mut self, event: &RawMotionEvent) -> bool {
        self.run_chain(&GENERIC_MOTION_CHAIN, event)
    }

    /// Register every device the host already knows about.
    ///
    /// Needed at startup because devices connected before the process started
    /// never produce an added notification. Safe to call again.
    pub fn init_devices(&mut self) {
        let ids = self.devices.device_ids();
        info!("Initializing input devices, host reports {}", ids.len());
        for id in ids {
            if let Some(device) = self.devices.device(id) {
                debug!("init: {}, name: {}", id, device.name);
            }
            self.on_device_added(id);
        }
    }

    pub fn on_device_added(&mut self, device_id: DeviceId) {
        self.registry
            .on_device_added(&*self.devices, device_id, &mut self.sink);
    }

    pub fn on_device_removed(&mut self, device_id: DeviceId) {
        self.registry.on_device_removed(device_id, &mut self.sink);
    }

    pub fn on_device_changed(&mut self, device_id: DeviceId) {
        self.registry
            .on_device_changed(&*self.devices, device_id, &mut self.sink);
    }

    pub fn set_long_press_enabled(&mut self, enabled: bool) {
        self.gestures.set_long_press_enabled(enabled);
    }

    pub fn set_panning_and_scaling_enabled(&mut self, enabled: bool) {
        self.gestures.set_panning_and_scaling_enabled(enabled);
    }

    fn emit_key(&mut self, event: &RawKeyEvent, pressed: bool) {
        self.sink.emit(CanonicalEvent::Key {
            key_code: event.key_code,
            scan_code: event.scan_code,
            unicode_char: event.unicode_char,
            pressed,
        });
    }

    fn run_chain(&mut self, chain: &[Stage], event: &RawMotionEvent) -> bool {
        for &stage in chain {
            if self.run_stage(stage, event).is_handled() {
                debug!("{:?} from {} handled by {:?}", event.action, event.device_id, stage);
                return true;
            }
        }
        debug!("{:?} from {} not handled", event.action, event.device_id);
        false
    }

    fn run_stage(&mut self, stage: Stage, event: &RawMotionEvent) -> Verdict {
        match stage {
            Stage::TouchGesture => self.gestures.on_touch_event(event, &mut self.sink),
            Stage::GenericGesture => self.gestures.on_generic_motion_event(event, &mut self.sink),
            Stage::DragContinuation => {
                Verdict::from_consumed(event.action == MotionAction::Move)
            }
            Stage::JoystickAxes => {
                if !event.source.contains(SourceFlags::JOYSTICK)
                    || event.action != MotionAction::Move
                {
                    return Verdict::Pass;
                }
                let hat_x = round_hat(event.axis_value(AxisId::HAT_X));
                let hat_y = round_hat(event.axis_value(AxisId::HAT_Y));
                Verdict::from_consumed(self.registry.report_axis_motion(
                    event.device_id,
                    event,
                    hat_x,
                    hat_y,
                    &mut self.sink,
                ))
            }
            Stage::Pointer => {
                if !is_pointer_source(event.source) {
                    return Verdict::Pass;
                }
                Verdict::from_consumed(motion::handle_pointer_event(event, &mut self.sink))
            }
            Stage::Touch => {
                // Pointer sources were already decided by the pointer stage.
                if is_pointer_source(event.source) {
                    return Verdict::Pass;
                }
                Verdict::from_consumed(motion::handle_touch_event(event, &mut self.sink))
            }
        }
    }
}

/// Half-way values round up, so -0.5 becomes 0.
fn round_hat(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}
