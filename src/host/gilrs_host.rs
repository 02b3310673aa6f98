//! Desktop host adapter backed by gilrs
//!
//! Turns gilrs gamepad events into [`HostEvent`]s so the dispatcher can be
//! driven by real controllers outside a mobile view layer. Axis values follow
//! the host convention: Y axes grow downwards and the d-pad is a hat.

use std::collections::HashMap;

use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

use crate::dispatch::HostEvent;
use crate::host::{
    AxisId, DeviceId, DeviceInfo, DeviceTable, KeyCode, MotionAction, MotionRange,
    RawKeyEvent, RawMotionEvent, SourceFlags,
};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Failed to initialize gilrs: {0}")]
    Init(String),
}

/// Stick and trigger axes, with whether the value is negated.
const AXIS_MAP: [(Axis, AxisId, bool); 6] = [
    (Axis::LeftStickX, AxisId::X, false),
    (Axis::LeftStickY, AxisId::Y, true),
    (Axis::RightStickX, AxisId::Z, false),
    (Axis::RightStickY, AxisId::RZ, true),
    (Axis::LeftZ, AxisId::LTRIGGER, false),
    (Axis::RightZ, AxisId::RTRIGGER, false),
];

const GAMEPAD_SOURCES: SourceFlags = SourceFlags::GAMEPAD.union(SourceFlags::JOYSTICK);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPhase {
    Pressed,
    Repeated,
    Released,
}

/// gilrs ids start at 0, which the host reserves for virtual input.
pub fn device_id(id: GamepadId) -> DeviceId {
    DeviceId(usize::from(id) as u32 + 1)
}

pub fn key_code_for(button: Button) -> Option<KeyCode> {
    let code = match button {
        Button::South => KeyCode::BUTTON_A,
        Button::East => KeyCode::BUTTON_B,
        Button::West => KeyCode::BUTTON_X,
        Button::North => KeyCode::BUTTON_Y,
        Button::C => KeyCode::BUTTON_C,
        Button::Z => KeyCode::BUTTON_Z,
        Button::LeftTrigger => KeyCode::BUTTON_L1,
        Button::RightTrigger => KeyCode::BUTTON_R1,
        Button::LeftTrigger2 => KeyCode::BUTTON_L2,
        Button::RightTrigger2 => KeyCode::BUTTON_R2,
        Button::Select => KeyCode::BUTTON_SELECT,
        Button::Start => KeyCode::BUTTON_START,
        Button::Mode => KeyCode::BUTTON_MODE,
        Button::LeftThumb => KeyCode::BUTTON_THUMBL,
        Button::RightThumb => KeyCode::BUTTON_THUMBR,
        _ => return None,
    };
    Some(code)
}

/// D-pad buttons as a hat axis and the direction they push it.
fn hat_direction(button: Button) -> Option<(AxisId, f32)> {
    match button {
        Button::DPadUp => Some((AxisId::HAT_Y, -1.0)),
        Button::DPadDown => Some((AxisId::HAT_Y, 1.0)),
        Button::DPadLeft => Some((AxisId::HAT_X, -1.0)),
        Button::DPadRight => Some((AxisId::HAT_X, 1.0)),
        _ => None,
    }
}

fn trigger_axis(button: Button) -> Option<AxisId> {
    match button {
        Button::LeftTrigger2 => Some(AxisId::LTRIGGER),
        Button::RightTrigger2 => Some(AxisId::RTRIGGER),
        _ => None,
    }
}

fn host_axis(axis: Axis) -> Option<(AxisId, bool)> {
    match axis {
        Axis::DPadX => Some((AxisId::HAT_X, false)),
        Axis::DPadY => Some((AxisId::HAT_Y, true)),
        _ => AXIS_MAP
            .iter()
            .find(|(gilrs_axis, _, _)| *gilrs_axis == axis)
            .map(|(_, id, invert)| (*id, *invert)),
    }
}

/// Motion ranges for a pad, given which gilrs axes and buttons it exposes.
pub fn motion_ranges(
    has_axis: impl Fn(Axis) -> bool,
    has_button: impl Fn(Button) -> bool,
) -> Vec<MotionRange> {
    let mut axes: Vec<AxisId> = AXIS_MAP
        .iter()
        .filter(|(axis, _, _)| has_axis(*axis))
        .map(|(_, id, _)| *id)
        .collect();

    if has_button(Button::LeftTrigger2) {
        axes.push(AxisId::LTRIGGER);
    }
    if has_button(Button::RightTrigger2) {
        axes.push(AxisId::RTRIGGER);
    }
    if has_axis(Axis::DPadX) || has_button(Button::DPadLeft) || has_button(Button::DPadRight) {
        axes.push(AxisId::HAT_X);
    }
    if has_axis(Axis::DPadY) || has_button(Button::DPadUp) || has_button(Button::DPadDown) {
        axes.push(AxisId::HAT_Y);
    }

    axes.sort();
    axes.dedup();
    axes.into_iter()
        .map(|axis| MotionRange::new(axis, SourceFlags::JOYSTICK))
        .collect()
}

fn device_info(id: DeviceId, gamepad: &Gamepad<'_>) -> DeviceInfo {
    DeviceInfo {
        id,
        name: gamepad.name().to_string(),
        sources: GAMEPAD_SOURCES,
        motion_ranges: motion_ranges(
            |axis| gamepad.axis_code(axis).is_some(),
            |button| gamepad.button_code(button).is_some(),
        ),
    }
}

/// Last known axis values of one pad. Every motion carries the full set.
#[derive(Debug, Clone, Default)]
pub struct PadState {
    axes: HashMap<AxisId, f32>,
}

impl PadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(&self, axis: AxisId) -> f32 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }

    pub fn on_button(
        &mut self,
        device: DeviceId,
        button: Button,
        scan_code: i32,
        phase: ButtonPhase,
    ) -> Option<HostEvent> {
        if let Some((axis, direction)) = hat_direction(button) {
            return match phase {
                ButtonPhase::Pressed => Some(self.set_axis(device, axis, direction)),
                ButtonPhase::Released => Some(self.set_axis(device, axis, 0.0)),
                ButtonPhase::Repeated => None,
            };
        }

        let Some(key_code) = key_code_for(button) else {
            debug!("No key code for gilrs button {:?}", button);
            return None;
        };

        let key = RawKeyEvent {
            key_code,
            source: GAMEPAD_SOURCES,
            device_id: device,
            scan_code,
            unicode_char: 0,
            repeat_count: u32::from(phase == ButtonPhase::Repeated),
        };
        Some(match phase {
            ButtonPhase::Pressed | ButtonPhase::Repeated => HostEvent::KeyDown(key),
            ButtonPhase::Released => HostEvent::KeyUp(key),
        })
    }

    /// Analog value of a button; only the lower triggers have one.
    pub fn on_button_value(
        &mut self,
        device: DeviceId,
        button: Button,
        value: f32,
    ) -> Option<HostEvent> {
        let axis = trigger_axis(button)?;
        Some(self.set_axis(device, axis, value))
    }

    pub fn on_axis(&mut self, device: DeviceId, axis: Axis, value: f32) -> Option<HostEvent> {
        let Some((axis_id, invert)) = host_axis(axis) else {
            debug!("Ignoring unsupported axis: {:?}", axis);
            return None;
        };
        let value = if invert { -value } else { value };
        Some(self.set_axis(device, axis_id, value))
    }

    fn set_axis(&mut self, device: DeviceId, axis: AxisId, value: f32) -> HostEvent {
        self.axes.insert(axis, value);
        let mut motion =
            RawMotionEvent::new(GAMEPAD_SOURCES, MotionAction::Move).with_device(device);
        motion.axis_values = self.axes.clone();
        HostEvent::GenericMotion(motion)
    }
}

/// Polls gilrs and keeps a [`DeviceTable`] of connected pads.
pub struct GilrsHost {
    gilrs: Gilrs,
    table: DeviceTable,
    pads: HashMap<DeviceId, PadState>,
}

impl GilrsHost {
    pub fn new() -> Result<Self, HostError> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new().map_err(|e| {
            error!("Failed to initialize gilrs: {}", e);
            HostError::Init(e.to_string())
        })?;
        info!("Successfully initialized gilrs");

        let mut host = Self {
            gilrs,
            table: DeviceTable::new(),
            pads: HashMap::new(),
        };
        host.sync_devices();
        Ok(host)
    }

    /// Shared view of the connected pads for the dispatcher.
    pub fn devices(&self) -> DeviceTable {
        self.table.clone()
    }

    /// Record every pad gilrs already knows about.
    pub fn sync_devices(&mut self) {
        let found: Vec<(DeviceId, DeviceInfo)> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| {
                let device = device_id(id);
                (device, device_info(device, &gamepad))
            })
            .collect();

        if found.is_empty() {
            warn!("No gamepad connected, waiting for hotplug");
        } else {
            info!("Found {} gamepads:", found.len());
        }
        for (device, info) in found {
            info!("  {} Name: {}", device, info.name);
            self.table.insert(info);
            self.pads.entry(device).or_default();
        }
    }

    /// Drain every pending gilrs event.
    pub fn poll(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if let Some(host_event) = self.convert(id, event) {
                events.push(host_event);
            }
        }
        events
    }

    fn convert(&mut self, id: GamepadId, event: EventType) -> Option<HostEvent> {
        let device = device_id(id);
        debug!("Processing gilrs event {:?} from {}", event, device);

        match event {
            EventType::Connected => {
                let info = device_info(device, &self.gilrs.gamepad(id));
                info!("Controller connected: {} ({})", info.name, device);
                self.table.insert(info);
                self.pads.insert(device, PadState::new());
                Some(HostEvent::DeviceAdded(device))
            }
            EventType::Disconnected => {
                warn!("Controller disconnected: {}", device);
                self.table.remove(device);
                self.pads.remove(&device);
                Some(HostEvent::DeviceRemoved(device))
            }
            EventType::ButtonPressed(button, code) => self.pad(device).on_button(
                device,
                button,
                code.into_u32() as i32,
                ButtonPhase::Pressed,
            ),
            EventType::ButtonRepeated(button, code) => self.pad(device).on_button(
                device,
                button,
                code.into_u32() as i32,
                ButtonPhase::Repeated,
            ),
            EventType::ButtonReleased(button, code) => self.pad(device).on_button(
                device,
                button,
                code.into_u32() as i32,
                ButtonPhase::Released,
            ),
            EventType::ButtonChanged(button, value, _) => {
                self.pad(device).on_button_value(device, button, value)
            }
            EventType::AxisChanged(axis, value, _) => self.pad(device).on_axis(device, axis, value),
            _ => {
                debug!("Unhandled event type: {:?}", event);
                None
            }
        }
    }

    fn pad(&mut self, device: DeviceId) -> &mut PadState {
        self.pads.entry(device).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAD: DeviceId = DeviceId(1);

    #[test]
    fn face_buttons_follow_positional_layout() {
        assert_eq!(key_code_for(Button::South), Some(KeyCode::BUTTON_A));
        assert_eq!(key_code_for(Button::East), Some(KeyCode::BUTTON_B));
        assert_eq!(key_code_for(Button::West), Some(KeyCode::BUTTON_X));
        assert_eq!(key_code_for(Button::North), Some(KeyCode::BUTTON_Y));
        assert_eq!(key_code_for(Button::Mode), Some(KeyCode::BUTTON_MODE));
        assert_eq!(key_code_for(Button::Unknown), None);
    }

    #[test]
    fn repeat_is_a_key_down_echo() {
        let mut pad = PadState::new();
        let event = pad.on_button(PAD, Button::South, 304, ButtonPhase::Repeated);
        assert!(matches!(
            event,
            Some(HostEvent::KeyDown(RawKeyEvent { repeat_count: 1, scan_code: 304, .. }))
        ));

        let event = pad.on_button(PAD, Button::South, 304, ButtonPhase::Released);
        assert!(matches!(
            event,
            Some(HostEvent::KeyUp(RawKeyEvent { repeat_count: 0, .. }))
        ));
    }

    #[test]
    fn dpad_buttons_drive_the_hat() {
        let mut pad = PadState::new();
        pad.on_button(PAD, Button::DPadUp, 0, ButtonPhase::Pressed);
        assert_eq!(pad.axis(AxisId::HAT_Y), -1.0);

        let Some(HostEvent::GenericMotion(motion)) =
            pad.on_button(PAD, Button::DPadRight, 0, ButtonPhase::Pressed)
        else {
            panic!("expected motion");
        };
        assert_eq!(motion.axis_values.get(&AxisId::HAT_X), Some(&1.0));
        assert_eq!(motion.axis_values.get(&AxisId::HAT_Y), Some(&-1.0));
        assert_eq!(motion.device_id, PAD);

        pad.on_button(PAD, Button::DPadUp, 0, ButtonPhase::Released);
        assert_eq!(pad.axis(AxisId::HAT_Y), 0.0);
        assert!(pad
            .on_button(PAD, Button::DPadUp, 0, ButtonPhase::Repeated)
            .is_none());
    }

    #[test]
    fn stick_y_is_inverted_and_snapshot_is_full() {
        let mut pad = PadState::new();
        pad.on_axis(PAD, Axis::LeftStickX, 0.25);
        let Some(HostEvent::GenericMotion(motion)) = pad.on_axis(PAD, Axis::LeftStickY, 0.5)
        else {
            panic!("expected motion");
        };
        assert_eq!(motion.axis_values.get(&AxisId::X), Some(&0.25));
        assert_eq!(motion.axis_values.get(&AxisId::Y), Some(&-0.5));
        assert!(motion.source.contains(SourceFlags::JOYSTICK));
        assert_eq!(motion.action, MotionAction::Move);
    }

    #[test]
    fn only_lower_triggers_report_values() {
        let mut pad = PadState::new();
        assert!(pad.on_button_value(PAD, Button::South, 1.0).is_none());
        pad.on_button_value(PAD, Button::RightTrigger2, 0.75);
        assert_eq!(pad.axis(AxisId::RTRIGGER), 0.75);
    }

    #[test]
    fn ranges_cover_exposed_controls() {
        let ranges = motion_ranges(
            |axis| matches!(axis, Axis::LeftStickX | Axis::LeftStickY),
            |button| matches!(button, Button::LeftTrigger2 | Button::DPadUp),
        );
        let axes: Vec<AxisId> = ranges.iter().map(|range| range.axis).collect();
        assert_eq!(
            axes,
            vec![AxisId::X, AxisId::Y, AxisId::HAT_Y, AxisId::LTRIGGER]
        );
        assert!(ranges
            .iter()
            .all(|range| range.is_from_source(SourceFlags::JOYSTICK)));
    }
}
