//! Joystick registry - device lifecycle and per-joystick state
//!
//! Owns the mapping from host device handles to logical joystick slots and
//! the last reported axis and hat values of every connected controller.
//!
//! # Slot assignment
//!
//! A newly connected controller receives the lowest logical id not currently
//! in use, so slots freed by a disconnect are handed out again:
//!
//! ```text
//! add A ─► joy0   add B ─► joy1   remove A   add C ─► joy0
//! ```
//!
//! # Change suppression
//!
//! Hosts report every axis on every motion event. An axis event is emitted
//! only when the value differs from the last one stored for that axis, and a
//! hat event only when the rounded hat position changes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::controller::buttons;
use crate::engine::{CanonicalEvent, EngineSink, LogicalId};
use crate::host::{AxisId, AxisLookup, DeviceId, DeviceInfo, DeviceQuery, KeyCode, SourceFlags};

/// Hat position stored before the first report. No rounded axis value can
/// produce it, so the first real report always differs.
pub const HAT_SENTINEL: (i32, i32) = (i32::MIN, i32::MIN);

/// One connected controller.
#[derive(Debug, Clone)]
pub struct Joystick {
    pub device_id: DeviceId,
    pub logical_id: LogicalId,
    pub name: String,
    /// Platform axes, ascending and unique. The position is the canonical axis.
    pub axes: Vec<AxisId>,
    pub has_hat_axes: bool,
    pub last_axis_values: HashMap<AxisId, f32>,
    pub last_hat: (i32, i32),
}

impl Joystick {
    fn from_device(info: &DeviceInfo, logical_id: LogicalId) -> Self {
        let mut axes = Vec::new();
        let mut seen = HashSet::new();
        let mut has_hat_axes = false;

        for range in &info.motion_ranges {
            let from_joystick = range.is_from_source(SourceFlags::JOYSTICK);
            let from_gamepad = range.is_from_source(SourceFlags::GAMEPAD);
            if !from_joystick && !from_gamepad {
                continue;
            }

            if range.axis.is_hat() {
                has_hat_axes = true;
            } else if seen.insert(range.axis) {
                axes.push(range.axis);
            } else {
                warn!(
                    "Duplicate axis {} reported by {} ({}), ignoring",
                    range.axis, info.id, info.name
                );
            }
        }
        axes.sort_unstable();

        Self {
            device_id: info.id,
            logical_id,
            name: info.name.clone(),
            axes,
            has_hat_axes,
            last_axis_values: HashMap::new(),
            last_hat: HAT_SENTINEL,
        }
    }

    /// Canonical index of a platform axis.
    pub fn canonical_axis(&self, axis: AxisId) -> Option<usize> {
        self.axes.iter().position(|&a| a == axis)
    }
}

/// Capability a host device-notification source drives.
///
/// Added and changed notifications carry only the device id; the listener
/// resolves it through the host's [`DeviceQuery`] at the time of the call.
pub trait DeviceListener {
    fn on_device_added(
        &mut self,
        host: &dyn DeviceQuery,
        device_id: DeviceId,
        sink: &mut dyn EngineSink,
    );

    fn on_device_removed(&mut self, device_id: DeviceId, sink: &mut dyn EngineSink);

    fn on_device_changed(
        &mut self,
        host: &dyn DeviceQuery,
        device_id: DeviceId,
        sink: &mut dyn EngineSink,
    );
}

#[derive(Debug, Default)]
pub struct JoystickRegistry {
    joysticks: HashMap<DeviceId, Joystick>,
}

impl JoystickRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller.
    ///
    /// `device` is the host lookup result for `device_id`; `None` means the
    /// lookup failed. Returns the assigned slot, or `None` when the device is
    /// already registered, unknown to the host, or not a joystick or gamepad.
    pub fn device_added(
        &mut self,
        device_id: DeviceId,
        device: Option<&DeviceInfo>,
        sink: &mut dyn EngineSink,
    ) -> Option<LogicalId> {
        if self.joysticks.contains_key(&device_id) {
            debug!("{} already registered, skipping", device_id);
            return None;
        }

        let Some(info) = device else {
            debug!("{} not found by host, skipping", device_id);
            return None;
        };

        if !info.sources.contains(SourceFlags::GAMEPAD)
            && !info.sources.contains(SourceFlags::JOYSTICK)
        {
            debug!("{} ({}) is not a game controller", device_id, info.name);
            return None;
        }

        let logical_id = self.lowest_free_id();
        let joystick = Joystick::from_device(info, logical_id);

        info!("=== New input device: {} as {}", joystick.name, logical_id);
        for (index, axis) in joystick.axes.iter().enumerate() {
            info!(" - Mapping platform {} to canonical axis {}", axis, index);
        }
        if joystick.has_hat_axes {
            info!(" - Hat reported through {} / {}", AxisId::HAT_X, AxisId::HAT_Y);
        }

        let name = joystick.name.clone();
        self.joysticks.insert(device_id, joystick);

        sink.emit(CanonicalEvent::JoyConnectionChanged {
            joy: logical_id,
            connected: true,
            name,
        });

        Some(logical_id)
    }

    /// Forget a controller and release its slot.
    pub fn device_removed(
        &mut self,
        device_id: DeviceId,
        sink: &mut dyn EngineSink,
    ) -> Option<LogicalId> {
        let joystick = self.joysticks.remove(&device_id)?;

        info!(
            "Input device removed: {} ({}), releasing {}",
            joystick.name, device_id, joystick.logical_id
        );
        sink.emit(CanonicalEvent::JoyConnectionChanged {
            joy: joystick.logical_id,
            connected: false,
            name: String::new(),
        });

        Some(joystick.logical_id)
    }

    /// Full reconnect: the slot and axis history are not carried over.
    pub fn device_changed(
        &mut self,
        device_id: DeviceId,
        device: Option<&DeviceInfo>,
        sink: &mut dyn EngineSink,
    ) -> Option<LogicalId> {
        self.device_removed(device_id, sink);
        self.device_added(device_id, device, sink)
    }

    /// Emit axis and hat changes for one motion report.
    ///
    /// Returns `true` whenever the device is a registered joystick, including
    /// reports where nothing changed, so the caller treats the motion as
    /// consumed.
    pub fn report_axis_motion(
        &mut self,
        device_id: DeviceId,
        values: &dyn AxisLookup,
        hat_x: i32,
        hat_y: i32,
        sink: &mut dyn EngineSink,
    ) -> bool {
        let Some(joystick) = self.joysticks.get_mut(&device_id) else {
            return false;
        };

        for (index, &axis) in joystick.axes.iter().enumerate() {
            let value = values.axis_value(axis);
            let changed = joystick
                .last_axis_values
                .get(&axis)
                .map_or(true, |&last| last != value);

            if changed {
                joystick.last_axis_values.insert(axis, value);
                sink.emit(CanonicalEvent::JoyAxis {
                    joy: joystick.logical_id,
                    axis: index,
                    value,
                });
            }
        }

        if joystick.has_hat_axes && joystick.last_hat != (hat_x, hat_y) {
            joystick.last_hat = (hat_x, hat_y);
            sink.emit(CanonicalEvent::JoyHat {
                joy: joystick.logical_id,
                x: hat_x,
                y: hat_y,
            });
        }

        true
    }

    /// Emit a button change for a registered joystick.
    ///
    /// Returns `false` only when the device is not registered. Codes without
    /// a canonical button are logged and dropped.
    pub fn report_button(
        &mut self,
        device_id: DeviceId,
        key_code: KeyCode,
        pressed: bool,
        sink: &mut dyn EngineSink,
    ) -> bool {
        let Some(joystick) = self.joysticks.get(&device_id) else {
            return false;
        };

        match buttons::translate(key_code) {
            Ok(button) => sink.emit(CanonicalEvent::JoyButton {
                joy: joystick.logical_id,
                button,
                pressed,
            }),
            Err(e) => warn!("{} on {}: {}", e, joystick.name, joystick.logical_id),
        }

        true
    }

    pub fn logical_id(&self, device_id: DeviceId) -> Option<LogicalId> {
        self.joysticks.get(&device_id).map(|j| j.logical_id)
    }

    pub fn joystick(&self, device_id: DeviceId) -> Option<&Joystick> {
        self.joysticks.get(&device_id)
    }

    pub fn contains(&self, device_id: DeviceId) -> bool {
        self.joysticks.contains_key(&device_id)
    }

    pub fn len(&self) -> usize {
        self.joysticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joysticks.is_empty()
    }

    fn lowest_free_id(&self) -> LogicalId {
        let mut candidate = 0;
        while self
            .joysticks
            .values()
            .any(|joystick| joystick.logical_id.0 == candidate)
        {
            candidate += 1;
        }
        LogicalId(candidate)
    }
}

impl DeviceListener for JoystickRegistry {
    fn on_device_added(
        &mut self,
        host: &dyn DeviceQuery,
        device_id: DeviceId,
        sink: &mut dyn EngineSink,
    ) {
        if self.contains(device_id) {
            return;
        }
        let info = host.device(device_id);
        self.device_added(device_id, info.as_ref(), sink);
    }

    fn on_device_removed(&mut self, device_id: DeviceId, sink: &mut dyn EngineSink) {
        self.device_removed(device_id, sink);
    }

    fn on_device_changed(
        &mut self,
        host: &dyn DeviceQuery,
        device_id: DeviceId,
        sink: &mut dyn EngineSink,
    ) {
        let info = host.device(device_id);
        self.device_changed(device_id, info.as_ref(), sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CanonicalButton;
    use crate::host::{DeviceTable, MotionRange};

    fn gamepad(id: u32, axes: &[i32]) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId(id),
            name: format!("Gamepad {id}"),
            sources: SourceFlags::GAMEPAD | SourceFlags::JOYSTICK,
            motion_ranges: axes
                .iter()
                .map(|&a| MotionRange::new(AxisId(a), SourceFlags::JOYSTICK))
                .collect(),
        }
    }

    fn no_axes() -> HashMap<AxisId, f32> {
        HashMap::new()
    }

    fn add(registry: &mut JoystickRegistry, info: &DeviceInfo) -> Option<LogicalId> {
        let mut events = Vec::new();
        registry.device_added(info.id, Some(info), &mut events)
    }

    fn axis_events(events: &[CanonicalEvent]) -> Vec<(usize, f32)> {
        events
            .iter()
            .filter_map(|e| match e {
                CanonicalEvent::JoyAxis { axis, value, .. } => Some((*axis, *value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn lowest_free_slot_is_reused() {
        let mut registry = JoystickRegistry::new();
        let mut events = Vec::new();

        assert_eq!(add(&mut registry, &gamepad(10, &[])), Some(LogicalId(0)));
        assert_eq!(add(&mut registry, &gamepad(11, &[])), Some(LogicalId(1)));
        assert_eq!(
            registry.device_removed(DeviceId(10), &mut events),
            Some(LogicalId(0))
        );
        assert_eq!(add(&mut registry, &gamepad(12, &[])), Some(LogicalId(0)));
        assert_eq!(add(&mut registry, &gamepad(13, &[])), Some(LogicalId(2)));
    }

    #[test]
    fn connection_events_carry_name_and_state() {
        let mut registry = JoystickRegistry::new();
        let mut events = Vec::new();
        let pad = gamepad(4, &[0]);

        registry.device_added(pad.id, Some(&pad), &mut events);
        registry.device_removed(pad.id, &mut events);

        assert_eq!(
            events,
            vec![
                CanonicalEvent::JoyConnectionChanged {
                    joy: LogicalId(0),
                    connected: true,
                    name: "Gamepad 4".to_string(),
                },
                CanonicalEvent::JoyConnectionChanged {
                    joy: LogicalId(0),
                    connected: false,
                    name: String::new(),
                },
            ]
        );
    }

    #[test]
    fn add_is_rejected_for_duplicates_lookup_misses_and_non_controllers() {
        let mut registry = JoystickRegistry::new();
        let mut events = Vec::new();
        let pad = gamepad(1, &[]);
        let keyboard = DeviceInfo {
            id: DeviceId(2),
            name: "Keyboard".to_string(),
            sources: SourceFlags::KEYBOARD | SourceFlags::DPAD,
            motion_ranges: Vec::new(),
        };

        assert!(registry.device_added(pad.id, Some(&pad), &mut events).is_some());
        assert!(registry.device_added(pad.id, Some(&pad), &mut events).is_none());
        assert!(registry.device_added(DeviceId(3), None, &mut events).is_none());
        assert!(registry
            .device_added(keyboard.id, Some(&keyboard), &mut events)
            .is_none());

        assert_eq!(registry.len(), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn removing_unknown_device_is_silent() {
        let mut registry = JoystickRegistry::new();
        let mut events = Vec::new();
        assert_eq!(registry.device_removed(DeviceId(99), &mut events), None);
        assert!(events.is_empty());
    }

    #[test]
    fn axes_are_sorted_and_deduplicated() {
        let mut registry = JoystickRegistry::new();
        add(&mut registry, &gamepad(1, &[3, 1, 3, 7]));

        let joystick = registry.joystick(DeviceId(1)).unwrap();
        assert_eq!(joystick.axes, vec![AxisId(1), AxisId(3), AxisId(7)]);
        assert_eq!(joystick.canonical_axis(AxisId(3)), Some(1));
    }

    #[test]
    fn hat_axes_and_foreign_sources_stay_out_of_axis_list() {
        let mut registry = JoystickRegistry::new();
        let mut pad = gamepad(1, &[0, 1]);
        pad.motion_ranges.push(MotionRange::new(AxisId::HAT_X, SourceFlags::JOYSTICK));
        pad.motion_ranges.push(MotionRange::new(AxisId::HAT_Y, SourceFlags::JOYSTICK));
        pad.motion_ranges.push(MotionRange::new(AxisId::RZ, SourceFlags::GAMEPAD));
        pad.motion_ranges.push(MotionRange::new(AxisId::Z, SourceFlags::TOUCHSCREEN));
        add(&mut registry, &pad);

        let joystick = registry.joystick(DeviceId(1)).unwrap();
        assert!(joystick.has_hat_axes);
        assert_eq!(joystick.axes, vec![AxisId::X, AxisId::Y, AxisId::RZ]);
        assert_eq!(joystick.last_hat, HAT_SENTINEL);
    }

    #[test]
    fn unchanged_axes_are_suppressed() {
        let mut registry = JoystickRegistry::new();
        add(&mut registry, &gamepad(1, &[0, 1]));
        let mut values: HashMap<AxisId, f32> = HashMap::from([(AxisId::X, 0.25), (AxisId::Y, -0.5)]);

        let mut first = Vec::new();
        assert!(registry.report_axis_motion(DeviceId(1), &values, 0, 0, &mut first));
        assert_eq!(axis_events(&first), vec![(0, 0.25), (1, -0.5)]);

        let mut second = Vec::new();
        assert!(registry.report_axis_motion(DeviceId(1), &values, 0, 0, &mut second));
        assert!(second.is_empty());

        values.insert(AxisId::Y, -0.5001);
        let mut third = Vec::new();
        registry.report_axis_motion(DeviceId(1), &values, 0, 0, &mut third);
        assert_eq!(axis_events(&third), vec![(1, -0.5001)]);
    }

    #[test]
    fn hat_changes_are_suppressed_and_first_report_always_fires() {
        let mut registry = JoystickRegistry::new();
        let mut pad = gamepad(1, &[]);
        pad.motion_ranges.push(MotionRange::new(AxisId::HAT_X, SourceFlags::JOYSTICK));
        add(&mut registry, &pad);
        let values: HashMap<AxisId, f32> = HashMap::new();
        let mut events = Vec::new();

        registry.report_axis_motion(DeviceId(1), &values, 0, 0, &mut events);
        registry.report_axis_motion(DeviceId(1), &values, 0, 0, &mut events);
        registry.report_axis_motion(DeviceId(1), &values, 1, 0, &mut events);

        let hats: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                CanonicalEvent::JoyHat { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(hats, vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn hat_is_ignored_without_hat_axes() {
        let mut registry = JoystickRegistry::new();
        add(&mut registry, &gamepad(1, &[]));
        let mut events = Vec::new();
        assert!(registry.report_axis_motion(DeviceId(1), &no_axes(), 1, -1, &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn motion_for_unknown_device_is_not_consumed() {
        let mut registry = JoystickRegistry::new();
        let mut events = Vec::new();
        assert!(!registry.report_axis_motion(DeviceId(5), &no_axes(), 0, 0, &mut events));
    }

    #[test]
    fn changed_device_is_rebuilt_from_scratch() {
        let mut registry = JoystickRegistry::new();
        let table = DeviceTable::new();
        let mut events = Vec::new();

        add(&mut registry, &gamepad(20, &[]));
        add(&mut registry, &gamepad(21, &[]));
        table.insert(gamepad(22, &[0]));
        registry.on_device_added(&table, DeviceId(22), &mut events);
        assert_eq!(registry.logical_id(DeviceId(22)), Some(LogicalId(2)));

        let values: HashMap<AxisId, f32> = HashMap::from([(AxisId::X, 0.75)]);
        registry.report_axis_motion(DeviceId(22), &values, 0, 0, &mut events);

        table.insert(gamepad(22, &[0, 11]));
        events.clear();
        registry.on_device_changed(&table, DeviceId(22), &mut events);

        let joystick = registry.joystick(DeviceId(22)).unwrap();
        assert_eq!(joystick.axes, vec![AxisId::X, AxisId::Z]);
        assert!(joystick.last_axis_values.is_empty());
        assert_eq!(joystick.logical_id, LogicalId(2));
        assert_eq!(events.len(), 2);

        // Same value as before the change is reported again.
        events.clear();
        registry.report_axis_motion(DeviceId(22), &values, 0, 0, &mut events);
        assert_eq!(axis_events(&events), vec![(0, 0.75), (1, 0.0)]);
    }

    #[test]
    fn changed_device_that_vanished_is_only_removed() {
        let mut registry = JoystickRegistry::new();
        let table = DeviceTable::new();
        let mut events = Vec::new();

        table.insert(gamepad(3, &[]));
        registry.on_device_added(&table, DeviceId(3), &mut events);
        table.remove(DeviceId(3));
        registry.on_device_changed(&table, DeviceId(3), &mut events);

        assert!(registry.is_empty());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn buttons_translate_through_canonical_layout() {
        let mut registry = JoystickRegistry::new();
        add(&mut registry, &gamepad(1, &[]));
        let mut events = Vec::new();

        assert!(registry.report_button(DeviceId(1), KeyCode::BUTTON_X, true, &mut events));
        assert!(registry.report_button(DeviceId(1), KeyCode::A, true, &mut events));
        assert!(!registry.report_button(DeviceId(2), KeyCode::BUTTON_X, true, &mut events));

        assert_eq!(
            events,
            vec![CanonicalEvent::JoyButton {
                joy: LogicalId(0),
                button: CanonicalButton(2),
                pressed: true,
            }]
        );
    }
}
