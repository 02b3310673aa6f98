//! In-memory device table shared between a host adapter and the dispatcher

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use super::{DeviceId, DeviceInfo, DeviceQuery};

/// Shared, cloneable snapshot of the devices a host currently knows about.
///
/// Host adapters write to it before posting device notifications; the
/// dispatcher reads it when it resolves those notifications. Clones share the
/// same table.
#[derive(Debug, Clone, Default)]
pub struct DeviceTable {
    devices: Arc<RwLock<BTreeMap<DeviceId, DeviceInfo>>>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a device. Returns the previous entry.
    pub fn insert(&self, info: DeviceInfo) -> Option<DeviceInfo> {
        debug!("Device table insert: {} ({})", info.id, info.name);
        self.write().insert(info.id, info)
    }

    pub fn remove(&self, id: DeviceId) -> Option<DeviceInfo> {
        debug!("Device table remove: {}", id);
        self.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<DeviceId, DeviceInfo>> {
        match self.devices.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Device table lock poisoned, continuing with last state");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<DeviceId, DeviceInfo>> {
        match self.devices.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Device table lock poisoned, continuing with last state");
                poisoned.into_inner()
            }
        }
    }
}

impl DeviceQuery for DeviceTable {
    fn device_ids(&self) -> Vec<DeviceId> {
        self.read().keys().copied().collect()
    }

    fn device(&self, id: DeviceId) -> Option<DeviceInfo> {
        self.read().get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SourceFlags;

    fn pad(id: u32) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId(id),
            name: format!("Pad {id}"),
            sources: SourceFlags::GAMEPAD,
            motion_ranges: Vec::new(),
        }
    }

    #[test]
    fn clones_share_entries() {
        let table = DeviceTable::new();
        let view = table.clone();

        table.insert(pad(7));
        assert_eq!(view.device_ids(), vec![DeviceId(7)]);
        assert_eq!(view.device(DeviceId(7)).map(|d| d.name), Some("Pad 7".to_string()));

        view.remove(DeviceId(7));
        assert!(table.is_empty());
        assert!(table.device(DeviceId(7)).is_none());
    }

    #[test]
    fn ids_are_listed_in_order() {
        let table = DeviceTable::new();
        table.insert(pad(9));
        table.insert(pad(2));
        table.insert(pad(5));
        assert_eq!(table.device_ids(), vec![DeviceId(2), DeviceId(5), DeviceId(9)]);
        assert_eq!(table.len(), 3);
    }
}
