use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::BridgeError;
use crate::options::SessionConfig;
use crate::zone::{ZoneId, ZoneState};

/// Maps zone names to zone ids and zone ids to their state.
///
/// Populated once when a session starts; the set of zones never changes afterwards.
/// Each zone's state sits behind its own mutex so callbacks for different zones do
/// not contend with each other.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    names: HashMap<String, ZoneId>,
    zones: HashMap<ZoneId, Arc<Mutex<ZoneState>>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry for all zones of a session config.
    pub fn from_config(config: &SessionConfig) -> Result<Self, BridgeError> {
        let mut registry = Self::new();
        for zone in config.zones() {
            registry.register(&zone.name, zone.id.clone())?;
        }
        Ok(registry)
    }

    /// Registers a zone. Registering the same name/id pair again is a no-op.
    pub fn register(&mut self, name: &str, id: ZoneId) -> Result<(), BridgeError> {
        if let Some(state) = self.zones.get(&id) {
            let existing = lock_zone(state).name().to_string();
            if existing != name {
                return Err(BridgeError::DuplicateZone {
                    id,
                    existing,
                    name: name.to_string(),
                });
            }
            return Ok(());
        }

        self.names.insert(name.to_string(), id.clone());
        self.zones.insert(id, Arc::new(Mutex::new(ZoneState::new(name))));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<ZoneId, BridgeError> {
        self.names
            .get(name)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownZone { zone: name.to_string() })
    }

    /// Snapshot of a zone's current state.
    pub fn state_of(&self, id: &ZoneId) -> Result<ZoneState, BridgeError> {
        self.entry(id)
            .map(|state| lock_zone(&state).clone())
            .ok_or_else(|| BridgeError::UnknownZone { zone: id.to_string() })
    }

    pub(crate) fn entry(&self, id: &ZoneId) -> Option<Arc<Mutex<ZoneState>>> {
        self.zones.get(id).cloned()
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.keys()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Locks a zone, recovering the state if a previous holder panicked.
pub(crate) fn lock_zone(state: &Mutex<ZoneState>) -> MutexGuard<'_, ZoneState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneStatus;

    #[test]
    fn register_and_resolve() {
        let mut reg = ZoneRegistry::new();
        reg.register("zoneA", ZoneId::from("idA")).unwrap();
        reg.register("zoneB", ZoneId::from("idB")).unwrap();

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.resolve("zoneA").unwrap(), ZoneId::from("idA"));

        let state = reg.state_of(&ZoneId::from("idB")).unwrap();
        assert_eq!(state.name(), "zoneB");
        assert_eq!(state.status(), ZoneStatus::Empty);
    }

    #[test]
    fn same_pair_twice_is_fine() {
        let mut reg = ZoneRegistry::new();
        reg.register("zoneA", ZoneId::from("idA")).unwrap();
        reg.register("zoneA", ZoneId::from("idA")).unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn id_bound_to_other_name_is_rejected() {
        let mut reg = ZoneRegistry::new();
        reg.register("zoneA", ZoneId::from("shared")).unwrap();

        let err = reg.register("zoneB", ZoneId::from("shared")).unwrap_err();
        assert_eq!(
            err,
            BridgeError::DuplicateZone {
                id: ZoneId::from("shared"),
                existing: "zoneA".into(),
                name: "zoneB".into(),
            }
        );
        assert!(reg.resolve("zoneB").is_err());
    }

    #[test]
    fn from_config_detects_collisions() {
        let cfg = SessionConfig::builder("app")
            .zone("zoneA", "same")
            .zone("zoneB", "same")
            .build()
            .unwrap();
        assert!(matches!(
            ZoneRegistry::from_config(&cfg),
            Err(BridgeError::DuplicateZone { .. })
        ));
    }

    #[test]
    fn unknown_lookups() {
        let reg = ZoneRegistry::new();
        assert_eq!(
            reg.resolve("nope").unwrap_err(),
            BridgeError::UnknownZone { zone: "nope".into() }
        );
        assert!(reg.state_of(&ZoneId::from("nope")).is_err());
        assert!(reg.is_empty());
    }
}
