use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sdk::AdHandle;

/// Opaque zone identifier assigned by the ad network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// A zone is a small state machine:
//
//   Empty ─► Loading ─► Loaded ─► Shown ─► Closed
//               │          │
//               ▼          ▼
//         FailedToLoad   Expired
//
// Every state may start over with a fresh load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ZoneStatus {
    /// Nothing has been requested yet
    #[default]
    Empty,
    /// An ad request is in flight
    Loading,
    /// An ad is filled and ready to be shown
    Loaded,
    /// The ad has been handed to the SDK for presentation
    Shown,
    /// The presented ad was dismissed
    Closed,
    /// The loaded ad expired before it was shown
    Expired,
    /// The last request was not filled
    FailedToLoad,
}

impl ZoneStatus {
    pub fn can_transition_to(self, next: ZoneStatus) -> bool {
        use ZoneStatus::*;

        matches!(
            (self, next),
            (_, Loading)
                | (Loading, Loaded)
                | (Loading, FailedToLoad)
                // overlapping requests may fill twice
                | (Loaded, Loaded)
                | (Loaded, Shown)
                | (Loaded, Expired)
                | (Shown, Closed)
        )
    }
}

/// Mutable state of one configured zone.
///
/// The ad handle is only present while the zone is [`ZoneStatus::Loaded`].
#[derive(Clone)]
pub struct ZoneState {
    name: String,
    status: ZoneStatus,
    ad: Option<Arc<dyn AdHandle>>,
}

impl std::fmt::Debug for ZoneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneState")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("ad", &self.ad.as_ref().map(|ad| ad.zone_id().clone()))
            .finish()
    }
}

impl ZoneState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ZoneStatus::Empty,
            ad: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }

    pub fn ad(&self) -> Option<&Arc<dyn AdHandle>> {
        self.ad.as_ref()
    }

    /// True when the zone holds an ad that can be shown right now.
    pub fn is_loaded(&self) -> bool {
        self.status == ZoneStatus::Loaded && self.ad.as_ref().is_some_and(|ad| !ad.is_expired())
    }

    fn transition(&mut self, next: ZoneStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }

    pub(crate) fn begin_load(&mut self) {
        self.transition(ZoneStatus::Loading);
        self.ad = None;
    }

    pub(crate) fn fill(&mut self, ad: Arc<dyn AdHandle>) -> bool {
        if !self.transition(ZoneStatus::Loaded) {
            return false;
        }
        self.ad = Some(ad);
        true
    }

    pub(crate) fn fail(&mut self) -> bool {
        if !self.transition(ZoneStatus::FailedToLoad) {
            return false;
        }
        self.ad = None;
        true
    }

    /// Marks the ad as used and hands it out for presentation.
    pub(crate) fn take_for_show(&mut self) -> Option<Arc<dyn AdHandle>> {
        if !self.is_loaded() {
            return None;
        }
        self.status = ZoneStatus::Shown;
        self.ad.take()
    }

    pub(crate) fn close(&mut self) -> bool {
        self.transition(ZoneStatus::Closed)
    }

    pub(crate) fn expire(&mut self) -> bool {
        if !self.transition(ZoneStatus::Expired) {
            return false;
        }
        self.ad = None;
        true
    }
}
