use std::fmt::Display;
use std::sync::{Arc, Weak};

use uuid::Uuid;

use crate::sdk::{AdHandle, InterstitialListener, Reward, RewardListener};
use crate::session::SessionId;
use crate::zone::{ZoneId, ZoneLifecycle};

/// Identity of one ad request, carried by its listener for log correlation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listener handed to the SDK with each ad request.
///
/// Bound to the session that issued the request, so a late callback cannot touch the
/// zones of a later session. Holds the lifecycle weakly: callbacks arriving after the
/// bridge is gone are ignored.
pub(crate) struct ZoneListener {
    session: SessionId,
    zone_id: ZoneId,
    request: RequestId,
    lifecycle: Weak<ZoneLifecycle>,
}

impl ZoneListener {
    pub fn new(session: SessionId, zone_id: ZoneId, request: RequestId, lifecycle: Weak<ZoneLifecycle>) -> Self {
        Self {
            session,
            zone_id,
            request,
            lifecycle,
        }
    }

    fn lifecycle(&self, callback: &str, zone_id: &ZoneId) -> Option<Arc<ZoneLifecycle>> {
        if zone_id != &self.zone_id {
            log::warn!(
                "{callback}: request {} for zone '{}' got a callback for zone '{zone_id}', ignored",
                self.request,
                self.zone_id
            );
            return None;
        }
        let lifecycle = self.lifecycle.upgrade();
        if lifecycle.is_none() {
            log::debug!("{callback}: bridge is gone, dropping callback for request {}", self.request);
        }
        lifecycle
    }
}

impl InterstitialListener for ZoneListener {
    fn on_request_filled(&self, ad: Arc<dyn AdHandle>) {
        if let Some(lc) = self.lifecycle("onRequestFilled", ad.zone_id()) {
            lc.on_filled(self.session, &self.zone_id, ad);
        }
    }

    fn on_request_not_filled(&self, zone_id: &ZoneId) {
        if let Some(lc) = self.lifecycle("onRequestNotFilled", zone_id) {
            lc.on_not_filled(self.session, zone_id);
        }
    }

    fn on_opened(&self, zone_id: &ZoneId) {
        // `displayed` was already reported when the ad was handed to the SDK
        log::trace!("onOpened: zone '{zone_id}' ({})", self.request);
    }

    fn on_clicked(&self, zone_id: &ZoneId) {
        if let Some(lc) = self.lifecycle("onClicked", zone_id) {
            lc.on_clicked(self.session, zone_id);
        }
    }

    fn on_closed(&self, zone_id: &ZoneId) {
        if let Some(lc) = self.lifecycle("onClosed", zone_id) {
            lc.on_closed(self.session, zone_id);
        }
    }

    fn on_expiring(&self, zone_id: &ZoneId) {
        if let Some(lc) = self.lifecycle("onExpiring", zone_id) {
            lc.on_expiring(self.session, zone_id);
        }
    }
}

/// Process-wide reward listener installed while a session is ready.
pub(crate) struct RewardRelay {
    session: SessionId,
    lifecycle: Weak<ZoneLifecycle>,
}

impl RewardRelay {
    pub fn new(session: SessionId, lifecycle: Weak<ZoneLifecycle>) -> Self {
        Self { session, lifecycle }
    }
}

impl RewardListener for RewardRelay {
    fn on_reward(&self, reward: Reward) {
        match self.lifecycle.upgrade() {
            Some(lc) => lc.on_reward(self.session, reward),
            None => log::debug!("onReward: bridge is gone, dropping reward for zone '{}'", reward.zone_id),
        }
    }
}
