use std::sync::Arc;

use crate::dispatcher::EventDispatcher;
use crate::errors::BridgeError;
use crate::events::{AdKind, CanonicalEvent, Phase, RESPONSE_LOAD_FAILED};
use crate::options::LoadOptions;
use crate::sdk::{AdHandle, AdSdk, Reward};
use crate::session::{SessionGate, SessionId};
use crate::zone::{lock_zone, RequestId, ZoneId, ZoneListener, ZoneState};

/// Drives the per-zone state machine from SDK callbacks and host requests.
///
/// Every transition happens under the zone's own lock, and the event describing it is
/// queued before the lock is released, so the host sees events in transition order.
/// Every call names the session it belongs to. Calls from a session that is no longer the
/// ready one, or for zones outside it, are dropped.
///
/// A callback whose transition is not valid from the zone's current state changes
/// nothing and emits nothing.
pub struct ZoneLifecycle {
    gate: Arc<SessionGate>,
    dispatcher: Arc<EventDispatcher>,
    sdk: Arc<dyn AdSdk>,
}

impl ZoneLifecycle {
    pub fn new(gate: Arc<SessionGate>, dispatcher: Arc<EventDispatcher>, sdk: Arc<dyn AdSdk>) -> Self {
        Self { gate, dispatcher, sdk }
    }

    fn ad_kind(&self, zone_id: &ZoneId) -> AdKind {
        self.sdk
            .zone_info(zone_id)
            .map(|info| AdKind::from_rewarded(info.is_rewarded))
            .unwrap_or(AdKind::Interstitial)
    }

    fn with_zone<R>(
        &self,
        session: SessionId,
        zone_id: &ZoneId,
        callback: &str,
        f: impl FnOnce(&mut ZoneState) -> R,
    ) -> Option<R> {
        let Some(registry) = self.gate.registry_for(session) else {
            log::debug!("{callback}: session {session} is closed, dropped for zone '{zone_id}'");
            return None;
        };
        let Some(entry) = registry.entry(zone_id) else {
            log::debug!("{callback}: zone '{zone_id}' is not part of session {session}, dropped");
            return None;
        };
        let mut zone = lock_zone(&entry);
        Some(f(&mut zone))
    }

    /// Moves a zone to `Loading`, forgetting any ad it held.
    pub fn request_load(&self, session: SessionId, zone_id: &ZoneId) -> bool {
        self.with_zone(session, zone_id, "load", |zone| zone.begin_load()).is_some()
    }

    /// Issues the SDK request for a zone that was moved to `Loading`.
    ///
    /// A request the SDK refuses outright is reported like a no-fill.
    pub fn issue_request(self: &Arc<Self>, session: SessionId, zone_id: &ZoneId, options: &LoadOptions) {
        if !self.gate.is_current(session) {
            log::debug!("load: session {session} closed before zone '{zone_id}' was requested");
            return;
        }
        let request = RequestId::new();
        let listener = Arc::new(ZoneListener::new(session, zone_id.clone(), request, Arc::downgrade(self)));

        log::debug!("requesting ad for zone '{zone_id}' ({request})");
        if let Err(e) = self.sdk.request_interstitial(zone_id, options, listener) {
            log::error!("ad request {request} for zone '{zone_id}' failed: {e:#}");
            self.on_not_filled(session, zone_id);
        }
    }

    pub fn on_filled(&self, session: SessionId, zone_id: &ZoneId, ad: Arc<dyn AdHandle>) {
        let kind = self.ad_kind(zone_id);
        self.with_zone(session, zone_id, "onRequestFilled", |zone| {
            if zone.fill(ad) {
                self.dispatcher
                    .emit(session, CanonicalEvent::for_zone(Phase::Loaded, kind, zone.name()));
            } else {
                log::debug!("zone '{}' is {:?}, ignoring fill", zone.name(), zone.status());
            }
        });
    }

    pub fn on_not_filled(&self, session: SessionId, zone_id: &ZoneId) {
        let kind = self.ad_kind(zone_id);
        self.with_zone(session, zone_id, "onRequestNotFilled", |zone| {
            if zone.fail() {
                self.dispatcher.emit(
                    session,
                    CanonicalEvent::for_zone(Phase::Failed, kind, zone.name()).with_error(RESPONSE_LOAD_FAILED),
                );
            } else {
                log::debug!("zone '{}' is {:?}, ignoring no-fill", zone.name(), zone.status());
            }
        });
    }

    pub fn on_clicked(&self, session: SessionId, zone_id: &ZoneId) {
        let kind = self.ad_kind(zone_id);
        self.with_zone(session, zone_id, "onClicked", |zone| {
            self.dispatcher
                .emit(session, CanonicalEvent::for_zone(Phase::Clicked, kind, zone.name()));
        });
    }

    pub fn on_closed(&self, session: SessionId, zone_id: &ZoneId) {
        let kind = self.ad_kind(zone_id);
        self.with_zone(session, zone_id, "onClosed", |zone| {
            if zone.close() {
                self.dispatcher
                    .emit(session, CanonicalEvent::for_zone(Phase::Closed, kind, zone.name()));
            } else {
                log::debug!("zone '{}' is {:?}, ignoring close", zone.name(), zone.status());
            }
        });
    }

    pub fn on_expiring(&self, session: SessionId, zone_id: &ZoneId) {
        let kind = self.ad_kind(zone_id);
        self.with_zone(session, zone_id, "onExpiring", |zone| {
            if zone.expire() {
                self.dispatcher
                    .emit(session, CanonicalEvent::for_zone(Phase::Expired, kind, zone.name()));
            } else {
                log::debug!("zone '{}' is {:?}, ignoring expiry", zone.name(), zone.status());
            }
        });
    }

    /// Reports a reward. Rewards are independent of the zone's load state.
    pub fn on_reward(&self, session: SessionId, reward: Reward) {
        self.with_zone(session, &reward.zone_id, "onReward", |zone| {
            let mut event = CanonicalEvent::new(Phase::Reward).with_kind(AdKind::RewardedVideo);
            if reward.success {
                event = event
                    .with_field("zoneName", zone.name())
                    .with_field("currencyName", reward.name.as_str())
                    .with_field("reward", reward.amount);
            }
            self.dispatcher.emit(session, event);
        });
    }

    /// Hands out a loaded zone's ad for presentation.
    ///
    /// The `displayed` event is queued before the zone is marked shown.
    pub fn request_show(&self, session: SessionId, zone_id: &ZoneId) -> Result<Arc<dyn AdHandle>, BridgeError> {
        let kind = self.ad_kind(zone_id);
        self.with_zone(session, zone_id, "show", |zone| {
            if !zone.is_loaded() {
                return Err(BridgeError::NoAdAvailable { zone: zone.name().to_string() });
            }
            self.dispatcher
                .emit(session, CanonicalEvent::for_zone(Phase::Displayed, kind, zone.name()));
            zone.take_for_show()
                .ok_or_else(|| BridgeError::NoAdAvailable { zone: zone.name().to_string() })
        })
        .unwrap_or_else(|| Err(BridgeError::UnknownZone { zone: zone_id.to_string() }))
    }

    /// Emits the `info` event for a zone with the metadata the SDK reports.
    pub fn emit_zone_info(&self, session: SessionId, zone_id: &ZoneId) {
        let Some(name) = self.with_zone(session, zone_id, "getInfoForZone", |zone| zone.name().to_string()) else {
            return;
        };
        let Some(info) = self.sdk.zone_info(zone_id) else {
            log::warn!("getInfoForZone: {} has no metadata for zone '{name}'", self.sdk.name());
            return;
        };

        self.dispatcher.emit(
            session,
            CanonicalEvent::for_zone(Phase::Info, AdKind::from_rewarded(info.is_rewarded), &name)
                .with_field("isRewardedZone", info.is_rewarded)
                .with_field("virtualCurrencyName", info.reward_name)
                .with_field("rewardAmount", info.reward_amount)
                .with_field("viewsPerReward", info.views_per_reward)
                .with_field("viewsUntilReward", info.remaining_views),
        );
    }
}
