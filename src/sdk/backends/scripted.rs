use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::options::{LoadOptions, SessionConfig};
use crate::sdk::backend::{AdHandle, AdSdk, InterstitialListener, Reward, RewardListener, ZoneInfo};
use crate::zone::ZoneId;
use anyhow::{anyhow, Result};

/// Ad handed out by [`ScriptedSdk::fill`].
#[derive(Debug)]
pub struct ScriptedAd {
    zone_id: ZoneId,
    expired: AtomicBool,
}

impl ScriptedAd {
    pub fn new(zone_id: ZoneId) -> Self {
        Self {
            zone_id,
            expired: AtomicBool::new(false),
        }
    }

    pub fn set_expired(&self, expired: bool) {
        self.expired.store(expired, Ordering::SeqCst);
    }
}

impl AdHandle for ScriptedAd {
    fn zone_id(&self) -> &ZoneId {
        &self.zone_id
    }

    fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

/// Calls the bridge made into the SDK, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SdkCall {
    Configure { app_id: String, zone_ids: Vec<ZoneId> },
    SetRewardListener { attached: bool },
    RequestInterstitial { zone_id: ZoneId, options: LoadOptions },
    Present { zone_id: ZoneId },
    DetachListener { zone_id: ZoneId },
}

#[derive(Default)]
struct Script {
    calls: Vec<SdkCall>,
    listeners: HashMap<ZoneId, Arc<dyn InterstitialListener>>,
    ads: HashMap<ZoneId, Arc<ScriptedAd>>,
    reward: Option<Arc<dyn RewardListener>>,
    zone_info: HashMap<ZoneId, ZoneInfo>,
    fail_configure: bool,
    fail_requests: bool,
}

/// SDK stand-in whose callbacks are fired by hand.
///
/// The bridge's calls are recorded and can be inspected with [`ScriptedSdk::calls`].
/// Methods such as [`ScriptedSdk::fill`] play the SDK side of the conversation by
/// invoking the listener the bridge registered for a zone. Callbacks are always
/// fired with the internal lock released, so listeners may call back into the SDK.
#[derive(Default)]
pub struct ScriptedSdk {
    inner: Mutex<Script>,
}

impl ScriptedSdk {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_zone_info(&self, info: ZoneInfo) {
        self.script().zone_info.insert(info.zone_id.clone(), info);
    }

    /// Makes the next `configure` calls fail.
    pub fn fail_configure(&self, fail: bool) {
        self.script().fail_configure = fail;
    }

    /// Makes the next ad requests fail before reaching the network.
    pub fn fail_requests(&self, fail: bool) {
        self.script().fail_requests = fail;
    }

    pub fn calls(&self) -> Vec<SdkCall> {
        self.script().calls.clone()
    }

    pub fn has_listener(&self, zone_id: &ZoneId) -> bool {
        self.script().listeners.contains_key(zone_id)
    }

    pub fn has_reward_listener(&self) -> bool {
        self.script().reward.is_some()
    }

    pub fn reward_listener(&self) -> Option<Arc<dyn RewardListener>> {
        self.script().reward.clone()
    }

    /// Listener currently attached for a zone. Callers may keep it past a detach to
    /// replay callbacks the way a real SDK delivers them late.
    pub fn listener(&self, zone_id: &ZoneId) -> Option<Arc<dyn InterstitialListener>> {
        let listener = self.script().listeners.get(zone_id).cloned();
        if listener.is_none() {
            log::debug!("ScriptedSdk: no listener attached for zone '{zone_id}'");
        }
        listener
    }

    /// Fills the outstanding request of a zone. Returns the ad, or `None` when no
    /// listener is attached.
    pub fn fill(&self, zone_id: &ZoneId) -> Option<Arc<ScriptedAd>> {
        let listener = self.listener(zone_id)?;
        let ad = Arc::new(ScriptedAd::new(zone_id.clone()));
        self.script().ads.insert(zone_id.clone(), ad.clone());
        listener.on_request_filled(ad.clone());
        Some(ad)
    }

    pub fn no_fill(&self, zone_id: &ZoneId) -> bool {
        self.listener(zone_id)
            .map(|l| l.on_request_not_filled(zone_id))
            .is_some()
    }

    pub fn open(&self, zone_id: &ZoneId) -> bool {
        self.listener(zone_id).map(|l| l.on_opened(zone_id)).is_some()
    }

    pub fn click(&self, zone_id: &ZoneId) -> bool {
        self.listener(zone_id).map(|l| l.on_clicked(zone_id)).is_some()
    }

    pub fn close(&self, zone_id: &ZoneId) -> bool {
        self.listener(zone_id).map(|l| l.on_closed(zone_id)).is_some()
    }

    /// Expires the last ad filled for the zone and notifies its listener.
    pub fn expire(&self, zone_id: &ZoneId) -> bool {
        if let Some(ad) = self.script().ads.get(zone_id) {
            ad.set_expired(true);
        }
        self.listener(zone_id).map(|l| l.on_expiring(zone_id)).is_some()
    }

    /// Delivers a reward through the reward listener, if one is installed.
    pub fn reward(&self, reward: Reward) -> bool {
        let listener = self.script().reward.clone();
        listener.map(|l| l.on_reward(reward)).is_some()
    }
}

impl AdSdk for ScriptedSdk {
    fn name(&self) -> &str {
        "ScriptedSdk"
    }

    fn version(&self) -> String {
        "scripted".to_string()
    }

    fn configure(&self, config: &SessionConfig) -> Result<()> {
        let mut script = self.script();
        script.calls.push(SdkCall::Configure {
            app_id: config.app_id().to_string(),
            zone_ids: config.zone_ids(),
        });
        if script.fail_configure {
            return Err(anyhow!("configure rejected for app '{}'", config.app_id()));
        }
        Ok(())
    }

    fn set_reward_listener(&self, listener: Option<Arc<dyn RewardListener>>) {
        let mut script = self.script();
        script.calls.push(SdkCall::SetRewardListener {
            attached: listener.is_some(),
        });
        script.reward = listener;
    }

    fn request_interstitial(
        &self,
        zone_id: &ZoneId,
        options: &LoadOptions,
        listener: Arc<dyn InterstitialListener>,
    ) -> Result<()> {
        let mut script = self.script();
        script.calls.push(SdkCall::RequestInterstitial {
            zone_id: zone_id.clone(),
            options: *options,
        });
        if script.fail_requests {
            return Err(anyhow!("request for zone '{zone_id}' rejected"));
        }
        script.listeners.insert(zone_id.clone(), listener);
        Ok(())
    }

    fn present(&self, ad: &Arc<dyn AdHandle>) -> Result<()> {
        self.script().calls.push(SdkCall::Present {
            zone_id: ad.zone_id().clone(),
        });
        if ad.is_expired() {
            return Err(anyhow!("ad for zone '{}' has expired", ad.zone_id()));
        }
        Ok(())
    }

    fn zone_info(&self, zone_id: &ZoneId) -> Option<ZoneInfo> {
        self.script().zone_info.get(zone_id).cloned()
    }

    fn detach_listener(&self, zone_id: &ZoneId) {
        let mut script = self.script();
        script.calls.push(SdkCall::DetachListener {
            zone_id: zone_id.clone(),
        });
        script.listeners.remove(zone_id);
    }
}
