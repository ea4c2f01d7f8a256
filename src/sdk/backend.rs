use std::sync::Arc;

use crate::options::{LoadOptions, SessionConfig};
use crate::zone::ZoneId;

/// A filled ad as handed out by the SDK.
///
/// The bridge stores it while its zone is loaded and passes it back to
/// [`AdSdk::present`] when the host asks to show the zone.
pub trait AdHandle: Send + Sync {
    /// Zone the ad was filled for
    fn zone_id(&self) -> &ZoneId;

    /// An expired ad can no longer be presented.
    fn is_expired(&self) -> bool;
}

/// Zone metadata reported by the SDK.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneInfo {
    pub zone_id: ZoneId,
    pub is_rewarded: bool,
    pub reward_name: String,
    pub reward_amount: i64,
    pub views_per_reward: i64,
    pub remaining_views: i64,
}

impl ZoneInfo {
    /// Metadata of a plain interstitial zone.
    pub fn interstitial(zone_id: ZoneId) -> Self {
        Self {
            zone_id,
            is_rewarded: false,
            reward_name: String::new(),
            reward_amount: 0,
            views_per_reward: 0,
            remaining_views: 0,
        }
    }

    /// Metadata of a rewarded zone granting `amount` of `currency` after every view.
    pub fn rewarded(zone_id: ZoneId, currency: impl Into<String>, amount: i64) -> Self {
        Self {
            zone_id,
            is_rewarded: true,
            reward_name: currency.into(),
            reward_amount: amount,
            views_per_reward: 1,
            remaining_views: 1,
        }
    }
}

/// Reward notification for a rewarded zone.
#[derive(Clone, Debug, PartialEq)]
pub struct Reward {
    pub zone_id: ZoneId,
    pub name: String,
    pub amount: i64,
    pub success: bool,
}

/// Per-request callbacks of an interstitial ad.
///
/// Callbacks may arrive on any thread, in any interleaving across zones.
pub trait InterstitialListener: Send + Sync {
    fn on_request_filled(&self, ad: Arc<dyn AdHandle>);
    fn on_request_not_filled(&self, zone_id: &ZoneId);
    /// The SDK opened the ad. Nothing is reported for this by default.
    fn on_opened(&self, _zone_id: &ZoneId) {}
    fn on_clicked(&self, zone_id: &ZoneId);
    fn on_closed(&self, zone_id: &ZoneId);
    fn on_expiring(&self, zone_id: &ZoneId);
}

/// Process-wide reward callback.
pub trait RewardListener: Send + Sync {
    fn on_reward(&self, reward: Reward);
}

/// The ad network SDK the bridge talks to.
///
/// Calls made by the bridge are issued from the UI execution context. Listener
/// callbacks may come back from any thread.
pub trait AdSdk: Send + Sync {
    /// Name of the SDK (used in logs)
    fn name(&self) -> &str;

    /// SDK version, reported in the startup banner
    fn version(&self) -> String;

    /// Configures the SDK for a session: app id, zones, user id, orientation and privacy.
    fn configure(&self, config: &SessionConfig) -> anyhow::Result<()>;

    /// Installs (or with `None` removes) the process-wide reward listener.
    fn set_reward_listener(&self, listener: Option<Arc<dyn RewardListener>>);

    /// Starts an ad request. The outcome is reported through `listener`.
    fn request_interstitial(
        &self,
        zone_id: &ZoneId,
        options: &LoadOptions,
        listener: Arc<dyn InterstitialListener>,
    ) -> anyhow::Result<()>;

    /// Presents a previously filled ad.
    fn present(&self, ad: &Arc<dyn AdHandle>) -> anyhow::Result<()>;

    /// Metadata of a zone, if the SDK knows it.
    fn zone_info(&self, zone_id: &ZoneId) -> Option<ZoneInfo>;

    /// Detaches the listener of a zone's outstanding ad, if any.
    fn detach_listener(&self, zone_id: &ZoneId);
}
