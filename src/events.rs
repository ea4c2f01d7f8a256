//! Bridge event types.
//!
//! Events travel in two shapes:
//!
//! - [`CanonicalEvent`]: the typed event built by the lifecycle state machine. It knows
//!   its [`Phase`], the [`AdKind`] of the zone, whether it reports an error and a free-form
//!   scalar payload.
//! - [`HostEvent`]: the flattened key/value form handed to the host listener. It is only
//!   produced at dispatch time, when the provider tag and the `isError` default are stamped.
//!
//! # Main Types
//!
//! - [`Phase`]: Lifecycle phase of an event (`init`, `loaded`, `reward`, ...).
//! - [`AdKind`]: Interstitial or rewarded video, derived from the zone's reward flag.
//! - [`Scalar`]: Payload value (bool, integer, float or string).

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use serde_json::{Map, Value};

/// Name of every event delivered to the host listener.
pub const EVENT_NAME: &str = "adsRequest";

/// Response tag attached to a failed load.
pub const RESPONSE_LOAD_FAILED: &str = "loadFailed";

/// Phase of an ad event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// The SDK session has been configured
    Init,
    /// Zone metadata requested through `getInfoForZone`
    Info,
    /// An ad has been filled for a zone
    Loaded,
    /// An ad request was not filled
    Failed,
    /// The user clicked the ad
    Clicked,
    /// The ad is about to be presented
    Displayed,
    /// The ad has been dismissed
    Closed,
    /// A loaded ad expired before being shown
    Expired,
    /// A reward was granted (or denied)
    Reward,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Info => "info",
            Phase::Loaded => "loaded",
            Phase::Failed => "failed",
            Phase::Clicked => "clicked",
            Phase::Displayed => "displayed",
            Phase::Closed => "closed",
            Phase::Expired => "expired",
            Phase::Reward => "reward",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of ad served by a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AdKind {
    #[serde(rename = "interstitial")]
    Interstitial,
    #[serde(rename = "rewardedVideo")]
    RewardedVideo,
}

impl AdKind {
    /// Rewarded zones serve rewarded video, all others serve interstitials.
    pub fn from_rewarded(is_rewarded: bool) -> Self {
        if is_rewarded {
            AdKind::RewardedVideo
        } else {
            AdKind::Interstitial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdKind::Interstitial => "interstitial",
            AdKind::RewardedVideo => "rewardedVideo",
        }
    }
}

impl Display for AdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scalar payload value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

/// Typed event produced by the bridge before it is flattened for the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    pub phase: Phase,
    /// `None` for session-level events such as `init`
    pub ad_kind: Option<AdKind>,
    /// `None` means "not an error" once dispatched
    pub is_error: Option<bool>,
    pub response: Option<String>,
    pub payload: BTreeMap<String, Scalar>,
}

impl CanonicalEvent {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            ad_kind: None,
            is_error: None,
            response: None,
            payload: BTreeMap::new(),
        }
    }

    /// Event for a specific zone. All zone events carry the zone name in their payload.
    pub fn for_zone(phase: Phase, kind: AdKind, zone_name: &str) -> Self {
        Self::new(phase).with_kind(kind).with_field("zoneName", zone_name)
    }

    pub fn event_type(&self) -> &'static str {
        EVENT_NAME
    }

    pub fn with_kind(mut self, kind: AdKind) -> Self {
        self.ad_kind = Some(kind);
        self
    }

    pub fn with_error(mut self, response: impl Into<String>) -> Self {
        self.is_error = Some(true);
        self.response = Some(response.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Flattens the event into the host wire shape, stamping the provider tag.
    pub fn into_host_event(self, provider: &str) -> HostEvent {
        let mut fields = Map::new();
        fields.insert("phase".into(), Value::from(self.phase.as_str()));
        if let Some(kind) = self.ad_kind {
            fields.insert("type".into(), Value::from(kind.as_str()));
        }
        fields.insert("isError".into(), Value::from(self.is_error.unwrap_or(false)));
        if let Some(response) = self.response {
            fields.insert("response".into(), Value::from(response));
        }
        if !self.payload.is_empty() {
            match serde_json::to_string(&self.payload) {
                Ok(data) => {
                    fields.insert("data".into(), Value::from(data));
                }
                Err(e) => log::error!("cannot encode payload of '{}' event: {e}", self.phase),
            }
        }
        fields.insert("provider".into(), Value::from(provider));

        HostEvent {
            name: EVENT_NAME.to_string(),
            fields,
        }
    }
}

/// Flattened event as delivered to the host listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostEvent {
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl HostEvent {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn phase(&self) -> Option<&str> {
        self.get("phase").and_then(Value::as_str)
    }

    pub fn ad_type(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.get("isError").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn provider(&self) -> Option<&str> {
        self.get("provider").and_then(Value::as_str)
    }

    /// Decodes the `data` field back into a JSON object, if present.
    pub fn data(&self) -> Option<Value> {
        let raw = self.get("data").and_then(Value::as_str)?;
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_and_kind_display() {
        assert_eq!(Phase::Displayed.to_string(), "displayed");
        assert_eq!(Phase::Init.to_string(), "init");
        assert_eq!(AdKind::from_rewarded(true).to_string(), "rewardedVideo");
        assert_eq!(AdKind::from_rewarded(false).to_string(), "interstitial");
    }

    #[test]
    fn host_event_defaults_is_error_and_stamps_provider() {
        let ev = CanonicalEvent::new(Phase::Init).into_host_event("adcolony");

        assert_eq!(ev.name, "adsRequest");
        assert_eq!(ev.phase(), Some("init"));
        assert_eq!(ev.provider(), Some("adcolony"));
        assert!(!ev.is_error());
        assert_eq!(ev.get("isError"), Some(&Value::Bool(false)));
        // session-level events have neither type nor data
        assert!(ev.ad_type().is_none());
        assert!(ev.get("data").is_none());
    }

    #[test]
    fn failed_event_keeps_error_and_response() {
        let ev = CanonicalEvent::for_zone(Phase::Failed, AdKind::Interstitial, "zoneA")
            .with_error(RESPONSE_LOAD_FAILED)
            .into_host_event("adcolony");

        assert!(ev.is_error());
        assert_eq!(ev.get("response"), Some(&Value::from("loadFailed")));
        assert_eq!(ev.ad_type(), Some("interstitial"));
        assert_eq!(ev.data().unwrap()["zoneName"], "zoneA");
    }

    #[test]
    fn payload_scalars_are_encoded_as_json_data() {
        let ev = CanonicalEvent::for_zone(Phase::Reward, AdKind::RewardedVideo, "zoneB")
            .with_field("currencyName", "coins")
            .with_field("reward", 25i64)
            .into_host_event("adcolony");

        let data = ev.data().unwrap();
        assert_eq!(data["zoneName"], "zoneB");
        assert_eq!(data["currencyName"], "coins");
        assert_eq!(data["reward"], 25);
    }

    #[test]
    fn host_event_serializes_flat() {
        let ev = CanonicalEvent::new(Phase::Init).into_host_event("adcolony");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["name"], "adsRequest");
        assert_eq!(json["phase"], "init");
        assert_eq!(json["provider"], "adcolony");
    }
}
