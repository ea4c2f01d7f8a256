use std::sync::Arc;

use crate::options::{LoadOptions, SessionConfig};
use crate::sdk::backend::{AdHandle, AdSdk, InterstitialListener, RewardListener, ZoneInfo};
use crate::zone::ZoneId;
use anyhow::{anyhow, Result};

/// Null SDK that accepts every call and never calls back.
///
/// Requests stay outstanding forever, so zones driven by it never leave `Loading`.
#[derive(Debug, Default)]
pub struct NullSdk;

impl NullSdk {
    pub fn new() -> Self {
        Self
    }
}

impl AdSdk for NullSdk {
    fn name(&self) -> &str {
        "NullSdk"
    }

    fn version(&self) -> String {
        "null".to_string()
    }

    fn configure(&self, config: &SessionConfig) -> Result<()> {
        log::debug!("NullSdk: configured app '{}' with {} zones", config.app_id(), config.zones().len());
        Ok(())
    }

    fn set_reward_listener(&self, _listener: Option<Arc<dyn RewardListener>>) {}

    fn request_interstitial(
        &self,
        zone_id: &ZoneId,
        _options: &LoadOptions,
        _listener: Arc<dyn InterstitialListener>,
    ) -> Result<()> {
        log::trace!("NullSdk: request for zone '{zone_id}' accepted");
        Ok(())
    }

    fn present(&self, ad: &Arc<dyn AdHandle>) -> Result<()> {
        Err(anyhow!("NullSdk cannot present ads (zone '{}')", ad.zone_id()))
    }

    fn zone_info(&self, zone_id: &ZoneId) -> Option<ZoneInfo> {
        Some(ZoneInfo::interstitial(zone_id.clone()))
    }

    fn detach_listener(&self, _zone_id: &ZoneId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl InterstitialListener for Recorder {
        fn on_request_filled(&self, ad: Arc<dyn AdHandle>) {
            self.0.lock().unwrap().push(format!("filled {}", ad.zone_id()));
        }
        fn on_request_not_filled(&self, zone_id: &ZoneId) {
            self.0.lock().unwrap().push(format!("not_filled {zone_id}"));
        }
        fn on_clicked(&self, _zone_id: &ZoneId) {}
        fn on_closed(&self, _zone_id: &ZoneId) {}
        fn on_expiring(&self, _zone_id: &ZoneId) {}
    }

    #[test]
    fn requests_never_call_back() {
        let sdk = NullSdk::new();
        let rec = Arc::new(Recorder::default());
        sdk.request_interstitial(&ZoneId::from("idA"), &LoadOptions::default(), rec.clone())
            .unwrap();
        assert!(rec.0.lock().unwrap().is_empty());
    }

    #[test]
    fn present_is_refused() {
        let ad: Arc<dyn AdHandle> =
            Arc::new(crate::sdk::backends::scripted::ScriptedAd::new(ZoneId::from("idA")));
        assert!(NullSdk::new().present(&ad).is_err());
    }

    #[test]
    fn zones_are_interstitial() {
        let info = NullSdk::new().zone_info(&ZoneId::from("idA")).unwrap();
        assert!(!info.is_rewarded);
        assert_eq!(info.zone_id.as_str(), "idA");
    }
}
