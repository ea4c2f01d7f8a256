//! Public API of the bridge.
//!
//! [`AdBridge`] is what the host runtime talks to. It owns one session at a time and wires
//! the pieces together:
//!
//! - the [`SessionGate`] refusing calls until the SDK is configured,
//! - the [`ZoneLifecycle`] tracking every zone and turning SDK callbacks into events,
//! - the [`EventDispatcher`] delivering those events on the host execution context.
//!
//! Calls into the SDK are never made on the caller's thread: they are posted to the UI
//! execution context and the API call returns right away. Their outcome reaches the host
//! later, as events.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use adcolony_bridge::{AdBridge, BridgeConfig, HostEvent, SerialExecutor};
//! use adcolony_bridge::sdk::backends::null::NullSdk;
//!
//! # async fn run() -> Result<(), adcolony_bridge::BridgeError> {
//! let rt = tokio::runtime::Handle::current();
//! let bridge = AdBridge::new(
//!     BridgeConfig::default(),
//!     Arc::new(NullSdk::new()),
//!     Arc::new(SerialExecutor::new("ui", &rt)),
//!     Arc::new(SerialExecutor::new("host", &rt)),
//! );
//!
//! bridge.init(
//!     Arc::new(|ev: &HostEvent| println!("{:?}", ev.phase())),
//!     &serde_json::json!({ "appId": "app1", "adZones": { "home": "vz1234" } }),
//! )?;
//! # Ok(()) }
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::config::BridgeConfig;
use crate::dispatcher::EventDispatcher;
use crate::errors::BridgeError;
use crate::events::{CanonicalEvent, Phase};
use crate::executor::ExecutionContext;
use crate::host::HostListener;
use crate::options::{LoadOptions, SessionConfig};
use crate::sdk::{AdSdk, RewardListener};
use crate::session::SessionGate;
use crate::zone::{RewardRelay, ZoneId, ZoneLifecycle, ZoneRegistry, ZoneState};

pub struct AdBridge {
    config: BridgeConfig,                 // Bridge-wide settings (provider tag, banner)
    gate: Arc<SessionGate>,               // Readiness and current session
    dispatcher: Arc<EventDispatcher>,     // Delivers events on the host context
    lifecycle: Arc<ZoneLifecycle>,        // Zone state machine
    sdk: Arc<dyn AdSdk>,                  // The ad network SDK
    ui: Arc<dyn ExecutionContext>,        // Context SDK calls are made on
}

impl AdBridge {
    pub fn new(
        config: BridgeConfig,
        sdk: Arc<dyn AdSdk>,
        ui: Arc<dyn ExecutionContext>,
        host: Arc<dyn ExecutionContext>,
    ) -> Self {
        let gate = Arc::new(SessionGate::new());
        let dispatcher = Arc::new(EventDispatcher::new(gate.clone(), host, config.provider.clone()));
        let lifecycle = Arc::new(ZoneLifecycle::new(gate.clone(), dispatcher.clone(), sdk.clone()));

        Self {
            config,
            gate,
            dispatcher,
            lifecycle,
            sdk,
            ui,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    // Logs a failed API call. Every public entry point funnels its error through here.
    fn report(&self, api: &str, err: &BridgeError) {
        match err {
            BridgeError::AlreadyInitialized => log::warn!("{api}: {err}"),
            BridgeError::NotReady { .. } => log::error!("{err}"),
            _ => log::error!("{api}: {err}"),
        }
    }

    /// Starts a session from the host's untyped option table.
    ///
    /// Returns once the session is registered. The `init` event follows when the SDK has
    /// been configured on the UI context.
    pub fn init(&self, listener: Arc<dyn HostListener>, options: &Value) -> Result<(), BridgeError> {
        let result = if self.gate.has_listener() {
            Err(BridgeError::AlreadyInitialized)
        } else {
            SessionConfig::validate(options)
                .map_err(BridgeError::from)
                .and_then(|config| self.start_session(listener, config))
        };
        result.inspect_err(|e| self.report("init", e))
    }

    /// Same as [`AdBridge::init`] for hosts that build the configuration themselves.
    pub fn init_with_config(&self, listener: Arc<dyn HostListener>, config: SessionConfig) -> Result<(), BridgeError> {
        let result = if self.gate.has_listener() {
            Err(BridgeError::AlreadyInitialized)
        } else {
            self.start_session(listener, config)
        };
        result.inspect_err(|e| self.report("init", e))
    }

    fn start_session(&self, listener: Arc<dyn HostListener>, config: SessionConfig) -> Result<(), BridgeError> {
        let registry = Arc::new(ZoneRegistry::from_config(&config)?);
        let session = self.gate.begin(listener)?;
        log::debug!("init: session {session} registered with {} zones", registry.len());

        let gate = self.gate.clone();
        let sdk = self.sdk.clone();
        let dispatcher = self.dispatcher.clone();
        let relay: Arc<dyn RewardListener> = Arc::new(RewardRelay::new(session, Arc::downgrade(&self.lifecycle)));
        let banner = format!("{}: {}", self.config.plugin_name, self.config.plugin_version);

        self.ui.execute(Box::new(move || {
            if let Err(e) = sdk.configure(&config) {
                log::error!("init: {} configuration failed: {e:#}", sdk.name());
                gate.abort(session);
                return;
            }
            if !gate.complete(session, registry) {
                log::debug!("init: session {session} was torn down while configuring");
                return;
            }
            sdk.set_reward_listener(Some(relay));

            log::info!("{banner} (SDK: {})", sdk.version());
            dispatcher.emit(session, CanonicalEvent::new(Phase::Init));
        }));

        Ok(())
    }

    /// Requests an ad for a zone. The outcome arrives as a `loaded` or `failed` event.
    pub fn load(&self, zone_name: &str, options: Option<&Value>) -> Result<(), BridgeError> {
        self.try_load(zone_name, options)
            .inspect_err(|e| self.report("load", e))
    }

    fn try_load(&self, zone_name: &str, options: Option<&Value>) -> Result<(), BridgeError> {
        let active = self.gate.active("load")?;
        let options = LoadOptions::validate(options)?;
        let zone_id = active.registry.resolve(zone_name)?;
        log::debug!("load: zone '{zone_name}' ({zone_id}) in session {}", active.id);

        self.lifecycle.request_load(active.id, &zone_id);

        let lifecycle = self.lifecycle.clone();
        let session = active.id;
        self.ui.execute(Box::new(move || lifecycle.issue_request(session, &zone_id, &options)));
        Ok(())
    }

    /// Shows the ad loaded for a zone.
    ///
    /// Fails with [`BridgeError::NoAdAvailable`] unless the zone holds a loaded, unexpired
    /// ad. On success the `displayed` event is queued before the ad is presented.
    pub fn show(&self, zone_name: &str) -> Result<(), BridgeError> {
        self.try_show(zone_name)
            .inspect_err(|e| self.report("show", e))
    }

    fn try_show(&self, zone_name: &str) -> Result<(), BridgeError> {
        let active = self.gate.active("show")?;
        let zone_id = active.registry.resolve(zone_name)?;
        let ad = self.lifecycle.request_show(active.id, &zone_id)?;

        let sdk = self.sdk.clone();
        self.ui.execute(Box::new(move || {
            if let Err(e) = sdk.present(&ad) {
                log::error!("show: presenting zone '{}' failed: {e:#}", ad.zone_id());
            }
        }));
        Ok(())
    }

    pub fn is_loaded(&self, zone_name: &str) -> Result<bool, BridgeError> {
        self.try_is_loaded(zone_name)
            .inspect_err(|e| self.report("isLoaded", e))
    }

    fn try_is_loaded(&self, zone_name: &str) -> Result<bool, BridgeError> {
        let active = self.gate.active("isLoaded")?;
        let zone_id = active.registry.resolve(zone_name)?;
        Ok(active.registry.state_of(&zone_id)?.is_loaded())
    }

    /// Queries the SDK for a zone's metadata. The result arrives as an `info` event.
    pub fn get_info_for_zone(&self, zone_name: &str) -> Result<(), BridgeError> {
        self.try_get_info_for_zone(zone_name)
            .inspect_err(|e| self.report("getInfoForZone", e))
    }

    fn try_get_info_for_zone(&self, zone_name: &str) -> Result<(), BridgeError> {
        let active = self.gate.active("getInfoForZone")?;
        let zone_id = active.registry.resolve(zone_name)?;

        let lifecycle = self.lifecycle.clone();
        let session = active.id;
        self.ui.execute(Box::new(move || lifecycle.emit_zone_info(session, &zone_id)));
        Ok(())
    }

    /// Snapshot of a zone's state, by zone id.
    pub fn zone_state(&self, zone_id: &ZoneId) -> Result<ZoneState, BridgeError> {
        let active = self.gate.active("zoneState")?;
        active.registry.state_of(zone_id)
    }

    /// Ends the current session. Safe to call at any time, any number of times.
    ///
    /// Events still queued for the host are dropped. The reward listener and every
    /// zone's SDK listener are detached on the UI context.
    pub fn teardown(&self) {
        let session = self.gate.session_id();
        let Some(registry) = self.gate.teardown() else {
            if let Some(session) = session {
                log::debug!("teardown: session {session} closed before it was ready");
            }
            return;
        };
        log::debug!("teardown: closing session with {} zones", registry.len());

        let sdk = self.sdk.clone();
        self.ui.execute(Box::new(move || {
            sdk.set_reward_listener(None);
            for zone_id in registry.zone_ids() {
                sdk.detach_listener(zone_id);
            }
        }));
    }
}
