//! Session options.
//!
//! `SessionConfig` is the validated, immutable form of the option table passed to
//! `init()`. It is built either from the untyped payload the host hands over
//! ([`SessionConfig::validate`]) or through [`SessionConfig::builder()`] for hosts that
//! already work with typed values. Both paths enforce the same rules.
//!
//! # Recognized options
//! - `appId` (string, required)
//! - `adZones` (table of zone name → zone id, required, non-empty)
//! - `adOrientation` (`"portrait"` or `"landscape"`)
//! - `userId` (string)
//! - `debugLogging` (boolean)
//! - `privacyFrameworks` (table of framework → required flag)
//! - `privacyConsents` (table of framework → consent flag)
//! - `hasUserConsent` (boolean, deprecated: folded into the GDPR consent)
//!
//! Any other key rejects the whole table. Framework names other than `gdpr`, `coppa` and
//! `ccpa` are ignored. A consent given for a framework that is not listed in
//! `privacyFrameworks` marks that framework as required.
//!
//! # Examples
//! ```rust
//! use adcolony_bridge::options::{PrivacyFramework, SessionConfig};
//! use serde_json::json;
//!
//! let cfg = SessionConfig::validate(&json!({
//!     "appId": "app1",
//!     "adZones": { "zoneA": "idA" },
//!     "privacyConsents": { "gdpr": true },
//! })).unwrap();
//!
//! assert!(cfg.privacy(PrivacyFramework::Gdpr).unwrap().required);
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::zone::ZoneId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "portrait" => Some(Orientation::Portrait),
            "landscape" => Some(Orientation::Landscape),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Privacy frameworks understood by the SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrivacyFramework {
    Gdpr,
    Coppa,
    Ccpa,
}

impl PrivacyFramework {
    /// Case-insensitive lookup. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        [PrivacyFramework::Gdpr, PrivacyFramework::Coppa, PrivacyFramework::Ccpa]
            .into_iter()
            .find(|fw| fw.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyFramework::Gdpr => "GDPR",
            PrivacyFramework::Coppa => "COPPA",
            PrivacyFramework::Ccpa => "CCPA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrivacySetting {
    pub required: bool,
    pub consent_granted: Option<bool>,
}

impl PrivacySetting {
    /// Consent in the SDK's string form (`"1"` granted, `"0"` denied).
    pub fn consent_string(&self) -> Option<&'static str> {
        self.consent_granted.map(|granted| if granted { "1" } else { "0" })
    }
}

/// A configured zone: human readable name and the SDK's zone id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneConfig {
    pub name: String,
    pub id: ZoneId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    app_id: String,
    zones: Vec<ZoneConfig>,
    user_id: Option<String>,
    orientation: Option<Orientation>,
    privacy: BTreeMap<PrivacyFramework, PrivacySetting>,
    debug_logging: bool,
}

impl SessionConfig {
    pub fn builder(app_id: impl Into<String>) -> SessionConfigBuilder {
        SessionConfigBuilder::new(app_id)
    }

    /// Validates an untyped option table.
    pub fn validate(raw: &Value) -> Result<Self, ValidationError> {
        let table = expect_table("options", raw)?;

        let mut app_id = None;
        let mut zones = None;
        let mut orientation = None;
        let mut user_id = None;
        let mut debug_logging = false;
        let mut frameworks = BTreeMap::new();
        let mut consents = BTreeMap::new();
        let mut has_user_consent = None;

        for (key, value) in table {
            match key.as_str() {
                "appId" => app_id = Some(expect_string(key, value)?),
                "adZones" => zones = Some(parse_zones(key, value)?),
                "adOrientation" => orientation = Some(expect_string(key, value)?),
                "userId" => user_id = Some(expect_string(key, value)?),
                "debugLogging" => debug_logging = expect_bool(key, value)?,
                "privacyFrameworks" => parse_privacy(key, value, &mut frameworks)?,
                "privacyConsents" => parse_privacy(key, value, &mut consents)?,
                "hasUserConsent" => {
                    let consent = expect_bool(key, value)?;
                    log::warn!("options.hasUserConsent is deprecated. Assuming GDPR");
                    has_user_consent = Some(consent);
                }
                _ => return Err(ValidationError::UnknownOption { key: key.clone() }),
            }
        }

        let app_id = app_id.ok_or_else(|| missing("appId"))?;
        let zones: Vec<(String, ZoneId)> = zones.ok_or_else(|| missing("adZones"))?;
        let orientation = match orientation {
            None => None,
            Some(s) => Some(Orientation::parse(&s).ok_or_else(|| ValidationError::InvalidValue {
                field: field("adOrientation"),
                value: s.clone(),
            })?),
        };

        // An explicit GDPR consent always wins over the deprecated flag
        if let Some(consent) = has_user_consent {
            consents.entry(PrivacyFramework::Gdpr).or_insert(consent);
        }

        let mut builder = SessionConfig::builder(app_id).debug_logging(debug_logging);
        for (name, id) in zones {
            builder = builder.zone(name, id);
        }
        if let Some(user_id) = user_id {
            builder = builder.user_id(user_id);
        }
        if let Some(orientation) = orientation {
            builder = builder.orientation(orientation);
        }
        builder
            .with(|b| {
                b.frameworks = frameworks;
                b.consents = consents;
            })
            .build()
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn zones(&self) -> &[ZoneConfig] {
        &self.zones
    }

    pub fn zone_ids(&self) -> Vec<ZoneId> {
        self.zones.iter().map(|z| z.id.clone()).collect()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    pub fn privacy(&self, framework: PrivacyFramework) -> Option<&PrivacySetting> {
        self.privacy.get(&framework)
    }

    pub fn privacy_settings(&self) -> impl Iterator<Item = (PrivacyFramework, &PrivacySetting)> {
        self.privacy.iter().map(|(fw, s)| (*fw, s))
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}

/// Typed construction of a [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    app_id: String,
    zones: BTreeMap<String, ZoneId>,
    user_id: Option<String>,
    orientation: Option<Orientation>,
    frameworks: BTreeMap<PrivacyFramework, bool>,
    consents: BTreeMap<PrivacyFramework, bool>,
    debug_logging: bool,
}

impl SessionConfigBuilder {
    fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            zones: BTreeMap::new(),
            user_id: None,
            orientation: None,
            frameworks: BTreeMap::new(),
            consents: BTreeMap::new(),
            debug_logging: false,
        }
    }

    #[inline]
    fn with(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }

    pub fn zone(self, name: impl Into<String>, id: impl Into<ZoneId>) -> Self {
        self.with(|b| {
            b.zones.insert(name.into(), id.into());
        })
    }
    pub fn user_id(self, id: impl Into<String>) -> Self { self.with(|b| b.user_id = Some(id.into())) }
    pub fn orientation(self, o: Orientation) -> Self { self.with(|b| b.orientation = Some(o)) }
    pub fn debug_logging(self, on: bool) -> Self { self.with(|b| b.debug_logging = on) }

    pub fn privacy_framework(self, fw: PrivacyFramework, required: bool) -> Self {
        self.with(|b| {
            b.frameworks.insert(fw, required);
        })
    }

    pub fn privacy_consent(self, fw: PrivacyFramework, granted: bool) -> Self {
        self.with(|b| {
            b.consents.insert(fw, granted);
        })
    }

    pub fn build(self) -> Result<SessionConfig, ValidationError> {
        if self.app_id.is_empty() {
            return Err(missing("appId"));
        }
        if self.zones.is_empty() {
            return Err(missing("adZones"));
        }

        let mut privacy: BTreeMap<PrivacyFramework, PrivacySetting> = self
            .frameworks
            .into_iter()
            .map(|(fw, required)| (fw, PrivacySetting { required, consent_granted: None }))
            .collect();
        for (fw, granted) in self.consents {
            privacy
                .entry(fw)
                .or_insert(PrivacySetting { required: true, consent_granted: None })
                .consent_granted = Some(granted);
        }

        Ok(SessionConfig {
            app_id: self.app_id,
            zones: self
                .zones
                .into_iter()
                .map(|(name, id)| ZoneConfig { name, id })
                .collect(),
            user_id: self.user_id,
            orientation: self.orientation,
            privacy,
            debug_logging: self.debug_logging,
        })
    }
}

/// Options accepted by `load()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Show the SDK's confirmation dialog before the ad
    pub pre_popup: bool,
    /// Show the SDK's result dialog after the ad
    pub post_popup: bool,
}

impl LoadOptions {
    /// Validates the optional option table of `load()`. `None` and `nil` mean defaults.
    pub fn validate(raw: Option<&Value>) -> Result<Self, ValidationError> {
        let table = match raw {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(v) => expect_table("options", v)?,
        };

        let mut opts = Self::default();
        for (key, value) in table {
            match key.as_str() {
                "prePopup" => opts.pre_popup = expect_bool(key, value)?,
                "postPopup" => opts.post_popup = expect_bool(key, value)?,
                _ => return Err(ValidationError::UnknownOption { key: key.clone() }),
            }
        }
        Ok(opts)
    }
}

// ---------- Helpers ----------

fn field(key: &str) -> String {
    format!("options.{key}")
}

fn missing(key: &str) -> ValidationError {
    ValidationError::MissingField { field: field(key) }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "nil",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

fn mismatch(field: String, expected: &'static str, v: &Value) -> ValidationError {
    ValidationError::TypeMismatch { field, expected, found: type_name(v) }
}

fn expect_table<'a>(name: &str, v: &'a Value) -> Result<&'a Map<String, Value>, ValidationError> {
    v.as_object().ok_or_else(|| mismatch(name.to_string(), "table", v))
}

fn expect_string(key: &str, v: &Value) -> Result<String, ValidationError> {
    v.as_str().map(str::to_string).ok_or_else(|| mismatch(field(key), "string", v))
}

fn expect_bool(key: &str, v: &Value) -> Result<bool, ValidationError> {
    v.as_bool().ok_or_else(|| mismatch(field(key), "boolean", v))
}

fn parse_zones(key: &str, v: &Value) -> Result<Vec<(String, ZoneId)>, ValidationError> {
    let table = v.as_object().ok_or_else(|| mismatch(field(key), "table", v))?;
    if table.is_empty() {
        return Err(missing(key));
    }

    table
        .iter()
        .map(|(name, id)| {
            let id = id
                .as_str()
                .ok_or_else(|| mismatch(field(&format!("{key}.{name}")), "string", id))?;
            Ok((name.clone(), ZoneId::from(id)))
        })
        .collect()
}

fn parse_privacy(
    key: &str,
    v: &Value,
    out: &mut BTreeMap<PrivacyFramework, bool>,
) -> Result<(), ValidationError> {
    let table = v.as_object().ok_or_else(|| mismatch(field(key), "table", v))?;
    for (name, flag) in table {
        match PrivacyFramework::from_name(name) {
            Some(fw) => {
                out.insert(fw, expect_bool(&format!("{key}.{name}"), flag)?);
            }
            None => log::debug!("options.{key}: ignoring unknown privacy framework '{name}'"),
        }
    }
    Ok(())
}
