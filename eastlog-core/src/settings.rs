//! Two-layer settings: defaults plus user overrides, merged on read.

use std::{
    path::PathBuf,
    sync::{OnceLock, PoisonError, RwLock},
};

use crate::{config::EastlogEnv, error::SettingsError, log_rotation::Rotation};

pub const DEFAULT_FORMAT: &str =
    "{date_rfc}||{timestamp}||{host}||{uri}||{verb}||{app}||{level}||{tag}||{message}";

/// Keys accepted by [`SettingsStore::set`].
pub const KNOWN_KEYS: [&str; 4] = ["path", "rotate", "application", "format"];

/// Effective logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root directory of all log files.
    pub path: Option<PathBuf>,
    pub rotate: Rotation,
    pub application: Option<String>,
    /// Template of a log line.
    pub format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path: None,
            rotate: Rotation::None,
            application: None,
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

impl Settings {
    /// `path/application`, or the configuration error that prevents writing.
    pub fn storage_dir(&self) -> Result<PathBuf, SettingsError> {
        let root = self
            .path
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(SettingsError::MissingPath)?;
        let application = self
            .application
            .as_deref()
            .filter(|application| !application.is_empty())
            .ok_or(SettingsError::MissingApplication)?;
        Ok(crate::log_rotation::log_directory(root, application))
    }
}

/// A partial set of settings. `None` leaves the underlying value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsLayer {
    pub path: Option<PathBuf>,
    pub rotate: Option<Rotation>,
    pub application: Option<String>,
    pub format: Option<String>,
}

impl SettingsLayer {
    /// Sets `key` from its string form. Returns false for unknown keys.
    pub fn set_key(&mut self, key: &str, value: String) -> bool {
        match key {
            "path" => self.path = Some(value.into()),
            "rotate" => self.rotate = Some(Rotation::from(value.as_str())),
            "application" => self.application = Some(value),
            "format" => self.format = Some(value),
            _ => return false,
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `base` with every value of this layer applied on top.
    pub fn apply(&self, mut base: Settings) -> Settings {
        if let Some(path) = &self.path {
            base.path = Some(path.clone());
        }
        if let Some(rotate) = self.rotate {
            base.rotate = rotate;
        }
        if let Some(application) = &self.application {
            base.application = Some(application.clone());
        }
        if let Some(format) = &self.format {
            base.format = format.clone();
        }
        base
    }
}

/// What [`SettingsStore::set`] does with keys outside [`KNOWN_KEYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Skip them.
    #[default]
    Lenient,
    /// Reject the whole call.
    Strict,
}

#[derive(Debug)]
enum DefaultsSource {
    Fixed(Settings),
    /// The environment, with this layer on top.
    Env(SettingsLayer),
}

#[derive(Debug)]
pub struct SettingsStore {
    source: DefaultsSource,
    defaults: OnceLock<Settings>,
    overrides: RwLock<SettingsLayer>,
    policy: KeyPolicy,
}

impl SettingsStore {
    /// A store whose defaults are exactly `defaults`.
    pub fn new(defaults: Settings) -> Self {
        Self::with_source(DefaultsSource::Fixed(defaults))
    }

    /// A store whose defaults are read from `EASTLOG_*` on first access.
    pub fn from_env() -> Self {
        Self::from_env_with(SettingsLayer::default())
    }

    /// Like [`SettingsStore::from_env`], with `layer` taking precedence over
    /// the environment.
    pub fn from_env_with(layer: SettingsLayer) -> Self {
        Self::with_source(DefaultsSource::Env(layer))
    }

    fn with_source(source: DefaultsSource) -> Self {
        Self {
            source,
            defaults: OnceLock::new(),
            overrides: RwLock::new(SettingsLayer::default()),
            policy: KeyPolicy::default(),
        }
    }

    pub fn with_policy(self, policy: KeyPolicy) -> Self {
        Self { policy, ..self }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// The defaults layer, initialised on first call.
    pub fn defaults(&self) -> Result<Settings, SettingsError> {
        if let Some(defaults) = self.defaults.get() {
            return Ok(defaults.clone());
        }
        let defaults = match &self.source {
            DefaultsSource::Fixed(settings) => settings.clone(),
            DefaultsSource::Env(layer) => layer.apply(EastlogEnv::load()?.settings()),
        };
        Ok(self.defaults.get_or_init(|| defaults).clone())
    }

    /// Merges `config` into the overrides.
    ///
    /// Unknown keys are skipped, or rejected with nothing applied under
    /// [`KeyPolicy::Strict`].
    pub fn set<I, K, V>(&self, config: I) -> Result<(), SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut overrides = self
            .overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut staged = overrides.clone();
        for (key, value) in config {
            let key = key.as_ref();
            if staged.set_key(key, value.into()) {
                continue;
            }
            match self.policy {
                KeyPolicy::Strict => return Err(SettingsError::UnknownKey(key.to_string())),
                KeyPolicy::Lenient => {
                    log::debug!(target: "eastlog", "ignoring unknown settings key `{key}`")
                }
            }
        }
        *overrides = staged;
        Ok(())
    }

    pub fn set_value(&self, key: &str, value: impl Into<String>) -> Result<(), SettingsError> {
        self.set([(key, value.into())])
    }

    /// Drops every override.
    pub fn reset(&self) {
        *self
            .overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner) = SettingsLayer::default();
    }

    pub fn overrides(&self) -> SettingsLayer {
        self.overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Defaults with the overrides applied.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let defaults = self.defaults()?;
        Ok(self
            .overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(defaults))
    }
}
