use derive_from_env::FromEnv;

use crate::{
    error::SettingsError,
    log_rotation::Rotation,
    settings::{Settings, SettingsLayer},
};

/// Defaults read from `EASTLOG_*` environment variables. Empty means unset.
#[derive(FromEnv)]
#[from_env(prefix = "EASTLOG")]
#[allow(non_snake_case)]
pub struct EastlogEnv {
    #[from_env(default = "")]
    pub PATH: String,
    #[from_env(default = "")]
    pub ROTATE: String,
    #[from_env(default = "")]
    pub APPLICATION: String,
    #[from_env(default = "")]
    pub FORMAT: String,
}

impl EastlogEnv {
    pub fn load() -> Result<Self, SettingsError> {
        Self::from_env().map_err(|e| SettingsError::Environment(format!("{e:?}")))
    }

    /// The environment as a settings layer.
    pub fn layer(self) -> SettingsLayer {
        let non_empty = |value: String| (!value.is_empty()).then_some(value);
        SettingsLayer {
            path: non_empty(self.PATH).map(Into::into),
            rotate: non_empty(self.ROTATE).map(|rotate| Rotation::from(rotate.as_str())),
            application: non_empty(self.APPLICATION),
            format: non_empty(self.FORMAT),
        }
    }

    pub fn settings(self) -> Settings {
        self.layer().apply(Settings::default())
    }
}
