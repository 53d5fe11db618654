//! # eastlog-core
//! Core utilities for eastlog - template rendering, date rotation and file appending.

mod config;
mod date_format;
mod error;
mod log_rotation;
mod log_writer;
mod settings;
mod template;
mod utils;
mod variables;

pub use config::EastlogEnv;
pub use date_format::{DEFAULT_DATE_FORMAT, format_date};
pub use error::{FormatError, LogError, Result, SettingsError};
pub use log_rotation::{Rotation, log_directory, target_path};
pub use log_writer::{LogFile, LogStdout, LogWriter, ensure_directory};
pub use settings::{DEFAULT_FORMAT, KNOWN_KEYS, KeyPolicy, Settings, SettingsLayer, SettingsStore};
pub use template::{Segment, Template};
pub use utils::{Clock, FixedClock, Level, SystemClock};
pub use variables::{
    FormatStrictness, PatternFn, Record, RequestContext, SENTINEL, VariableSet, VariableValue,
};
