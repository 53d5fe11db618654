//! # eastlog
//! Template-driven logger appending to date-rotated files.
//!
//! Each call renders the configured template and appends the line to
//! `{path}/{application}/{file}`, where the file name follows the rotation
//! mode (`app-2024-06-01.log`, `app-2024-06.log`, `app-2024.log` or `app.log`).
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! eastlog = "0.1.0"
//! ```
//!
//! ```rust
//! use eastlog::{Rotation, logger_config};
//!
//! let logger = logger_config()
//!     .with_path("/tmp/eastlog_doc")
//!     .with_application("web")
//!     .with_rotation(Rotation::Daily)
//!     .with_format("{level}||{tag}||{message}")
//!     .build();
//! logger.info("boot", "hello").expect("Unable to write log line");
//! let content = std::fs::read_to_string(logger.path().unwrap()).unwrap();
//! assert!(content.ends_with("info||boot||hello\n"));
//! ```
//!
//! ## Overriding settings
//! Settings given to the builder (or found in `EASTLOG_PATH`, `EASTLOG_ROTATE`,
//! `EASTLOG_APPLICATION` and `EASTLOG_FORMAT`) are the defaults. `set` layers
//! overrides on top and `reset` drops them.
//!
//! ```rust
//! use eastlog::logger_config;
//!
//! let logger = logger_config()
//!     .with_path("/tmp/eastlog_doc")
//!     .with_application("web")
//!     .build();
//! logger.set([("application", "api"), ("rotate", "year")]).unwrap();
//! assert_eq!(logger.load().unwrap().application.as_deref(), Some("api"));
//! logger.reset();
//! assert_eq!(logger.load().unwrap().application.as_deref(), Some("web"));
//! ```
//!
//! ## Templates
//! `{name}` placeholders are replaced by variables (`level`, `tag`, `message`,
//! `app`, `pid`, `host`, ...). `{<date>(Y-m-d)}` formats the current date with
//! PHP-style specifiers. Unknown placeholders are written as is.
//!
//! ```rust
//! use eastlog::logger_config;
//!
//! let logger = logger_config()
//!     .with_application("web")
//!     .with_format("[{<date>(Y)}] {app}.{level}: {message} {unknown}")
//!     .build();
//! let line = logger.render(eastlog::Level::Warning, "db", "slow query").unwrap();
//! assert!(line.ends_with("] web.warning: slow query {unknown}"));
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use eastlog_core::{LogFile, LogStdout, LogWriter, SettingsLayer};

pub use eastlog_core::{
    Clock, DEFAULT_FORMAT, FixedClock, FormatError, FormatStrictness, KNOWN_KEYS, KeyPolicy,
    Level, LogError, PatternFn, Record, RequestContext, Result, Rotation, SENTINEL, Settings,
    SettingsError, SettingsStore, SystemClock, Template, VariableSet, VariableValue,
};

/// A logger instance: settings, clock and request context.
///
/// Every call is synchronous. Nothing is buffered between calls.
pub struct Logger {
    settings: SettingsStore,
    clock: Arc<dyn Clock>,
    request: RequestContext,
    patterns: Vec<(String, PatternFn)>,
    strictness: FormatStrictness,
    stdout: bool,
}

impl Logger {
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Overrides settings for known keys (`path`, `rotate`, `application`, `format`).
    pub fn set<I, K, V>(&self, config: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Ok(self.settings.set(config)?)
    }

    pub fn set_value(&self, key: &str, value: impl Into<String>) -> Result<()> {
        Ok(self.settings.set_value(key, value)?)
    }

    /// Drops every override set with [`Logger::set`].
    pub fn reset(&self) {
        self.settings.reset();
    }

    /// Effective settings.
    pub fn load(&self) -> Result<Settings> {
        Ok(self.settings.load()?)
    }

    pub fn info(&self, tag: &str, message: &str) -> Result<usize> {
        self.log(Level::Info, tag, message)
    }

    pub fn warning(&self, tag: &str, message: &str) -> Result<usize> {
        self.log(Level::Warning, tag, message)
    }

    pub fn error(&self, tag: &str, message: &str) -> Result<usize> {
        self.log(Level::Error, tag, message)
    }

    pub fn debug(&self, tag: &str, message: &str) -> Result<usize> {
        self.log(Level::Debug, tag, message)
    }

    pub fn verbose(&self, tag: &str, message: &str) -> Result<usize> {
        self.log(Level::Verbose, tag, message)
    }

    /// Logs through an operation named after a level (`"info"`, `"error"`, ...).
    ///
    /// Any other name is [`LogError::UnsupportedOperation`].
    pub fn call(&self, operation: &str, tag: &str, message: &str) -> Result<usize> {
        let level = operation.parse::<Level>()?;
        self.log(level, tag, message)
    }

    /// Renders a record and appends it to the current file.
    /// Returns the number of bytes written.
    pub fn log(&self, level: Level, tag: &str, message: &str) -> Result<usize> {
        let settings = self.settings.load()?;
        let dir = settings.storage_dir()?;
        let now = self.clock.now();
        let line = self.render_at(&settings, now, level, tag, message)?;
        let mut file = LogFile::open(dir.join(settings.rotate.file_name(&now)))?;
        let written = file.regular(&line, level)?;
        if self.stdout {
            // the line is already on disk
            LogStdout.regular(&line, level).ok();
        }
        Ok(written)
    }

    /// Renders a record without writing it.
    pub fn render(&self, level: Level, tag: &str, message: &str) -> Result<String> {
        let settings = self.settings.load()?;
        self.render_at(&settings, self.clock.now(), level, tag, message)
    }

    /// The variables a record would be rendered with.
    pub fn variables(&self, level: Level, tag: &str, message: &str) -> Result<VariableSet> {
        let settings = self.settings.load()?;
        Ok(self.variable_set(&settings, self.clock.now(), level, tag, message))
    }

    /// The file a record logged now is appended to.
    pub fn path(&self) -> Result<PathBuf> {
        let settings = self.settings.load()?;
        let dir = settings.storage_dir()?;
        Ok(dir.join(settings.rotate.file_name(&self.clock.now())))
    }

    fn variable_set(
        &self,
        settings: &Settings,
        now: chrono::DateTime<chrono::Local>,
        level: Level,
        tag: &str,
        message: &str,
    ) -> VariableSet {
        let record = Record {
            level,
            tag,
            message,
            application: settings.application.as_deref().unwrap_or(SENTINEL),
        };
        let mut vars = VariableSet::builtin(&record, &self.request, now);
        for (kind, callback) in &self.patterns {
            let callback = Arc::clone(callback);
            vars.insert_pattern(kind, move |param: &str| callback(param));
        }
        vars
    }

    fn render_at(
        &self,
        settings: &Settings,
        now: chrono::DateTime<chrono::Local>,
        level: Level,
        tag: &str,
        message: &str,
    ) -> Result<String> {
        let template = Template::parse(&settings.format);
        let vars = self.variable_set(settings, now, level, tag, message);
        Ok(vars.render(&template, self.strictness)?)
    }
}

/// Forwards `log` records to a [`Logger`], using the record target as tag.
struct EastLogger {
    logger: Arc<Logger>,
}

impl log::Log for EastLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        // eastlog's own diagnostics would loop back here
        let target = record.target();
        if target == "eastlog" || target.starts_with("eastlog::") {
            return;
        }
        self.logger
            .log(
                record.level().into(),
                record.target(),
                &record.args().to_string(),
            )
            .ok();
    }

    fn flush(&self) {}
}

/// Builder for configuring a [`Logger`].
pub struct ConfigBuilder {
    defaults: SettingsLayer,
    from_env: bool,
    key_policy: KeyPolicy,
    strictness: FormatStrictness,
    clock: Arc<dyn Clock>,
    request: RequestContext,
    patterns: Vec<(String, PatternFn)>,
    stdout: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            defaults: SettingsLayer::default(),
            from_env: true,
            key_policy: KeyPolicy::Lenient,
            strictness: FormatStrictness::Lenient,
            clock: Arc::new(SystemClock),
            request: RequestContext::default(),
            patterns: Vec::new(),
            stdout: false,
        }
    }
}

impl ConfigBuilder {
    /// Sets the root directory of log files.
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.defaults.path = Some(path.as_ref().to_path_buf());
        self
    }
    /// Sets the rotation mode.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.defaults.rotate = Some(rotation);
        self
    }
    /// Sets the application name, which is also the log sub-directory.
    pub fn with_application(mut self, application: &str) -> Self {
        self.defaults.application = Some(application.into());
        self
    }
    /// Sets the line template.
    pub fn with_format(mut self, format: &str) -> Self {
        self.defaults.format = Some(format.into());
        self
    }
    /// Echo every line to stdout.
    pub fn with_stdout(self, yes: bool) -> Self {
        Self {
            stdout: yes,
            ..self
        }
    }
    /// Read missing defaults from `EASTLOG_*` variables (the default).
    pub fn from_env(self) -> Self {
        self.with_env(true)
    }
    /// Do not read defaults from `EASTLOG_*` variables.
    pub fn no_env(self) -> Self {
        Self {
            from_env: false,
            ..self
        }
    }
    /// Dynamically set the environment flag.
    pub fn with_env(self, yes: bool) -> Self {
        Self {
            from_env: yes,
            ..self
        }
    }
    pub fn with_clock<C: Clock + 'static>(self, clock: C) -> Self {
        Self {
            clock: Arc::new(clock),
            ..self
        }
    }
    pub fn with_request_context(self, request: RequestContext) -> Self {
        Self { request, ..self }
    }
    /// Registers a `{<kind>(param)}` placeholder.
    pub fn with_pattern<F>(mut self, kind: &str, callback: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, FormatError> + Send + Sync + 'static,
    {
        self.patterns.push((kind.into(), Arc::new(callback)));
        self
    }
    /// Reject unknown keys in [`Logger::set`].
    pub fn strict_keys(self) -> Self {
        Self {
            key_policy: KeyPolicy::Strict,
            ..self
        }
    }
    /// Fail the call when a pattern placeholder cannot be expanded.
    pub fn strict_format(self) -> Self {
        Self {
            strictness: FormatStrictness::Strict,
            ..self
        }
    }

    pub fn build(self) -> Logger {
        let Self {
            defaults,
            from_env,
            key_policy,
            strictness,
            clock,
            request,
            patterns,
            stdout,
        } = self;
        let settings = if from_env {
            SettingsStore::from_env_with(defaults)
        } else {
            SettingsStore::new(defaults.apply(Settings::default()))
        };
        Logger {
            settings: settings.with_policy(key_policy),
            clock,
            request,
            patterns,
            strictness,
            stdout,
        }
    }

    /// Builds the logger and installs it as the `log` backend.
    /// The record target is used as tag.
    pub fn init_global(self) -> std::result::Result<Arc<Logger>, log::SetLoggerError> {
        let logger = Arc::new(self.build());
        log::set_boxed_logger(Box::new(EastLogger {
            logger: Arc::clone(&logger),
        }))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(logger)
    }
}

/// Returns a default ConfigBuilder for configuring the logger.
pub fn logger_config() -> ConfigBuilder {
    ConfigBuilder::default()
}
