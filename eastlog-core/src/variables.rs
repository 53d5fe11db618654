//! Variables available to a template and the single-pass renderer.

use std::{env, fmt, sync::Arc};

use chrono::{DateTime, Local};

use crate::{
    date_format::format_date,
    error::FormatError,
    template::{Segment, Template},
    utils::Level,
};

/// Value substituted for context that is not available.
pub const SENTINEL: &str = "-";

/// Callback behind a `{<kind>(param)}` placeholder.
pub type PatternFn = Arc<dyn Fn(&str) -> Result<String, FormatError> + Send + Sync>;

/// What happens when a pattern callback fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatStrictness {
    /// Keep the raw placeholder in the output and carry on.
    #[default]
    Lenient,
    /// Abort the render with the callback's error.
    Strict,
}

/// Request metadata of the current execution context.
///
/// Every field is optional and renders as `-` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub host: Option<String>,
    pub uri: Option<String>,
    pub method: Option<String>,
    pub body: Option<String>,
    pub remote_addr: Option<String>,
    pub remote_port: Option<String>,
    pub user_agent: Option<String>,
    pub server_addr: Option<String>,
    pub server_port: Option<String>,
    pub protocol: Option<String>,
    pub https: bool,
    pub forwarded_proto: Option<String>,
}

impl RequestContext {
    /// Reads the CGI environment (`HTTP_HOST`, `REQUEST_URI`, ...).
    ///
    /// The request body is never read from stdin and stays unset.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            host: var("HTTP_HOST"),
            uri: var("REQUEST_URI"),
            method: var("REQUEST_METHOD"),
            body: None,
            remote_addr: var("REMOTE_ADDR"),
            remote_port: var("REMOTE_PORT"),
            user_agent: var("HTTP_USER_AGENT"),
            server_addr: var("SERVER_ADDR"),
            server_port: var("SERVER_PORT"),
            protocol: var("SERVER_PROTOCOL"),
            https: var("HTTPS").is_some_and(|https| https.eq_ignore_ascii_case("on")),
            forwarded_proto: var("HTTP_X_FORWARDED_PROTO"),
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.https || self.forwarded_proto.as_deref() == Some("https") {
            "https"
        } else {
            "http"
        }
    }
}

/// Caller-supplied part of a log record.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub level: Level,
    pub tag: &'a str,
    pub message: &'a str,
    pub application: &'a str,
}

#[derive(Clone)]
enum Entry {
    Static(String),
    Pattern(PatternFn),
}

impl Entry {
    fn view(&self) -> VariableValue<'_> {
        match self {
            Entry::Static(value) => VariableValue::Static(value),
            Entry::Pattern(_) => VariableValue::Pattern,
        }
    }
}

/// Read-only view of a variable, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableValue<'a> {
    Static(&'a str),
    Pattern,
}

/// Ordered mapping from variable name to value.
///
/// Aliases are extra names for an existing entry: writing through an alias
/// updates the entry it points to.
#[derive(Clone, Default)]
pub struct VariableSet {
    entries: Vec<(String, Entry)>,
    aliases: Vec<(String, usize)>,
}

impl fmt::Debug for VariableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in variables for one log call, in definition order.
    pub fn builtin(record: &Record<'_>, request: &RequestContext, now: DateTime<Local>) -> Self {
        let or_sentinel = |value: &Option<String>| value.as_deref().unwrap_or(SENTINEL).to_string();
        let mut vars = Self::new();
        vars.insert_pattern("date", move |spec: &str| format_date(&now, spec));
        vars.insert("date_rfc2822", now.format("%a, %d %b %Y %H:%M:%S %z").to_string())
            .insert(
                "timestamp",
                format!("{}.{:04}", now.timestamp(), now.timestamp_subsec_micros() / 100),
            )
            .insert("unixtime", now.timestamp().to_string())
            .insert("pid", std::process::id().to_string())
            .insert("gid", process_group_id())
            .insert("current_user", current_user())
            .insert("message", record.message)
            .insert("tag", record.tag)
            .insert("level", record.level.as_str())
            .insert("application", record.application)
            .insert("request_host", or_sentinel(&request.host))
            .insert("request_uri", or_sentinel(&request.uri))
            .insert("request_method", or_sentinel(&request.method))
            .insert("request_body", or_sentinel(&request.body))
            .insert("request_addr", or_sentinel(&request.remote_addr))
            .insert("request_port", or_sentinel(&request.remote_port))
            .insert("request_user_agent", or_sentinel(&request.user_agent))
            .insert("server_addr", or_sentinel(&request.server_addr))
            .insert("server_port", or_sentinel(&request.server_port))
            .insert("server_protocol", or_sentinel(&request.protocol))
            .insert("scheme", request.scheme());
        for (alias, target) in [
            ("date_rfc", "date_rfc2822"),
            ("app", "application"),
            ("host", "request_host"),
            ("uri", "request_uri"),
            ("verb", "request_method"),
            ("body", "request_body"),
            ("user_agent", "request_user_agent"),
        ] {
            vars.alias(alias, target);
        }
        vars
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(entry_name, _)| entry_name == name)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| alias == name)
                    .map(|(_, index)| *index)
            })
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.index(name).map(|index| &self.entries[index].1)
    }

    fn put(&mut self, name: &str, entry: Entry) {
        match self.index(name) {
            Some(index) => self.entries[index].1 = entry,
            None => self.entries.push((name.to_string(), entry)),
        }
    }

    /// Sets a static variable, replacing the current value of `name` or of the
    /// entry `name` aliases.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.put(name, Entry::Static(value.into()));
        self
    }

    /// Sets the pattern variable used by `{<kind>(param)}`.
    pub fn insert_pattern<F>(&mut self, kind: &str, callback: F) -> &mut Self
    where
        F: Fn(&str) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        self.put(kind, Entry::Pattern(Arc::new(callback)));
        self
    }

    /// Makes `alias` another name for `target`. Returns false when `target`
    /// is unknown or `alias` already names an entry.
    pub fn alias(&mut self, alias: &str, target: &str) -> bool {
        if self.index(alias).is_some() {
            return false;
        }
        match self.index(target) {
            Some(index) => {
                self.aliases.push((alias.to_string(), index));
                true
            }
            None => false,
        }
    }

    /// Static value of `name`, following aliases.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.entry(name)? {
            Entry::Static(value) => Some(value),
            Entry::Pattern(_) => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index(name).is_some()
    }

    /// Entries in definition order, then aliases.
    pub fn iter(&self) -> impl Iterator<Item = (&str, VariableValue<'_>)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.view()))
            .chain(
                self.aliases
                    .iter()
                    .map(|(alias, index)| (alias.as_str(), self.entries[*index].1.view())),
            )
    }

    /// Substitutes every known placeholder of `template`.
    ///
    /// Substituted values are not scanned again, so a message containing
    /// `{tag}` is written as is.
    pub fn render(
        &self,
        template: &Template,
        strictness: FormatStrictness,
    ) -> Result<String, FormatError> {
        let mut out = String::with_capacity(template.source().len() * 2);
        for segment in template.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable { name, raw } => match self.entry(name) {
                    Some(Entry::Static(value)) => out.push_str(value),
                    _ => out.push_str(raw),
                },
                Segment::Pattern { kind, param, raw } => match self.entry(kind) {
                    Some(Entry::Pattern(callback)) => match callback(param) {
                        Ok(value) => out.push_str(&value),
                        Err(err) if strictness == FormatStrictness::Lenient => {
                            log::warn!(target: "eastlog", "keeping placeholder {raw}: {err}");
                            out.push_str(raw);
                        }
                        Err(err) => return Err(err),
                    },
                    _ => out.push_str(raw),
                },
            }
        }
        Ok(out)
    }
}

#[cfg(unix)]
fn process_group_id() -> String {
    nix::unistd::getpgrp().to_string()
}

#[cfg(not(unix))]
fn process_group_id() -> String {
    SENTINEL.to_string()
}

#[cfg(unix)]
fn current_user() -> String {
    use nix::unistd::{User, geteuid};
    match User::from_uid(geteuid()) {
        Ok(Some(user)) => user.name,
        _ => user_from_env(),
    }
}

#[cfg(not(unix))]
fn current_user() -> String {
    user_from_env()
}

fn user_from_env() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| SENTINEL.to_string())
}
