//! Template mini-language.
//!
//! A template is plain text with two kinds of placeholders:
//! `{name}` looks up a variable, `{<kind>(param)}` calls the pattern variable
//! `kind` with `param`. Anything else, including malformed braces, is literal.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(?:<(\w+)>\((.*?)\)|(\w+))\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `{name}`
    Variable { name: String, raw: String },
    /// `{<kind>(param)}`
    Pattern {
        kind: String,
        param: String,
        raw: String,
    },
}

impl Segment {
    /// The source text of the segment, used when it cannot be resolved.
    pub fn raw(&self) -> &str {
        match self {
            Segment::Literal(text) => text,
            Segment::Variable { raw, .. } | Segment::Pattern { raw, .. } => raw,
        }
    }
}

/// A parsed template, ready to be rendered any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_RE.captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            let raw = whole.as_str().to_string();
            let segment = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(kind), Some(param), _) => Segment::Pattern {
                    kind: kind.as_str().to_string(),
                    param: param.as_str().to_string(),
                    raw,
                },
                (_, _, Some(name)) => Segment::Variable {
                    name: name.as_str().to_string(),
                    raw,
                },
                _ => Segment::Literal(raw),
            };
            segments.push(segment);
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }
        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the template has no placeholder at all.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }
}
