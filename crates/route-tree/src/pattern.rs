//! Path pattern compiler
//!
//! Turns a route pattern such as `/users/:id(\\d+)/:tab?` into an anchored
//! [`Regex`] plus the ordered list of parameter [`Key`]s it captures.
//!
//! Supported syntax:
//! - literal text, matched case-insensitively unless [`MatchOptions::sensitive`]
//! - `:name` parameters, with `?`, `*` and `+` modifiers
//! - custom capture patterns `:name(\\d+)` and unnamed groups `(\\d+)`
//! - the `*` wildcard
//! - `\\` escapes for literal `:`, `(` or `*`
//!
//! The `regex` crate has no look-around, so prefix-mode patterns consume
//! the segment boundary in a trailing `tail` group that is subtracted from
//! the reported match.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::MatchOptions;
use crate::error::{RouteError, RouteResult};

const DEFAULT_DELIMITER: char = '/';
const TAIL_GROUP: &str = "tail";

/// A route pattern: one pattern string, or alternatives tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutePattern {
    /// One pattern string
    Single(String),
    /// Alternatives, first match wins
    Any(Vec<String>),
}

impl RoutePattern {
    /// The alternatives in declaration order.
    pub fn alternatives(&self) -> &[String] {
        match self {
            Self::Single(pattern) => std::slice::from_ref(pattern),
            Self::Any(patterns) => patterns,
        }
    }

    /// True if this is exactly the single pattern `path`.
    pub fn is(&self, path: &str) -> bool {
        matches!(self, Self::Single(pattern) if pattern == path)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(pattern) => f.write_str(pattern),
            Self::Any(patterns) => write!(f, "[{}]", patterns.join(", ")),
        }
    }
}

impl From<&str> for RoutePattern {
    fn from(pattern: &str) -> Self {
        Self::Single(pattern.to_string())
    }
}

impl From<String> for RoutePattern {
    fn from(pattern: String) -> Self {
        Self::Single(pattern)
    }
}

impl From<Vec<String>> for RoutePattern {
    fn from(patterns: Vec<String>) -> Self {
        Self::Any(patterns)
    }
}

impl From<Vec<&str>> for RoutePattern {
    fn from(patterns: Vec<&str>) -> Self {
        Self::Any(patterns.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RoutePattern {
    fn from(patterns: [&str; N]) -> Self {
        Self::Any(patterns.iter().map(|p| p.to_string()).collect())
    }
}

/// A parameter captured by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Parameter name; unnamed groups are numbered from 0
    pub name: String,
    /// `.` or `/` preceding the parameter, if any
    pub prefix: Option<char>,
    /// `?` or `*` modifier
    pub optional: bool,
    /// `+` or `*` modifier
    pub repeat: bool,
    /// Followed by other text in the same segment
    pub partial: bool,
    /// Regex source matched by a single repetition
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(Key),
}

/// One compiled alternative of a [`RoutePattern`].
#[derive(Debug)]
struct Alternative {
    regex: Regex,
    keys: Vec<Key>,
}

/// A compiled [`RoutePattern`].
#[derive(Debug)]
pub struct CompiledPattern {
    alternatives: Vec<Alternative>,
}

/// A raw (undecoded) match of a [`CompiledPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch<'p> {
    /// Consumed prefix of the path, possibly empty
    pub path: &'p str,
    /// Every key of every alternative, `None` where nothing was captured
    pub captures: Vec<(&'p str, Option<&'p str>)>,
}

impl CompiledPattern {
    /// Compile `pattern`, anchored at the start and, if `end`, at the end.
    pub fn compile(pattern: &RoutePattern, end: bool, options: MatchOptions) -> RouteResult<Self> {
        let alternatives = pattern
            .alternatives()
            .iter()
            .map(|source| compile_alternative(source, end, options))
            .collect::<RouteResult<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    /// All keys across alternatives, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.alternatives.iter().flat_map(|alt| alt.keys.iter())
    }

    /// Match `path` against the first alternative that accepts it.
    pub fn exec<'p>(&'p self, path: &'p str) -> Option<RawMatch<'p>> {
        let (index, caps) = self
            .alternatives
            .iter()
            .enumerate()
            .find_map(|(index, alt)| alt.regex.captures(path).map(|caps| (index, caps)))?;

        let whole = caps.get(0)?;
        let tail = caps.name(TAIL_GROUP).map_or(0, |m| m.len());
        let consumed = &path[..whole.end() - tail];

        let captures = self
            .alternatives
            .iter()
            .enumerate()
            .flat_map(|(alt_index, alt)| {
                alt.keys.iter().enumerate().map(move |(key_index, key)| {
                    (alt_index, key_index, key.name.as_str())
                })
            })
            .map(|(alt_index, key_index, name)| {
                let value = (alt_index == index)
                    .then(|| caps.name(&group_name(key_index)))
                    .flatten()
                    .map(|m| m.as_str());
                (name, value)
            })
            .collect();

        Some(RawMatch {
            path: consumed,
            captures,
        })
    }
}

fn group_name(index: usize) -> String {
    format!("p{}", index)
}

fn compile_alternative(source: &str, end: bool, options: MatchOptions) -> RouteResult<Alternative> {
    let tokens = parse(source);
    let mut route = String::new();
    let mut keys = Vec::new();

    for token in tokens {
        match token {
            Token::Literal(text) => route.push_str(&regex::escape(&text)),
            Token::Param(key) => {
                let prefix = key
                    .prefix
                    .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
                    .unwrap_or_default();
                let mut capture = format!("(?:{})", key.pattern);
                if key.repeat {
                    capture = format!("{capture}(?:{prefix}{capture})*");
                }
                let group = format!("(?P<{}>{})", group_name(keys.len()), capture);
                let segment = match (key.optional, key.partial) {
                    (true, false) => format!("(?:{prefix}{group})?"),
                    (true, true) => format!("{prefix}{group}?"),
                    (false, _) => format!("{prefix}{group}"),
                };
                route.push_str(&segment);
                keys.push(key);
            }
        }
    }

    let ends_with_delimiter = route.ends_with(DEFAULT_DELIMITER);
    if !options.strict && ends_with_delimiter {
        route.pop();
    }

    let tail = match (end, options.strict) {
        (true, false) => "/?$".to_string(),
        (true, true) => "$".to_string(),
        (false, false) => format!("(?:/$|$|(?P<{TAIL_GROUP}>/))"),
        (false, true) if ends_with_delimiter => String::new(),
        (false, true) => format!("(?:$|(?P<{TAIL_GROUP}>/))"),
    };

    let flags = if options.sensitive { "" } else { "(?i)" };
    let regex = Regex::new(&format!("{flags}^{route}{tail}"))
        .map_err(|e| RouteError::invalid_pattern(source, e))?;

    Ok(Alternative { regex, keys })
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Read a `( ... )` group body starting at `start` (which must be `(`).
///
/// Returns the body and the index just past the closing paren.
fn read_group(chars: &[char], start: usize) -> Option<(String, usize)> {
    if chars.get(start) != Some(&'(') {
        return None;
    }
    let mut body = String::new();
    let mut i = start + 1;
    while let Some(&c) = chars.get(i) {
        match c {
            '\\' => {
                let escaped = *chars.get(i + 1)?;
                body.push(c);
                body.push(escaped);
                i += 2;
            }
            ')' if !body.is_empty() => return Some((body, i + 1)),
            '(' | ')' => return None,
            _ => {
                body.push(c);
                i += 1;
            }
        }
    }
    None
}

/// Escape `$` in a user capture group so it stays a literal.
fn escape_group(group: &str) -> String {
    let mut escaped = String::with_capacity(group.len());
    let mut chars = group.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                escaped.push(c);
                if let Some(next) = chars.next() {
                    escaped.push(next);
                }
            }
            '$' => escaped.push_str("\\$"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parameter body found at some index: name, custom pattern, modifier, end index.
struct ParamBody {
    name: Option<String>,
    pattern: Option<String>,
    modifier: Option<char>,
    asterisk: bool,
    end: usize,
}

fn read_param(chars: &[char], start: usize) -> Option<ParamBody> {
    let (name, pattern, mut i) = match chars.get(start)? {
        ':' => {
            let mut i = start + 1;
            let mut name = String::new();
            while let Some(&c) = chars.get(i).filter(|c| is_word(**c)) {
                name.push(c);
                i += 1;
            }
            if name.is_empty() {
                return None;
            }
            match read_group(chars, i) {
                Some((group, after)) => (Some(name), Some(group), after),
                None => (Some(name), None, i),
            }
        }
        '(' => {
            let (group, after) = read_group(chars, start)?;
            (None, Some(group), after)
        }
        '*' => {
            return Some(ParamBody {
                name: None,
                pattern: None,
                modifier: None,
                asterisk: true,
                end: start + 1,
            });
        }
        _ => return None,
    };

    let modifier = chars.get(i).copied().filter(|c| matches!(c, '+' | '*' | '?'));
    if modifier.is_some() {
        i += 1;
    }

    Some(ParamBody {
        name,
        pattern,
        modifier,
        asterisk: false,
        end: i,
    })
}

fn parse(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut unnamed = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            if let Some(&escaped) = chars.get(i + 1) {
                literal.push(escaped);
                i += 2;
                continue;
            }
        }

        let prefix = matches!(c, '/' | '.').then_some(c);
        let body_start = if prefix.is_some() { i + 1 } else { i };
        let Some(body) = read_param(&chars, body_start) else {
            literal.push(c);
            i += 1;
            continue;
        };

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        let next = chars.get(body.end).copied();
        let delimiter = prefix.unwrap_or(DEFAULT_DELIMITER);
        let name = body.name.unwrap_or_else(|| {
            unnamed += 1;
            (unnamed - 1).to_string()
        });
        let pattern = match body.pattern {
            Some(group) => escape_group(&group),
            None if body.asterisk => ".*".to_string(),
            None => format!("[^{}]+?", regex::escape(delimiter.encode_utf8(&mut [0; 4]))),
        };

        tokens.push(Token::Param(Key {
            name,
            prefix,
            optional: matches!(body.modifier, Some('?' | '*')),
            repeat: matches!(body.modifier, Some('+' | '*')),
            partial: prefix.is_some() && next.is_some() && next != prefix,
            pattern,
        }));
        i = body.end;
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}
