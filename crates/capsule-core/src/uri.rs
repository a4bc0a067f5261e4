//! The `capsule://` URI grammar.
//!
//! ```text
//! capsule://authority/domain[/subdomain...]/operation[/version][?key=value[&key=value...]]
//! ```
//!
//! A [`CapsuleUri`] can only be obtained by parsing, which keeps the
//! round-trip law `parse(to_uri(x)) == x` true for every value in existence.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Params;

/// Scheme prefix every capsule identifier starts with.
pub const SCHEME: &str = "capsule://";

/// Domain that routes resolution to locally installed sovereign capsules.
pub const SOVEREIGN_DOMAIN: &str = "sovereign";

/// A parsed capsule identifier.
///
/// Immutable: fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapsuleUri {
    authority: String,
    domain: String,
    subdomains: Vec<String>,
    operation: String,
    version: Option<String>,
    params: Params,
}

impl CapsuleUri {
    /// Parse a `capsule://` URI.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedUri`] if the scheme is missing, the
    /// authority is empty or contains characters outside
    /// `[A-Za-z0-9._-]`, a path segment is empty, or fewer than two path
    /// segments (domain and operation) follow the authority.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let rest = text
            .strip_prefix(SCHEME)
            .ok_or_else(|| CoreError::malformed(text, "missing capsule:// scheme"))?;

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let mut segments = path.split('/');
        let authority = segments.next().unwrap_or_default();
        if authority.is_empty() {
            return Err(CoreError::malformed(text, "empty authority"));
        }
        if let Some(bad) = authority.chars().find(|c| !is_authority_char(*c)) {
            return Err(CoreError::malformed(
                text,
                format!("authority contains disallowed character '{bad}'"),
            ));
        }

        let mut path = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                return Err(CoreError::malformed(text, "empty path segment"));
            }
            path.push(segment.to_owned());
        }
        if path.len() < 2 {
            return Err(CoreError::malformed(
                text,
                "expected at least a domain and an operation",
            ));
        }

        // NOTE: the version heuristic only looks at the leading characters of
        // the final segment. An operation such as `v2handler` in final
        // position behind a subdomain is taken as the version. Kept as-is;
        // see `test_version_heuristic_swallows_v_prefixed_operation`.
        let version = if path.len() >= 3 && path.last().is_some_and(|s| looks_like_version(s)) {
            path.pop()
        } else {
            None
        };

        let operation = path
            .pop()
            .ok_or_else(|| CoreError::malformed(text, "missing operation"))?;
        let mut rest = path.into_iter();
        let domain = rest
            .next()
            .ok_or_else(|| CoreError::malformed(text, "missing domain"))?;
        let subdomains = rest.collect();

        Ok(Self {
            authority: authority.to_owned(),
            domain,
            subdomains,
            operation,
            version,
            params: query.map(parse_query).unwrap_or_default(),
        })
    }

    /// The authority (first component after the scheme).
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The capsule domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Subdomains between the domain and the operation, in order.
    #[must_use]
    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// The operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The version token (`v` followed by digits or dots), if present.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Query parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Look up a single query parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Whether this URI targets the sovereign (local) resolution branch.
    #[must_use]
    pub fn is_sovereign(&self) -> bool {
        self.domain == SOVEREIGN_DOMAIN
    }

    /// The canonical URI without its query string.
    ///
    /// Registries and mesh replicas are keyed by this value so that
    /// invocation parameters never affect lookup.
    #[must_use]
    pub fn address(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(SCHEME);
        out.push_str(&self.authority);
        out.push('/');
        out.push_str(&self.domain);
        for sub in &self.subdomains {
            out.push('/');
            out.push_str(sub);
        }
        out.push('/');
        out.push_str(&self.operation);
        if let Some(version) = &self.version {
            out.push('/');
            out.push_str(version);
        }
        out
    }

    /// Serialize to the canonical string form. Parameters are emitted in
    /// key order.
    #[must_use]
    pub fn to_uri(&self) -> String {
        let mut out = self.address();
        if !self.params.is_empty() {
            out.push('?');
            let query: Vec<String> = self
                .params
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            out.push_str(&query.join("&"));
        }
        out
    }
}

/// Authorities are bare host names. `:` is not allowed, so a port
/// (`host:8080`) makes the URI malformed.
fn is_authority_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

fn looks_like_version(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next() == Some('v') && chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.')
}

/// Parse `key=value` pairs. A pair without `=` gets a blank value; pairs
/// with an empty key are dropped; later keys overwrite earlier ones.
fn parse_query(query: &str) -> Params {
    let mut params = BTreeMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key.is_empty() {
            continue;
        }
        params.insert(key.to_owned(), value.to_owned());
    }
    params
}

impl fmt::Display for CapsuleUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for CapsuleUri {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CapsuleUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_uri())
    }
}

impl<'de> Deserialize<'de> for CapsuleUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
