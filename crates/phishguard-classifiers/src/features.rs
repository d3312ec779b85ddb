//! URL feature extraction
//!
//! Turns an arbitrary input string into the fixed 20-field feature map the
//! scorers consume. Extraction is total: inputs that are not well-formed
//! URLs still produce a map, with unparsable components treated as empty.
//! Nothing here touches DNS or the network.

use aho_corasick::AhoCorasick;
use phishguard_core::{Error, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::borrow::Cow;

/// Number of numeric fields in a feature vector
pub const FEATURE_COUNT: usize = 20;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "url_length",
    "domain_length",
    "path_length",
    "query_length",
    "num_dots",
    "num_hyphens",
    "num_underscores",
    "num_slashes",
    "num_question_marks",
    "num_equals",
    "num_ampersands",
    "num_percent",
    "has_ip",
    "has_shortener",
    "has_suspicious_keywords",
    "subdomain_count",
    "has_www",
    "is_https",
    "path_depth",
    "has_file_extension",
];

/// Vector positions of each feature
pub mod index {
    pub const URL_LENGTH: usize = 0;
    pub const DOMAIN_LENGTH: usize = 1;
    pub const PATH_LENGTH: usize = 2;
    pub const QUERY_LENGTH: usize = 3;
    pub const NUM_DOTS: usize = 4;
    pub const NUM_HYPHENS: usize = 5;
    pub const NUM_UNDERSCORES: usize = 6;
    pub const NUM_SLASHES: usize = 7;
    pub const NUM_QUESTION_MARKS: usize = 8;
    pub const NUM_EQUALS: usize = 9;
    pub const NUM_AMPERSANDS: usize = 10;
    pub const NUM_PERCENT: usize = 11;
    pub const HAS_IP: usize = 12;
    pub const HAS_SHORTENER: usize = 13;
    pub const HAS_SUSPICIOUS_KEYWORDS: usize = 14;
    pub const SUBDOMAIN_COUNT: usize = 15;
    pub const HAS_WWW: usize = 16;
    pub const IS_HTTPS: usize = 17;
    pub const PATH_DEPTH: usize = 18;
    pub const HAS_FILE_EXTENSION: usize = 19;
}

/// Known link-shortener hosts
pub const SHORTENER_DOMAINS: &[&str] = &["bit.ly", "tinyurl.com", "goo.gl", "t.co", "ow.ly"];

/// Credential-lure keywords matched anywhere in the lower-cased input
pub const SUSPICIOUS_KEYWORDS: &[&str] = &["secure", "account", "update", "verify", "confirm", "login"];

/// Scheme synthesized for inputs that carry none
const DEFAULT_SCHEME_PREFIX: &str = "http://";

/// Fixed-width numeric view of a [`FeatureMap`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap raw values laid out in [`FEATURE_NAMES`] order
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Value at a vector position
    pub fn get(&self, idx: usize) -> f64 {
        self.0[idx]
    }

    /// Indicator fields are stored as 0/1
    pub fn flag(&self, idx: usize) -> bool {
        self.0[idx] != 0.0
    }

    /// Values at the given positions, in the given order
    pub fn select(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&i| self.0[i]).collect()
    }

    /// Keep only the given positions; everything else reads as zero
    pub fn retain(&self, indices: &[usize]) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        for &i in indices {
            values[i] = self.0[i];
        }
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

/// Features extracted from one input string
///
/// Field order matches [`FEATURE_NAMES`]; serialization keeps that order and
/// writes indicators as 0/1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureMap {
    pub url_length: usize,
    pub domain_length: usize,
    pub path_length: usize,
    pub query_length: usize,
    pub num_dots: usize,
    pub num_hyphens: usize,
    pub num_underscores: usize,
    pub num_slashes: usize,
    pub num_question_marks: usize,
    pub num_equals: usize,
    pub num_ampersands: usize,
    pub num_percent: usize,
    #[serde(serialize_with = "as_flag")]
    pub has_ip: bool,
    #[serde(serialize_with = "as_flag")]
    pub has_shortener: bool,
    #[serde(serialize_with = "as_flag")]
    pub has_suspicious_keywords: bool,
    pub subdomain_count: usize,
    #[serde(serialize_with = "as_flag")]
    pub has_www: bool,
    #[serde(serialize_with = "as_flag")]
    pub is_https: bool,
    pub path_depth: usize,
    #[serde(serialize_with = "as_flag")]
    pub has_file_extension: bool,

    /// Lower-cased input (after scheme synthesis) for substring scans
    pub url_lower: String,
}

fn as_flag<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl FeatureMap {
    /// Numeric vector in [`FEATURE_NAMES`] order
    pub fn vector(&self) -> FeatureVector {
        FeatureVector([
            self.url_length as f64,
            self.domain_length as f64,
            self.path_length as f64,
            self.query_length as f64,
            self.num_dots as f64,
            self.num_hyphens as f64,
            self.num_underscores as f64,
            self.num_slashes as f64,
            self.num_question_marks as f64,
            self.num_equals as f64,
            self.num_ampersands as f64,
            self.num_percent as f64,
            flag(self.has_ip),
            flag(self.has_shortener),
            flag(self.has_suspicious_keywords),
            self.subdomain_count as f64,
            flag(self.has_www),
            flag(self.is_https),
            self.path_depth as f64,
            flag(self.has_file_extension),
        ])
    }

    /// Ordered (name, value) pairs
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.vector().as_slice().iter().copied())
            .collect()
    }

    /// Look up a numeric feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.vector().get(i))
    }
}

/// Structural pieces of a URL, split the way lenient URL parsers do
#[derive(Debug, Default, PartialEq, Eq)]
struct UrlParts<'a> {
    scheme: &'a str,
    authority: &'a str,
    path: &'a str,
    query: &'a str,
}

impl<'a> UrlParts<'a> {
    /// Split without validating; never fails
    fn split(url: &'a str) -> Self {
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("https://") {
            ("https", rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            ("http", rest)
        } else {
            return Self::default();
        };

        let authority_end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
        let (authority, mut rest) = rest.split_at(authority_end);

        if let Some((before, _fragment)) = rest.split_once('#') {
            rest = before;
        }
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, query),
            None => (rest, ""),
        };

        Self {
            scheme,
            authority,
            path: strip_params(path),
            query,
        }
    }
}

/// Drop `;params` from the last path segment
fn strip_params(path: &str) -> &str {
    let last_segment_start = path.rfind('/').unwrap_or(0);
    match path[last_segment_start..].find(';') {
        Some(offset) => &path[..last_segment_start + offset],
        None => path,
    }
}

/// Host portion of a lower-cased authority: no userinfo, no port
fn host_of(authority: &str) -> &str {
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host.starts_with('[') {
        return host.split_once(']').map_or(host, |(h, _)| &h[1..]);
    }
    host.split_once(':').map_or(host, |(h, _)| h)
}

/// Labels beyond the registrable name, ignoring a leading `www.`
fn subdomain_count(host: &str) -> usize {
    let host = host.strip_prefix("www.").unwrap_or(host);
    if !host.contains('.') {
        return 0;
    }
    host.split('.').count().saturating_sub(2)
}

fn is_shortener(host: &str) -> bool {
    SHORTENER_DOMAINS.iter().any(|shortener| {
        host == *shortener
            || host
                .strip_suffix(shortener)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn count_char(s: &str, c: char) -> usize {
    s.chars().filter(|&ch| ch == c).count()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Feature extractor with its matchers compiled once
pub struct FeatureExtractor {
    ip_regex: Regex,
    keywords: AhoCorasick,
}

impl FeatureExtractor {
    /// Create a new feature extractor
    pub fn new() -> Result<Self> {
        Ok(Self {
            ip_regex: Regex::new(r"^\d+\.\d+\.\d+\.\d+")
                .map_err(|e| Error::internal(format!("Failed to compile IP regex: {}", e)))?,
            keywords: AhoCorasick::new(SUSPICIOUS_KEYWORDS)
                .map_err(|e| Error::internal(format!("Failed to build keyword matcher: {}", e)))?,
        })
    }

    /// Extract the feature map for one input
    pub fn extract(&self, input: &str) -> FeatureMap {
        let url: Cow<'_, str> = if input.starts_with("http://") || input.starts_with("https://") {
            Cow::Borrowed(input)
        } else {
            Cow::Owned(format!("{}{}", DEFAULT_SCHEME_PREFIX, input))
        };

        let parts = UrlParts::split(&url);
        let authority = parts.authority.to_lowercase();
        let host = host_of(&authority);
        let url_lower = url.to_lowercase();

        let last_segment = parts.path.rsplit('/').next().unwrap_or("");

        FeatureMap {
            url_length: char_len(&url),
            domain_length: char_len(&authority),
            path_length: char_len(parts.path),
            query_length: char_len(parts.query),
            num_dots: count_char(&url, '.'),
            num_hyphens: count_char(&url, '-'),
            num_underscores: count_char(&url, '_'),
            num_slashes: count_char(&url, '/'),
            num_question_marks: count_char(&url, '?'),
            num_equals: count_char(&url, '='),
            num_ampersands: count_char(&url, '&'),
            num_percent: count_char(&url, '%'),
            has_ip: self.ip_regex.is_match(&authority),
            has_shortener: is_shortener(host),
            has_suspicious_keywords: self.keywords.is_match(&url_lower),
            subdomain_count: subdomain_count(host),
            has_www: authority.starts_with("www."),
            is_https: parts.scheme == "https",
            path_depth: parts.path.split('/').filter(|s| !s.is_empty()).count(),
            has_file_extension: last_segment.contains('.'),
            url_lower,
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new().expect("Failed to create feature extractor")
    }
}
