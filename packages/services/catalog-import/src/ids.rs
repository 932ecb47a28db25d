use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace used in global ids when none is configured.
pub const DEFAULT_PLATFORM: &str = "shopify";

/// Resource types that appear in global ids (`gid://<platform>/<Type>/<id>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalIdResource {
    Product,
    ProductImage,
    Collection,
    CollectionImage,
    Location,
    ProductVariant,
    Publication,
}

impl GlobalIdResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalIdResource::Product => "Product",
            GlobalIdResource::ProductImage => "ProductImage",
            GlobalIdResource::Collection => "Collection",
            GlobalIdResource::CollectionImage => "CollectionImage",
            GlobalIdResource::Location => "Location",
            GlobalIdResource::ProductVariant => "ProductVariant",
            GlobalIdResource::Publication => "Publication",
        }
    }
}

impl fmt::Display for GlobalIdResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw resource id as it arrives from a sheet cell, a query string or a
/// remote payload: an integer, a float, or text (digits or a global id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for ResourceId {
    fn from(v: i64) -> Self { ResourceId::Int(v) }
}

impl From<u64> for ResourceId {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(ResourceId::Int).unwrap_or(ResourceId::Float(v as f64))
    }
}

impl From<f64> for ResourceId {
    fn from(v: f64) -> Self { ResourceId::Float(v) }
}

impl From<&str> for ResourceId {
    fn from(v: &str) -> Self { ResourceId::Text(v.to_string()) }
}

impl From<String> for ResourceId {
    fn from(v: String) -> Self { ResourceId::Text(v) }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Int(v) => write!(f, "{}", v),
            ResourceId::Float(v) => write!(f, "{}", v),
            ResourceId::Text(v) => f.write_str(v),
        }
    }
}

/// Converts between legacy integer ids and global-id strings.
///
/// Both directions are total: anything that cannot be translated yields
/// `None`, and callers decide whether that is a validation failure.
#[derive(Debug, Clone)]
pub struct IdTranslator {
    platform: String,
}

impl Default for IdTranslator {
    fn default() -> Self { Self::new(DEFAULT_PLATFORM) }
}

impl IdTranslator {
    pub fn new(platform: impl Into<String>) -> Self {
        Self { platform: platform.into() }
    }

    pub fn platform(&self) -> &str { &self.platform }

    /// Legacy (integer) id of `id`.
    ///
    /// Accepts plain digit strings, integers, integral floats and
    /// `gid://<platform>/<Type>/<digits>` (case-insensitive, surrounding
    /// whitespace ignored). Zero is never a valid legacy id.
    pub fn to_legacy_id(&self, id: &ResourceId) -> Option<u64> {
        let legacy = match id {
            ResourceId::Int(v) => u64::try_from(*v).ok(),
            ResourceId::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && *v >= 0.0 && *v <= u64::MAX as f64 {
                    Some(*v as u64)
                } else {
                    None
                }
            }
            ResourceId::Text(s) => {
                if is_digits(s) {
                    s.parse::<u64>().ok()
                } else {
                    self.split_global_id(s.trim()).and_then(|(_, digits)| digits.parse::<u64>().ok())
                }
            }
        };
        legacy.filter(|v| *v > 0)
    }

    /// Global id of `id` for `resource`.
    ///
    /// A global id already naming `resource` comes back unchanged; a global id
    /// naming any other type is rejected.
    pub fn to_global_id(&self, id: &ResourceId, resource: GlobalIdResource) -> Option<String> {
        if let ResourceId::Text(s) = id {
            let trimmed = s.trim();
            if let Some((kind, _)) = self.split_global_id(trimmed) {
                return kind.eq_ignore_ascii_case(resource.as_str()).then(|| trimmed.to_string());
            }
        }
        self.to_legacy_id(id)
            .map(|legacy| format!("gid://{}/{}/{}", self.platform, resource, legacy))
    }

    /// `(Type, digits)` parts of a well-formed global id for this platform.
    fn split_global_id<'a>(&self, s: &'a str) -> Option<(&'a str, &'a str)> {
        const SCHEME: &str = "gid://";
        if !s.get(..SCHEME.len())?.eq_ignore_ascii_case(SCHEME) {
            return None;
        }
        let mut parts = s[SCHEME.len()..].split('/');
        let platform = parts.next()?;
        let kind = parts.next()?;
        let digits = parts.next()?;
        if parts.next().is_some() || !platform.eq_ignore_ascii_case(&self.platform) {
            return None;
        }
        if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphabetic()) || !is_digits(digits) {
            return None;
        }
        Some((kind, digits))
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
