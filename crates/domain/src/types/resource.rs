//! Resource classification and caching strategies

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse category of a request, driving strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Document,
    Script,
    Style,
    Image,
    Font,
    Other,
}

impl ResourceClass {
    /// Every class, in declaration order.
    pub const ALL: [Self; 6] =
        [Self::Document, Self::Script, Self::Style, Self::Image, Self::Font, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Script => "script",
            Self::Style => "style",
            Self::Image => "image",
            Self::Font => "font",
            Self::Other => "other",
        }
    }

    /// Class for a declared request destination. Destinations without a
    /// dedicated class (`audio`, `worker`, ...) map to `Other`.
    pub fn from_destination(destination: &str) -> Self {
        match destination.to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "script" => Self::Script,
            "style" => Self::Style,
            "image" => Self::Image,
            "font" => Self::Font,
            _ => Self::Other,
        }
    }

    /// Class inferred from a URL path and its file extension.
    pub fn from_path(path: &str) -> Self {
        if path.is_empty() || path.ends_with('/') || path.ends_with(".html") {
            return Self::Document;
        }

        let file_name = path.rsplit('/').next().unwrap_or(path);
        let Some((_, extension)) = file_name.rsplit_once('.') else {
            return Self::Other;
        };

        match extension.to_ascii_lowercase().as_str() {
            "js" | "mjs" => Self::Script,
            "css" => Self::Style,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" => Self::Image,
            "woff" | "woff2" | "ttf" | "otf" => Self::Font,
            _ => Self::Other,
        }
    }

    /// Image and font entries are the ones subject to the cache-size guard.
    pub fn is_size_guarded(&self) -> bool {
        matches!(self, Self::Image | Self::Font)
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorithm governing how a request is served from cache vs. network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    #[default]
    NetworkFirst,
    StaleWhileRevalidate,
    CacheOnly,
    NetworkOnly,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache-first",
            Self::NetworkFirst => "network-first",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
            Self::CacheOnly => "cache-only",
            Self::NetworkOnly => "network-only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static class → strategy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyTable(BTreeMap<ResourceClass, Strategy>);

impl Default for StrategyTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            (ResourceClass::Document, Strategy::NetworkFirst),
            (ResourceClass::Script, Strategy::StaleWhileRevalidate),
            (ResourceClass::Style, Strategy::StaleWhileRevalidate),
            (ResourceClass::Image, Strategy::CacheFirst),
            (ResourceClass::Font, Strategy::CacheFirst),
            (ResourceClass::Other, Strategy::NetworkFirst),
        ]))
    }
}

impl StrategyTable {
    /// Table with no entries; every lookup yields the default strategy.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Strategy configured for `class`, network-first when unset.
    pub fn get(&self, class: ResourceClass) -> Strategy {
        self.0.get(&class).copied().unwrap_or_default()
    }

    pub fn set(&mut self, class: ResourceClass, strategy: Strategy) {
        self.0.insert(class, strategy);
    }

    /// Builder-style [`StrategyTable::set`].
    pub fn with(mut self, class: ResourceClass, strategy: Strategy) -> Self {
        self.set(class, strategy);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceClass, Strategy)> + '_ {
        self.0.iter().map(|(class, strategy)| (*class, *strategy))
    }
}
