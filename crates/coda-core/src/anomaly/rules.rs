//! Anomaly screening rules, loaded from a TOML file.
//!
//! The deny-lists live in data rather than code so the rule set can be
//! audited and extended without a rebuild.
//!
//! # Example
//!
//! ```toml
//! invalid_countries = ["ZZ"]
//!
//! [deny]
//! addresses = ["10.0.0.1"]
//! address_prefixes = ["185.220."]
//! artists = ["Fake Artist"]
//! albums = ["Fake Album"]
//!
//! [rapid_play]
//! min_group_size = 100
//! max_gap_secs = 30
//! max_rapid_ratio = 0.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Country code the exports use for "unknown / invalid".
pub const UNKNOWN_COUNTRY: &str = "ZZ";

/// Top-level anomaly rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRules {
    /// Country codes that mark a record as invalid.
    #[serde(default = "default_invalid_countries")]
    pub invalid_countries: Vec<String>,

    #[serde(default)]
    pub deny: DenyLists,

    #[serde(default)]
    pub rapid_play: RapidPlayRule,
}

/// Per-record deny-lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenyLists {
    /// Exact network addresses.
    pub addresses: Vec<String>,
    /// Address prefixes, e.g. `"185.220."`.
    pub address_prefixes: Vec<String>,
    /// Known-fabricated artist names (trimmed, case-insensitive).
    pub artists: Vec<String>,
    /// Known-fabricated album names (trimmed, case-insensitive).
    pub albums: Vec<String>,
}

/// Group-level verdict for repeated plays of one (artist, track) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RapidPlayRule {
    /// Groups must be strictly larger than this to be examined.
    pub min_group_size: usize,
    /// Adjacent plays closer than this many seconds are "rapid".
    pub max_gap_secs: i64,
    /// The group is discarded when rapid plays exceed this share of it.
    pub max_rapid_ratio: f64,
}

impl Default for RapidPlayRule {
    fn default() -> Self {
        Self {
            min_group_size: 100,
            max_gap_secs: 30,
            max_rapid_ratio: 0.5,
        }
    }
}

impl Default for AnomalyRules {
    fn default() -> Self {
        Self {
            invalid_countries: default_invalid_countries(),
            deny: DenyLists::default(),
            rapid_play: RapidPlayRule::default(),
        }
    }
}

fn default_invalid_countries() -> Vec<String> {
    vec![UNKNOWN_COUNTRY.to_string()]
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl AnomalyRules {
    /// Load anomaly rules from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_toml(&content).map_err(|e| {
            Error::InvalidData(format!(
                "failed to parse anomaly rules from {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let rules: Self =
            toml::from_str(content).map_err(|e| Error::InvalidData(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    fn validate(&self) -> Result<()> {
        let ratio = self.rapid_play.max_rapid_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::InvalidData(format!(
                "rapid_play.max_rapid_ratio must be within [0, 1], got {ratio}"
            )));
        }
        let gap = self.rapid_play.max_gap_secs;
        if gap < 0 {
            return Err(Error::InvalidData(
                "rapid_play.max_gap_secs must not be negative".to_string(),
            ));
        }
        if chrono::TimeDelta::try_seconds(gap).is_none() {
            return Err(Error::InvalidData(format!(
                "rapid_play.max_gap_secs is out of range, got {gap}"
            )));
        }
        Ok(())
    }

    pub fn is_invalid_country(&self, country: &str) -> bool {
        self.invalid_countries.iter().any(|c| c == country)
    }

    pub fn is_denied_address(&self, address: &str) -> bool {
        self.deny.addresses.iter().any(|a| a == address)
            || self
                .deny
                .address_prefixes
                .iter()
                .any(|prefix| address.starts_with(prefix.as_str()))
    }

    pub fn is_denied_artist(&self, artist: &str) -> bool {
        let artist = normalize_name(artist);
        self.deny.artists.iter().any(|a| normalize_name(a) == artist)
    }

    pub fn is_denied_album(&self, album: &str) -> bool {
        let album = normalize_name(album);
        self.deny.albums.iter().any(|a| normalize_name(a) == album)
    }
}
