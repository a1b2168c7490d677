use crate::ad_break::{AdBreak, AdvertisingPlan};
use crate::cue_point::CuePoint;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// One waterfall candidate as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdTagConfig {
    /// Ad tag (usually a VAST URL) passed to the player untouched.
    pub tag: String,
}

/// A single ad break definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdBreakConfig {
    /// Position in milliseconds. 0 = preroll, -1 = postroll.
    pub position_ms: i64,
    /// Candidates in waterfall order.
    #[serde(default)]
    pub ads: Vec<AdTagConfig>,
}

impl AdBreakConfig {
    pub fn new(position_ms: i64, tags: &[&str]) -> Self {
        AdBreakConfig {
            position_ms,
            ads: tags
                .iter()
                .map(|t| AdTagConfig { tag: t.to_string() })
                .collect(),
        }
    }
}

/// Advertising attached to a media entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisingConfig {
    #[serde(default)]
    pub advertising: Vec<AdBreakConfig>,
}

impl AdvertisingConfig {
    pub fn new(advertising: Vec<AdBreakConfig>) -> Self {
        AdvertisingConfig { advertising }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read advertising configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config = Self::from_json(&data)?;
        debug!(path = %path.display(), breaks = config.advertising.len(), "Loaded advertising config");
        Ok(config)
    }

    /// Build the cue index and break table.
    ///
    /// Bad entries never fail the build: invalid positions are dropped,
    /// empty tags are ignored, and duplicate positions merge into a single
    /// break whose waterfall keeps configuration order.
    pub fn build(&self) -> AdvertisingPlan {
        let breaks = self.advertising.iter().filter_map(|cfg| {
            let cue = CuePoint(cfg.position_ms);
            if !cue.is_valid() {
                warn!(position_ms = cfg.position_ms, "Dropping ad break with invalid position");
                return None;
            }
            let tags: Vec<String> = cfg
                .ads
                .iter()
                .filter(|ad| {
                    let keep = !ad.tag.trim().is_empty();
                    if !keep {
                        warn!(%cue, "Ignoring empty ad tag");
                    }
                    keep
                })
                .map(|ad| ad.tag.clone())
                .collect();
            if tags.is_empty() {
                warn!(%cue, "Ad break has no candidates");
            }
            Some(AdBreak::new(cue, tags))
        });
        AdvertisingPlan::new(breaks)
    }
}
