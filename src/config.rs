use crate::calc::{AveragePolicy, RankingPolicy};
use crate::model::LevelType;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "bulletind.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelPolicies {
    pub nursery: AveragePolicy,
    pub primary: AveragePolicy,
    pub secondary: AveragePolicy,
}

impl Default for LevelPolicies {
    fn default() -> Self {
        Self {
            nursery: AveragePolicy::FlatMean,
            primary: AveragePolicy::FlatMean,
            secondary: AveragePolicy::BucketBlend,
        }
    }
}

impl LevelPolicies {
    pub fn for_level(&self, level: LevelType) -> AveragePolicy {
        match level {
            LevelType::Nursery => self.nursery,
            LevelType::Primary => self.primary,
            LevelType::Secondary => self.secondary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalcConfig {
    pub ranking: RankingPolicy,
    pub policies: LevelPolicies,
}

impl CalcConfig {
    /// Reads `bulletind.json` from a workspace. A missing file is not an error.
    pub fn load_from_workspace(workspace: &Path) -> anyhow::Result<Option<CalcConfig>> {
        let path = workspace.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        let cfg: CalcConfig = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid config", path.to_string_lossy()))?;
        Ok(Some(cfg))
    }

    /// Applies a partial override on top of this config. Keys absent from
    /// `patch` keep their current value.
    pub fn merged(&self, patch: &serde_json::Value) -> Result<CalcConfig, String> {
        let mut base = serde_json::to_value(self).map_err(|e| e.to_string())?;
        merge_json(&mut base, patch);
        serde_json::from_value(base).map_err(|e| e.to_string())
    }
}

fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(b), serde_json::Value::Object(p)) => {
            for (k, v) in p {
                match b.get_mut(k) {
                    Some(slot) => merge_json(slot, v),
                    None => {
                        b.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (slot, v) => *slot = v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_follow_education_level() {
        let cfg = CalcConfig::default();
        assert_eq!(cfg.ranking, RankingPolicy::Sequential);
        assert_eq!(
            cfg.policies.for_level(LevelType::Secondary),
            AveragePolicy::BucketBlend
        );
        assert_eq!(
            cfg.policies.for_level(LevelType::Primary),
            AveragePolicy::FlatMean
        );
    }

    #[test]
    fn partial_override_keeps_other_keys() {
        let cfg = CalcConfig::default()
            .merged(&json!({ "policies": { "primary": "bucketBlend" } }))
            .expect("merge");
        assert_eq!(cfg.policies.primary, AveragePolicy::BucketBlend);
        assert_eq!(cfg.policies.nursery, AveragePolicy::FlatMean);
        assert_eq!(cfg.ranking, RankingPolicy::Sequential);

        let cfg = cfg.merged(&json!({ "ranking": "competition" })).expect("merge");
        assert_eq!(cfg.ranking, RankingPolicy::Competition);
        assert_eq!(cfg.policies.primary, AveragePolicy::BucketBlend);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(CalcConfig::default()
            .merged(&json!({ "ranking": "dense" }))
            .is_err());
    }

    #[test]
    fn empty_file_object_gives_defaults() {
        let cfg: CalcConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, CalcConfig::default());
    }
}
