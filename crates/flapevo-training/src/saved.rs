use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flapevo_engine::{NodeCounts, ParameterBlob};

use crate::BestEver;

/// A trained policy as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPolicy {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    /// Generation the policy's agent lived in.
    pub generation: u32,
    pub score: u32,
    pub fitness: f32,
    pub node_counts: NodeCounts,
    pub parameters: ParameterBlob,
}

impl SavedPolicy {
    #[must_use]
    pub fn from_best(name: impl Into<String>, best: &BestEver, trained_at: DateTime<Utc>) -> Self {
        let policy = best.policy();
        Self {
            name: name.into(),
            trained_at,
            generation: best.generation(),
            score: best.score(),
            fitness: best.fitness(),
            node_counts: policy.node_counts(),
            parameters: policy.copy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_saved_policy() {
        let json = r#"{
            "name": "run-1",
            "trained_at": "2026-01-02T03:04:05Z",
            "generation": 7,
            "score": 12,
            "fitness": 1234.5,
            "node_counts": { "input": 5, "hidden": 8, "output": 2 },
            "parameters": { "groups": [ { "shape": [2], "values": [0.5, -0.5] } ] }
        }"#;
        let saved: SavedPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(saved.generation, 7);
        assert_eq!(saved.node_counts, NodeCounts::DEFAULT);
        assert_eq!(saved.parameters.scalar_count(), 2);
        assert_eq!(saved.trained_at.to_rfc3339(), "2026-01-02T03:04:05+00:00");
    }
}
