//! Pattern-extraction thresholds (spec §3.8, §4.6, §9).

#[derive(Debug, Clone, Copy)]
pub struct PatternThresholds {
    pub min_occurrences: u64,
    pub confidence_floor: f64,
    /// Below this, an existing Pattern is considered to have drifted and
    /// is forked into a refined successor (spec §4.6 pattern evolution)
    /// rather than merely refreshed in place.
    pub retraining_floor: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self { min_occurrences: 3, confidence_floor: 0.6, retraining_floor: 0.4 }
    }
}

impl PatternThresholds {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let min_occurrences = std::env::var("AGENTFLOW_PATTERN_MIN_OCCURRENCES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.min_occurrences);
        let confidence_floor = std::env::var("AGENTFLOW_PATTERN_CONFIDENCE_FLOOR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.confidence_floor);
        let retraining_floor = std::env::var("AGENTFLOW_PATTERN_RETRAINING_FLOOR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.retraining_floor);
        Self { min_occurrences, confidence_floor, retraining_floor }
    }
}

/// Weights for the solution-ranking score in `find_solutions`
/// (spec §4.6): `score = w1 * similarity + w2 * success_rate + w3 * recency_decay`.
#[derive(Debug, Clone, Copy)]
pub struct RankingWeights {
    pub similarity: f64,
    pub success_rate: f64,
    pub recency: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self { similarity: 0.5, success_rate: 0.35, recency: 0.15 }
    }
}
