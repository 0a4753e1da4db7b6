use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonitorThresholds {
    pub inactive_hours: f64,
    pub struggle_score: f64,
    pub boredom_score: f64,
    pub fast_completion_hours: f64,
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            inactive_hours: 2.0,
            struggle_score: 0.7,
            boredom_score: 0.6,
            fast_completion_hours: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderParams {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
}

impl Default for RecommenderParams {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
            epsilon_decay: 0.99,
            min_epsilon: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    pub engagement: f64,
    pub completion: f64,
    pub performance: f64,
    pub satisfaction: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            engagement: 0.3,
            completion: 0.25,
            performance: 0.25,
            satisfaction: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub seed: u64,
    pub monitor_samples: usize,
    pub style_samples_per_class: usize,
    pub behavior_samples: usize,
    pub behavior_trees: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            monitor_samples: 500,
            style_samples_per_class: 150,
            behavior_samples: 500,
            behavior_trees: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub thresholds: MonitorThresholds,
    #[serde(default)]
    pub recommender: RecommenderParams,
    #[serde(default)]
    pub reward_weights: RewardWeights,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl EngineConfig {
    /// Only the training seed is tunable from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(seed) = std::env::var("ENGINE_TRAINING_SEED")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.training.seed = seed;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.thresholds.inactive_hours, 2.0);
        assert_eq!(config.thresholds.struggle_score, 0.7);
        assert_eq!(config.thresholds.boredom_score, 0.6);
        assert_eq!(config.thresholds.fast_completion_hours, 0.5);
        assert_eq!(config.recommender.alpha, 0.1);
        assert_eq!(config.recommender.gamma, 0.9);
        assert_eq!(config.recommender.min_epsilon, 0.01);
        assert_eq!(config.reward_weights.engagement, 0.3);
        assert_eq!(config.training.seed, 42);
    }
}
