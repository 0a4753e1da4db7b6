use engage_algo::{IsolationForest, IsolationParams, LinearRegression, StandardScaler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::adaptive::config::TrainingConfig;
use crate::adaptive::synthetic::exponential;

/// Everything the monitor learns in one training pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorModels {
    pub scaler: StandardScaler,
    pub anomaly: IsolationForest,
    pub struggle: LinearRegression,
    pub boredom: LinearRegression,
}

impl MonitorModels {
    pub fn is_well_formed(&self) -> bool {
        self.anomaly.is_well_formed()
    }
}

pub struct MonitorDataset {
    pub rows: Vec<Vec<f64>>,
    pub struggle: Vec<f64>,
    pub boredom: Vec<f64>,
}

/// Synthetic sessions in feature-vector order, labelled by fixed rules.
pub fn synthetic_sessions(samples: usize, seed: u64) -> MonitorDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = MonitorDataset {
        rows: Vec::with_capacity(samples),
        struggle: Vec::with_capacity(samples),
        boredom: Vec::with_capacity(samples),
    };

    for _ in 0..samples {
        let total_events = rng.random_range(5..150) as f64;
        let duration_hours = exponential(&mut rng, 1.0);
        let max_gap_hours = exponential(&mut rng, 0.5);
        let long_gaps = rng.random_range(0..10) as f64;
        let events_per_minute = rng.random_range(0.1..3.0);
        let engagement_ratio = rng.random_range(0.2..1.0);
        let tab_switches = rng.random_range(0..15) as f64;
        let quiz_fails = rng.random_range(0..8) as f64;
        let video_pauses = rng.random_range(0..10) as f64;
        let repeats = rng.random_range(0..5) as f64;
        let diversity = rng.random_range(1..15) as f64;
        let scroll_depth = rng.random_range(0.1..1.0);

        let struggling = tab_switches > 8.0 || quiz_fails > 4.0;
        let bored = events_per_minute < 0.3 && duration_hours > 1.0;

        data.rows.push(vec![
            total_events,
            duration_hours,
            max_gap_hours,
            long_gaps,
            events_per_minute,
            engagement_ratio,
            tab_switches,
            quiz_fails,
            video_pauses,
            repeats,
            diversity,
            scroll_depth,
        ]);
        data.struggle.push(if struggling { 1.0 } else { 0.0 });
        data.boredom.push(if bored { 1.0 } else { 0.0 });
    }
    data
}

pub fn fit_monitor_models(config: &TrainingConfig) -> MonitorModels {
    let data = synthetic_sessions(config.monitor_samples, config.seed);
    let scaler = StandardScaler::fit(&data.rows);
    let scaled = scaler.transform(&data.rows);

    let anomaly = IsolationForest::fit(
        &scaled,
        &IsolationParams {
            n_estimators: 100,
            contamination: 0.15,
            seed: config.seed,
            ..IsolationParams::default()
        },
    );
    let struggle = LinearRegression::fit(&scaled, &data.struggle);
    let boredom = LinearRegression::fit(&scaled, &data.boredom);

    MonitorModels {
        scaler,
        anomaly,
        struggle,
        boredom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_sessions_are_reproducible_and_labelled() {
        let a = synthetic_sessions(50, 42);
        let b = synthetic_sessions(50, 42);
        assert_eq!(a.rows, b.rows);
        for (row, label) in a.rows.iter().zip(&a.struggle) {
            let expected = row[6] > 8.0 || row[7] > 4.0;
            assert_eq!(*label == 1.0, expected);
            assert!(row[0] >= 5.0 && row[0] < 150.0);
            assert!(row[11] >= 0.1 && row[11] < 1.0);
        }
    }

    #[test]
    fn struggle_model_rises_with_quiz_failures() {
        let models = fit_monitor_models(&TrainingConfig::default());
        let mut calm = vec![40.0, 1.0, 0.3, 2.0, 1.0, 0.7, 1.0, 0.0, 2.0, 1.0, 5.0, 0.6];
        let mut rough = calm.clone();
        rough[6] = 14.0;
        rough[7] = 7.0;
        calm = models.scaler.transform_row(&calm);
        rough = models.scaler.transform_row(&rough);
        assert!(models.struggle.predict_row(&rough) > models.struggle.predict_row(&calm));
        assert!(models.anomaly.is_fitted());
    }
}
