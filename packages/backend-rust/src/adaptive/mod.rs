//! Adaptive learning engine: session monitoring, Q-learning course
//! recommendation, learning-style classification and behavior prediction.
//!
//! Every component is an explicitly constructed service object. Models train
//! lazily on first use unless restored from a [`persistence::ModelStore`].

pub mod behavior;
pub mod config;
pub mod engine;
pub mod monitor;
pub mod persistence;
pub mod recommender;
pub mod style;
pub mod synthetic;
pub mod types;

pub use config::EngineConfig;
pub use engine::{AdaptiveEngine, LoadReport};
pub use persistence::{ModelStore, PersistenceError};
pub use types::{Action, BehaviorEvent, CourseRecord, EventType, Feedback, LearnerState};
