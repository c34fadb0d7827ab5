//! Service layer: the scrape pipeline and its stages.
//!
//! [`PoolPipeline`] drives one cycle per pool through extraction,
//! persistence, [`AnomalyDetector`] and [`Synchronizer`].

pub mod anomaly_detector;
pub mod pipeline;
pub mod synchronizer;

pub use anomaly_detector::AnomalyDetector;
pub use pipeline::{CycleReport, PoolPipeline, PoolTarget};
pub use synchronizer::{AccountProfile, CallOutcome, SyncCounts, SyncReport, Synchronizer};
