//! # mining-pool-monitor
//!
//! Scrapes mining pool observer dashboards, keeps a local SQLite history of
//! pool summaries, workers and daily earnings, flags anomalies, and mirrors
//! the latest state to a PostgREST backend.
//!
//! Each pool runs the same sequential cycle; pools run concurrently and a
//! failure in one never affects another.
//!
//! ## Architecture
//!
//! ```text
//! Observer page (HttpPageSource / StaticPageSource)
//!     │
//!     ├── Extractor + Vocabulary (extract/)
//!     ├── Normalizer (normalize)
//!     │
//!     ├── SqliteStore (persistence/)
//!     ├── AnomalyDetector (service/)
//!     ├── Synchronizer ──► RemoteStore (remote/)
//!     │
//!     └── Read API (api/) over SqliteStore
//! ```

pub mod api;
pub mod app_state;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod persistence;
pub mod remote;
pub mod service;
