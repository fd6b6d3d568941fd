//! PupilPath client core.
//!
//! Headless state and sync layer for the PupilPath worksheet platform's
//! parent and teacher apps: session-history aggregation, the class mastery
//! heatmap, debounced topic-preference sync, optimistic role switching, the
//! report generation and send workflow, and subscription usage gating. The
//! UI shell renders what lives here; it never talks to the backend directly.
//!
//! All remote access goes through the [`api::Backend`] trait, so every
//! engine runs unchanged against the HTTP backend or an in-memory double.

pub mod api;
pub mod dashboard;
pub mod error;
pub mod heatmap;
pub mod prefs;
pub mod report;
pub mod role;
pub mod session;
pub mod subscription;
pub mod timeline;
pub mod types;

pub use api::http::HttpBackend;
pub use api::Backend;
pub use error::{ApiError, ApiResult};
pub use session::SessionContext;
