//! Chokai core - fiscal-year resolution and membership roster engine.
//!
//! This crate holds the parts of the community association manager that
//! carry real invariants:
//!
//! - `fiscal`: working fiscal year resolution and era-style year labels
//! - `grade`: grade bands and sort order derived from birthdates
//! - `roster`: roster ordering and participation merging
//! - `upsert`: insert-or-update by natural key over a record store
//! - `rollover`: drafting next year's officer roster and recurring tasks
//! - `notify`: one-time notification recipient fan-out
//!
//! Persistence is behind the `store::RecordStore` trait; authentication is an
//! opaque member identity plus the `auth::OfficerPermission` capability check.

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod fiscal;
pub mod grade;
pub mod models;
pub mod notify;
pub mod rollover;
pub mod roster;
pub mod store;
pub mod upsert;
pub mod utils;

pub use config::{Config, OrganizationCalendarConfig};
pub use context::RequestContext;
pub use error::{EngineError, EngineResult};
pub use fiscal::FiscalYear;
