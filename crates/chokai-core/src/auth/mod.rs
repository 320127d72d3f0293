//! Request identity collaborators.
//!
//! This module provides:
//! - `Session`: session-scoped preferences, chiefly the fiscal-year override
//! - `OfficerPermission`: the capability check guarding mutation entry points
//!
//! Authentication itself happens outside the engine; callers hand in an
//! opaque `MemberId` for the current user.

pub mod permission;
pub mod session;

pub use permission::{require_officer, AllowAll, OfficerPermission, OfficerRoster};
pub use session::{parse_override, Session, SessionPreferences, FISCAL_YEAR_PREFERENCE};
