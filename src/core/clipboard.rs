//! Selection capture
//!
//! - `source`: the polled selection/clipboard collaborator
//! - `monitor`: background task that samples the source and forwards changes
//! - `filter`: cheap per-tick eligibility predicate
//! - `guard`: cooldown cache plus history lookups that stop repeat translations

pub mod filter;
pub mod guard;
pub mod monitor;
pub mod source;

pub use filter::{FilterContext, Rejection, SelectionFilter};
pub use guard::DuplicateGuard;
pub use monitor::SelectionMonitor;
pub use source::{SelectionSource, SystemClipboard};
