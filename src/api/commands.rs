//! Command modules for explicit user actions
//!
//! Unlike the automatic selection path, these surface every failure to the
//! caller as a `CommandError`.
//!
//! - `translate`: manual (typed) translation
//! - `history`: view, edit, delete and clear translation history
//! - `monitor`: auto-translate on/off

pub mod history;
pub mod monitor;
pub mod translate;
