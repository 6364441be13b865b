//! External feature collaborators.

pub mod translator;
