pub mod clipboard;
pub mod coordinator;
pub mod features;
pub mod history;
