//! Process utilities.

pub mod bootstrap;
pub mod retry;
