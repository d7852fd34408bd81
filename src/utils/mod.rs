//! Process-wide helpers shared by the service and the binaries.

pub mod bootstrap;
pub mod retry;
