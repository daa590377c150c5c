//! Token payloads returned by acquisition attempts.

pub mod result;
pub mod secret;
