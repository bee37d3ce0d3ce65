//! Helpers shared by the integration test binaries.

#[path = "../../src/test_support/socket_guard.rs"]
pub mod socket_guard;
