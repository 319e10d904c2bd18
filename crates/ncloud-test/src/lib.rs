//! Test infrastructure for the NCloud resource crates
//!
//! Provides:
//! - In-memory gateways with scripted eventual consistency
//! - Session and raw record fixtures
//! - Canonical record verification helpers
//! - Tracing setup for tests

pub mod fixtures;
pub mod gateways;
pub mod logging;
mod verification;

pub use fixtures::*;
pub use gateways::{
    CallCounts, ClassicPublicIpGateway, InMemoryPublicIpGateway, InMemoryRepositoryGateway,
    PublicIpRecord, VpcPublicIpGateway,
};
pub use logging::init_test_logging;
pub use verification::*;
