//! Helpdesk MCP: in-process capability providers
//!
//! Serves the COMMON and ATLAS providers from a canned response table so the
//! workflow can run without remote services. Tests use the builder methods
//! to pin the score or knock out abilities.
pub mod oracle;
pub mod registry;
pub mod scenarios;

pub use oracle::ScoreOracle;
pub use registry::{ProviderRegistry, SCORING_ABILITY};
pub use scenarios::{sample_scenarios, Scenario};
