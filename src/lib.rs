//! Automated OpenAPI client regeneration runner.
//!
//! Clones the client library repository, fetches the vendor's current
//! OpenAPI document, prunes the generated source tree, regenerates the
//! client, repairs its imports, and publishes the result only when the
//! release build succeeds.

pub mod config;
pub mod contract;
pub mod dotnet;
pub mod download;
pub mod fixer;
pub mod git;
pub mod pipeline;
pub mod process;
pub mod prune;
pub mod usings;
