//! Code generation for micro-cli
//!
//! This crate turns the schema and project configuration into files:
//! - new microservice projects and their client library entries
//! - RPC stubs and proto fragments inserted into existing services
//! - Helm charts for deployed services
//!
//! All text comes from tera templates embedded in the binary.

mod addrpc;
mod helm;
mod insert;
mod params;
mod scaffold;
mod templates;

pub use addrpc::{AddRpcRequest, CodeGenerator, RpcAdder, ShellCodeGenerator};
pub use helm::HelmGenerator;
pub use insert::{append_block, splice_block, Placement, TemplateRenderer};
pub use params::{HelmParams, ProjectParams, RpcParams, DEFAULT_SERVICE_PORT};
pub use scaffold::ProjectScaffolder;
