//! Typed parameters for each template family

use micro_cli_common::case::{to_pascal_case, without_hyphens};
use micro_cli_common::{Config, RpcKind};
use serde::Serialize;

/// Default gRPC port exposed by the generated chart
pub const DEFAULT_SERVICE_PORT: u16 = 9000;

/// Parameters of the project skeleton templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectParams {
    /// Name given on the command line (`user-info`)
    pub base_service_name: String,
    /// Project directory name (`user-info-service`)
    pub service_name: String,
    /// Go package of the client library (`userinfo`)
    pub package_name: String,
    /// Go type prefix of the generated gRPC service (`UserInfo`)
    pub service_hump: String,
    pub description: String,
    pub root_path: String,
    pub client_root_path: String,
}

impl ProjectParams {
    pub fn new(service: &str, description: &str, config: &Config) -> Self {
        Self {
            base_service_name: service.to_string(),
            service_name: format!("{service}-service"),
            package_name: without_hyphens(service),
            service_hump: to_pascal_case(&service.replace('-', "_")),
            description: single_line(description),
            root_path: config.root_path.clone(),
            client_root_path: config.client_root_path.clone(),
        }
    }
}

/// Parameters of the RPC stub and proto fragment templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcParams {
    /// Pascal-case RPC name
    pub rpc_name: String,
    /// Go type implementing the RPC (`Admin` or `Foreground`)
    pub rpc_type: String,
    /// Go package of the generated bindings (`userpb`)
    pub proto_package: String,
    pub comment: String,
}

impl RpcParams {
    pub fn new(service: &str, rpc: &str, kind: RpcKind, comment: &str) -> Self {
        Self {
            rpc_name: to_pascal_case(rpc),
            rpc_type: kind.type_name().to_string(),
            proto_package: format!("{}pb", without_hyphens(service)),
            comment: single_line(comment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelmParams {
    pub chart_name: String,
    pub description: String,
    pub image: String,
    pub port: u16,
    pub package_name: String,
    pub rpcs: Vec<String>,
}

impl HelmParams {
    pub fn new(service: &str, description: &str, rpcs: Vec<String>, config: &Config) -> Self {
        let chart_name = format!("{service}-service");
        Self {
            image: format!("{}/{}", config.root_path, chart_name),
            chart_name,
            description: single_line(description),
            port: DEFAULT_SERVICE_PORT,
            package_name: without_hyphens(service),
            rpcs,
        }
    }
}

/// Collapse a free-text value onto one line so it stays inside a `//` comment
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("/go", "github.com/acme/", "github.com/acme/clients")
    }

    #[test]
    fn test_project_params_naming() {
        let params = ProjectParams::new("user-info", "user\nprofiles", &config());
        assert_eq!(params.service_name, "user-info-service");
        assert_eq!(params.package_name, "userinfo");
        assert_eq!(params.service_hump, "UserInfo");
        assert_eq!(params.description, "user profiles");
        assert_eq!(params.root_path, "github.com/acme");
    }

    #[test]
    fn test_rpc_params() {
        let params = RpcParams::new("user-info", "get_user", RpcKind::Admin, "  fetch\tone ");
        assert_eq!(params.rpc_name, "GetUser");
        assert_eq!(params.rpc_type, "Admin");
        assert_eq!(params.proto_package, "userinfopb");
        assert_eq!(params.comment, "fetch one");
    }

    #[test]
    fn test_helm_params() {
        let params = HelmParams::new("user", "", vec!["Ping".into()], &config());
        assert_eq!(params.chart_name, "user-service");
        assert_eq!(params.image, "github.com/acme/user-service");
        assert_eq!(params.port, DEFAULT_SERVICE_PORT);
    }
}
