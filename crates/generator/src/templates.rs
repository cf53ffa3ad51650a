//! Template loading and management

use micro_cli_common::case::{to_camel_case, to_pascal_case};
use micro_cli_common::{MicroError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

pub(crate) const RPC_STUB: &str = "rpc/stub.go";
pub(crate) const RPC_MESSAGES: &str = "rpc/messages.proto";
pub(crate) const RPC_LINE: &str = "rpc/rpc.proto";
pub(crate) const HELM_CHART: &str = "helm/Chart.yaml";
pub(crate) const HELM_VALUES: &str = "helm/values.yaml";
pub(crate) const CLIENT_ROOT_README: &str = "client/README.md";

/// Every embedded template, keyed by the name it is rendered under
const TEMPLATES: &[(&str, &str)] = &[
    (RPC_STUB, include_str!("../templates/rpc/stub.go.tera")),
    (RPC_MESSAGES, include_str!("../templates/rpc/messages.proto.tera")),
    (RPC_LINE, include_str!("../templates/rpc/rpc.proto.tera")),
    (
        "microservice/main.go",
        include_str!("../templates/microservice/main.go.tera"),
    ),
    (
        "microservice/program/program.go",
        include_str!("../templates/microservice/program/program.go.tera"),
    ),
    (
        "microservice/program/services/base.go",
        include_str!("../templates/microservice/program/services/base.go.tera"),
    ),
    (
        "microservice/program/services/foreground.go",
        include_str!("../templates/microservice/program/services/foreground.go.tera"),
    ),
    (
        "microservice/program/services/admin.go",
        include_str!("../templates/microservice/program/services/admin.go.tera"),
    ),
    (
        "microservice/test/main_test.go",
        include_str!("../templates/microservice/test/main_test.go.tera"),
    ),
    (
        "microservice/README.md",
        include_str!("../templates/microservice/README.md.tera"),
    ),
    ("microservice/env", include_str!("../templates/microservice/env.tera")),
    (CLIENT_ROOT_README, include_str!("../templates/client/README.md.tera")),
    (
        "client/client/foreground.go",
        include_str!("../templates/client/client/foreground.go.tera"),
    ),
    (
        "client/client/admin.go",
        include_str!("../templates/client/client/admin.go.tera"),
    ),
    (
        "client/client/README.md",
        include_str!("../templates/client/client/README.md.tera"),
    ),
    (
        "client/proto/foreground.proto",
        include_str!("../templates/client/proto/foreground.proto.tera"),
    ),
    (
        "client/proto/admin.proto",
        include_str!("../templates/client/proto/admin.proto.tera"),
    ),
    (
        "client/proto/gen.sh",
        include_str!("../templates/client/proto/gen.sh.tera"),
    ),
    (
        "client/proto/README.md",
        include_str!("../templates/client/proto/README.md.tera"),
    ),
    (HELM_CHART, include_str!("../templates/helm/Chart.yaml.tera")),
    (HELM_VALUES, include_str!("../templates/helm/values.yaml.tera")),
];

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();
    // Generated Go, proto and YAML must not be HTML-escaped
    tera.autoescape_on(vec![]);

    tera.register_filter("pascal_case", pascal_case_filter);
    tera.register_filter("camel_case", camel_case_filter);

    for (name, body) in TEMPLATES {
        tera.add_raw_template(name, body).map_err(|e| {
            MicroError::Template(format!("Failed to load {} template: {}", name, e))
        })?;
    }

    Ok(tera)
}

/// Filter converting `snake_case` to `PascalCase`
fn pascal_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("pascal_case filter expects a string"))?;
    Ok(Value::String(to_pascal_case(s)))
}

/// Filter converting `snake_case` to `camelCase`
fn camel_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("camel_case filter expects a string"))?;
    Ok(Value::String(to_camel_case(s)))
}
