// Terraform plan JSON path

use crate::errors::{EstimateError, Result};
use crate::model::{AttrValue, Resource};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Plan document as produced by `terraform show -json plan.out`, reduced to
/// the parts the estimator reads.
#[derive(Debug, Deserialize)]
struct PlanDocument {
    format_version: String,
    planned_values: PlannedValues,
    #[serde(default)]
    configuration: Option<Configuration>,
}

#[derive(Debug, Deserialize)]
struct PlannedValues {
    root_module: PlanModule,
}

#[derive(Debug, Default, Deserialize)]
struct PlanModule {
    #[serde(default)]
    resources: Vec<PlanResource>,
    #[serde(default)]
    child_modules: Vec<PlanModule>,
}

#[derive(Debug, Deserialize)]
struct PlanResource {
    /// Fully-qualified, module-prefixed address.
    address: String,
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    provider_name: Option<String>,
    #[serde(default)]
    values: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct Configuration {
    #[serde(default)]
    provider_config: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderConfig {
    #[serde(default)]
    expressions: serde_json::Value,
}

pub fn load_plan_file(path: &Path, default_region: Option<&str>) -> Result<Vec<Resource>> {
    let content = fs::read_to_string(path).map_err(|e| {
        EstimateError::input_invalid(format!("cannot read plan file {}: {e}", path.display()))
    })?;
    load_plan_str(&content, default_region)
}

/// Parse a plan JSON and walk `planned_values.root_module` recursively.
pub fn load_plan_str(content: &str, default_region: Option<&str>) -> Result<Vec<Resource>> {
    let plan: PlanDocument = serde_json::from_str(content)
        .map_err(|e| EstimateError::input_invalid(format!("malformed plan JSON: {e}")))?;

    check_format_version(&plan.format_version)?;

    let provider_regions = plan
        .configuration
        .as_ref()
        .map(provider_regions)
        .unwrap_or_default();

    let mut resources = Vec::new();
    collect_module(
        &plan.planned_values.root_module,
        &provider_regions,
        default_region,
        &mut resources,
    );
    super::finalize(resources)
}

/// Accepts the plan formats Terraform has shipped (0.x and 1.x); anything
/// else is fatal, never skipped.
fn check_format_version(version: &str) -> Result<()> {
    let major = version.split('.').next().unwrap_or("");
    match major {
        "0" | "1" => Ok(()),
        _ => Err(EstimateError::input_invalid(format!(
            "unsupported plan format_version '{version}'"
        ))),
    }
}

fn provider_regions(configuration: &Configuration) -> HashMap<String, String> {
    let mut regions = HashMap::new();
    for (name, config) in &configuration.provider_config {
        if let Some(region) = config
            .expressions
            .get("region")
            .and_then(|r| r.get("constant_value"))
            .and_then(|v| v.as_str())
        {
            regions.insert(name.clone(), region.to_string());
        }
    }
    regions
}

fn collect_module(
    module: &PlanModule,
    provider_regions: &HashMap<String, String>,
    default_region: Option<&str>,
    out: &mut Vec<Resource>,
) {
    for planned in &module.resources {
        out.push(to_resource(planned, provider_regions, default_region));
    }
    for child in &module.child_modules {
        collect_module(child, provider_regions, default_region, out);
    }
}

fn to_resource(
    planned: &PlanResource,
    provider_regions: &HashMap<String, String>,
    default_region: Option<&str>,
) -> Resource {
    let mut resource = Resource::new(&planned.address, &planned.resource_type);

    if let Some(values) = planned.values.as_object() {
        for (key, value) in values {
            if let Some(attr) = AttrValue::from_json(value) {
                resource.attributes.insert(key.clone(), attr);
            }
        }
    }

    // Region precedence: explicit attribute, provider configuration,
    // caller-supplied fallback. Unresolvable regions stay None for the
    // mocker/adapter contract to reject.
    resource.region = resource
        .str_attr("region")
        .map(str::to_string)
        .or_else(|| {
            provider_key(planned.provider_name.as_deref())
                .and_then(|key| provider_regions.get(key))
                .cloned()
        })
        .or_else(|| default_region.map(str::to_string));

    resource
}

/// `registry.terraform.io/hashicorp/aws` configures provider key `aws`.
fn provider_key(provider_name: Option<&str>) -> Option<&str> {
    provider_name.map(|name| name.rsplit('/').next().unwrap_or(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PLAN: &str = r#"{
        "format_version": "1.2",
        "terraform_version": "1.5.0",
        "planned_values": {
            "root_module": {
                "resources": [
                    {
                        "address": "aws_instance.web",
                        "mode": "managed",
                        "type": "aws_instance",
                        "name": "web",
                        "provider_name": "registry.terraform.io/hashicorp/aws",
                        "values": {
                            "instance_type": "t3.micro",
                            "ami": "ami-0abcdef1234567890",
                            "tags": {"Name": "web"}
                        }
                    }
                ],
                "child_modules": [
                    {
                        "address": "module.storage",
                        "resources": [
                            {
                                "address": "module.storage.aws_s3_bucket.logs",
                                "mode": "managed",
                                "type": "aws_s3_bucket",
                                "name": "logs",
                                "provider_name": "registry.terraform.io/hashicorp/aws",
                                "values": {"bucket": "logs"}
                            }
                        ]
                    }
                ]
            }
        },
        "configuration": {
            "provider_config": {
                "aws": {
                    "name": "aws",
                    "expressions": {"region": {"constant_value": "us-east-1"}}
                }
            }
        }
    }"#;

    #[test]
    fn walks_child_modules_with_prefixed_addresses() {
        let resources = load_plan_str(PLAN, None).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].address, "aws_instance.web");
        assert_eq!(resources[1].address, "module.storage.aws_s3_bucket.logs");
        assert_eq!(resources[1].resource_type, "aws_s3_bucket");
    }

    #[test]
    fn resolves_region_from_provider_config() {
        let resources = load_plan_str(PLAN, None).unwrap();
        assert_eq!(resources[0].region.as_deref(), Some("us-east-1"));
        assert_eq!(
            resources[0].str_attr("instance_type"),
            Some("t3.micro")
        );
    }

    #[test]
    fn falls_back_to_caller_region() {
        let plan = r#"{
            "format_version": "1.0",
            "planned_values": {"root_module": {"resources": [
                {"address": "aws_instance.a", "type": "aws_instance", "name": "a", "values": {}}
            ]}}
        }"#;
        let resources = load_plan_str(plan, Some("eu-west-1")).unwrap();
        assert_eq!(resources[0].region.as_deref(), Some("eu-west-1"));

        let without = load_plan_str(plan, None).unwrap();
        assert_eq!(without[0].region, None);
    }

    #[test]
    fn explicit_region_attribute_wins() {
        let plan = r#"{
            "format_version": "1.0",
            "planned_values": {"root_module": {"resources": [
                {"address": "aws_instance.a", "type": "aws_instance", "name": "a",
                 "provider_name": "registry.terraform.io/hashicorp/aws",
                 "values": {"region": "ap-southeast-2"}}
            ]}},
            "configuration": {"provider_config": {"aws": {"expressions": {"region": {"constant_value": "us-east-1"}}}}}
        }"#;
        let resources = load_plan_str(plan, None).unwrap();
        assert_eq!(resources[0].region.as_deref(), Some("ap-southeast-2"));
    }

    #[test]
    fn unknown_format_version_is_fatal() {
        let plan = r#"{"format_version": "9.0", "planned_values": {"root_module": {}}}"#;
        let err = load_plan_str(plan, None).unwrap_err();
        assert_eq!(err.code(), "E_INPUT_INVALID");
    }

    #[test]
    fn malformed_json_is_fatal() {
        let err = load_plan_str("{not json", None).unwrap_err();
        assert_eq!(err.code(), "E_INPUT_INVALID");
    }
}
