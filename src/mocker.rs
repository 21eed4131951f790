// Mocker: annotate missing or unresolved inputs with explained defaults

use crate::model::{AttrValue, Confidence, MockAnnotation, Resource};
use std::collections::BTreeMap;
use tracing::debug;

/// Fill unresolved references and missing required attributes with
/// annotated defaults.
///
/// Rules are keyed by resource type and only ever ADD attributes or
/// materialize sentinel placeholders; user-supplied values are never
/// overwritten. Each materialized default appends a `MockAnnotation`.
/// Running the mocker over an already-mocked list is a no-op. Regions are
/// the loader's contract and are never touched here.
pub fn mock_resources(mut resources: Vec<Resource>) -> Vec<Resource> {
    for resource in &mut resources {
        let before = resource.annotations.len();
        apply_type_rule(resource);
        materialize_sentinels(resource);
        if resource.annotations.len() > before {
            resource.mocked = true;
            debug!(
                address = %resource.address,
                defaults = resource.annotations.len() - before,
                "materialized mock defaults"
            );
        }
    }
    resources
}

fn apply_type_rule(resource: &mut Resource) {
    match resource.resource_type.as_str() {
        "aws_instance" => mock_instance(resource),
        "aws_db_instance" => mock_db_instance(resource),
        "aws_lambda_function" => mock_lambda(resource),
        _ => {}
    }
}

fn mock_instance(resource: &mut Resource) {
    // Missing and unresolved get the same synthetic default but distinct
    // reasons, so the assumption list states the actual cause.
    match resource.attr("ami") {
        None => add_default(
            resource,
            "ami",
            AttrValue::Str("ami-mock00000001".into()),
            "ami not specified; replaced with synthetic id",
            Confidence::Medium,
        ),
        Some(ami) if ami.is_unresolved() => add_default(
            resource,
            "ami",
            AttrValue::Str("ami-mock00000001".into()),
            "unresolved data source reference replaced with synthetic id",
            Confidence::Medium,
        ),
        Some(_) => {}
    }

    if resource.attr("root_block_device").is_none() {
        let mut device = BTreeMap::new();
        device.insert("volume_size".to_string(), AttrValue::Num(8.0));
        device.insert("volume_type".to_string(), AttrValue::Str("gp3".into()));
        add_default(
            resource,
            "root_block_device",
            AttrValue::Map(device),
            "AWS-documented default root volume (8 GB gp3)",
            Confidence::High,
        );
    }
}

fn mock_db_instance(resource: &mut Resource) {
    if resource.attr("allocated_storage").is_none() {
        add_default(
            resource,
            "allocated_storage",
            AttrValue::Num(20.0),
            "AWS-documented RDS minimum storage (20 GB)",
            Confidence::High,
        );
    }
    if resource.attr("engine").is_none() {
        add_default(
            resource,
            "engine",
            AttrValue::Str("postgres".into()),
            "common-case database engine",
            Confidence::Medium,
        );
    }
    if resource.attr("multi_az").is_none() {
        add_default(
            resource,
            "multi_az",
            AttrValue::Bool(false),
            "common-case single-AZ deployment",
            Confidence::Medium,
        );
    }
}

fn mock_lambda(resource: &mut Resource) {
    if resource.attr("memory_size").is_none() {
        add_default(
            resource,
            "memory_size",
            AttrValue::Num(128.0),
            "AWS-documented default Lambda memory (128 MB)",
            Confidence::High,
        );
    }
    if resource.attr("timeout").is_none() {
        add_default(
            resource,
            "timeout",
            AttrValue::Num(3.0),
            "AWS-documented default Lambda timeout (3 s)",
            Confidence::High,
        );
    }
}

/// Replace every remaining `${...}` sentinel with a synthetic placeholder
/// so adapters never observe unresolved expressions.
fn materialize_sentinels(resource: &mut Resource) {
    let mut paths = Vec::new();
    for (field, value) in &resource.attributes {
        collect_sentinels(field, value, &mut paths);
    }
    for path in &paths {
        let synthetic = format!("mock-{}", path.rsplit('.').next().unwrap_or(path));
        set_path(&mut resource.attributes, path, AttrValue::Str(synthetic.clone()));
        resource.annotations.push(MockAnnotation {
            field: path.clone(),
            value: synthetic,
            reason: "unresolved reference replaced with synthetic value".into(),
            confidence: Confidence::Medium,
        });
    }
}

fn collect_sentinels(path: &str, value: &AttrValue, out: &mut Vec<String>) {
    match value {
        AttrValue::Unresolved(_) => out.push(path.to_string()),
        AttrValue::Map(map) => {
            for (key, nested) in map {
                collect_sentinels(&format!("{path}.{key}"), nested, out);
            }
        }
        AttrValue::List(items) => {
            for (index, nested) in items.iter().enumerate() {
                collect_sentinels(&format!("{path}.{index}"), nested, out);
            }
        }
        _ => {}
    }
}

fn set_path(attributes: &mut BTreeMap<String, AttrValue>, path: &str, replacement: AttrValue) {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return;
    };
    let Some(mut current) = attributes.get_mut(first) else {
        return;
    };
    for segment in segments {
        let next = match current {
            AttrValue::Map(map) => map.get_mut(segment),
            AttrValue::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return,
        }
    }
    *current = replacement;
}

fn add_default(
    resource: &mut Resource,
    field: &str,
    value: AttrValue,
    reason: &str,
    confidence: Confidence,
) {
    let rendered = match &value {
        AttrValue::Str(s) => s.clone(),
        AttrValue::Num(n) => n.to_string(),
        AttrValue::Bool(b) => b.to_string(),
        other => other.canonical(),
    };
    resource.attributes.insert(field.to_string(), value);
    resource.annotations.push(MockAnnotation {
        field: field.to_string(),
        value: rendered,
        reason: reason.to_string(),
        confidence,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bare_instance() -> Resource {
        Resource::new("aws_instance.web", "aws_instance")
            .with_region("us-east-1")
            .with_attr("instance_type", AttrValue::Str("t3.micro".into()))
            .with_attr("ami", AttrValue::unresolved("data.aws_ami.ubuntu.id"))
    }

    #[test]
    fn materializes_unresolved_ami_with_annotation() {
        let mocked = mock_resources(vec![bare_instance()]);
        let web = &mocked[0];
        assert!(web.mocked);
        assert_eq!(web.str_attr("ami"), Some("ami-mock00000001"));
        let annotation = web.annotations.iter().find(|a| a.field == "ami").unwrap();
        assert_eq!(annotation.confidence, Confidence::Medium);
    }

    #[test]
    fn adds_documented_root_volume_default_as_high() {
        let mocked = mock_resources(vec![bare_instance()]);
        let root = mocked[0].attr("root_block_device").unwrap();
        assert_eq!(root.get("volume_size").and_then(|v| v.as_f64()), Some(8.0));
        assert_eq!(root.get("volume_type").and_then(|v| v.as_str()), Some("gp3"));
        let annotation = mocked[0]
            .annotations
            .iter()
            .find(|a| a.field == "root_block_device")
            .unwrap();
        assert_eq!(annotation.confidence, Confidence::High);
    }

    #[test]
    fn missing_ami_reason_differs_from_unresolved() {
        let without_ami = Resource::new("aws_instance.web", "aws_instance")
            .with_region("us-east-1")
            .with_attr("instance_type", AttrValue::Str("t3.micro".into()));
        let mocked = mock_resources(vec![without_ami]);
        let annotation = mocked[0].annotations.iter().find(|a| a.field == "ami").unwrap();
        assert_eq!(annotation.reason, "ami not specified; replaced with synthetic id");

        let unresolved = mock_resources(vec![bare_instance()]);
        let annotation = unresolved[0]
            .annotations
            .iter()
            .find(|a| a.field == "ami")
            .unwrap();
        assert_eq!(
            annotation.reason,
            "unresolved data source reference replaced with synthetic id"
        );
    }

    #[test]
    fn interpolation_shaped_literals_are_not_overwritten() {
        let resource = bare_instance().with_attr(
            "user_policy",
            AttrValue::Str("${aws:username}".into()),
        );
        let mocked = mock_resources(vec![resource]);
        assert_eq!(mocked[0].str_attr("user_policy"), Some("${aws:username}"));
        assert!(!mocked[0].annotations.iter().any(|a| a.field == "user_policy"));
    }

    #[test]
    fn never_overwrites_user_values() {
        let resource = bare_instance().with_attr("ami", AttrValue::Str("ami-user".into()));
        let mocked = mock_resources(vec![resource]);
        assert_eq!(mocked[0].str_attr("ami"), Some("ami-user"));
        assert!(!mocked[0].annotations.iter().any(|a| a.field == "ami"));
    }

    #[test]
    fn rds_minimum_storage_is_high_confidence() {
        let resource = Resource::new("aws_db_instance.db", "aws_db_instance")
            .with_region("us-east-1")
            .with_attr("instance_class", AttrValue::Str("db.t3.micro".into()));
        let mocked = mock_resources(vec![resource]);
        assert_eq!(mocked[0].num_attr("allocated_storage"), Some(20.0));
        let annotation = mocked[0]
            .annotations
            .iter()
            .find(|a| a.field == "allocated_storage")
            .unwrap();
        assert_eq!(annotation.confidence, Confidence::High);
    }

    #[test]
    fn mocking_twice_is_a_no_op() {
        let once = mock_resources(vec![bare_instance()]);
        let twice = mock_resources(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn region_is_never_mocked() {
        let resource = Resource::new("aws_instance.web", "aws_instance")
            .with_attr("instance_type", AttrValue::Str("t3.micro".into()));
        let mocked = mock_resources(vec![resource]);
        assert_eq!(mocked[0].region, None);
    }

    #[test]
    fn nested_sentinels_are_materialized() {
        let mut device = BTreeMap::new();
        device.insert(
            "volume_size".to_string(),
            AttrValue::unresolved("var.volume_size"),
        );
        let resource = bare_instance().with_attr("root_block_device", AttrValue::Map(device));
        let mocked = mock_resources(vec![resource]);
        let root = mocked[0].attr("root_block_device").unwrap();
        assert!(!root.get("volume_size").unwrap().is_unresolved());
        assert!(mocked[0]
            .annotations
            .iter()
            .any(|a| a.field == "root_block_device.volume_size"));
    }
}
