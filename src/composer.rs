// Estimate composer: aggregation, assumptions, identity, reproducibility

use crate::errors::{EstimateError, Result};
use crate::mode::EvaluationMode;
use crate::model::estimate::SKU_NOT_FOUND;
use crate::model::{Assumption, Confidence, CostItem, Estimate, Resource};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

const CURRENCY: &str = "USD";

/// Content hash over the normalized resource list and the evaluation mode.
/// Two inputs with equal fingerprints estimate identically under the same
/// catalog version.
pub fn input_fingerprint(resources: &[Resource], mode: EvaluationMode) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mode.to_string().as_bytes());
    for resource in resources {
        hasher.update(b"\x1e");
        hasher.update(resource.address.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(resource.resource_type.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(resource.region.as_deref().unwrap_or("").as_bytes());
        for (key, value) in &resource.attributes {
            hasher.update(b"\x1f");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.canonical().as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// The estimate id is derived from the fingerprint so that re-running the
/// same input reproduces the output byte-exactly.
fn derive_id(fingerprint: &str) -> Uuid {
    let digest = Sha256::digest(format!("{fingerprint}:estimate-id").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Aggregate priced items into the final estimate.
///
/// `assumptions` carries the adapter-level entries (per-vector assumption
/// strings and unsupported-resource notes); mocker annotations and
/// NOT_FOUND items are folded in here. `used_versions` are the catalog
/// fingerprints observed by the matcher; more than one is a coherence bug.
pub fn compose(
    resources: Vec<Resource>,
    mut cost_items: Vec<CostItem>,
    assumptions: Vec<Assumption>,
    mode: EvaluationMode,
    used_versions: &BTreeSet<String>,
) -> Result<Estimate> {
    if used_versions.len() > 1 {
        return Err(EstimateError::infrastructure(
            "compose",
            format!(
                "cost items span {} catalog versions ({}); a single estimation must read one snapshot",
                used_versions.len(),
                used_versions.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
        ));
    }
    let catalog_version = used_versions.iter().next().cloned().unwrap_or_default();

    cost_items.sort_by(|a, b| {
        (&a.resource_address, &a.service, &a.usage_type)
            .cmp(&(&b.resource_address, &b.service, &b.usage_type))
    });

    let mut service_breakdown: BTreeMap<String, f64> = BTreeMap::new();
    for item in &cost_items {
        *service_breakdown.entry(item.service.clone()).or_insert(0.0) += item.total;
    }
    let total_cost: f64 = service_breakdown.values().sum();

    let confidence = cost_items
        .iter()
        .map(|item| item.confidence)
        .min()
        .unwrap_or(Confidence::High);

    let mut collected: BTreeSet<Assumption> = assumptions.into_iter().collect();
    for resource in &resources {
        for annotation in &resource.annotations {
            collected.insert(Assumption::new(
                &resource.address,
                &annotation.field,
                format!("{} = {} ({})", annotation.field, annotation.value, annotation.reason),
            ));
        }
    }
    for item in &cost_items {
        if item.sku == SKU_NOT_FOUND {
            collected.insert(Assumption::new(
                &item.resource_address,
                &item.usage_type,
                format!(
                    "no pricing match found for {} {} in {}; estimated at zero",
                    item.service, item.usage_type, item.region
                ),
            ));
        }
    }

    let input_fingerprint = input_fingerprint(&resources, mode);
    let id = derive_id(&input_fingerprint);

    Ok(Estimate {
        id,
        input_fingerprint,
        catalog_version,
        total_cost,
        currency: CURRENCY.to_string(),
        service_breakdown,
        resources,
        cost_items,
        assumptions: collected.into_iter().collect(),
        confidence,
        evaluation_mode: mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrValue, MatchType, MockAnnotation};
    use pretty_assertions::assert_eq;

    fn item(address: &str, service: &str, usage_type: &str, total: f64) -> CostItem {
        CostItem {
            resource_address: address.into(),
            service: service.into(),
            region: "us-east-1".into(),
            usage_type: usage_type.into(),
            quantity: 1.0,
            unit: "Hrs".into(),
            price_per_unit: total,
            total,
            sku: "SKU".into(),
            confidence: Confidence::High,
            match_type: MatchType::Exact,
            formula: String::new(),
        }
    }

    fn web() -> Resource {
        Resource::new("aws_instance.web", "aws_instance")
            .with_region("us-east-1")
            .with_attr("instance_type", AttrValue::Str("t3.micro".into()))
    }

    #[test]
    fn accounting_identity_holds() {
        let items = vec![
            item("aws_instance.web", "AmazonEC2", "BoxUsage:t3.micro", 7.592),
            item("aws_instance.web", "AmazonEC2", "EBS:VolumeUsage.gp3", 0.64),
            item("aws_db_instance.main", "AmazonRDS", "InstanceUsage:db.t3.micro", 12.41),
        ];
        let estimate = compose(
            vec![web()],
            items,
            Vec::new(),
            EvaluationMode::Conservative,
            &BTreeSet::from(["v1".to_string()]),
        )
        .unwrap();

        let item_sum: f64 = estimate.cost_items.iter().map(|i| i.total).sum();
        let breakdown_sum: f64 = estimate.service_breakdown.values().sum();
        assert!((item_sum - breakdown_sum).abs() < 1e-9);
        assert_eq!(breakdown_sum, estimate.total_cost);
    }

    #[test]
    fn confidence_is_the_minimum_over_items() {
        let mut low = item("aws_instance.web", "AmazonEC2", "DataTransfer-Out-Bytes", 9.0);
        low.confidence = Confidence::Low;
        let estimate = compose(
            vec![web()],
            vec![item("aws_instance.web", "AmazonEC2", "BoxUsage:t3.micro", 7.592), low],
            Vec::new(),
            EvaluationMode::Conservative,
            &BTreeSet::from(["v1".to_string()]),
        )
        .unwrap();
        assert_eq!(estimate.confidence, Confidence::Low);
    }

    #[test]
    fn items_and_assumptions_are_ordered() {
        let items = vec![
            item("b.two", "AmazonRDS", "InstanceUsage:db.t3.micro", 1.0),
            item("a.one", "AmazonEC2", "BoxUsage:t3.micro", 1.0),
        ];
        let assumptions = vec![
            Assumption::new("b.two", "z", "later"),
            Assumption::new("a.one", "a", "earlier"),
        ];
        let estimate = compose(
            Vec::new(),
            items,
            assumptions,
            EvaluationMode::Conservative,
            &BTreeSet::from(["v1".to_string()]),
        )
        .unwrap();
        assert_eq!(estimate.cost_items[0].resource_address, "a.one");
        assert_eq!(estimate.assumptions[0].resource_address, "a.one");
    }

    #[test]
    fn mocker_annotations_become_assumptions() {
        let mut resource = web();
        resource.annotations.push(MockAnnotation {
            field: "ami".into(),
            value: "ami-mock00000001".into(),
            reason: "unresolved data source reference replaced with synthetic id".into(),
            confidence: Confidence::Medium,
        });
        let estimate = compose(
            vec![resource],
            Vec::new(),
            Vec::new(),
            EvaluationMode::Conservative,
            &BTreeSet::new(),
        )
        .unwrap();
        assert_eq!(estimate.assumptions.len(), 1);
        assert_eq!(estimate.assumptions[0].field, "ami");
    }

    #[test]
    fn not_found_items_surface_in_assumptions() {
        let mut missing = item("aws_s3_bucket.logs", "AmazonS3", "TimedStorage-ByteHrs", 0.0);
        missing.sku = SKU_NOT_FOUND.into();
        let estimate = compose(
            Vec::new(),
            vec![missing],
            Vec::new(),
            EvaluationMode::Conservative,
            &BTreeSet::new(),
        )
        .unwrap();
        assert!(estimate.assumptions[0].message.contains("no pricing match"));
    }

    #[test]
    fn mixed_catalog_versions_are_rejected() {
        let err = compose(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            EvaluationMode::Conservative,
            &BTreeSet::from(["v1".to_string(), "v2".to_string()]),
        )
        .unwrap_err();
        assert_eq!(err.code(), "E_INFRASTRUCTURE");
    }

    #[test]
    fn fingerprint_and_id_are_deterministic() {
        let resources = vec![web()];
        let a = input_fingerprint(&resources, EvaluationMode::Conservative);
        let b = input_fingerprint(&resources, EvaluationMode::Conservative);
        assert_eq!(a, b);
        assert_ne!(a, input_fingerprint(&resources, EvaluationMode::Optimistic));
        assert_eq!(derive_id(&a), derive_id(&b));
    }

    #[test]
    fn empty_estimate_has_high_confidence_and_zero_total() {
        let estimate = compose(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            EvaluationMode::Conservative,
            &BTreeSet::new(),
        )
        .unwrap();
        assert_eq!(estimate.total_cost, 0.0);
        assert_eq!(estimate.confidence, Confidence::High);
        assert_eq!(estimate.catalog_version, "");
    }
}
