// Estimate diff: compare two finished estimates

use crate::model::Estimate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Difference between a baseline and a proposed estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateDiff {
    pub before_total: f64,
    pub after_total: f64,
    pub delta: f64,
    /// Percentage change against the baseline; zero when the baseline is
    /// zero.
    pub percent: f64,
    pub resource_changes: Vec<ResourceDelta>,
    pub service_changes: Vec<ServiceDelta>,
}

/// Per-address cost movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDelta {
    pub address: String,
    pub change_type: ChangeType,
    pub cost_before: f64,
    pub cost_after: f64,
    pub delta: f64,
}

/// Per-service cost movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDelta {
    pub service: String,
    pub cost_before: f64,
    pub cost_after: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Increased,
    Decreased,
    Unchanged,
}

/// Compare two estimates. Pure over the inputs; ordering follows the
/// estimates' own address and service ordering.
pub fn diff_estimates(before: &Estimate, after: &Estimate) -> EstimateDiff {
    let before_total = before.total_cost;
    let after_total = after.total_cost;
    let delta = after_total - before_total;
    let percent = if before_total != 0.0 {
        delta / before_total * 100.0
    } else {
        0.0
    };

    let before_by_address = totals_by_address(before);
    let after_by_address = totals_by_address(after);

    let mut addresses: Vec<&String> = before_by_address
        .keys()
        .chain(after_by_address.keys())
        .collect();
    addresses.sort();
    addresses.dedup();

    let resource_changes = addresses
        .into_iter()
        .map(|address| {
            let cost_before = before_by_address.get(address).copied();
            let cost_after = after_by_address.get(address).copied();
            let change_type = match (cost_before, cost_after) {
                (None, Some(_)) => ChangeType::Added,
                (Some(_), None) => ChangeType::Removed,
                (Some(b), Some(a)) if a > b => ChangeType::Increased,
                (Some(b), Some(a)) if a < b => ChangeType::Decreased,
                _ => ChangeType::Unchanged,
            };
            ResourceDelta {
                address: address.clone(),
                change_type,
                cost_before: cost_before.unwrap_or(0.0),
                cost_after: cost_after.unwrap_or(0.0),
                delta: cost_after.unwrap_or(0.0) - cost_before.unwrap_or(0.0),
            }
        })
        .collect();

    let mut services: Vec<&String> = before
        .service_breakdown
        .keys()
        .chain(after.service_breakdown.keys())
        .collect();
    services.sort();
    services.dedup();

    let service_changes = services
        .into_iter()
        .map(|service| {
            let cost_before = before.service_breakdown.get(service).copied().unwrap_or(0.0);
            let cost_after = after.service_breakdown.get(service).copied().unwrap_or(0.0);
            ServiceDelta {
                service: service.clone(),
                cost_before,
                cost_after,
                delta: cost_after - cost_before,
            }
        })
        .collect();

    EstimateDiff {
        before_total,
        after_total,
        delta,
        percent,
        resource_changes,
        service_changes,
    }
}

/// A resource with only zero-cost items still appears in the totals, so
/// added and removed zero-cost resources surface in the diff.
fn totals_by_address(estimate: &Estimate) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for resource in &estimate.resources {
        totals.entry(resource.address.clone()).or_insert(0.0);
    }
    for item in &estimate.cost_items {
        *totals.entry(item.resource_address.clone()).or_insert(0.0) += item.total;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use crate::mode::EvaluationMode;
    use crate::model::{Confidence, CostItem, MatchType, Resource};
    use std::collections::BTreeSet;

    fn item(address: &str, total: f64) -> CostItem {
        CostItem {
            resource_address: address.into(),
            service: "AmazonEC2".into(),
            region: "us-east-1".into(),
            usage_type: "BoxUsage:t3.micro".into(),
            quantity: 730.0,
            unit: "Hrs".into(),
            price_per_unit: total / 730.0,
            total,
            sku: "SKU".into(),
            confidence: Confidence::High,
            match_type: MatchType::Exact,
            formula: String::new(),
        }
    }

    fn estimate(addresses: &[(&str, f64)]) -> Estimate {
        let resources = addresses
            .iter()
            .map(|(address, _)| Resource::new(*address, "aws_instance"))
            .collect();
        let items = addresses
            .iter()
            .map(|(address, total)| item(address, *total))
            .collect();
        compose(
            resources,
            items,
            Vec::new(),
            EvaluationMode::Conservative,
            &BTreeSet::from(["v1".to_string()]),
        )
        .unwrap()
    }

    #[test]
    fn added_instance_doubles_the_total() {
        let before = estimate(&[("aws_instance.a", 8.232)]);
        let after = estimate(&[("aws_instance.a", 8.232), ("aws_instance.b", 8.232)]);
        let diff = diff_estimates(&before, &after);

        assert!((diff.delta - 8.232).abs() < 1e-9);
        assert!((diff.percent - 100.0).abs() < 1e-9);
        let added: Vec<_> = diff
            .resource_changes
            .iter()
            .filter(|c| c.change_type == ChangeType::Added)
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].address, "aws_instance.b");
    }

    #[test]
    fn removed_and_unchanged_are_classified() {
        let before = estimate(&[("aws_instance.a", 10.0), ("aws_instance.b", 5.0)]);
        let after = estimate(&[("aws_instance.a", 10.0)]);
        let diff = diff_estimates(&before, &after);
        assert_eq!(diff.resource_changes[0].change_type, ChangeType::Unchanged);
        assert_eq!(diff.resource_changes[1].change_type, ChangeType::Removed);
        assert!((diff.percent + 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_baseline_reports_zero_percent() {
        let before = estimate(&[]);
        let after = estimate(&[("aws_instance.a", 1.0)]);
        let diff = diff_estimates(&before, &after);
        assert_eq!(diff.percent, 0.0);
        assert_eq!(diff.delta, 1.0);
    }
}
