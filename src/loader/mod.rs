// Terraform loader: source trees or plan JSON into normalized resources

pub mod hcl_source;
pub mod plan;

use crate::errors::{EstimateError, Result};
use crate::model::Resource;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Bytes of a candidate file inspected for plan-JSON markers.
const PLAN_SNIFF_BYTES: usize = 1024;

/// True when the first 1 KB of the file carries both plan-JSON markers.
pub fn is_plan_json(path: &Path) -> bool {
    let Ok(mut file) = fs::File::open(path) else {
        return false;
    };
    let mut head = vec![0u8; PLAN_SNIFF_BYTES];
    let Ok(read) = file.read(&mut head) else {
        return false;
    };
    head.truncate(read);
    let head = String::from_utf8_lossy(&head);
    head.contains("\"format_version\"") && head.contains("\"planned_values\"")
}

/// Load resources from a path: a plan-JSON file, or a directory of `.tf`
/// source files. The plan path is taken whenever the file sniffs as a plan.
pub fn load_path(path: &Path, default_region: Option<&str>) -> Result<Vec<Resource>> {
    if path.is_dir() {
        hcl_source::load_source_dir(path, default_region)
    } else if is_plan_json(path) {
        plan::load_plan_file(path, default_region)
    } else {
        Err(EstimateError::input_invalid(format!(
            "{} is neither a Terraform source directory nor a plan JSON file",
            path.display()
        )))
    }
}

/// Sort by address and reject duplicates; every loader output goes through
/// here so downstream stages can rely on address-unique, ordered input.
pub(crate) fn finalize(mut resources: Vec<Resource>) -> Result<Vec<Resource>> {
    resources.sort_by(|a, b| a.address.cmp(&b.address));
    for pair in resources.windows(2) {
        if pair[0].address == pair[1].address {
            return Err(EstimateError::input_invalid(format!(
                "duplicate resource address '{}'",
                pair[0].address
            )));
        }
    }
    Ok(resources)
}
