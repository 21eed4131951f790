// Terraform source-tree path: HCL parsing with best-effort evaluation

use crate::errors::{EstimateError, Result};
use crate::model::{AttrValue, Resource};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Load every `.tf` file under `dir` and normalize the declared resources.
///
/// Expression evaluation is best-effort: literals and simple `var.`
/// interpolations with declared defaults are resolved; everything else is
/// preserved as an `${...}` sentinel for the mocker. Provider plugins are
/// never executed.
pub fn load_source_dir(dir: &Path, default_region: Option<&str>) -> Result<Vec<Resource>> {
    let files = tf_files(dir);
    if files.is_empty() {
        return Err(EstimateError::input_invalid(format!(
            "no .tf files found under {}",
            dir.display()
        )));
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        let content = fs::read_to_string(file).map_err(|e| {
            EstimateError::input_invalid(format!("cannot read {}: {e}", file.display()))
        })?;
        documents.push(parse_document(&content, file)?);
    }

    let variables = collect_variable_defaults(&documents);
    let provider_region = documents
        .iter()
        .find_map(|doc| find_provider_region(doc, &variables));

    let mut resources = Vec::new();
    for doc in &documents {
        collect_resources(
            doc,
            &variables,
            provider_region.as_deref(),
            default_region,
            &mut resources,
        );
    }
    super::finalize(resources)
}

/// All `.tf` files under the root, sorted for deterministic merge order.
fn tf_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    files.sort();
    files
}

/// Parse one HCL document into a JSON-shaped tree. Unresolvable expressions
/// come back as `${...}` interpolation strings.
fn parse_document(content: &str, file: &Path) -> Result<serde_json::Value> {
    let value: hcl::Value = hcl::from_str(content).map_err(|e| {
        EstimateError::input_invalid(format!("malformed HCL in {}: {e}", file.display()))
    })?;
    serde_json::to_value(&value).map_err(|e| {
        EstimateError::input_invalid(format!("cannot normalize HCL in {}: {e}", file.display()))
    })
}

fn collect_variable_defaults(documents: &[serde_json::Value]) -> BTreeMap<String, AttrValue> {
    let mut defaults = BTreeMap::new();
    for doc in documents {
        let Some(variables) = doc.get("variable").and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, decl) in variables {
            if let Some(default) = decl.get("default").and_then(AttrValue::from_json) {
                defaults.entry(name.clone()).or_insert(default);
            }
        }
    }
    defaults
}

/// Region of the first `provider "aws"` block that declares one.
fn find_provider_region(
    doc: &serde_json::Value,
    variables: &BTreeMap<String, AttrValue>,
) -> Option<String> {
    let aws = doc.get("provider")?.get("aws")?;
    let blocks: Vec<&serde_json::Value> = match aws {
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for block in blocks {
        if let Some(region) = block.get("region").and_then(AttrValue::from_json) {
            let resolved = resolve(region, variables);
            if !resolved.is_unresolved() {
                if let Some(region) = resolved.as_str() {
                    return Some(region.to_string());
                }
            }
        }
    }
    None
}

fn collect_resources(
    doc: &serde_json::Value,
    variables: &BTreeMap<String, AttrValue>,
    provider_region: Option<&str>,
    default_region: Option<&str>,
    out: &mut Vec<Resource>,
) {
    let Some(resource_types) = doc.get("resource").and_then(|v| v.as_object()) else {
        return;
    };
    for (resource_type, named) in resource_types {
        let Some(named) = named.as_object() else {
            continue;
        };
        for (name, body) in named {
            let mut resource =
                Resource::new(format!("{resource_type}.{name}"), resource_type.clone());
            if let Some(body) = body.as_object() {
                for (key, value) in body {
                    if let Some(attr) = AttrValue::from_json(value) {
                        resource
                            .attributes
                            .insert(key.clone(), resolve(attr, variables));
                    }
                }
            }
            let explicit = resource.str_attr("region").map(str::to_string);
            resource.region = explicit
                .or_else(|| provider_region.map(str::to_string))
                .or_else(|| default_region.map(str::to_string));
            out.push(resource);
        }
    }
}

/// Substitute `var.` interpolations where a default is declared. A string
/// still carrying interpolation syntax after substitution is an expression
/// hcl could not evaluate and becomes an `Unresolved` sentinel. This is the
/// only place sentinels are created: in HCL source a `${...}` string IS an
/// expression (a literal would be escaped `$${...}`), so no user-supplied
/// string value can be mistaken for one.
fn resolve(value: AttrValue, variables: &BTreeMap<String, AttrValue>) -> AttrValue {
    match value {
        AttrValue::Str(s) => resolve_str(s, variables),
        AttrValue::List(items) => AttrValue::List(
            items
                .into_iter()
                .map(|item| resolve(item, variables))
                .collect(),
        ),
        AttrValue::Map(map) => AttrValue::Map(
            map.into_iter()
                .map(|(k, v)| (k, resolve(v, variables)))
                .collect(),
        ),
        other => other,
    }
}

fn resolve_str(s: String, variables: &BTreeMap<String, AttrValue>) -> AttrValue {
    let var_ref = Regex::new(r"\$\{var\.([A-Za-z0-9_-]+)\}").expect("static pattern");

    // A whole-string reference keeps the default's type.
    if let Some(captures) = var_ref.captures(&s) {
        if captures.get(0).map(|m| m.as_str()) == Some(s.as_str()) {
            if let Some(default) = variables.get(&captures[1]) {
                return default.clone();
            }
            return AttrValue::Unresolved(s);
        }
    }

    // Embedded references resolve where a scalar default exists; unknown
    // references are kept in place and flag the whole string unresolved.
    let replaced = var_ref
        .replace_all(&s, |captures: &regex::Captures<'_>| {
            match variables.get(&captures[1]) {
                Some(AttrValue::Str(v)) => v.clone(),
                Some(AttrValue::Num(n)) => n.to_string(),
                Some(AttrValue::Bool(b)) => b.to_string(),
                _ => captures[0].to_string(),
            }
        })
        .into_owned();

    if replaced.contains("${") {
        AttrValue::Unresolved(replaced)
    } else {
        AttrValue::Str(replaced)
    }
}
