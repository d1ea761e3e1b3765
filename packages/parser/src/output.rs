//! Writing parsed rules to disk.
//!
//! Output is one JSON object per file mapping section identifiers to
//! [`SectionRules`], pretty printed with sorted keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::parser::SectionStage;
use crate::types::SectionRules;

/// `<output_dir>/<chapter>.json`
pub fn default_output_path(output_dir: &Path, chapter: &str) -> PathBuf {
    output_dir.join(format!("{chapter}.json"))
}

/// Write a whole chapter, replacing any existing file.
pub fn save_chapter(path: &Path, sections: &BTreeMap<String, SectionRules>) -> Result<()> {
    let entries = sections
        .iter()
        .map(|(id, rules)| -> Result<(String, Value)> {
            Ok((id.clone(), serde_json::to_value(rules)?))
        })
        .collect::<Result<BTreeMap<String, Value>>>()?;
    write_json(path, &entries)?;
    info!(
        path = %path.display(),
        sections = entries.len(),
        stage = %SectionStage::Persisted,
        "saved chapter"
    );
    Ok(())
}

/// Merge sections into the file at `path`, overwriting matching keys and
/// keeping all others. A missing file starts empty.
///
/// Returns the number of sections in the file after merging.
pub fn merge_sections(path: &Path, sections: &BTreeMap<String, SectionRules>) -> Result<usize> {
    let mut entries: BTreeMap<String, Value> = if path.is_file() {
        serde_json::from_str(&fs::read_to_string(path)?)?
    } else {
        BTreeMap::new()
    };

    for (id, rules) in sections {
        entries.insert(id.clone(), serde_json::to_value(rules)?);
    }

    write_json(path, &entries)?;
    info!(
        path = %path.display(),
        merged = sections.len(),
        total = entries.len(),
        stage = %SectionStage::Persisted,
        "merged sections"
    );
    Ok(entries.len())
}

fn write_json(path: &Path, entries: &BTreeMap<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(&sort_keys(entries))?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// Recursively rebuild objects so keys serialize in sorted order regardless
/// of the `serde_json` map backend.
fn sort_keys(entries: &BTreeMap<String, Value>) -> BTreeMap<&str, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.as_str(), sorted_value(v)))
        .collect()
}

fn sorted_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, sorted_value(v))).collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), v))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_value).collect()),
        other => other.clone(),
    }
}
