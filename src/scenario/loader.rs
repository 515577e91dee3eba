//! Loading scenarios from disk
//!
//! A file holds a single scenario, a list of scenarios, or a mapping with a
//! `scenarios` key. Directories expand to their `.yaml`, `.yml` and `.json`
//! files, sorted by file name.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::config::Scenario;
use crate::common::{Error, Result};

const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Load and validate scenarios from files and directories, in argument order
pub fn load_paths(paths: &[PathBuf]) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();
    for path in paths {
        scenarios.extend(load_path(path)?);
    }

    let mut names = HashSet::new();
    for scenario in &scenarios {
        if !names.insert(scenario.name.as_str()) {
            return Err(Error::invalid_scenario(
                &scenario.name,
                "name is used by more than one scenario",
            ));
        }
    }

    Ok(scenarios)
}

/// Load and validate the scenarios in one file or directory
pub fn load_path(path: &Path) -> Result<Vec<Scenario>> {
    if path.is_dir() {
        let mut scenarios = Vec::new();
        for file in scenario_files(path)? {
            scenarios.extend(load_file(&file)?);
        }
        return Ok(scenarios);
    }
    load_file(path)
}

fn scenario_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::FileRead {
        path: dir.display().to_string(),
        error: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_file(path: &Path) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
    parse_scenarios(&content, is_json).map_err(|e| match e {
        Error::Config(reason) => {
            Error::Config(format!("Failed to parse '{}': {}", path.display(), reason))
        }
        other => other,
    })
}

/// Parse scenarios from YAML (or JSON when `is_json`) text and validate them
pub fn parse_scenarios(content: &str, is_json: bool) -> Result<Vec<Scenario>> {
    let document: Value = if is_json {
        serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))?
    } else {
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?
    };

    let scenarios = match document {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Scenario>, _>>(),
        Value::Object(mut map) if map.contains_key("scenarios") => {
            let items = map.remove("scenarios").unwrap_or(Value::Null);
            serde_json::from_value(items)
        }
        Value::Object(map) => serde_json::from_value(Value::Object(map)).map(|s| vec![s]),
        Value::Null => Ok(Vec::new()),
        _ => {
            return Err(Error::Config(
                "expected a scenario, a list of scenarios or a 'scenarios' key".to_string(),
            ))
        }
    }
    .map_err(|e| Error::Config(e.to_string()))?;

    for scenario in &scenarios {
        scenario.validate()?;
    }
    Ok(scenarios)
}
