//! Configuration file maintenance: detect keys missing from an older
//! configuration file and fill them with defaults, preserving user values.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::models::cause::SanctionCause;
use crate::models::money::Money;
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

const TOP_LEVEL_KEYS: [&str; 6] = [
    "database",
    "lock_name",
    "lock_lease_secs",
    "schedule_interval_secs",
    "absence_policy",
    "tariffs",
];

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    let yaml: Value =
        serde_yaml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))?;
    match yaml {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config("configuration root must be a mapping".into())),
    }
}

/// Report problems in the configuration file without touching it:
/// missing top-level keys, causes without tariff, unparsable amounts.
pub fn check_config_file(path: &Path) -> AppResult<Vec<String>> {
    let map = read_mapping(path)?;
    let mut problems = Vec::new();

    for key in TOP_LEVEL_KEYS {
        if !map.contains_key(Value::String(key.to_string())) {
            problems.push(format!("missing key '{}'", key));
        }
    }

    let tariffs = map
        .get(Value::String("tariffs".to_string()))
        .and_then(Value::as_mapping);

    if let Some(tariffs) = tariffs {
        for cause in SanctionCause::ALL {
            match tariffs.get(Value::String(cause.label().to_string())) {
                None => problems.push(format!("no tariff for cause '{}'", cause)),
                Some(v) => {
                    let raw = yaml_scalar_to_string(v);
                    if raw.parse::<Money>().is_err() {
                        problems.push(format!("invalid tariff for cause '{}': {}", cause, raw));
                    }
                }
            }
        }
    }

    Ok(problems)
}

fn yaml_scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => format!("{:?}", other),
    }
}

/// Add missing top-level keys (and missing tariffs) with their default
/// values. Returns `true` when the file was rewritten.
pub fn migrate_config_file(path: &Path) -> AppResult<bool> {
    let mut map = read_mapping(path)?;

    let defaults = serde_yaml::to_value(Config::default())
        .map_err(|e| AppError::Config(e.to_string()))?;
    let Value::Mapping(defaults) = defaults else {
        return Err(AppError::Config("unexpected default configuration shape".into()));
    };

    let mut changed = false;

    for key in TOP_LEVEL_KEYS {
        let k = Value::String(key.to_string());
        if !map.contains_key(&k)
            && let Some(v) = defaults.get(&k)
        {
            info(format!("Adding missing key '{}'", key));
            map.insert(k, v.clone());
            changed = true;
        }
    }

    let tariffs_key = Value::String("tariffs".to_string());
    if let (Some(Value::Mapping(current)), Some(Value::Mapping(default_tariffs))) = (
        map.get(&tariffs_key).cloned(),
        defaults.get(&tariffs_key),
    ) {
        let mut merged = current;
        for (cause, amount) in default_tariffs {
            if !merged.contains_key(cause) {
                info(format!("Adding default tariff for {:?}", cause));
                merged.insert(cause.clone(), amount.clone());
                changed = true;
            }
        }
        map.insert(tariffs_key, Value::Mapping(merged));
    }

    if changed {
        let serialized = serde_yaml::to_string(&Value::Mapping(map))
            .map_err(|_| AppError::ConfigSave)?;
        fs::write(path, serialized)?;
        success(format!("Configuration migrated: {}", path.display()));
    }

    Ok(changed)
}
