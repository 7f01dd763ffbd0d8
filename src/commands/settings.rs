use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_FILE: &str = "settings.json";
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveServerSettings {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub log_level: String,
}

pub fn load_effective_server_settings(data_dir: &Path) -> Result<EffectiveServerSettings, String> {
    let settings = load_settings_from_disk(data_dir)?;

    // Sanitized values are always present; the fallbacks only guard the types.
    let host = settings
        .get("host")
        .and_then(Value::as_str)
        .unwrap_or("127.0.0.1")
        .to_string();
    let port = settings
        .get("port")
        .and_then(Value::as_u64)
        .and_then(|p| u16::try_from(p).ok())
        .unwrap_or(3000);
    let database_file = settings
        .get("databaseFile")
        .and_then(Value::as_str)
        .unwrap_or("feedback.db");
    let log_level = settings
        .get("logLevel")
        .and_then(Value::as_str)
        .unwrap_or("info")
        .to_string();

    Ok(EffectiveServerSettings {
        host,
        port,
        database_path: data_dir.join(database_file),
        log_level,
    })
}

/// Reads `settings.json`, filling and repairing it in place when needed.
pub fn load_settings_from_disk(data_dir: &Path) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {SETTINGS_FILE}: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| json!({}))
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

fn ensure_data_dir(data_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(data_dir)
        .map_err(|e| format!("Failed to create data directory {}: {e}", data_dir.display()))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write {SETTINGS_FILE}: {e}"))
}

/// Fills missing keys, repairs invalid values and stamps the schema version.
/// A file written by a newer release keeps its version stamp.
fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let stored_version = stored_schema_version(&out);
    merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);

    let version = match stored_version {
        Some(v) if v > SETTINGS_SCHEMA_VERSION => {
            log::warn!(
                "{SETTINGS_FILE} has schema_version {v}, newer than {SETTINGS_SCHEMA_VERSION}; unknown keys are ignored"
            );
            v
        }
        Some(v) if v == SETTINGS_SCHEMA_VERSION => v,
        other => {
            log::info!(
                "migrating {SETTINGS_FILE} from schema_version {} to {SETTINGS_SCHEMA_VERSION}",
                other.unwrap_or(0)
            );
            SETTINGS_SCHEMA_VERSION
        }
    };

    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(version));
    }

    out
}

fn stored_schema_version(settings: &Value) -> Option<i64> {
    settings.get("schema_version").and_then(Value::as_i64)
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "host": "127.0.0.1",
        "port": 3000,
        "databaseFile": "feedback.db",
        "logLevel": "info"
    })
}

fn merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        target_obj
            .entry(key.clone())
            .or_insert_with(|| default_value.clone());
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "port", 1, u16::MAX as u64, 3000);
    ensure_non_blank(obj, "host", "127.0.0.1");
    ensure_non_blank(obj, "databaseFile", "feedback.db");
    sanitize_enum(obj, "logLevel", LOG_LEVELS, "info");
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_non_blank(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(valid));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let data_dir = tmp.path().join("data");

        let effective = load_effective_server_settings(&data_dir).expect("load settings");

        assert!(data_dir.join(SETTINGS_FILE).exists());
        assert_eq!(effective.host, "127.0.0.1");
        assert_eq!(effective.port, 3000);
        assert_eq!(effective.database_path, data_dir.join("feedback.db"));
        assert_eq!(effective.log_level, "info");
    }

    #[test]
    fn invalid_values_are_repaired() {
        let migrated = migrate_settings(json!({
            "port": 0,
            "host": "   ",
            "logLevel": "verbose",
            "databaseFile": "triage.db"
        }));

        assert_eq!(migrated["port"], json!(1));
        assert_eq!(migrated["host"], json!("127.0.0.1"));
        assert_eq!(migrated["logLevel"], json!("info"));
        assert_eq!(migrated["databaseFile"], json!("triage.db"));
        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION));
    }

    #[test]
    fn existing_file_keeps_custom_values() {
        let tmp = tempfile::tempdir().expect("temp dir");
        fs::write(
            tmp.path().join(SETTINGS_FILE),
            r#"{ "port": 8088, "logLevel": "debug" }"#,
        )
        .expect("write settings");

        let effective = load_effective_server_settings(tmp.path()).expect("load settings");
        assert_eq!(effective.port, 8088);
        assert_eq!(effective.log_level, "debug");

        let rewritten: Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join(SETTINGS_FILE)).unwrap()).unwrap();
        assert_eq!(rewritten["databaseFile"], json!("feedback.db"));
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let migrated = migrate_settings(json!("not an object"));
        assert_eq!(migrated, default_settings());
    }

    #[test]
    fn missing_or_old_version_is_stamped_current() {
        assert_eq!(
            migrate_settings(json!({ "port": 4000 }))["schema_version"],
            json!(SETTINGS_SCHEMA_VERSION)
        );
        assert_eq!(
            migrate_settings(json!({ "schema_version": 0 }))["schema_version"],
            json!(SETTINGS_SCHEMA_VERSION)
        );
        assert_eq!(
            migrate_settings(json!({ "schema_version": "one" }))["schema_version"],
            json!(SETTINGS_SCHEMA_VERSION)
        );
    }

    #[test]
    fn newer_version_is_not_downgraded() {
        let migrated = migrate_settings(json!({
            "schema_version": SETTINGS_SCHEMA_VERSION + 1,
            "port": 9000,
            "futureKey": true
        }));

        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION + 1));
        assert_eq!(migrated["port"], json!(9000));
        assert_eq!(migrated["futureKey"], json!(true));
        assert_eq!(migrated["logLevel"], json!("info"));
    }

    #[test]
    fn defaults_never_replace_present_keys() {
        let mut settings = json!({ "host": "0.0.0.0", "extra": [1, 2] });
        merge_defaults(&mut settings, &default_settings());

        assert_eq!(settings["host"], json!("0.0.0.0"));
        assert_eq!(settings["extra"], json!([1, 2]));
        assert_eq!(settings["port"], json!(3000));
    }
}
