//! Display registry
//!
//! A JSON document holding an array of display records. It is shared by the
//! admin API (create, edit, delete) and by every monitor (`last_value`
//! commits), so each call is a read-merge-write of the whole document under
//! one async mutex, finished by an atomic replace (temp file + rename).
//!
//! Records are kept as raw JSON objects between reads and writes. A record
//! that fails to parse is reported on its own and still written back
//! untouched, and keys this service does not know survive every rewrite.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::display::{DisplayConfig, DisplayUpdate, MAX_DISPLAYS};
use crate::error::{ConfigError, RegistryError};

type Result<T> = std::result::Result<T, RegistryError>;

/// Keys the admin interface owns; `name` is immutable and `last_value`
/// belongs to the monitor.
const ADMIN_KEYS: [&str; 9] = [
    "ip",
    "port",
    "protocol",
    "query",
    "interval",
    "unit_id",
    "start_reg",
    "max_chars",
    "header",
];

const LAST_VALUE_KEY: &str = "last_value";

/// File-backed display registry
#[derive(Debug)]
pub struct DisplayRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DisplayRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every record; a bad record never hides the others
    pub async fn load_displays(
        &self,
    ) -> Result<Vec<std::result::Result<DisplayConfig, ConfigError>>> {
        let _guard = self.lock.lock().await;
        let records = self.read_records().await?;

        Ok(records
            .into_iter()
            .enumerate()
            .map(|(index, record)| -> std::result::Result<DisplayConfig, ConfigError> {
                let display = parse_record(index, record)?;
                display.validate()?;
                Ok(display)
            })
            .collect())
    }

    /// All records that parse; malformed ones are logged and left out
    pub async fn list(&self) -> Result<Vec<DisplayConfig>> {
        let _guard = self.lock.lock().await;
        let records = self.read_records().await?;

        let mut displays = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match parse_record(index, record) {
                Ok(display) => displays.push(display),
                Err(e) => warn!("{}", e),
            }
        }
        Ok(displays)
    }

    pub async fn get(&self, name: &str) -> Result<DisplayConfig> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;

        let index = find_record(&records, name)?;
        Ok(parse_record(index, records.swap_remove(index))?)
    }

    /// Add a display; rejected when invalid, duplicated or the registry is full
    pub async fn create(&self, mut config: DisplayConfig) -> Result<DisplayConfig> {
        config.name = config.name.trim().to_string();
        config.host = config.host.trim().to_string();
        config.query = config.query.trim().to_string();
        config.last_value = None;
        config.validate()?;

        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;

        if records.len() >= MAX_DISPLAYS {
            return Err(RegistryError::CapacityExceeded { max: MAX_DISPLAYS });
        }
        if find_record(&records, &config.name).is_ok() {
            return Err(RegistryError::Duplicate(config.name));
        }

        records.push(serde_json::to_value(&config)?);
        self.write_records(&records).await?;

        info!("Display '{}' created ({} of {})", config.name, records.len(), MAX_DISPLAYS);
        Ok(config)
    }

    /// Apply an admin edit; `last_value` and unknown keys are preserved
    pub async fn update(&self, name: &str, update: &DisplayUpdate) -> Result<DisplayConfig> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;

        let index = find_record(&records, name)?;
        let mut display = parse_record(index, records[index].clone())?;
        update.apply_to(&mut display);
        display.validate()?;

        let updated = serde_json::to_value(&display)?;
        if let (Some(target), Value::Object(source)) = (records[index].as_object_mut(), updated) {
            merge_admin_keys(target, source);
        }
        self.write_records(&records).await?;

        info!("Display '{}' updated", name);
        Ok(display)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;

        let index = find_record(&records, name)?;
        records.remove(index);
        self.write_records(&records).await?;

        info!("Display '{}' deleted", name);
        Ok(())
    }

    /// Record the value a display now shows; touches nothing but `last_value`
    pub async fn commit_last_value(&self, name: &str, value: Option<&str>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;

        let index = find_record(&records, name)?;
        let Some(record) = records[index].as_object_mut() else {
            return Err(RegistryError::NotFound(name.to_string()));
        };
        record.insert(
            LAST_VALUE_KEY.to_string(),
            value.map_or(Value::Null, |v| Value::String(v.to_string())),
        );
        self.write_records(&records).await?;

        debug!("Committed last_value {:?} for '{}'", value, name);
        Ok(())
    }

    async fn read_records(&self) -> Result<Vec<Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Registry {} not found, treated as empty", self.path.display());
                return Ok(Vec::new());
            },
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Array(records) => Ok(records),
            other => Err(RegistryError::Parse(format!(
                "expected an array of displays, found {}",
                json_kind(&other)
            ))),
        }
    }

    async fn write_records(&self, records: &[Value]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir).await?;

        let base = self
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("config.json");
        let tmp_path = dir.join(format!(".{}.tmp-{}", base, std::process::id()));

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

fn parse_record(index: usize, record: Value) -> std::result::Result<DisplayConfig, ConfigError> {
    serde_json::from_value(record).map_err(|e| ConfigError::MalformedRecord {
        index,
        reason: e.to_string(),
    })
}

fn find_record(records: &[Value], name: &str) -> Result<usize> {
    records
        .iter()
        .position(|r| r.get("name").and_then(Value::as_str) == Some(name))
        .ok_or_else(|| RegistryError::NotFound(name.to_string()))
}

/// Overwrite admin-owned keys of `target` with those in `source`; keys that
/// `source` omits (cleared optionals) are removed.
fn merge_admin_keys(target: &mut Map<String, Value>, mut source: Map<String, Value>) {
    for key in ADMIN_KEYS {
        match source.remove(key) {
            Some(value) => {
                target.insert(key.to_string(), value);
            },
            None => {
                target.remove(key);
            },
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
