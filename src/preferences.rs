use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const THEMES: [&str; 4] = ["dark", "light", "midnight", "matrix"];
const ACCENTS: [&str; 5] = ["cyan", "violet", "emerald", "amber", "rose"];

/// Checks well-known theming keys; any other key is stored as-is.
pub fn validate_preference(key: &str, value: &str) -> Result<(), String> {
    match key {
        "theme" if !THEMES.contains(&value) => Err(format!(
            "Unknown theme '{}'. Expected one of: {}",
            value,
            THEMES.join(", ")
        )),
        "accent" if !ACCENTS.contains(&value) => Err(format!(
            "Unknown accent '{}'. Expected one of: {}",
            value,
            ACCENTS.join(", ")
        )),
        "font_size" => match value.parse::<u8>() {
            Ok(size) if (10..=24).contains(&size) => Ok(()),
            _ => Err(format!("Font size must be a number between 10 and 24, got '{}'", value)),
        },
        _ => Ok(()),
    }
}

/// UI preferences persisted as a flat JSON object.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Loads preferences from `path`. A missing or unreadable file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut values = Self::defaults();
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(stored) => {
                    info!("Loaded {} preferences from {}", stored.len(), path.display());
                    values.extend(stored);
                }
                Err(e) => warn!("Ignoring malformed preferences file '{}': {}", path.display(), e),
            },
            Err(_) => info!("No preferences file at {}, using defaults", path.display()),
        }
        Self { path, values }
    }

    fn defaults() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("theme".to_string(), "dark".to_string()),
            ("accent".to_string(), "cyan".to_string()),
            ("font_size".to_string(), "14".to_string()),
        ])
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn all(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        validate_preference(key, value)?;
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn save(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory '{}': {}", parent.display(), e))?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| format!("Failed to serialize preferences: {}", e))?;
        fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write preferences to '{}': {}", self.path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::load(dir.path().join("prefs.json"));
        assert_eq!(store.get("theme"), Some("dark"));
        assert_eq!(store.get("font_size"), Some("14"));
        assert_eq!(store.get("sidebar"), None);
    }

    #[test]
    fn set_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let mut store = PreferenceStore::load(&path);
        store.set("theme", "matrix").unwrap();
        store.set("sidebar", "collapsed").unwrap();

        let reloaded = PreferenceStore::load(&path);
        assert_eq!(reloaded.get("theme"), Some("matrix"));
        assert_eq!(reloaded.get("sidebar"), Some("collapsed"));
        assert_eq!(reloaded.get("accent"), Some("cyan"));
    }

    #[test]
    fn rejects_invalid_theme_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::load(dir.path().join("prefs.json"));
        assert!(store.set("theme", "neon").is_err());
        assert!(store.set("font_size", "99").is_err());
        assert!(store.set("font_size", "big").is_err());
        assert_eq!(store.get("theme"), Some("dark"));
        assert!(!dir.path().join("prefs.json").exists());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();
        let store = PreferenceStore::load(&path);
        assert_eq!(store.get("accent"), Some("cyan"));
    }
}
