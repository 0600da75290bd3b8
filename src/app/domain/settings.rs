use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::error::{EditorError, Result};

/// Settings for the file store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSettings {
    /// File opened on load. Falls back to the container id.
    #[serde(default)]
    pub name: Option<String>,

    /// Content given to files created without an explicit body.
    #[serde(default)]
    pub default_content: String,

    /// Persist after every edit instead of waiting for `save()`.
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
}

/// Stylesheet paths, relative to `base_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSettings {
    #[serde(default = "default_base_theme")]
    pub base: String,

    #[serde(default = "default_editor_theme")]
    pub editor: String,

    #[serde(default = "default_preview_theme")]
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default = "default_client_side_storage")]
    pub client_side_storage: bool,

    #[serde(default = "default_local_storage_name")]
    pub local_storage_name: String,

    #[serde(default)]
    pub file: FileSettings,

    #[serde(default)]
    pub theme: ThemeSettings,
}

fn default_auto_save() -> bool {
    false
}

fn default_base_theme() -> String {
    "themes/base/epiceditor.css".to_string()
}

fn default_editor_theme() -> String {
    "themes/editor/epic-dark.css".to_string()
}

fn default_preview_theme() -> String {
    "themes/preview/github.css".to_string()
}

fn default_base_path() -> String {
    "epiceditor".to_string()
}

fn default_client_side_storage() -> bool {
    true
}

fn default_local_storage_name() -> String {
    "epiceditor".to_string()
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            name: None,
            default_content: String::new(),
            auto_save: default_auto_save(),
        }
    }
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            base: default_base_theme(),
            editor: default_editor_theme(),
            preview: default_preview_theme(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            client_side_storage: default_client_side_storage(),
            local_storage_name: default_local_storage_name(),
            file: FileSettings::default(),
            theme: ThemeSettings::default(),
        }
    }
}

impl Settings {
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_default_content(mut self, content: impl Into<String>) -> Self {
        self.file.default_content = content.into();
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_path.trim().is_empty() {
            return Err(EditorError::Config("base_path must not be empty".to_string()));
        }
        if self.local_storage_name.trim().is_empty() {
            return Err(EditorError::Config(
                "local_storage_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Join an asset path onto `base_path` with exactly one separator.
    pub fn resolve_asset(&self, relative: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        let relative = relative.trim_start_matches('/');
        format!("{}/{}", base, relative)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from `path`, falling back to defaults if the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Failed to parse settings: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Load settings from the default location.
    pub fn load() -> Self {
        Self::load_from(&Self::get_config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// Get config file path (cross-platform)
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("epiceditor");
        path.push("settings.json");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.base_path, "epiceditor");
        assert!(settings.client_side_storage);
        assert_eq!(settings.local_storage_name, "epiceditor");
        assert_eq!(settings.file.name, None);
        assert_eq!(settings.file.default_content, "");
        assert!(!settings.file.auto_save);
        assert_eq!(settings.theme.preview, "themes/preview/github.css");
    }

    #[test]
    fn test_serialize_deserialize() {
        let settings = Settings::default().with_default_content("#foo\n\n##bar");
        let json = serde_json::to_string(&settings).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, loaded);
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{"base_path": "/static/epiceditor/", "file": {"default_content": "hi"}}"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.base_path, "/static/epiceditor/");
        assert_eq!(settings.file.default_content, "hi");
        assert!(!settings.file.auto_save);
        assert_eq!(settings.local_storage_name, "epiceditor");
        assert_eq!(settings.theme, ThemeSettings::default());
    }

    #[test]
    fn test_resolve_asset_single_separator() {
        let settings = Settings::default().with_base_path("/epiceditor/");
        assert_eq!(
            settings.resolve_asset("/themes/base/epiceditor.css"),
            "/epiceditor/themes/base/epiceditor.css"
        );
        let settings = Settings::default().with_base_path("assets");
        assert_eq!(settings.resolve_asset("a.css"), "assets/a.css");
    }

    #[test]
    fn test_validate_rejects_empty_base_path() {
        let settings = Settings::default().with_base_path("  ");
        assert!(matches!(settings.validate(), Err(EditorError::Config(_))));

        let mut settings = Settings::default();
        settings.local_storage_name.clear();
        assert!(settings.validate().is_err());

        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(Settings::load_from(&missing), Settings::default());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ this is not json").unwrap();
        assert_eq!(Settings::load_from(&corrupt), Settings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default().with_file_name("readme");
        settings.file.auto_save = true;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
    }
}
