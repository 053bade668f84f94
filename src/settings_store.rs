use crate::error::{BlobError, SettingsError};
use crate::render_config::{
    ConfigChange, ControlValues, HexColor, RenderConfig, DEFAULT_BACKGROUND_COLOR,
    DEFAULT_FRAMES_PER_SECOND, DEFAULT_TEXT_COLOR, DEFAULT_TRAIL_OPACITY,
};
use crate::storage::KeyValueStore;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Key under which the settings blob is persisted
pub const SETTINGS_KEY: &str = "matrixSettings";

/// Suggested name for exported settings files
pub const EXPORT_FILE_NAME: &str = "matrix-settings.json";

/// Returned when the host must rebuild everything from storage for a change to take effect
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct RestartRequired;

/// On-disk shape of the settings blob
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSettings {
    text_color: HexColor,
    bg_color: HexColor,
    #[serde(serialize_with = "serialize_number")]
    trail_opacity: f64,
    #[serde(serialize_with = "serialize_number")]
    speed: f64,
}

impl From<&RenderConfig> for PersistedSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            text_color: config.text_color,
            bg_color: config.background_color,
            trail_opacity: config.trail_opacity,
            speed: config.frames_per_second,
        }
    }
}

/// Whole numbers are written without a fractional part, so `30.0` persists as `30`
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && *value >= 0.0 && *value <= u64::MAX as f64 {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn parse_blob(text: &str) -> Result<Map<String, Value>, BlobError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(BlobError::NotAnObject),
    }
}

/// A color field, or `None` if it is missing, empty, or not a `#rrggbb` string
fn color_field(fields: &Map<String, Value>, name: &str) -> Option<HexColor> {
    match fields.get(name) {
        Some(Value::String(s)) if !s.is_empty() => match s.parse() {
            Ok(color) => Some(color),
            Err(e) => {
                log::warn!("Ignoring stored {name}: {e}");
                None
            }
        },
        _ => None,
    }
}

/// A numeric field, or `None` if it is missing, zero, not a number, or rejected by `valid`
fn number_field(fields: &Map<String, Value>, name: &str, valid: impl Fn(f64) -> bool) -> Option<f64> {
    let value = fields.get(name)?.as_f64()?;
    if value == 0.0 {
        return None;
    }
    if !valid(value) {
        log::warn!("Ignoring out of range stored {name}: {value}");
        return None;
    }
    Some(value)
}

/// Build a config from a stored blob, falling back to defaults field by field
fn config_from_fields(fields: &Map<String, Value>) -> RenderConfig {
    RenderConfig {
        text_color: color_field(fields, "textColor").unwrap_or(DEFAULT_TEXT_COLOR),
        background_color: color_field(fields, "bgColor").unwrap_or(DEFAULT_BACKGROUND_COLOR),
        trail_opacity: number_field(fields, "trailOpacity", |v| (0.0..=1.0).contains(&v))
            .unwrap_or(DEFAULT_TRAIL_OPACITY),
        frames_per_second: number_field(fields, "speed", |v| v.is_finite() && v > 0.0)
            .unwrap_or(DEFAULT_FRAMES_PER_SECOND),
    }
}

/// Single source of truth for the render configuration, kept in sync with a [`KeyValueStore`]
pub struct SettingsStore<S: KeyValueStore> {
    storage: S,
    config: RenderConfig,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Create a store holding the default config. Call [`SettingsStore::load`] to pick up persisted values.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            config: RenderConfig::default(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the persisted blob, if any, into the current config.
    ///
    /// Missing and falsy fields (including a stored `0`) take their defaults. A blob that does
    /// not parse leaves the defaults in place and is reported as an error.
    pub fn load(&mut self) -> Result<ControlValues, SettingsError> {
        self.config = RenderConfig::default();

        let Some(saved) = self.storage.get(SETTINGS_KEY) else {
            log::info!("No saved settings, using defaults.");
            return Ok(self.control_values());
        };

        let fields = parse_blob(&saved).map_err(SettingsError::MalformedPersistedSettings)?;
        self.config = config_from_fields(&fields);
        log::info!("Loaded saved settings.");

        Ok(self.control_values())
    }

    /// Like [`SettingsStore::load`], but a malformed blob is logged and the defaults kept
    pub fn load_or_default(&mut self) -> ControlValues {
        match self.load() {
            Ok(controls) => controls,
            Err(e) => {
                log::warn!("Falling back to default settings.");
                log::debug!("Failed to load settings with the following error: {e}");
                self.config = RenderConfig::default();
                self.control_values()
            }
        }
    }

    /// Values for the settings panel's input controls
    pub fn control_values(&self) -> ControlValues {
        ControlValues::from(&self.config)
    }

    /// Apply one edit and persist the whole config.
    ///
    /// The in-memory config keeps the edit even if persisting fails.
    pub fn on_config_change(&mut self, change: ConfigChange) -> Result<(), SettingsError> {
        match change {
            ConfigChange::TextColor(color) => self.config.text_color = color,
            ConfigChange::BackgroundColor(color) => self.config.background_color = color,
            ConfigChange::OpacityPercent(percent) => {
                self.config.trail_opacity = f64::from(percent.min(100)) / 100.0;
            }
            ConfigChange::Speed(fps) => self.config.frames_per_second = f64::from(fps.max(1)),
        }

        self.save()
    }

    fn save(&mut self) -> Result<(), SettingsError> {
        let blob = serde_json::to_string(&PersistedSettings::from(&self.config))?;
        self.storage.set(SETTINGS_KEY, blob)
    }

    /// Forget the persisted settings
    pub fn reset(&mut self) -> Result<RestartRequired, SettingsError> {
        self.storage.remove(SETTINGS_KEY)?;
        log::info!("Settings reset.");
        Ok(RestartRequired)
    }

    /// The persisted blob exactly as stored, or `{}` if nothing has been saved
    pub fn export_blob(&self) -> String {
        self.storage
            .get(SETTINGS_KEY)
            .unwrap_or_else(|| "{}".to_string())
    }

    pub fn export_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        fs::write(path, self.export_blob()).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Exported settings to {}.", path.display());
        Ok(())
    }

    /// Replace the persisted blob with `contents`.
    ///
    /// Nothing is written unless `contents` is a JSON object.
    pub fn import_blob(&mut self, contents: &str) -> Result<RestartRequired, SettingsError> {
        let fields = parse_blob(contents).map_err(SettingsError::MalformedImportedFile)?;
        let blob = serde_json::to_string(&Value::Object(fields))?;
        self.storage.set(SETTINGS_KEY, blob)?;
        log::info!("Imported settings.");
        Ok(RestartRequired)
    }

    pub fn import_from_file(&mut self, path: &Path) -> Result<RestartRequired, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_blob(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use tempfile::tempdir;

    fn store_with(blob: Option<&str>) -> SettingsStore<MemoryStore> {
        let mut storage = MemoryStore::default();
        if let Some(blob) = blob {
            storage.set(SETTINGS_KEY, blob.to_string()).unwrap();
        }
        SettingsStore::new(storage)
    }

    fn reloaded(store: SettingsStore<MemoryStore>) -> RenderConfig {
        let mut fresh = SettingsStore::new(store.storage().clone());
        fresh.load().unwrap();
        fresh.config().clone()
    }

    #[test]
    fn load_without_blob_keeps_defaults() {
        let mut store = store_with(None);
        store.load().unwrap();
        assert_eq!(store.config(), &RenderConfig::default());
        assert_eq!(store.storage().get(SETTINGS_KEY), None);
    }

    #[test]
    fn load_reads_full_blob() {
        let mut store = store_with(Some(
            r##"{"textColor":"#ff0000","bgColor":"#000000","trailOpacity":0.1,"speed":60}"##,
        ));
        let controls = store.load().unwrap();

        assert_eq!(
            store.config(),
            &RenderConfig {
                text_color: HexColor([0xff, 0, 0]),
                background_color: HexColor([0, 0, 0]),
                trail_opacity: 0.1,
                frames_per_second: 60.0,
            }
        );
        assert_eq!(controls.opacity_percent, 10);
        assert_eq!(controls.speed, 60);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let mut store = store_with(Some(r##"{"textColor":"#123456"}"##));
        store.load().unwrap();

        let config = store.config();
        assert_eq!(config.text_color, HexColor([0x12, 0x34, 0x56]));
        assert_eq!(config.background_color, DEFAULT_BACKGROUND_COLOR);
        assert_eq!(config.trail_opacity, DEFAULT_TRAIL_OPACITY);
        assert_eq!(config.frames_per_second, DEFAULT_FRAMES_PER_SECOND);
    }

    #[test]
    fn zero_values_are_treated_as_unset() {
        let mut store = store_with(Some(r#"{"textColor":"","trailOpacity":0,"speed":0}"#));
        store.load().unwrap();
        assert_eq!(store.config(), &RenderConfig::default());
    }

    #[test]
    fn malformed_fields_take_defaults() {
        let mut store = store_with(Some(
            r##"{"textColor":"green","bgColor":7,"trailOpacity":1.5,"speed":-10,"extra":true}"##,
        ));
        store.load().unwrap();
        assert_eq!(store.config(), &RenderConfig::default());
    }

    #[test]
    fn unparsable_blob_is_reported_and_defaults_kept() {
        let mut store = store_with(Some("{oops"));
        assert!(matches!(
            store.load(),
            Err(SettingsError::MalformedPersistedSettings(BlobError::Json(_)))
        ));

        let controls = store.load_or_default();
        assert_eq!(store.config(), &RenderConfig::default());
        assert_eq!(controls.speed, 30);
    }

    #[test]
    fn opacity_percent_persists_as_fraction() {
        let mut store = store_with(None);
        store.on_config_change(ConfigChange::OpacityPercent(25)).unwrap();

        let saved: Value = serde_json::from_str(&store.export_blob()).unwrap();
        assert_eq!(saved["trailOpacity"], 0.25);
    }

    #[test]
    fn persisted_blob_uses_wire_names() {
        let mut store = store_with(None);
        store.on_config_change(ConfigChange::Speed(45)).unwrap();

        assert_eq!(
            store.export_blob(),
            r##"{"textColor":"#00ff00","bgColor":"#000000","trailOpacity":0.05,"speed":45}"##
        );
    }

    #[test]
    fn every_field_round_trips_through_storage() {
        let changes = [
            ConfigChange::TextColor(HexColor([1, 2, 3])),
            ConfigChange::BackgroundColor(HexColor([4, 5, 6])),
            ConfigChange::OpacityPercent(80),
            ConfigChange::Speed(12),
        ];

        for change in changes {
            let mut store = store_with(None);
            store.load().unwrap();
            store.on_config_change(change.clone()).unwrap();
            let expected = store.config().clone();

            assert_eq!(reloaded(store), expected, "{change:?} did not survive a reload");
        }
    }

    #[test]
    fn updates_are_clamped_to_usable_values() {
        let mut store = store_with(None);
        store.on_config_change(ConfigChange::OpacityPercent(250)).unwrap();
        store.on_config_change(ConfigChange::Speed(0)).unwrap();

        assert_eq!(store.config().trail_opacity, 1.0);
        assert_eq!(store.config().frames_per_second, 1.0);
    }

    #[test]
    fn reset_removes_blob() {
        let mut store = store_with(Some(r#"{"speed":60}"#));
        assert_eq!(store.reset().unwrap(), RestartRequired);
        assert_eq!(store.storage().get(SETTINGS_KEY), None);
        assert_eq!(reloaded(store), RenderConfig::default());
    }

    #[test]
    fn export_is_verbatim_or_empty_object() {
        assert_eq!(store_with(None).export_blob(), "{}");

        let blob = r#"{ "speed" : 60 }"#;
        assert_eq!(store_with(Some(blob)).export_blob(), blob);
    }

    #[test]
    fn import_replaces_blob() {
        let mut store = store_with(Some(r#"{"speed":60}"#));
        let restart = store.import_blob(r##"{"textColor":"#0000ff","speed":15}"##).unwrap();
        assert_eq!(restart, RestartRequired);

        let config = reloaded(store);
        assert_eq!(config.text_color, HexColor([0, 0, 0xff]));
        assert_eq!(config.frames_per_second, 15.0);
    }

    #[test]
    fn invalid_import_changes_nothing() {
        let blob = r#"{"speed":60}"#;
        let mut store = store_with(Some(blob));
        store.load().unwrap();
        let before = store.config().clone();

        for contents in ["not json", "[1, 2]", "null", ""] {
            let err = store.import_blob(contents).unwrap_err();
            assert!(matches!(err, SettingsError::MalformedImportedFile(_)), "{contents:?}");
        }

        assert_eq!(store.storage().get(SETTINGS_KEY).as_deref(), Some(blob));
        assert_eq!(store.config(), &before);
    }

    #[test]
    fn unreadable_import_file_changes_nothing() {
        let dir = tempdir().unwrap();
        let mut store = store_with(None);
        let missing = dir.path().join("does-not-exist.json");

        assert!(matches!(
            store.import_from_file(&missing),
            Err(SettingsError::Io { .. })
        ));
        assert_eq!(store.storage().get(SETTINGS_KEY), None);
    }

    #[test]
    fn export_and_import_through_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);

        let mut source = store_with(None);
        source.on_config_change(ConfigChange::Speed(24)).unwrap();
        source.export_to_file(&path).unwrap();

        let mut target = store_with(None);
        let _ = target.import_from_file(&path).unwrap();
        assert_eq!(reloaded(target).frames_per_second, 24.0);
        assert_eq!(fs::read_to_string(&path).unwrap(), source.export_blob());
    }
}
