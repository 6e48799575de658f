//! Preset files: the full parameter set stored as JSON.
//!
//! A preset is a serialized [`SynthParams`]; missing fields fall back to
//! their defaults and every loaded value is clamped to its documented
//! range. `armonico params --json` prints a complete default preset to
//! start from.

use armonico_synth::SynthParams;
use std::path::Path;

/// Errors loading or applying presets.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    /// Preset file could not be read.
    #[error("preset file error: {0}")]
    Io(#[from] std::io::Error),

    /// Preset file is not valid JSON for the parameter set.
    #[error("preset parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// An override was not of the form `id=value`.
    #[error("override `{0}` is not of the form id=value")]
    MalformedOverride(String),

    /// An override named a parameter that does not exist.
    #[error("unknown parameter `{0}`")]
    UnknownParam(String),

    /// An override value did not parse as a number.
    #[error("invalid value `{value}` for `{id}`")]
    BadValue {
        /// Parameter id.
        id: String,
        /// Offending value text.
        value: String,
    },
}

/// Load a preset file, falling back to defaults for absent fields.
pub fn load(path: &Path) -> Result<SynthParams, PresetError> {
    let text = std::fs::read_to_string(path)?;
    let mut params: SynthParams = serde_json::from_str(&text)?;
    params.clamp_ranges();
    Ok(params)
}

/// Apply `id=value` overrides on top of a parameter set.
pub fn apply_overrides(params: &mut SynthParams, overrides: &[String]) -> Result<(), PresetError> {
    for pair in overrides {
        let Some((id, value)) = pair.split_once('=') else {
            return Err(PresetError::MalformedOverride(pair.clone()));
        };
        let id = id.trim();
        let v: f32 = value
            .trim()
            .parse()
            .map_err(|_| PresetError::BadValue {
                id: id.to_string(),
                value: value.trim().to_string(),
            })?;
        if !params.set_by_id(id, v) {
            return Err(PresetError::UnknownParam(id.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn default_preset_round_trips() {
        let params = SynthParams::default();
        let json = serde_json::to_string_pretty(&params).unwrap();
        let f = write_temp(&json);
        let loaded = load(f.path()).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn partial_preset_fills_defaults() {
        let f = write_temp(r#"{ "overtones": 42, "volume": 0.25 }"#);
        let loaded = load(f.path()).unwrap();
        assert_eq!(loaded.overtones, 42);
        assert_eq!(loaded.volume, 0.25);
        assert_eq!(loaded.bend, SynthParams::default().bend);
    }

    #[test]
    fn out_of_range_preset_values_are_clamped() {
        let f = write_temp(r#"{ "volume": 9.0, "bend": -500.0 }"#);
        let loaded = load(f.path()).unwrap();
        assert_eq!(loaded.volume, 1.0);
        assert_eq!(loaded.bend, -64.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let f = write_temp("{ not json");
        assert!(matches!(load(f.path()), Err(PresetError::Json(_))));
    }

    #[test]
    fn overrides_apply_in_order() {
        let mut params = SynthParams::default();
        let overrides = vec!["volume=0.8".to_string(), "overtones=100".to_string()];
        apply_overrides(&mut params, &overrides).unwrap();
        assert_eq!(params.volume, 0.8);
        assert_eq!(params.overtones, 100);
    }

    #[test]
    fn override_errors_name_the_problem() {
        let mut params = SynthParams::default();
        assert!(matches!(
            apply_overrides(&mut params, &["volume".to_string()]),
            Err(PresetError::MalformedOverride(_))
        ));
        assert!(matches!(
            apply_overrides(&mut params, &["nope=1".to_string()]),
            Err(PresetError::UnknownParam(_))
        ));
        assert!(matches!(
            apply_overrides(&mut params, &["volume=loud".to_string()]),
            Err(PresetError::BadValue { .. })
        ));
    }
}
