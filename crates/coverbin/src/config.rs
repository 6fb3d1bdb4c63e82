//! Configuration boundary: raw user input, presets, and validation.
//!
//! Input arrives as loosely-typed [`RawParameters`] (from a TOML preset file,
//! `-D key=value` overrides, or both) and leaves as a [`BuildParameters`].
//! Nothing downstream re-checks these values.
//!
//! ```toml
//! [defaults]
//! lid_fit_tolerance = 0.1
//!
//! [[preset]]
//! name = "2x2x3-6x6"
//! grid_x = 2
//! grid_y = 2
//! height = 3
//! divx = 6
//! divy = 6
//! ```

use crate::error::{ConfigError, Result};
use crate::params::{BuildParameters, GripMode, HeightMode, HeightSpec, InteriorStyle, Part};
use crate::profile::{BASE_HEIGHT, FLOOR_THICKNESS};
use serde::{Deserialize, Serialize};

/// Unvalidated parameters; every field optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct RawParameters {
    pub grid_x: Option<i64>,
    pub grid_y: Option<i64>,
    pub height: Option<f64>,
    pub height_mode: Option<String>,
    pub divx: Option<i64>,
    pub divy: Option<i64>,
    pub lid_fit_tolerance: Option<f64>,
    pub grip_mode: Option<String>,
    pub interior_style: Option<String>,
    pub part: Option<String>,
}

/// Option names accepted by [`RawParameters::apply_override`].
pub const KEYS: &[&str] = &[
    "grid_x",
    "grid_y",
    "height",
    "height_mode",
    "divx",
    "divy",
    "lid_fit_tolerance",
    "grip_mode",
    "interior_style",
    "part",
];

fn parse_int(field: &str, value: &str) -> Result<i64> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_float(field: &str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_or<T: std::str::FromStr<Err = ConfigError>>(value: Option<&str>, default: T) -> Result<T> {
    value.map_or(Ok(default), str::parse)
}

impl RawParameters {
    /// Layer `over` on top of `self`; fields set in `over` win.
    pub fn merge(&self, over: &RawParameters) -> RawParameters {
        RawParameters {
            grid_x: over.grid_x.or(self.grid_x),
            grid_y: over.grid_y.or(self.grid_y),
            height: over.height.or(self.height),
            height_mode: over.height_mode.clone().or_else(|| self.height_mode.clone()),
            divx: over.divx.or(self.divx),
            divy: over.divy.or(self.divy),
            lid_fit_tolerance: over.lid_fit_tolerance.or(self.lid_fit_tolerance),
            grip_mode: over.grip_mode.clone().or_else(|| self.grip_mode.clone()),
            interior_style: over
                .interior_style
                .clone()
                .or_else(|| self.interior_style.clone()),
            part: over.part.clone().or_else(|| self.part.clone()),
        }
    }

    /// Apply one `key=value` override.
    pub fn apply_override(&mut self, arg: &str) -> Result<()> {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedOverride(arg.to_string()))?;
        let key = key.trim();
        let value = value.trim().trim_matches('"');

        match key {
            "grid_x" => self.grid_x = Some(parse_int(key, value)?),
            "grid_y" => self.grid_y = Some(parse_int(key, value)?),
            "height" => self.height = Some(parse_float(key, value)?),
            "height_mode" => self.height_mode = Some(value.to_string()),
            "divx" => self.divx = Some(parse_int(key, value)?),
            "divy" => self.divy = Some(parse_int(key, value)?),
            "lid_fit_tolerance" => self.lid_fit_tolerance = Some(parse_float(key, value)?),
            "grip_mode" => self.grip_mode = Some(value.to_string()),
            "interior_style" => self.interior_style = Some(value.to_string()),
            "part" => self.part = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Check every field and fill defaults.
    pub fn validate(&self) -> Result<BuildParameters> {
        let defaults = BuildParameters::default();

        let grid = |field: &'static str, v: Option<i64>, default: u32| -> Result<u32> {
            match v {
                None => Ok(default),
                Some(n) => u32::try_from(n)
                    .ok()
                    .filter(|&n| n >= 1)
                    .ok_or(ConfigError::InvalidGrid { field, value: n }),
            }
        };
        let divisions = |field: &'static str, v: Option<i64>| -> Result<u32> {
            match v {
                None => Ok(0),
                Some(n) => {
                    u32::try_from(n).map_err(|_| ConfigError::NegativeDivisions { field, value: n })
                }
            }
        };

        let grid_x = grid("grid_x", self.grid_x, defaults.grid_x)?;
        let grid_y = grid("grid_y", self.grid_y, defaults.grid_y)?;
        let divx = divisions("divx", self.divx)?;
        let divy = divisions("divy", self.divy)?;

        let tolerance = self.lid_fit_tolerance.unwrap_or(defaults.lid_fit_tolerance);
        if !tolerance.is_finite() {
            return Err(ConfigError::NonFiniteValue("lid_fit_tolerance"));
        }
        if tolerance < 0.0 {
            return Err(ConfigError::NegativeTolerance(tolerance));
        }

        let height = HeightSpec {
            value: self.height.unwrap_or(defaults.height.value),
            mode: parse_or(self.height_mode.as_deref(), HeightMode::Units)?,
        };
        if !height.value.is_finite() {
            return Err(ConfigError::NonFiniteValue("height"));
        }
        let body = height.body_height();
        let minimum = BASE_HEIGHT + FLOOR_THICKNESS;
        if body <= minimum {
            return Err(ConfigError::InvalidHeight { body, minimum });
        }

        Ok(BuildParameters {
            grid_x,
            grid_y,
            height,
            divx,
            divy,
            lid_fit_tolerance: tolerance,
            grip: parse_or(self.grip_mode.as_deref(), GripMode::None)?,
            interior: parse_or(self.interior_style.as_deref(), InteriorStyle::Minimal)?,
            part: parse_or(self.part.as_deref(), Part::Bin)?,
        })
    }
}

/// One named entry of a preset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPreset {
    /// Preset name, used for `--preset` and output file names.
    pub name: String,
    /// Values overriding `[defaults]`.
    #[serde(flatten)]
    pub params: RawParameters,
}

/// A TOML preset file: shared defaults plus named variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetFile {
    /// Values shared by every preset.
    #[serde(default)]
    pub defaults: RawParameters,
    /// Named variants, in file order.
    #[serde(default)]
    pub preset: Vec<NamedPreset>,
}

impl PresetFile {
    /// Parse TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Preset names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.preset.iter().map(|p| p.name.as_str())
    }

    /// Defaults merged with the named preset.
    pub fn resolve(&self, name: &str) -> Result<RawParameters> {
        self.preset
            .iter()
            .find(|p| p.name == name)
            .map(|p| self.defaults.merge(&p.params))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    /// Every preset, merged over the defaults.
    pub fn resolve_all(&self) -> Vec<(String, RawParameters)> {
        self.preset
            .iter()
            .map(|p| (p.name.clone(), self.defaults.merge(&p.params)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_defaults() {
        let params = RawParameters::default().validate().unwrap();
        assert_eq!(params, BuildParameters::default());
    }

    #[test]
    fn test_overrides() {
        let mut raw = RawParameters::default();
        raw.apply_override("grid_x=3").unwrap();
        raw.apply_override("part=\"both-open\"").unwrap();
        raw.apply_override(" lid_fit_tolerance = 0.25 ").unwrap();
        let params = raw.validate().unwrap();
        assert_eq!(params.grid_x, 3);
        assert_eq!(params.part, Part::BothOpen);
        assert_eq!(params.lid_fit_tolerance, 0.25);
    }

    #[test]
    fn test_override_errors() {
        let mut raw = RawParameters::default();
        assert!(matches!(
            raw.apply_override("grid_x"),
            Err(ConfigError::MalformedOverride(_))
        ));
        assert!(matches!(
            raw.apply_override("colour=red"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            raw.apply_override("divx=two"),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let check = |raw: RawParameters| raw.validate().unwrap_err();

        assert!(matches!(
            check(RawParameters {
                grid_x: Some(0),
                ..Default::default()
            }),
            ConfigError::InvalidGrid { field: "grid_x", .. }
        ));
        assert!(matches!(
            check(RawParameters {
                divy: Some(-1),
                ..Default::default()
            }),
            ConfigError::NegativeDivisions { field: "divy", .. }
        ));
        assert!(matches!(
            check(RawParameters {
                lid_fit_tolerance: Some(-0.1),
                ..Default::default()
            }),
            ConfigError::NegativeTolerance(_)
        ));
        assert!(matches!(
            check(RawParameters {
                grip_mode: Some("both".into()),
                ..Default::default()
            }),
            ConfigError::UnknownVariant { .. }
        ));
        assert!(matches!(
            check(RawParameters {
                height: Some(0.5),
                ..Default::default()
            }),
            ConfigError::InvalidHeight { .. }
        ));
        assert!(matches!(
            check(RawParameters {
                height: Some(f64::NAN),
                ..Default::default()
            }),
            ConfigError::NonFiniteValue("height")
        ));
    }

    #[test]
    fn test_large_tolerance_is_accepted() {
        let raw = RawParameters {
            lid_fit_tolerance: Some(3.0),
            ..Default::default()
        };
        assert_eq!(raw.validate().unwrap().lid_fit_tolerance, 3.0);
    }

    #[test]
    fn test_preset_file() {
        let src = r#"
            [defaults]
            lid_fit_tolerance = 0.2
            grip_mode = "single"

            [[preset]]
            name = "small"
            grid_x = 1
            grid_y = 1
            height = 2

            [[preset]]
            name = "sorted"
            divx = 6
            divy = 6
            grip_mode = "full"
        "#;
        let file = PresetFile::from_toml_str(src).unwrap();
        assert_eq!(file.names().collect::<Vec<_>>(), vec!["small", "sorted"]);

        let small = file.resolve("small").unwrap().validate().unwrap();
        assert_eq!((small.grid_x, small.grid_y), (1, 1));
        assert_eq!(small.height.body_height(), 14.0);
        assert_eq!(small.grip, GripMode::Single);
        assert_eq!(small.lid_fit_tolerance, 0.2);

        let sorted = file.resolve("sorted").unwrap().validate().unwrap();
        assert_eq!((sorted.divx, sorted.divy), (6, 6));
        assert_eq!(sorted.grip, GripMode::Full);

        assert!(matches!(
            file.resolve("missing"),
            Err(ConfigError::UnknownPreset(_))
        ));
        assert_eq!(file.resolve_all().len(), 2);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            PresetFile::from_toml_str("[[preset]]\nname = "),
            Err(ConfigError::Toml(_))
        ));
    }
}
