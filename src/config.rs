//! Static description of the planetary system, stored as JSON.
//!
//! The file holds the sun's starting mass and the ordered list of planets:
//!
//! ```json
//! {
//!   "sun": { "mass": 999.0 },
//!   "planets": [
//!     { "name": "planet_1", "density": 5.5, "orbit_radius": 50.0, "speed": 3.123 }
//!   ]
//! }
//! ```
//!
//! Every field is required. A file that cannot be read or parsed aborts
//! startup; there is no partial load.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "planetary_system.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SunConfig {
  pub mass: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlanetConfig {
  pub name: String,
  pub density: f32,
  pub orbit_radius: f32,
  pub speed: f32, // angular speed, see `SimParams::angle_divisor`
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemConfig {
  pub sun: SunConfig,
  pub planets: Vec<PlanetConfig>,
}

#[derive(Debug)]
pub enum ConfigError {
  /// The file could not be read or written.
  Io { path: PathBuf, source: io::Error },
  /// The file is not valid JSON or lacks a required field.
  Parse {
    path: PathBuf,
    source: serde_json::Error,
  },
  /// The system could not be encoded as JSON.
  Serialize {
    path: PathBuf,
    source: serde_json::Error,
  },
  /// The file parsed but describes an impossible system.
  Invalid { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Io { path, source } => {
        write!(f, "cannot access config '{}': {}", path.display(), source)
      }
      ConfigError::Parse { path, source } => {
        write!(f, "malformed config '{}': {}", path.display(), source)
      }
      ConfigError::Serialize { path, source } => {
        write!(f, "cannot encode config for '{}': {}", path.display(), source)
      }
      ConfigError::Invalid { path, reason } => {
        write!(f, "invalid config '{}': {}", path.display(), reason)
      }
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ConfigError::Io { source, .. } => Some(source),
      ConfigError::Parse { source, .. } | ConfigError::Serialize { source, .. } => Some(source),
      ConfigError::Invalid { .. } => None,
    }
  }
}

fn planet(name: &str, density: f32, orbit_radius: f32, speed: f32) -> PlanetConfig {
  PlanetConfig {
    name: name.to_string(),
    density,
    orbit_radius,
    speed,
  }
}

pub fn default_config() -> SystemConfig {
  SystemConfig {
    sun: SunConfig { mass: 999.0 },
    planets: vec![
      planet("planet_1", 5.5, 50.0, 3.123),
      planet("planet_2", 5.0, 80.0, 4.312),
      planet("planet_3", 4.0, 110.0, 5.321),
      planet("planet_4", 3.5, 140.0, 6.123),
      planet("planet_5", 3.0, 170.0, 7.912),
      planet("planet_6", 2.0, 200.0, 8.129),
      planet("planet_7", 1.0, 230.0, 9.192),
    ],
  }
}

/// Overwrites `path` with the built-in system.
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
  let json = serde_json::to_string_pretty(&default_config()).map_err(|source| {
    ConfigError::Serialize {
      path: path.to_path_buf(),
      source,
    }
  })?;
  fs::write(path, json).map_err(|source| ConfigError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Writes the default system if `path` does not exist yet, or always when
/// `reset` is set. Returns whether the file was (re)written.
pub fn ensure_config(path: &Path, reset: bool) -> Result<bool, ConfigError> {
  if reset || !path.exists() {
    write_default(path)?;
    log::info!("wrote default planetary system to {}", path.display());
    return Ok(true);
  }
  Ok(false)
}

pub fn load(path: &Path) -> Result<SystemConfig, ConfigError> {
  let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let config: SystemConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  config.validate().map_err(|reason| ConfigError::Invalid {
    path: path.to_path_buf(),
    reason,
  })?;
  log::info!(
    "loaded {} planets from {}",
    config.planets.len(),
    path.display()
  );
  Ok(config)
}

impl SystemConfig {
  fn validate(&self) -> Result<(), String> {
    if !self.sun.mass.is_finite() || self.sun.mass < 0.0 {
      return Err(format!("sun mass must be a non-negative number, got {}", self.sun.mass));
    }
    let mut names = HashSet::new();
    for p in &self.planets {
      if !names.insert(p.name.as_str()) {
        return Err(format!("planet name '{}' appears more than once", p.name));
      }
      for (field, value) in [
        ("density", p.density),
        ("orbit_radius", p.orbit_radius),
        ("speed", p.speed),
      ] {
        if !value.is_finite() {
          return Err(format!("planet '{}' has non-finite {}", p.name, field));
        }
      }
      if p.density < 0.0 || p.orbit_radius < 0.0 {
        return Err(format!(
          "planet '{}' needs non-negative density and orbit_radius",
          p.name
        ));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("planetary-config-{}-{}.json", std::process::id(), name))
  }

  #[test]
  fn default_system_has_sun_and_seven_planets() {
    let config = default_config();
    assert_eq!(config.sun.mass, 999.0);
    assert_eq!(config.planets.len(), 7);
    assert_eq!(config.planets[0].name, "planet_1");
    assert_eq!(config.planets[6].orbit_radius, 230.0);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn written_default_loads_back() {
    let path = scratch("roundtrip");
    write_default(&path).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(loaded, default_config());
    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn ensure_config_keeps_existing_file_unless_reset() {
    let path = scratch("ensure");
    let _ = fs::remove_file(&path);
    assert!(ensure_config(&path, false).unwrap());

    let mut custom = default_config();
    custom.sun.mass = 1.0;
    fs::write(&path, serde_json::to_string(&custom).unwrap()).unwrap();
    assert!(!ensure_config(&path, false).unwrap());
    assert_eq!(load(&path).unwrap().sun.mass, 1.0);

    assert!(ensure_config(&path, true).unwrap());
    assert_eq!(load(&path).unwrap().sun.mass, 999.0);
    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn write_into_missing_directory_is_io_error() {
    let path = scratch("no-such-dir").join("planetary_system.json");
    let err = write_default(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().starts_with("cannot access config"));
  }

  #[test]
  fn encoding_failure_is_not_reported_as_malformed_file() {
    let source = serde_json::from_str::<SunConfig>("{}").unwrap_err();
    let err = ConfigError::Serialize {
      path: PathBuf::from("planetary_system.json"),
      source,
    };
    let message = err.to_string();
    assert!(message.starts_with("cannot encode config"));
    assert!(!message.contains("malformed"));
    assert!(std::error::Error::source(&err).is_some());
  }

  #[test]
  fn missing_file_is_io_error() {
    let err = load(&scratch("does-not-exist")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
  }

  #[test]
  fn missing_field_is_parse_error() {
    let path = scratch("missing-field");
    fs::write(
      &path,
      r#"{"sun": {"mass": 1}, "planets": [{"name": "a", "density": 1, "speed": 2}]}"#,
    )
    .unwrap();
    let err = load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("orbit_radius"));
    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn duplicate_planet_names_are_rejected() {
    let path = scratch("duplicate");
    let mut config = default_config();
    config.planets[1].name = "planet_1".to_string();
    fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
    let err = load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
    fs::remove_file(&path).unwrap();
  }
}
