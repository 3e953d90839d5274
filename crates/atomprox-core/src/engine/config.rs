use crate::core::radius::policy::{
    DEFAULT_VDW_SEARCH_FACTOR, DEFAULT_VDW_SEARCH_OFFSET, VdwSearchMargins,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration file {path:?} is invalid: {source}")]
    Invalid { path: PathBuf, source: ConfigError },
}

/// Options fixed for the lifetime of a proximity cursor.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// greater_only = true
/// zero_based = false
///
/// [vdw_margins]
/// factor = 4.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Only report atoms whose index is greater than the bound self atom.
    pub greater_only: bool,
    /// Report indices relative to the first atom of the bound model.
    pub zero_based: bool,
    /// Restrict the partition to the half space `x >= center.x`.
    pub hemisphere_only: bool,
    /// Never reuse a partition cursor between model bindings.
    pub thread_safe: bool,
    pub vdw_margins: VdwSearchMargins,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_margin("vdw_margins.factor", self.vdw_margins.factor)?;
        check_margin("vdw_margins.offset", self.vdw_margins.offset)
    }

    pub fn from_toml_str(content: &str, source: &Path) -> Result<Self, ConfigLoadError> {
        parse_toml(content, source, Self::validate)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let config = load_toml(path, Self::validate)?;
        debug!(path = %path.display(), ?config, "Loaded search configuration.");
        Ok(config)
    }
}

pub const DEFAULT_BOND_TOLERANCE: f64 = 0.45;
pub const DEFAULT_MIN_BOND_DISTANCE: f64 = 0.4;
pub const DEFAULT_MAX_BONDS_PER_ATOM: usize = 20;

/// Distance rules for deriving covalent bonds from coordinates.
///
/// Two atoms bond when `min_distance <= d <= r1 + r2 + tolerance`, where `r1` and `r2`
/// are the elements' bonding radii.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BondingConfig {
    pub tolerance: f64,
    pub min_distance: f64,
    /// Atoms already holding more covalent bonds than this get no new ones.
    pub max_bonds_per_atom: usize,
}

impl Default for BondingConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_BOND_TOLERANCE,
            min_distance: DEFAULT_MIN_BOND_DISTANCE,
            max_bonds_per_atom: DEFAULT_MAX_BONDS_PER_ATOM,
        }
    }
}

impl BondingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("tolerance", self.tolerance)?;
        check_non_negative("min_distance", self.min_distance)
    }

    pub fn from_toml_str(content: &str, source: &Path) -> Result<Self, ConfigLoadError> {
        parse_toml(content, source, Self::validate)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let config = load_toml(path, Self::validate)?;
        debug!(path = %path.display(), ?config, "Loaded bonding configuration.");
        Ok(config)
    }
}

/// Geometry limits for hydrogen-bond detection.
///
/// With explicit hydrogens the hydrogen-acceptor distance is tested; without them the
/// donor-acceptor distance of the heavy atoms is.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HydrogenBondConfig {
    pub max_hydrogen_acceptor_distance: f64,
    pub min_hydrogen_acceptor_distance: f64,
    pub max_donor_acceptor_distance: f64,
    pub min_donor_acceptor_distance: f64,
    /// Smallest allowed angle between a bonded neighbour, the atom, and its partner.
    /// Zero disables the angle test.
    pub min_attached_angle_degrees: f64,
}

impl Default for HydrogenBondConfig {
    fn default() -> Self {
        Self {
            max_hydrogen_acceptor_distance: 2.5,
            min_hydrogen_acceptor_distance: 1.0,
            max_donor_acceptor_distance: 3.25,
            min_donor_acceptor_distance: 2.5,
            min_attached_angle_degrees: 90.0,
        }
    }
}

impl HydrogenBondConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("min_hydrogen_acceptor_distance", self.min_hydrogen_acceptor_distance)?;
        check_non_negative("min_donor_acceptor_distance", self.min_donor_acceptor_distance)?;
        check_margin("max_hydrogen_acceptor_distance", self.max_hydrogen_acceptor_distance)?;
        check_margin("max_donor_acceptor_distance", self.max_donor_acceptor_distance)?;
        if !(0.0..=180.0).contains(&self.min_attached_angle_degrees) {
            return Err(ConfigError::InvalidParameter {
                name: "min_attached_angle_degrees",
                value: self.min_attached_angle_degrees,
                reason: "must lie between 0 and 180 degrees",
            });
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str, source: &Path) -> Result<Self, ConfigLoadError> {
        parse_toml(content, source, Self::validate)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let config = load_toml(path, Self::validate)?;
        debug!(path = %path.display(), ?config, "Loaded hydrogen-bond configuration.");
        Ok(config)
    }
}

fn parse_toml<T: DeserializeOwned>(
    content: &str,
    source: &Path,
    validate: impl FnOnce(&T) -> Result<(), ConfigError>,
) -> Result<T, ConfigLoadError> {
    let config: T = toml::from_str(content).map_err(|e| ConfigLoadError::Toml {
        path: source.to_path_buf(),
        source: e,
    })?;
    validate(&config).map_err(|e| ConfigLoadError::Invalid {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(config)
}

fn load_toml<T: DeserializeOwned>(
    path: &Path,
    validate: impl FnOnce(&T) -> Result<(), ConfigError>,
) -> Result<T, ConfigLoadError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_toml(&content, path, validate)
}

fn check_margin(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be a finite positive number",
        })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be a finite non-negative number",
        })
    }
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    greater_only: Option<bool>,
    zero_based: Option<bool>,
    hemisphere_only: Option<bool>,
    thread_safe: Option<bool>,
    vdw_search_factor: Option<f64>,
    vdw_search_offset: Option<f64>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn greater_only(mut self, enabled: bool) -> Self {
        self.greater_only = Some(enabled);
        self
    }
    pub fn zero_based(mut self, enabled: bool) -> Self {
        self.zero_based = Some(enabled);
        self
    }
    pub fn hemisphere_only(mut self, enabled: bool) -> Self {
        self.hemisphere_only = Some(enabled);
        self
    }
    pub fn thread_safe(mut self, enabled: bool) -> Self {
        self.thread_safe = Some(enabled);
        self
    }
    pub fn vdw_search_factor(mut self, factor: f64) -> Self {
        self.vdw_search_factor = Some(factor);
        self
    }
    pub fn vdw_search_offset(mut self, offset: f64) -> Self {
        self.vdw_search_offset = Some(offset);
        self
    }

    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let config = SearchConfig {
            greater_only: self.greater_only.unwrap_or(false),
            zero_based: self.zero_based.unwrap_or(false),
            hemisphere_only: self.hemisphere_only.unwrap_or(false),
            thread_safe: self.thread_safe.unwrap_or(false),
            vdw_margins: VdwSearchMargins {
                factor: self.vdw_search_factor.unwrap_or(DEFAULT_VDW_SEARCH_FACTOR),
                offset: self.vdw_search_offset.unwrap_or(DEFAULT_VDW_SEARCH_OFFSET),
            },
        };
        config.validate()?;
        Ok(config)
    }
}
