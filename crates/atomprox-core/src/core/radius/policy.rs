use super::elements::{VdwColumn, tabulated_vdw_radius};
use super::params::UserVdwRadii;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Source of the van der Waals radius tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VdwClass {
    /// Jmol defaults, tuned for structures without explicit hydrogens.
    #[default]
    Jmol,
    /// OpenBabel 2.2 values.
    Babel,
    /// OpenRasmol values; noticeably tighter than the others.
    Rasmol,
    /// OpenBabel 2.1 values.
    Babel21,
    /// User-defined per-element radii, falling back to [`VdwClass::Jmol`].
    User,
    /// Whatever the atom's model declares as its default class.
    Auto,
}

impl VdwClass {
    pub(crate) fn column(self) -> Option<VdwColumn> {
        match self {
            Self::Jmol => Some(VdwColumn::Jmol),
            Self::Babel => Some(VdwColumn::Babel),
            Self::Rasmol => Some(VdwColumn::Rasmol),
            Self::Babel21 => Some(VdwColumn::Babel21),
            Self::User | Self::Auto => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid van der Waals class: '{0}'")]
pub struct ParseVdwClassError(pub String);

impl FromStr for VdwClass {
    type Err = ParseVdwClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jmol" => Ok(Self::Jmol),
            "babel" | "openbabel" => Ok(Self::Babel),
            "rasmol" => Ok(Self::Rasmol),
            "babel21" => Ok(Self::Babel21),
            "user" => Ok(Self::User),
            "auto" => Ok(Self::Auto),
            _ => Err(ParseVdwClassError(s.to_string())),
        }
    }
}

impl fmt::Display for VdwClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jmol => "jmol",
            Self::Babel => "babel",
            Self::Rasmol => "rasmol",
            Self::Babel21 => "babel21",
            Self::User => "user",
            Self::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Resolves the van der Waals radius (Angstroms) of an element under a concrete class.
///
/// `Auto` must be resolved by the caller against the owning model; if it reaches
/// this point it is treated as [`VdwClass::Jmol`].
pub fn vdw_radius(element: u8, class: VdwClass, user: &UserVdwRadii) -> f64 {
    match class {
        VdwClass::User => user
            .get(element)
            .unwrap_or_else(|| tabulated_vdw_radius(element, VdwColumn::Jmol)),
        other => tabulated_vdw_radius(element, other.column().unwrap_or(VdwColumn::Jmol)),
    }
}

/// Provides per-atom van der Waals radii to the proximity engine.
pub trait VdwRadiusSource {
    /// Returns the radius of the atom with global index `atom_index`, or `None`
    /// if no such atom exists.
    fn vdw_radius(&self, atom_index: usize, class: VdwClass) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadiusKind {
    /// The policy value replaces the radius.
    Fixed,
    /// The policy value is added to the radius.
    Offset,
    /// The radius is scaled by the policy value.
    Factor,
}

/// Margins used to widen the search region of a van der Waals query.
///
/// The partition is searched before any per-pair radius is known, so the bound
/// has to cover the largest plausible sum of two radii. The defaults assume no
/// radius exceeds 2.5 Angstroms.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VdwSearchMargins {
    /// Multiplier applied to the policy value of a [`RadiusKind::Factor`] policy.
    pub factor: f64,
    /// Distance added to the policy value of a [`RadiusKind::Offset`] policy.
    pub offset: f64,
}

pub const DEFAULT_VDW_SEARCH_FACTOR: f64 = 5.0;
pub const DEFAULT_VDW_SEARCH_OFFSET: f64 = 5.0;

impl Default for VdwSearchMargins {
    fn default() -> Self {
        Self {
            factor: DEFAULT_VDW_SEARCH_FACTOR,
            offset: DEFAULT_VDW_SEARCH_OFFSET,
        }
    }
}

/// Rule for deriving the comparison radius of a proximity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusPolicy {
    pub kind: RadiusKind,
    pub value: f64,
    /// When set, the threshold is computed per atom pair from this class of radii.
    pub vdw_class: Option<VdwClass>,
}

impl RadiusPolicy {
    pub fn fixed(value: f64) -> Self {
        Self {
            kind: RadiusKind::Fixed,
            value,
            vdw_class: None,
        }
    }

    pub fn offset(value: f64) -> Self {
        Self {
            kind: RadiusKind::Offset,
            value,
            vdw_class: None,
        }
    }

    pub fn factor(value: f64) -> Self {
        Self {
            kind: RadiusKind::Factor,
            value,
            vdw_class: None,
        }
    }

    /// Makes the policy van der Waals aware, using radii from `class`.
    pub fn with_vdw(mut self, class: VdwClass) -> Self {
        self.vdw_class = Some(class);
        self
    }

    pub fn is_vdw(&self) -> bool {
        self.vdw_class.is_some()
    }

    /// Applies the policy to a single scalar radius.
    pub fn apply_to(&self, radius: f64) -> f64 {
        match self.kind {
            RadiusKind::Fixed => self.value,
            RadiusKind::Offset => radius + self.value,
            RadiusKind::Factor => radius * self.value,
        }
    }

    /// Conservative search radius for a van der Waals query.
    pub fn search_radius(&self, margins: &VdwSearchMargins) -> f64 {
        match self.kind {
            RadiusKind::Offset => margins.offset + self.value,
            RadiusKind::Factor => margins.factor * self.value,
            RadiusKind::Fixed => margins.offset,
        }
    }

    /// Acceptance distance for a pair of atoms with radii `r_self` and `r_other`.
    ///
    /// An offset applies to both atoms, hence it is counted twice.
    pub fn pair_threshold(&self, r_self: f64, r_other: f64) -> f64 {
        let sum = r_self + r_other;
        match self.kind {
            RadiusKind::Offset => sum + 2.0 * self.value,
            RadiusKind::Factor => sum * self.value,
            RadiusKind::Fixed => sum,
        }
    }

    #[inline]
    pub fn pair_threshold_squared(&self, r_self: f64, r_other: f64) -> f64 {
        let d = self.pair_threshold(r_self, r_other);
        d * d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn apply_to_transforms_scalar_radius_per_kind() {
        assert_eq!(RadiusPolicy::fixed(2.0).apply_to(7.0), 2.0);
        assert_eq!(RadiusPolicy::offset(0.5).apply_to(3.0), 3.5);
        assert_eq!(RadiusPolicy::factor(1.5).apply_to(2.0), 3.0);
    }

    #[test]
    fn factor_pair_threshold_scales_radius_sum() {
        let policy = RadiusPolicy::factor(1.2).with_vdw(VdwClass::Jmol);
        let threshold = policy.pair_threshold_squared(1.7, 1.5);
        assert!((threshold - (1.2f64 * 3.2).powi(2)).abs() < TOLERANCE);
    }

    #[test]
    fn offset_pair_threshold_counts_offset_for_both_atoms() {
        let policy = RadiusPolicy::offset(0.25).with_vdw(VdwClass::Babel);
        assert!((policy.pair_threshold(1.0, 1.5) - 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn fixed_pair_threshold_is_plain_radius_sum() {
        let policy = RadiusPolicy::fixed(9.0).with_vdw(VdwClass::Jmol);
        assert_eq!(policy.pair_threshold(1.2, 1.7), 1.2 + 1.7);
    }

    #[test]
    fn search_radius_uses_margins() {
        let margins = VdwSearchMargins::default();
        assert_eq!(RadiusPolicy::factor(1.0).search_radius(&margins), 5.0);
        assert_eq!(RadiusPolicy::offset(0.5).search_radius(&margins), 5.5);
        assert_eq!(RadiusPolicy::fixed(0.0).search_radius(&margins), 5.0);

        let tight = VdwSearchMargins {
            factor: 4.0,
            offset: 3.0,
        };
        assert_eq!(RadiusPolicy::factor(0.5).search_radius(&tight), 2.0);
        assert_eq!(RadiusPolicy::offset(1.0).search_radius(&tight), 4.0);
    }

    #[test]
    fn user_class_falls_back_to_jmol_table() {
        let mut user = UserVdwRadii::new();
        user.set(6, 2.0);
        assert_eq!(vdw_radius(6, VdwClass::User, &user), 2.0);
        assert_eq!(vdw_radius(8, VdwClass::User, &user), 1.7);
        assert_eq!(vdw_radius(8, VdwClass::Babel, &user), 1.52);
    }

    #[test]
    fn vdw_class_parses_and_displays() {
        assert_eq!("Rasmol".parse::<VdwClass>(), Ok(VdwClass::Rasmol));
        assert_eq!("openbabel".parse::<VdwClass>(), Ok(VdwClass::Babel));
        assert_eq!(VdwClass::Babel21.to_string(), "babel21");
        assert!("ionic".parse::<VdwClass>().is_err());
    }
}
