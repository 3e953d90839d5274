use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Electrostatic prefactor of the hydrogen-bond energy, in kcal·Å/mol.
///
/// Partial charges of 0.42e and 0.20e on the C=O and N-H groups times 332.
pub const HBOND_ENERGY_CONSTANT: f64 = -332.0 * 0.42 * 0.2;

/// Provenance of a hydrogen bond; calculated protein bonds record the sequence offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HydrogenBondKind {
    #[default]
    Regular,
    Calculated,
    Plus2,
    Plus3,
    Plus4,
    Plus5,
    Minus3,
    Minus4,
    Nucleotide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    Quintuple,
    Sextuple,
    /// Delocalized aromatic bond whose Kekulé assignment is unknown.
    Aromatic,
    /// Partial bond drawn as `whole` solid lines plus a dashed `fraction` pattern.
    Partial { whole: u8, fraction: u8 },
    Unspecified,
    Hydrogen(HydrogenBondKind),
    /// Non-chemical rendering support.
    Strut,
}

impl BondOrder {
    /// Integer bond order for covalent orders with a definite multiplicity.
    pub fn multiplicity(self) -> Option<u8> {
        match self {
            Self::Single => Some(1),
            Self::Double => Some(2),
            Self::Triple => Some(3),
            Self::Quadruple => Some(4),
            Self::Quintuple => Some(5),
            Self::Sextuple => Some(6),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid bond order string: '{0}'")]
pub struct ParseBondOrderError(pub String);

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let order = match normalized.as_str() {
            "1" | "s" | "single" => Self::Single,
            "2" | "d" | "double" => Self::Double,
            "3" | "t" | "triple" => Self::Triple,
            "4" | "quadruple" => Self::Quadruple,
            "5" | "quintuple" => Self::Quintuple,
            "6" | "sextuple" => Self::Sextuple,
            "1.5" | "a" | "ar" | "aromatic" => Self::Aromatic,
            "h" | "hbond" | "hydrogen" => Self::Hydrogen(HydrogenBondKind::Regular),
            "strut" | "struts" => Self::Strut,
            "?" | "unspecified" => Self::Unspecified,
            other => match other.strip_prefix("partial") {
                Some(rest) => parse_partial(rest.trim())
                    .ok_or_else(|| ParseBondOrderError(s.to_string()))?,
                None => return Err(ParseBondOrderError(s.to_string())),
            },
        };
        Ok(order)
    }
}

fn parse_partial(text: &str) -> Option<BondOrder> {
    let (whole, fraction) = text.split_once('.')?;
    Some(BondOrder::Partial {
        whole: whole.parse().ok()?,
        fraction: fraction.parse().ok()?,
    })
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Double => f.write_str("double"),
            Self::Triple => f.write_str("triple"),
            Self::Quadruple => f.write_str("quadruple"),
            Self::Quintuple => f.write_str("quintuple"),
            Self::Sextuple => f.write_str("sextuple"),
            Self::Aromatic => f.write_str("aromatic"),
            Self::Partial { whole, fraction } => write!(f, "partial {whole}.{fraction}"),
            Self::Unspecified => f.write_str("unspecified"),
            Self::Hydrogen(_) => f.write_str("hbond"),
            Self::Strut => f.write_str("strut"),
        }
    }
}

/// Orthogonal markers carried next to the bond order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BondFlags {
    pub aromatic: bool,
    /// Both endpoints are sulfur (disulfide bridges).
    pub sulfur: bool,
    /// Created by the current editing operation rather than loaded.
    pub new: bool,
}

/// Edge of a bond's visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Shown,
    Hidden,
}

/// A connection between two atoms.
///
/// The order and flags are the only source of truth for the bond's chemistry;
/// every predicate is derived from them on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    atom1: usize,
    atom2: usize,
    order: BondOrder,
    flags: BondFlags,
    width: u16,
    visible: bool,
    energy: f64,
}

impl Bond {
    /// Creates a hidden bond of the given order between two atom indices.
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
            flags: BondFlags {
                aromatic: order == BondOrder::Aromatic,
                ..BondFlags::default()
            },
            width: 0,
            visible: false,
            energy: 0.0,
        }
    }

    /// Creates an aromatic bond with a resolved Kekulé order (usually single or double).
    pub fn aromatic(atom1: usize, atom2: usize, kekule_order: BondOrder) -> Self {
        let mut bond = Self::new(atom1, atom2, kekule_order);
        bond.flags.aromatic = true;
        bond
    }

    /// Creates a hydrogen bond carrying its precomputed energy in kcal/mol.
    pub fn hydrogen(atom1: usize, atom2: usize, kind: HydrogenBondKind, energy: f64) -> Self {
        let mut bond = Self::new(atom1, atom2, BondOrder::Hydrogen(kind));
        bond.energy = energy;
        bond
    }

    pub fn atom_indices(&self) -> (usize, usize) {
        (self.atom1, self.atom2)
    }

    pub fn contains(&self, atom_index: usize) -> bool {
        self.atom1 == atom_index || self.atom2 == atom_index
    }

    /// Returns the partner of `atom_index`, or `None` if it is not an endpoint.
    pub fn other_atom(&self, atom_index: usize) -> Option<usize> {
        if atom_index == self.atom1 {
            Some(self.atom2)
        } else if atom_index == self.atom2 {
            Some(self.atom1)
        } else {
            None
        }
    }

    pub fn order(&self) -> BondOrder {
        self.order
    }

    pub fn flags(&self) -> BondFlags {
        self.flags
    }

    /// Replaces the order; the sulfur and new markers survive, aromaticity follows the new order.
    pub fn set_order(&mut self, order: BondOrder) {
        self.order = order;
        self.flags.aromatic = order == BondOrder::Aromatic;
    }

    pub(crate) fn set_sulfur(&mut self, sulfur: bool) {
        self.flags.sulfur = sulfur;
    }

    pub fn mark_new(&mut self) {
        self.flags.new = true;
    }

    pub fn clear_new(&mut self) {
        self.flags.new = false;
    }

    pub fn is_covalent(&self) -> bool {
        !matches!(self.order, BondOrder::Hydrogen(_) | BondOrder::Strut)
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self.order, BondOrder::Hydrogen(_))
    }

    pub fn is_aromatic(&self) -> bool {
        self.flags.aromatic
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.order, BondOrder::Partial { .. })
    }

    pub fn is_sulfur(&self) -> bool {
        self.flags.sulfur
    }

    pub fn is_new(&self) -> bool {
        self.flags.new
    }

    /// Contribution of this bond to each endpoint's valence.
    pub fn valence(&self) -> u8 {
        if !self.is_covalent() {
            return 0;
        }
        match self.order {
            BondOrder::Partial { .. } | BondOrder::Aromatic | BondOrder::Unspecified => 1,
            order => order.multiplicity().unwrap_or(1),
        }
    }

    /// Hydrogen-bond energy in kcal/mol; 0 for every other bond.
    pub fn energy(&self) -> f64 {
        if self.is_hydrogen() { self.energy } else { 0.0 }
    }

    /// Rendered width in milli-Angstroms; 0 means not drawn.
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Sets the rendered width and reports a visibility transition, if any.
    ///
    /// Only a change between zero and non-zero width produces a transition, so
    /// repeated calls with the same kind of width never report twice.
    pub fn set_width(&mut self, width: u16) -> Option<VisibilityChange> {
        self.width = width;
        let is_visible = width != 0;
        if is_visible == self.visible {
            return None;
        }
        self.visible = is_visible;
        Some(if is_visible {
            VisibilityChange::Shown
        } else {
            VisibilityChange::Hidden
        })
    }
}

/// Energy of a backbone hydrogen bond from its four interatomic distances.
///
/// `d_ah`: acceptor–hydrogen, `d_ad`: acceptor–donor, `d_cd`: carbonyl carbon–donor,
/// `d_ch`: carbonyl carbon–hydrogen. Distances are in Angstroms and must be non-zero;
/// the result is in kcal/mol, negative for a stabilizing bond.
#[inline]
pub fn hydrogen_bond_energy(d_ah: f64, d_ad: f64, d_cd: f64, d_ch: f64) -> f64 {
    HBOND_ENERGY_CONSTANT * (1.0 / d_ah - 1.0 / d_ad + 1.0 / d_cd - 1.0 / d_ch)
}

/// Same as [`hydrogen_bond_energy`], measured from coordinates.
///
/// Returns `None` if any two of the involved atoms coincide.
pub fn hydrogen_bond_energy_from_positions(
    acceptor: &Point3<f64>,
    carbonyl: &Point3<f64>,
    donor: &Point3<f64>,
    hydrogen: &Point3<f64>,
) -> Option<f64> {
    let distances = [
        nalgebra::distance(acceptor, hydrogen),
        nalgebra::distance(acceptor, donor),
        nalgebra::distance(carbonyl, donor),
        nalgebra::distance(carbonyl, hydrogen),
    ];
    if distances.iter().any(|&d| d < 1e-6) {
        return None;
    }
    let [d_ah, d_ad, d_cd, d_ch] = distances;
    Some(hydrogen_bond_energy(d_ah, d_ad, d_cd, d_ch))
}
