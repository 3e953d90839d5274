use phf::{Map, phf_map};

/// Highest atomic number covered by the built-in tables.
pub const MAX_ELEMENT_NUMBER: u8 = 54;

static ELEMENT_NUMBERS: Map<&'static str, u8> = phf_map! {
    "XX" => 0, "H" => 1, "D" => 1, "T" => 1, "HE" => 2, "LI" => 3, "BE" => 4, "B" => 5,
    "C" => 6, "N" => 7, "O" => 8, "F" => 9, "NE" => 10, "NA" => 11, "MG" => 12,
    "AL" => 13, "SI" => 14, "P" => 15, "S" => 16, "CL" => 17, "AR" => 18, "K" => 19,
    "CA" => 20, "SC" => 21, "TI" => 22, "V" => 23, "CR" => 24, "MN" => 25, "FE" => 26,
    "CO" => 27, "NI" => 28, "CU" => 29, "ZN" => 30, "GA" => 31, "GE" => 32, "AS" => 33,
    "SE" => 34, "BR" => 35, "KR" => 36, "RB" => 37, "SR" => 38, "Y" => 39, "ZR" => 40,
    "NB" => 41, "MO" => 42, "TC" => 43, "RU" => 44, "RH" => 45, "PD" => 46, "AG" => 47,
    "CD" => 48, "IN" => 49, "SN" => 50, "SB" => 51, "TE" => 52, "I" => 53, "XE" => 54,
};

static ELEMENT_SYMBOLS: [&str; MAX_ELEMENT_NUMBER as usize + 1] = [
    "Xx", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P",
    "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh",
    "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe",
];

/// Van der Waals radii in milli-Angstroms, one row per element.
///
/// Columns: Jmol, OpenBabel 2.2, OpenRasmol, OpenBabel 2.1.
#[rustfmt::skip]
static VDW_MILLI_ANGSTROMS: [[u16; 4]; MAX_ELEMENT_NUMBER as usize + 1] = [
    [1000, 1000, 1000, 1000], // XX
    [1200, 1100, 1100, 1200], // H
    [1400, 1400, 2200, 1400], // He
    [1820, 1810, 1220, 2200], // Li
    [1700, 1530, 628, 1900], // Be
    [2080, 1920, 1548, 1800], // B
    [1950, 1700, 1548, 1700], // C
    [1850, 1550, 1400, 1600], // N
    [1700, 1520, 1348, 1550], // O
    [1730, 1470, 1300, 1500], // F
    [1540, 1540, 2020, 1540], // Ne
    [2270, 2270, 2200, 2400], // Na
    [1730, 1730, 1500, 2200], // Mg
    [2050, 1840, 1500, 2100], // Al
    [2100, 2100, 2200, 2100], // Si
    [2080, 1800, 1880, 1950], // P
    [2000, 1800, 1808, 1800], // S
    [1970, 1750, 1748, 1800], // Cl
    [1880, 1880, 2768, 1880], // Ar
    [2750, 2750, 2388, 2800], // K
    [1973, 2310, 1948, 2400], // Ca
    [1700, 2300, 1320, 2300], // Sc
    [1700, 2150, 1948, 2150], // Ti
    [1700, 2050, 1060, 2050], // V
    [1700, 2050, 1128, 2050], // Cr
    [1700, 2050, 1188, 2050], // Mn
    [1700, 2050, 1948, 2050], // Fe
    [1700, 2000, 1128, 2000], // Co
    [1630, 2000, 1240, 2000], // Ni
    [1400, 2000, 1148, 2000], // Cu
    [1390, 2100, 1148, 2100], // Zn
    [1870, 1870, 1548, 2100], // Ga
    [1700, 2110, 3996, 2100], // Ge
    [1850, 1850, 828, 2050], // As
    [1900, 1900, 900, 1900], // Se
    [2100, 1830, 1748, 1900], // Br
    [2020, 2020, 1900, 2020], // Kr
    [1700, 3030, 2648, 2900], // Rb
    [1700, 2490, 2020, 2550], // Sr
    [1700, 2400, 1608, 2400], // Y
    [1700, 2300, 1420, 2300], // Zr
    [1700, 2150, 1328, 2150], // Nb
    [1700, 2100, 1748, 2100], // Mo
    [1700, 2050, 1800, 2050], // Tc
    [1700, 2050, 1200, 2050], // Ru
    [1700, 2000, 1220, 2000], // Rh
    [1630, 2050, 1440, 2050], // Pd
    [1720, 2100, 1548, 2100], // Ag
    [1580, 2200, 1748, 2200], // Cd
    [1930, 2200, 1448, 2200], // In
    [2170, 1930, 1668, 2250], // Sn
    [2200, 2170, 1120, 2200], // Sb
    [2060, 2060, 1260, 2100], // Te
    [2150, 1980, 1748, 2100], // I
    [2160, 2160, 2100, 2160], // Xe
];

/// Covalent bonding radii in milli-Angstroms (OpenBabel), indexed by atomic number.
///
/// Element 0 has no radius and never bonds.
#[rustfmt::skip]
static BONDING_MILLI_ANGSTROMS: [u16; MAX_ELEMENT_NUMBER as usize + 1] = [
    0, 230, 930, 680, 350, 830, 680, 680, 680, 640, 1120, 970, 1100, 1350, 1200, 750,
    1020, 990, 1570, 1330, 990, 1440, 1470, 1330, 1350, 1350, 1340, 1330, 1500, 1520,
    1450, 1220, 1170, 1210, 1220, 1210, 1910, 1470, 1120, 1780, 1560, 1480, 1470, 1350,
    1400, 1450, 1500, 1590, 1690, 1630, 1460, 1460, 1470, 1400, 1980,
];

/// Column of the van der Waals table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum VdwColumn {
    Jmol = 0,
    Babel = 1,
    Rasmol = 2,
    Babel21 = 3,
}

/// Looks up the atomic number for an element symbol, ignoring case and surrounding whitespace.
pub fn element_number(symbol: &str) -> Option<u8> {
    ELEMENT_NUMBERS
        .get(symbol.trim().to_ascii_uppercase().as_str())
        .copied()
}

/// Returns the canonical symbol of an element, or `"Xx"` for numbers outside the table.
pub fn element_symbol(element: u8) -> &'static str {
    ELEMENT_SYMBOLS
        .get(element as usize)
        .copied()
        .unwrap_or(ELEMENT_SYMBOLS[0])
}

/// Tabulated van der Waals radius in Angstroms; unknown elements use the row for element 0.
pub(crate) fn tabulated_vdw_radius(element: u8, column: VdwColumn) -> f64 {
    let row = VDW_MILLI_ANGSTROMS
        .get(element as usize)
        .unwrap_or(&VDW_MILLI_ANGSTROMS[0]);
    f64::from(row[column as usize]) / 1000.0
}

/// Covalent bonding radius in Angstroms; zero for element 0 and unknown elements.
pub fn bonding_radius(element: u8) -> f64 {
    BONDING_MILLI_ANGSTROMS
        .get(element as usize)
        .map_or(0.0, |&r| f64::from(r) / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_number_is_case_insensitive() {
        assert_eq!(element_number("C"), Some(6));
        assert_eq!(element_number("cl"), Some(17));
        assert_eq!(element_number(" Fe "), Some(26));
        assert_eq!(element_number("D"), Some(1));
        assert_eq!(element_number("Qq"), None);
    }

    #[test]
    fn element_symbol_round_trips_known_numbers() {
        for n in 1..=MAX_ELEMENT_NUMBER {
            assert_eq!(element_number(element_symbol(n)), Some(n));
        }
        assert_eq!(element_symbol(200), "Xx");
    }

    #[test]
    fn tabulated_radii_match_reference_values() {
        assert_eq!(tabulated_vdw_radius(1, VdwColumn::Jmol), 1.2);
        assert_eq!(tabulated_vdw_radius(6, VdwColumn::Babel), 1.7);
        assert_eq!(tabulated_vdw_radius(8, VdwColumn::Rasmol), 1.348);
        assert_eq!(tabulated_vdw_radius(16, VdwColumn::Babel21), 1.8);
    }

    #[test]
    fn unknown_element_uses_placeholder_radius() {
        assert_eq!(tabulated_vdw_radius(120, VdwColumn::Jmol), 1.0);
    }

    #[test]
    fn bonding_radii_cover_common_elements() {
        assert_eq!(bonding_radius(1), 0.23);
        assert_eq!(bonding_radius(6), 0.68);
        assert_eq!(bonding_radius(16), 1.02);
        assert_eq!(bonding_radius(0), 0.0);
        assert_eq!(bonding_radius(99), 0.0);
    }
}
