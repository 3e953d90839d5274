use super::elements::element_number;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UserRadiusRecord {
    element: String,
    radius: f64,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Unknown element symbol '{symbol}' in '{path}'")]
    UnknownElement { path: String, symbol: String },
    #[error("Invalid radius {radius} for element '{symbol}' in '{path}'")]
    InvalidRadius {
        path: String,
        symbol: String,
        radius: f64,
    },
}

/// Per-element van der Waals radii supplied by the user, in Angstroms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserVdwRadii {
    radii: HashMap<u8, f64>,
}

impl UserVdwRadii {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, element: u8, radius: f64) {
        self.radii.insert(element, radius);
    }

    pub fn get(&self, element: u8) -> Option<f64> {
        self.radii.get(&element).copied()
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Loads radii from a CSV file with an `element,radius` header.
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let source = path.to_string_lossy().to_string();
        let reader = csv::Reader::from_path(path).map_err(|e| ParamLoadError::Csv {
            path: source.clone(),
            source: e,
        })?;
        Self::from_csv_reader(reader, &source)
    }

    /// Reads radii from any CSV source; `source` only labels errors.
    pub fn from_reader<R: io::Read>(reader: R, source: &str) -> Result<Self, ParamLoadError> {
        Self::from_csv_reader(csv::Reader::from_reader(reader), source)
    }

    fn from_csv_reader<R: io::Read>(
        mut reader: csv::Reader<R>,
        source: &str,
    ) -> Result<Self, ParamLoadError> {
        let mut radii = Self::new();
        for result in reader.deserialize::<UserRadiusRecord>() {
            let record = result.map_err(|e| ParamLoadError::Csv {
                path: source.to_string(),
                source: e,
            })?;
            let element =
                element_number(&record.element).ok_or_else(|| ParamLoadError::UnknownElement {
                    path: source.to_string(),
                    symbol: record.element.clone(),
                })?;
            if !record.radius.is_finite() || record.radius <= 0.0 {
                return Err(ParamLoadError::InvalidRadius {
                    path: source.to_string(),
                    symbol: record.element,
                    radius: record.radius,
                });
            }
            radii.set(element, record.radius);
        }
        debug!(count = radii.len(), source, "Loaded user van der Waals radii.");
        Ok(radii)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn load_succeeds_with_valid_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("radii.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "element,radius\nC,1.9\nn,1.6\nFe,2.1").unwrap();

        let radii = UserVdwRadii::load(&file_path).unwrap();
        assert_eq!(radii.len(), 3);
        assert_eq!(radii.get(6), Some(1.9));
        assert_eq!(radii.get(7), Some(1.6));
        assert_eq!(radii.get(26), Some(2.1));
        assert_eq!(radii.get(8), None);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = UserVdwRadii::load(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(ParamLoadError::Csv { .. })));
    }

    #[test]
    fn from_reader_rejects_unknown_element() {
        let data = "element,radius\nZz,1.0\n";
        let result = UserVdwRadii::from_reader(data.as_bytes(), "inline");
        match result {
            Err(ParamLoadError::UnknownElement { symbol, path }) => {
                assert_eq!(symbol, "Zz");
                assert_eq!(path, "inline");
            }
            other => panic!("expected UnknownElement, got {other:?}"),
        }
    }

    #[test]
    fn from_reader_rejects_non_positive_radius() {
        let data = "element,radius\nO,-1.0\n";
        let result = UserVdwRadii::from_reader(data.as_bytes(), "inline");
        assert!(matches!(result, Err(ParamLoadError::InvalidRadius { .. })));
    }

    #[test]
    fn from_reader_rejects_malformed_rows() {
        let data = "element,radius\nO,wide\n";
        let result = UserVdwRadii::from_reader(data.as_bytes(), "inline");
        assert!(matches!(result, Err(ParamLoadError::Csv { .. })));
    }
}
