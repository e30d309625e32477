//! Encoding Schemes - one capability, four variants, registered by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigError;

pub mod caesar;
pub mod direct_word;
pub mod geo;
pub mod grid;

pub use caesar::CaesarCipher;
pub use direct_word::DirectWord;
pub use geo::{GeoCoordinate, Place};
pub use grid::{CoordinateGrid, GridCell, LETTER_TO_COORDINATE};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemeError {
    #[error("Character {0:?} is outside the scheme alphabet")]
    Encoding(char),

    #[error("Unknown coordinate: row {row}, column {col}")]
    UnknownCoordinate { row: u8, col: u8 },

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Scheme {scheme} cannot read a {found} payload")]
    PayloadMismatch {
        scheme: &'static str,
        found: &'static str,
    },

    #[error("Manual review required: {0:?}")]
    ManualReviewRequired(String),
}

impl SchemeError {
    pub fn payload_mismatch(scheme: &'static str, found: &Payload) -> Self {
        Self::PayloadMismatch {
            scheme,
            found: found.kind(),
        }
    }
}

/// What a slot shows. Each scheme produces exactly one payload kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Grid { row: u8, col: u8 },
    Cipher { text: String },
    Geo { coordinate: String },
    Clue { sentence: String },
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Grid { .. } => "grid",
            Payload::Cipher { .. } => "cipher",
            Payload::Geo { .. } => "geo",
            Payload::Clue { .. } => "clue",
        }
    }

    /// Text as printed on the artifact.
    pub fn display_text(&self) -> String {
        match self {
            Payload::Grid { row, col } => format!("ROW {}, COLUMN {}", row, col),
            Payload::Cipher { text } => text.clone(),
            Payload::Geo { coordinate } => coordinate.clone(),
            Payload::Clue { sentence } => sentence.clone(),
        }
    }
}

/// Encode/decode capability shared by every scheme variant.
pub trait EncodingScheme {
    fn kind(&self) -> &'static str;
    fn encode(&self, letter: char) -> Result<Payload, SchemeError>;
    fn decode(&self, payload: &Payload) -> Result<char, SchemeError>;
    fn describe(&self) -> String;

    /// False when decoding needs a human reader.
    fn is_mechanical(&self) -> bool {
        true
    }
}

pub(crate) fn normalize_letter(letter: char) -> Result<char, SchemeError> {
    let upper = letter.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Ok(upper)
    } else {
        Err(SchemeError::Encoding(letter))
    }
}

/// Tagged scheme instance, as written in chapter files:
/// `{"kind": "caesar", "shift": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scheme {
    CoordinateGrid(CoordinateGrid),
    Caesar(CaesarCipher),
    GeoCoordinate(GeoCoordinate),
    DirectWord(DirectWord),
}

impl Scheme {
    /// Instance-level consistency that serde cannot express.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Scheme::GeoCoordinate(geo) => geo.check_places(),
            _ => Ok(()),
        }
    }

    fn inner(&self) -> &dyn EncodingScheme {
        match self {
            Scheme::CoordinateGrid(s) => s,
            Scheme::Caesar(s) => s,
            Scheme::GeoCoordinate(s) => s,
            Scheme::DirectWord(s) => s,
        }
    }
}

impl EncodingScheme for Scheme {
    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn encode(&self, letter: char) -> Result<Payload, SchemeError> {
        self.inner().encode(letter)
    }

    fn decode(&self, payload: &Payload) -> Result<char, SchemeError> {
        self.inner().decode(payload)
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }

    fn is_mechanical(&self) -> bool {
        self.inner().is_mechanical()
    }
}

/// Named scheme instances. Each is built once and shared by every slot that
/// names it.
#[derive(Debug, Clone)]
pub struct SchemeRegistry {
    schemes: BTreeMap<String, Arc<Scheme>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self {
            schemes: BTreeMap::new(),
        }
    }

    /// One instance of every variant under its kind name; `caesar` shifts +1.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("coordinate_grid", Scheme::CoordinateGrid(CoordinateGrid::default()));
        registry.register("caesar", Scheme::Caesar(CaesarCipher::default()));
        registry.register("geo_coordinate", Scheme::GeoCoordinate(GeoCoordinate::default()));
        registry.register("direct_word", Scheme::DirectWord(DirectWord::default()));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.schemes.insert(name.into(), Arc::new(scheme));
    }

    /// Like `register`, for instances read from chapter files.
    pub fn try_register(&mut self, name: impl Into<String>, scheme: Scheme) -> Result<(), ConfigError> {
        let name = name.into();
        scheme
            .check()
            .map_err(|reason| ConfigError::InvalidScheme {
                name: name.clone(),
                reason,
            })?;
        self.register(name, scheme);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Scheme>, ConfigError> {
        self.schemes
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownScheme(name.to_string()))
    }

    pub fn list(&self) -> impl Iterator<Item = (&str, &Scheme)> {
        self.schemes.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_spec_parses_from_json() {
        let scheme: Scheme = serde_json::from_str(r#"{"kind": "caesar", "shift": -3}"#).unwrap();
        assert_eq!(scheme, Scheme::Caesar(CaesarCipher::new(-3)));

        let grid: Scheme = serde_json::from_str(r#"{"kind": "coordinate_grid"}"#).unwrap();
        assert_eq!(grid.kind(), "coordinate_grid");
    }

    #[test]
    fn unknown_scheme_kind_is_rejected() {
        let parsed = serde_json::from_str::<Scheme>(r#"{"kind": "vigenere"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn registry_shares_instances() {
        let registry = SchemeRegistry::with_defaults();
        let a = registry.get("caesar").unwrap();
        let b = registry.get("caesar").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn registry_miss_is_configuration_error() {
        let registry = SchemeRegistry::with_defaults();
        assert_eq!(
            registry.get("rot13").unwrap_err(),
            ConfigError::UnknownScheme("rot13".into())
        );
    }

    #[test]
    fn try_register_rejects_undecodable_geo_places() {
        let mut registry = SchemeRegistry::with_defaults();
        let clash = Scheme::GeoCoordinate(GeoCoordinate::with_places(vec![Place {
            name: "Mahé Landing".into(),
            coordinate: "4.6097° S, 55.4263° E".into(),
        }]));
        let err = registry.try_register("mahe", clash).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidScheme { ref name, .. } if name == "mahe"));
        assert!(registry.get("mahe").is_err());

        let ok = Scheme::Caesar(CaesarCipher::new(3));
        registry.try_register("caesar_three", ok).unwrap();
        assert!(registry.get("caesar_three").is_ok());
    }

    #[test]
    fn non_letters_fail_encoding() {
        let registry = SchemeRegistry::with_defaults();
        for (_, scheme) in registry.list() {
            assert_eq!(scheme.encode('7').unwrap_err(), SchemeError::Encoding('7'));
            assert_eq!(scheme.encode(' ').unwrap_err(), SchemeError::Encoding(' '));
        }
    }

    #[test]
    fn payload_kind_mismatch_is_reported() {
        let grid = Scheme::CoordinateGrid(CoordinateGrid::default());
        let err = grid
            .decode(&Payload::Cipher { text: "A".into() })
            .unwrap_err();
        assert_eq!(
            err,
            SchemeError::PayloadMismatch {
                scheme: "coordinate_grid",
                found: "cipher"
            }
        );
    }

    #[test]
    fn grid_payload_display() {
        assert_eq!(
            Payload::Grid { row: 2, col: 3 }.display_text(),
            "ROW 2, COLUMN 3"
        );
    }
}
