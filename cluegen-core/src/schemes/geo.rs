//! Geographic coordinate scheme backed by a fixed gazetteer.

use serde::{Deserialize, Serialize};

use super::{EncodingScheme, Payload, SchemeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coordinate: String,
}

impl Place {
    pub fn initial(&self) -> Option<char> {
        self.name
            .chars()
            .next()
            .map(|c| fold_accent(c).to_ascii_uppercase())
    }
}

// Accented initials (Île, Félicité) file under their base letter.
fn fold_accent(c: char) -> char {
    match c {
        'É' | 'È' | 'Ê' | 'é' | 'è' | 'ê' => 'E',
        'Î' | 'Ï' | 'î' | 'ï' => 'I',
        'Ô' | 'ô' => 'O',
        'À' | 'Â' | 'à' | 'â' => 'A',
        other => other,
    }
}

pub const BUILTIN_GAZETTEER: [(&str, &str); 26] = [
    ("Anse Royale", "4.7400° S, 55.5167° E"),
    ("Bel Ombre", "4.6097° S, 55.4263° E"),
    ("Cascade", "4.6631° S, 55.4917° E"),
    ("Danzilles", "4.5967° S, 55.4158° E"),
    ("Eden Island", "4.6333° S, 55.4667° E"),
    ("Félicité Island", "4.3167° S, 55.8667° E"),
    ("Glacis", "4.5833° S, 55.4333° E"),
    ("Hodoul Island", "4.6000° S, 55.4667° E"),
    ("Île Thérèse", "4.6706° S, 55.4006° E"),
    ("Jardin du Roi", "4.7300° S, 55.5000° E"),
    ("Kerlan", "4.3200° S, 55.6700° E"),
    ("La Digue", "4.3592° S, 55.8408° E"),
    ("Mont Fleuri", "4.6300° S, 55.4500° E"),
    ("North Island", "4.3950° S, 55.2450° E"),
    ("Olivier Levasseur's Grave", "21.0096° S, 55.2707° E"),
    ("Praslin", "4.3333° S, 55.7333° E"),
    ("Quatre Bornes", "20.2654° S, 57.4791° E"),
    ("Round Island", "4.6167° S, 55.5000° E"),
    ("Silhouette Island", "4.4833° S, 55.2333° E"),
    ("Takamaka", "4.7667° S, 55.5000° E"),
    ("Union Estate", "4.3597° S, 55.8300° E"),
    ("Victoria", "4.6167° S, 55.4500° E"),
    ("Whale Rock", "4.5500° S, 55.3833° E"),
    ("Xai-Xai", "25.0519° S, 33.6442° E"),
    ("Yala", "6.3725° N, 81.5186° E"),
    ("Zanzibar", "6.1659° S, 39.2026° E"),
];

/// Coordinate scheme. Chapter files may register extra places; they are
/// consulted before the built-in gazetteer when encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_places: Vec<Place>,
}

impl GeoCoordinate {
    pub fn with_places(extra_places: Vec<Place>) -> Self {
        Self { extra_places }
    }

    pub fn places(&self) -> impl Iterator<Item = Place> + '_ {
        self.extra_places
            .iter()
            .cloned()
            .chain(BUILTIN_GAZETTEER.iter().map(|(name, coordinate)| Place {
                name: name.to_string(),
                coordinate: coordinate.to_string(),
            }))
    }

    pub fn place_for(&self, letter: char) -> Option<Place> {
        self.places().find(|p| p.initial() == Some(letter))
    }

    /// Every extra place needs a letter initial and a coordinate no place
    /// with another initial uses; otherwise its letter cannot be decoded.
    pub fn check_places(&self) -> Result<(), String> {
        for extra in &self.extra_places {
            let initial = extra
                .initial()
                .filter(char::is_ascii_uppercase)
                .ok_or_else(|| format!("place {:?} does not start with a letter", extra.name))?;
            if let Some(clash) = self
                .places()
                .find(|p| p.coordinate == extra.coordinate && p.initial() != Some(initial))
            {
                return Err(format!(
                    "place {:?} reuses the coordinate {} of {:?}",
                    extra.name, extra.coordinate, clash.name
                ));
            }
        }
        Ok(())
    }
}

impl EncodingScheme for GeoCoordinate {
    fn kind(&self) -> &'static str {
        "geo_coordinate"
    }

    fn encode(&self, letter: char) -> Result<Payload, SchemeError> {
        let letter = super::normalize_letter(letter)?;
        let place = self.place_for(letter).ok_or(SchemeError::Encoding(letter))?;
        Ok(Payload::Geo {
            coordinate: place.coordinate,
        })
    }

    fn decode(&self, payload: &Payload) -> Result<char, SchemeError> {
        let coordinate = match payload {
            Payload::Geo { coordinate } => coordinate,
            other => return Err(SchemeError::payload_mismatch(self.kind(), other)),
        };

        let mut initials: Vec<char> = self
            .places()
            .filter(|p| p.coordinate == *coordinate)
            .filter_map(|p| p.initial())
            .collect();
        initials.sort_unstable();
        initials.dedup();

        match initials.as_slice() {
            [letter] => Ok(*letter),
            [] => Err(SchemeError::UnknownLocation(format!(
                "{} is not in the gazetteer",
                coordinate
            ))),
            _ => Err(SchemeError::UnknownLocation(format!(
                "{} is ambiguous",
                coordinate
            ))),
        }
    }

    fn describe(&self) -> String {
        "Geo coordinate: the first letter of the place at these coordinates".to_string()
    }
}
