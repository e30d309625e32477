//! Direct word clues. Encoding picks a sentence; decoding is left to a human.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{EncodingScheme, Payload, SchemeError};

pub const BUILTIN_CLUES: [(char, &str); 26] = [
    ('A', "The first letter of the ALPHABET"),
    ('B', "Where every BEACH and BAY begins"),
    ('C', "The start of every CAPTAIN'S COMPASS"),
    ('D', "The beginning of DAWN and DESTINY"),
    ('E', "The first step EAST toward the EQUATOR"),
    ('F', "FORTUNE FAVOURS the bold"),
    ('G', "All that GLITTERS is GOLD"),
    ('H', "HIDDEN in every HARBOUR"),
    ('I', "The self - ME, MYSELF and ___"),
    ('J', "The opening of every JEWEL and JOURNEY"),
    ('K', "The KEY that opens the KING'S chest"),
    ('L', "LOVE begins with this letter"),
    ('M', "MARKED on every MAP"),
    ('N', "Found in NINE and NORTH"),
    ('O', "The shape of the OPEN OCEAN"),
    ('P', "Every PIRATE'S PROMISE starts here"),
    ('Q', "The QUEST before the QUEEN"),
    ('R', "ROCKS and REEFS hide the way"),
    ('S', "SAND, SEA and SILVER share it"),
    ('T', "The first mark on every TREASURE map"),
    ('U', "UNDER the waves, UNSEEN"),
    ('V', "VICTORY and the VOYAGE home"),
    ('W', "The WIND that fills the WEST sail"),
    ('X', "It marks the spot"),
    ('Y', "The question every sailor asks: ___?"),
    ('Z', "The last letter - ZERO to ZENITH"),
];

/// Natural-language clue scheme. There is no mechanical decode for free
/// text, so every payload of this scheme goes to manual review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectWord {
    /// Per-letter sentence overrides, keyed by the capital letter.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clues: BTreeMap<String, String>,
}

impl DirectWord {
    pub fn clue_for(&self, letter: char) -> Option<String> {
        if let Some(custom) = self.clues.get(letter.to_string().as_str()) {
            return Some(custom.clone());
        }
        BUILTIN_CLUES
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, s)| s.to_string())
    }
}

impl EncodingScheme for DirectWord {
    fn kind(&self) -> &'static str {
        "direct_word"
    }

    fn encode(&self, letter: char) -> Result<Payload, SchemeError> {
        let letter = super::normalize_letter(letter)?;
        let sentence = self.clue_for(letter).ok_or(SchemeError::Encoding(letter))?;
        Ok(Payload::Clue { sentence })
    }

    fn decode(&self, payload: &Payload) -> Result<char, SchemeError> {
        match payload {
            Payload::Clue { sentence } => Err(SchemeError::ManualReviewRequired(sentence.clone())),
            other => Err(SchemeError::payload_mismatch(self.kind(), other)),
        }
    }

    fn describe(&self) -> String {
        "Direct word: a sentence whose highlighted word yields the letter (reviewed by hand)"
            .to_string()
    }

    fn is_mechanical(&self) -> bool {
        false
    }
}
