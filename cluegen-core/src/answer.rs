//! Answer and decoy policy for one chapter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A slot that deliberately shows the wrong letter for one answer position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoy {
    pub letter: char,
    /// Zero-based answer position the decoy pretends to fill.
    pub impersonates: usize,
}

/// The hidden answer. Built once per chapter and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSpec {
    answer: Vec<char>,
    decoys: BTreeMap<String, Decoy>,
}

impl AnswerSpec {
    /// Whitespace separates words on the artifacts but never occupies a slot,
    /// so `"DAN ZIL"` and `"DANZIL"` describe the same six slots.
    pub fn new(answer: &str, decoys: BTreeMap<String, Decoy>) -> Result<Self, ConfigError> {
        let mut letters = Vec::with_capacity(answer.len());
        for c in answer.chars().filter(|c| !c.is_whitespace()) {
            let upper = c.to_ascii_uppercase();
            if !upper.is_ascii_uppercase() {
                return Err(ConfigError::answer(format!(
                    "{:?} contains non-letter {:?}",
                    answer, c
                )));
            }
            letters.push(upper);
        }
        if letters.is_empty() {
            return Err(ConfigError::answer("answer is empty"));
        }

        let mut normalized = BTreeMap::new();
        for (slot_id, decoy) in decoys {
            let letter = decoy.letter.to_ascii_uppercase();
            if !letter.is_ascii_uppercase() {
                return Err(ConfigError::InvalidDecoy {
                    slot_id,
                    reason: format!("{:?} is not a letter", decoy.letter),
                });
            }
            if decoy.impersonates >= letters.len() {
                return Err(ConfigError::InvalidDecoy {
                    slot_id,
                    reason: format!(
                        "position {} is outside a {}-letter answer",
                        decoy.impersonates,
                        letters.len()
                    ),
                });
            }
            normalized.insert(
                slot_id,
                Decoy {
                    letter,
                    impersonates: decoy.impersonates,
                },
            );
        }

        Ok(Self {
            answer: letters,
            decoys: normalized,
        })
    }

    pub fn without_decoys(answer: &str) -> Result<Self, ConfigError> {
        Self::new(answer, BTreeMap::new())
    }

    pub fn letters(&self) -> &[char] {
        &self.answer
    }

    pub fn letter_at(&self, position: usize) -> Option<char> {
        self.answer.get(position).copied()
    }

    pub fn len(&self) -> usize {
        self.answer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answer.is_empty()
    }

    pub fn decoys(&self) -> &BTreeMap<String, Decoy> {
        &self.decoys
    }

    pub fn as_string(&self) -> String {
        self.answer.iter().collect()
    }
}
