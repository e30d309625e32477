//! Caesar shift scheme.

use serde::{Deserialize, Serialize};

use super::{EncodingScheme, Payload, SchemeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaesarCipher {
    pub shift: i32,
}

impl Default for CaesarCipher {
    fn default() -> Self {
        Self { shift: 1 }
    }
}

impl CaesarCipher {
    pub fn new(shift: i32) -> Self {
        Self { shift }
    }

    /// The shift reduced to `0..26`; any `i32` from a chapter file is fine.
    fn forward(&self) -> i32 {
        self.shift.rem_euclid(26)
    }

    fn backward(&self) -> i32 {
        -self.forward()
    }

    /// Shift every ASCII letter in `text`, preserving case. Anything else,
    /// spaces included, passes through unchanged in both directions.
    pub fn apply(&self, text: &str) -> String {
        text.chars().map(|c| shift_char(c, self.forward())).collect()
    }

    /// Inverse of [`CaesarCipher::apply`].
    pub fn reverse(&self, text: &str) -> String {
        text.chars().map(|c| shift_char(c, self.backward())).collect()
    }
}

/// `shift` must already be reduced to `-25..=25`.
fn shift_char(c: char, shift: i32) -> char {
    let base = match c {
        'A'..='Z' => b'A',
        'a'..='z' => b'a',
        _ => return c,
    };
    let offset = (c as u8 - base) as i32;
    let shifted = (offset + shift).rem_euclid(26) as u8;
    (base + shifted) as char
}

impl EncodingScheme for CaesarCipher {
    fn kind(&self) -> &'static str {
        "caesar"
    }

    fn encode(&self, letter: char) -> Result<Payload, SchemeError> {
        let letter = super::normalize_letter(letter)?;
        Ok(Payload::Cipher {
            text: shift_char(letter, self.forward()).to_string(),
        })
    }

    fn decode(&self, payload: &Payload) -> Result<char, SchemeError> {
        let text = match payload {
            Payload::Cipher { text } => text,
            other => return Err(SchemeError::payload_mismatch(self.kind(), other)),
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Ok(shift_char(c, self.backward())),
            _ => Err(SchemeError::MalformedPayload(format!(
                "cipher payload must be one capital letter, got {:?}",
                text
            ))),
        }
    }

    fn describe(&self) -> String {
        format!(
            "Caesar cipher: shift {:+}; decode by shifting {:+}",
            self.shift,
            -i64::from(self.shift)
        )
    }
}
