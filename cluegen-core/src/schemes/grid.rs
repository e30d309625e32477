//! Coordinate grid scheme - one canonical letter/cell table.

use serde::{Deserialize, Serialize};

use super::{EncodingScheme, Payload, SchemeError};

/// A 1-based cell in the lettering grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: u8,
    pub col: u8,
}

const fn cell(row: u8, col: u8) -> GridCell {
    GridCell { row, col }
}

pub const GRID_COLUMNS: u8 = 5;

/// Row-major, five columns wide. This is the only letter/cell table in the
/// crate; every grid payload is produced and read through it.
pub const LETTER_TO_COORDINATE: [(char, GridCell); 26] = [
    ('A', cell(1, 1)),
    ('B', cell(1, 2)),
    ('C', cell(1, 3)),
    ('D', cell(1, 4)),
    ('E', cell(1, 5)),
    ('F', cell(2, 1)),
    ('G', cell(2, 2)),
    ('H', cell(2, 3)),
    ('I', cell(2, 4)),
    ('J', cell(2, 5)),
    ('K', cell(3, 1)),
    ('L', cell(3, 2)),
    ('M', cell(3, 3)),
    ('N', cell(3, 4)),
    ('O', cell(3, 5)),
    ('P', cell(4, 1)),
    ('Q', cell(4, 2)),
    ('R', cell(4, 3)),
    ('S', cell(4, 4)),
    ('T', cell(4, 5)),
    ('U', cell(5, 1)),
    ('V', cell(5, 2)),
    ('W', cell(5, 3)),
    ('X', cell(5, 4)),
    ('Y', cell(5, 5)),
    ('Z', cell(6, 1)),
];

pub fn cell_for(letter: char) -> Option<GridCell> {
    LETTER_TO_COORDINATE
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, c)| *c)
}

pub fn letter_at(cell: GridCell) -> Option<char> {
    LETTER_TO_COORDINATE
        .iter()
        .find(|(_, c)| *c == cell)
        .map(|(l, _)| *l)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateGrid {}

impl EncodingScheme for CoordinateGrid {
    fn kind(&self) -> &'static str {
        "coordinate_grid"
    }

    fn encode(&self, letter: char) -> Result<Payload, SchemeError> {
        let letter = super::normalize_letter(letter)?;
        let GridCell { row, col } = cell_for(letter).ok_or(SchemeError::Encoding(letter))?;
        Ok(Payload::Grid { row, col })
    }

    fn decode(&self, payload: &Payload) -> Result<char, SchemeError> {
        match payload {
            Payload::Grid { row, col } => letter_at(cell(*row, *col)).ok_or(
                SchemeError::UnknownCoordinate {
                    row: *row,
                    col: *col,
                },
            ),
            other => Err(SchemeError::payload_mismatch(self.kind(), other)),
        }
    }

    fn describe(&self) -> String {
        format!(
            "Coordinate grid: letters A-Z laid out row by row, {} columns wide",
            GRID_COLUMNS
        )
    }
}
