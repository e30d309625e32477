//! Layer Plan - one scheme and one slot per answer letter and per decoy.
//!
//! A plan is built all at once or not at all: slot collisions and letters
//! without a scheme reject the whole plan before anything is rendered.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::answer::AnswerSpec;
use crate::error::ConfigError;
use crate::schemes::{EncodingScheme, Payload, Scheme, SchemeError, SchemeRegistry};

pub type SlotId = String;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Duplicate slot id: {0}")]
    DuplicateSlot(SlotId),

    #[error("No scheme assigned to letter {letter:?} at position {position}")]
    UnassignedLetter { position: usize, letter: char },

    #[error("Cannot encode slot {slot_id}: {source}")]
    Encoding {
        slot_id: SlotId,
        #[source]
        source: SchemeError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerPlanEntry {
    pub slot_id: SlotId,
    pub scheme_name: String,
    pub scheme: Arc<Scheme>,
    pub payload: Payload,
    pub is_decoy: bool,
    pub expected_letter: char,
    /// Answer position filled, or impersonated for decoys.
    pub position: usize,
}

impl LayerPlanEntry {
    /// Encode `letter` with `scheme` and wrap the result as an entry.
    pub fn encode(
        slot_id: impl Into<SlotId>,
        scheme_name: impl Into<String>,
        scheme: Arc<Scheme>,
        letter: char,
        position: usize,
        is_decoy: bool,
    ) -> Result<Self, PlanError> {
        let slot_id = slot_id.into();
        let payload = scheme.encode(letter).map_err(|source| PlanError::Encoding {
            slot_id: slot_id.clone(),
            source,
        })?;
        Ok(Self {
            slot_id,
            scheme_name: scheme_name.into(),
            scheme,
            payload,
            is_decoy,
            expected_letter: letter.to_ascii_uppercase(),
            position,
        })
    }

    pub fn decode(&self) -> Result<char, SchemeError> {
        self.scheme.decode(&self.payload)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerPlan {
    entries: Vec<LayerPlanEntry>,
}

impl LayerPlan {
    /// Accepts entries as given; fails on the first repeated slot id.
    pub fn from_entries(entries: Vec<LayerPlanEntry>) -> Result<Self, PlanError> {
        check_slot_ids(&entries)?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LayerPlanEntry] {
        &self.entries
    }

    pub fn get(&self, slot_id: &str) -> Option<&LayerPlanEntry> {
        self.entries.iter().find(|e| e.slot_id == slot_id)
    }

    /// Non-decoy entries in answer order.
    pub fn answer_entries(&self) -> Vec<&LayerPlanEntry> {
        let mut letters: Vec<_> = self.entries.iter().filter(|e| !e.is_decoy).collect();
        letters.sort_by_key(|e| e.position);
        letters
    }

    pub fn decoy_entries(&self) -> impl Iterator<Item = &LayerPlanEntry> {
        self.entries.iter().filter(|e| e.is_decoy)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_slot_ids(entries: &[LayerPlanEntry]) -> Result<(), PlanError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for entry in entries {
        if entry.slot_id.is_empty() {
            return Err(ConfigError::InvalidIdentifier(
                entry.slot_id.clone(),
                "slot id is empty".into(),
            )
            .into());
        }
        if !seen.insert(entry.slot_id.as_str()) {
            return Err(PlanError::DuplicateSlot(entry.slot_id.clone()));
        }
    }
    Ok(())
}

/// How answer positions pick their scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    /// Same scheme for every letter.
    Uniform(String),
    /// Explicit scheme per position; must cover the whole answer.
    PerPosition(Vec<String>),
    /// Round-robin over the listed schemes.
    Cycle(Vec<String>),
}

impl AssignmentPolicy {
    pub fn scheme_for(&self, position: usize) -> Option<&str> {
        let name = match self {
            AssignmentPolicy::Uniform(name) => Some(name.as_str()),
            AssignmentPolicy::PerPosition(names) => names.get(position).map(String::as_str),
            AssignmentPolicy::Cycle(names) if names.is_empty() => None,
            AssignmentPolicy::Cycle(names) => Some(names[position % names.len()].as_str()),
        };
        name.filter(|name| !name.is_empty())
    }
}

pub fn default_slot_id(position: usize) -> SlotId {
    format!("letter_{}", position + 1)
}

pub struct PlanBuilder<'a> {
    answer: &'a AnswerSpec,
    registry: &'a SchemeRegistry,
    policy: AssignmentPolicy,
    slot_ids: Option<Vec<SlotId>>,
    decoy_scheme: Option<String>,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(answer: &'a AnswerSpec, registry: &'a SchemeRegistry, policy: AssignmentPolicy) -> Self {
        Self {
            answer,
            registry,
            policy,
            slot_ids: None,
            decoy_scheme: None,
        }
    }

    /// Explicit slot ids for the answer letters, in answer order.
    pub fn slot_ids(mut self, slot_ids: Vec<SlotId>) -> Self {
        self.slot_ids = Some(slot_ids);
        self
    }

    /// Scheme for every decoy. Without it a decoy borrows the scheme of the
    /// position it impersonates.
    pub fn decoy_scheme(mut self, name: impl Into<String>) -> Self {
        self.decoy_scheme = Some(name.into());
        self
    }

    pub fn build(self) -> Result<LayerPlan, PlanError> {
        if let Some(ids) = &self.slot_ids {
            if ids.len() != self.answer.len() {
                return Err(ConfigError::InvalidChapter(format!(
                    "expected {} slot ids, got {}",
                    self.answer.len(),
                    ids.len()
                ))
                .into());
            }
        }

        let mut entries = Vec::with_capacity(self.answer.len() + self.answer.decoys().len());

        for (position, &letter) in self.answer.letters().iter().enumerate() {
            let scheme_name = self
                .policy
                .scheme_for(position)
                .ok_or(PlanError::UnassignedLetter { position, letter })?;
            let scheme = self.registry.get(scheme_name)?;
            let slot_id = match &self.slot_ids {
                Some(ids) => ids[position].clone(),
                None => default_slot_id(position),
            };
            entries.push(LayerPlanEntry::encode(
                slot_id,
                scheme_name,
                scheme,
                letter,
                position,
                false,
            )?);
        }

        for (slot_id, decoy) in self.answer.decoys() {
            let scheme_name = match &self.decoy_scheme {
                Some(name) => name.as_str(),
                None => self
                    .policy
                    .scheme_for(decoy.impersonates)
                    .ok_or(PlanError::UnassignedLetter {
                        position: decoy.impersonates,
                        letter: decoy.letter,
                    })?,
            };
            let scheme = self.registry.get(scheme_name)?;
            entries.push(LayerPlanEntry::encode(
                slot_id.clone(),
                scheme_name,
                scheme,
                decoy.letter,
                decoy.impersonates,
                true,
            )?);
        }

        let plan = LayerPlan::from_entries(entries)?;
        tracing::debug!(
            letters = self.answer.len(),
            decoys = self.answer.decoys().len(),
            "layer plan built"
        );
        Ok(plan)
    }
}
