//! Chapter files - one JSON document per puzzle chapter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::answer::{AnswerSpec, Decoy};
use crate::error::ConfigError;
use crate::plan::{AssignmentPolicy, LayerPlan, PlanBuilder, PlanError, SlotId};
use crate::schemes::{Scheme, SchemeRegistry};
use crate::style::StyleConfig;

pub type CollectionId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSpec {
    pub collection_id: CollectionId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_engine_min_version")]
    pub engine_min_version: String,
    pub answer: String,
    #[serde(default)]
    pub decoys: BTreeMap<SlotId, Decoy>,
    /// Extra or overriding scheme instances, by name.
    #[serde(default)]
    pub schemes: BTreeMap<String, Scheme>,
    pub assignment: AssignmentPolicy,
    #[serde(default)]
    pub slot_ids: Option<Vec<SlotId>>,
    #[serde(default)]
    pub decoy_scheme: Option<String>,
    #[serde(default)]
    pub style: StyleConfig,
}

fn default_engine_min_version() -> String {
    "1.0.0".to_string()
}

impl ChapterSpec {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidChapter(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidChapter(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidChapter(format!("{}: {}", path.display(), e)))
    }

    pub fn answer_spec(&self) -> Result<AnswerSpec, ConfigError> {
        AnswerSpec::new(&self.answer, self.decoys.clone())
    }

    /// Built-in schemes plus the chapter's own, which win on name clashes.
    pub fn registry(&self) -> Result<SchemeRegistry, ConfigError> {
        let mut registry = SchemeRegistry::with_defaults();
        for (name, scheme) in &self.schemes {
            registry.try_register(name.clone(), scheme.clone())?;
        }
        Ok(registry)
    }

    pub fn plan(&self, answer: &AnswerSpec) -> Result<LayerPlan, PlanError> {
        let registry = self.registry()?;
        let mut builder = PlanBuilder::new(answer, &registry, self.assignment.clone());
        if let Some(ids) = &self.slot_ids {
            builder = builder.slot_ids(ids.clone());
        }
        if let Some(name) = &self.decoy_scheme {
            builder = builder.decoy_scheme(name.clone());
        }
        builder.build()
    }
}

/// Chapter registry - loads every chapter file in a directory
pub struct ChapterRegistry {
    chapters: BTreeMap<CollectionId, ChapterSpec>,
}

impl ChapterRegistry {
    pub fn new() -> Self {
        Self {
            chapters: BTreeMap::new(),
        }
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map_or(false, |e| e == "json") {
                    match ChapterSpec::load(&path) {
                        Ok(chapter) => registry.register(chapter),
                        Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping chapter file"),
                    }
                }
            }
        }
        Ok(registry)
    }

    pub fn get(&self, collection_id: &str) -> Option<&ChapterSpec> {
        self.chapters.get(collection_id)
    }

    pub fn list(&self) -> Vec<&ChapterSpec> {
        self.chapters.values().collect()
    }

    pub fn register(&mut self, chapter: ChapterSpec) {
        self.chapters.insert(chapter.collection_id.clone(), chapter);
    }
}

impl Default for ChapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
