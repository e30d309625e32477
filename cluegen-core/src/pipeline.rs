//! Generation Pipeline - Single Entry Point
//!
//! CRITICAL: `run` MUST validate the plan before writing anything. No bypass.
//!
//! Plan-level defects refuse the whole run. A letter slot that fails to
//! decode only loses its own artifact, unless the pipeline is strict.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::answer::AnswerSpec;
use crate::chapter::ChapterSpec;
use crate::compositor::compose;
use crate::error::ConfigError;
use crate::hashing::{compute_manifest_hash, layout_fingerprint, sha256_hex};
use crate::plan::{LayerPlan, LayerPlanEntry, PlanError};
use crate::render::{ImageFormat, Renderer};
use crate::schemes::EncodingScheme;
use crate::store::{artifact_name, check_component, FileStore, StoreError};
use crate::style::StyleConfig;
use crate::validation::{ConsistencyValidator, Defect, DefectKind, Severity, ValidationReport};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Decode mismatch: {0}")]
    DecodeMismatch(String),

    #[error("Chapter requires engine >= {required}, current is {engine}")]
    EngineVersionMismatch { required: String, engine: String },

    #[error(transparent)]
    Persistence(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything one chapter run needs, passed explicitly.
pub struct GenerationContext<'a> {
    pub collection_id: &'a str,
    pub answer: &'a AnswerSpec,
    pub style: &'a StyleConfig,
    pub store: &'a dyn FileStore,
    pub renderer: &'a dyn Renderer,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        collection_id: &'a str,
        answer: &'a AnswerSpec,
        style: &'a StyleConfig,
        store: &'a dyn FileStore,
        renderer: &'a dyn Renderer,
    ) -> Result<Self, ConfigError> {
        check_component("collection id", collection_id)?;
        style.validate()?;
        Ok(Self {
            collection_id,
            answer,
            style,
            store,
            renderer,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub slot_id: String,
    pub file_name: String,
    pub path: PathBuf,
    pub format: ImageFormat,
    pub layout_hash: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStage {
    Decode,
    Render,
}

/// A slot that was skipped; the rest of the batch still ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotFailure {
    pub slot_id: String,
    pub stage: SlotStage,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub collection_id: String,
    pub answer: String,
    pub validation: ValidationReport,
    pub artifacts: Vec<ArtifactRecord>,
    pub failures: Vec<SlotFailure>,
    pub manifest_hash: String,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Hashed view of a report. Run id, timestamp and store paths stay out so
/// identical runs hash identically.
#[derive(Serialize)]
struct Manifest<'a> {
    engine_version: &'a str,
    collection_id: &'a str,
    answer: &'a str,
    validation: &'a ValidationReport,
    artifacts: Vec<ManifestArtifact<'a>>,
    failures: &'a [SlotFailure],
}

#[derive(Serialize)]
struct ManifestArtifact<'a> {
    slot_id: &'a str,
    file_name: &'a str,
    format: ImageFormat,
    layout_hash: &'a str,
    content_hash: &'a str,
}

fn manifest_hash(report: &GenerationReport) -> Result<String, serde_json::Error> {
    let manifest = Manifest {
        engine_version: &report.engine_version,
        collection_id: &report.collection_id,
        answer: &report.answer,
        validation: &report.validation,
        artifacts: report
            .artifacts
            .iter()
            .map(|a| ManifestArtifact {
                slot_id: &a.slot_id,
                file_name: &a.file_name,
                format: a.format,
                layout_hash: &a.layout_hash,
                content_hash: &a.content_hash,
            })
            .collect(),
        failures: &report.failures,
    };
    compute_manifest_hash(&manifest)
}

/// Defects that make every artifact of the run wrong, not just one slot's.
fn is_plan_level(defect: &Defect) -> bool {
    defect.severity == Severity::Error
        && matches!(
            defect.kind,
            DefectKind::AnswerMismatch | DefectKind::DecoyLeaksAnswer | DefectKind::UnknownPosition
        )
}

fn refusal(defects: &[&Defect]) -> String {
    defects
        .iter()
        .map(|d| d.describe())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The generation pipeline - single entry point for writing artifacts
pub struct GenerationPipeline {
    validator: ConsistencyValidator,
    strict: bool,
}

impl GenerationPipeline {
    pub fn new() -> Self {
        Self {
            validator: ConsistencyValidator::new(),
            strict: false,
        }
    }

    /// Refuse the run on any error-severity defect, slot-level ones included.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validate a plan against its answer
    ///
    /// This is the ONLY validation entry point.
    pub fn validate_plan(&self, plan: &LayerPlan, answer: &AnswerSpec) -> ValidationReport {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate(plan, answer)
    }

    /// Compose, render and store every slot of `plan`.
    ///
    /// CRITICAL: This ALWAYS calls validate_plan first. It writes nothing
    /// when the report has plan-level defects (or any error, when strict).
    /// Slots that fail to decode are skipped and recorded as failures.
    #[tracing::instrument(skip(self, ctx, plan), fields(collection = %ctx.collection_id, slots = plan.len()))]
    pub fn run(
        &self,
        ctx: &GenerationContext<'_>,
        plan: &LayerPlan,
    ) -> Result<GenerationReport, PipelineError> {
        let validation = self.validate_plan(plan, ctx.answer);
        let blocking: Vec<&Defect> = if self.strict {
            validation.errors().collect()
        } else {
            validation.defects.iter().filter(|d| is_plan_level(d)).collect()
        };
        if !blocking.is_empty() {
            tracing::warn!(defects = blocking.len(), strict = self.strict, "plan refused");
            return Err(PipelineError::DecodeMismatch(refusal(&blocking)));
        }
        if !validation.ok {
            tracing::warn!(
                defects = validation.defects.len(),
                "plan has slot defects, affected slots will be skipped"
            );
        }

        let mut artifacts = vec![];
        let mut failures = vec![];

        for entry in plan.entries() {
            if let Err(message) = self_check(entry) {
                tracing::warn!(slot = %entry.slot_id, %message, "slot skipped before render");
                failures.push(SlotFailure {
                    slot_id: entry.slot_id.clone(),
                    stage: SlotStage::Decode,
                    message,
                });
                continue;
            }

            let layout = compose(entry, ctx.style)?;
            let layout_hash = layout_fingerprint(&layout)?;

            let image = match ctx.renderer.draw(&layout) {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(slot = %entry.slot_id, error = %e, "render failed");
                    failures.push(SlotFailure {
                        slot_id: entry.slot_id.clone(),
                        stage: SlotStage::Render,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let declared = ctx.renderer.format();
            if image.format != declared {
                let message = format!(
                    "renderer declares {} but produced {}",
                    declared.extension(),
                    image.format.extension()
                );
                tracing::warn!(slot = %entry.slot_id, %message, "render format mismatch");
                failures.push(SlotFailure {
                    slot_id: entry.slot_id.clone(),
                    stage: SlotStage::Render,
                    message,
                });
                continue;
            }

            let file_name = artifact_name(ctx.collection_id, &entry.slot_id, image.format)?;
            // A store failure ends the batch.
            let path = ctx.store.save(Path::new(&file_name), &image)?;

            artifacts.push(ArtifactRecord {
                slot_id: entry.slot_id.clone(),
                file_name,
                path,
                format: image.format,
                layout_hash,
                content_hash: sha256_hex(&image.data),
            });
        }

        let mut report = GenerationReport {
            run_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            collection_id: ctx.collection_id.to_string(),
            answer: ctx.answer.as_string(),
            validation,
            artifacts,
            failures,
            manifest_hash: String::new(), // Computed after
        };
        report.manifest_hash = manifest_hash(&report)?;

        tracing::info!(
            written = report.artifacts.len(),
            skipped = report.failures.len(),
            "generation finished"
        );
        Ok(report)
    }

    /// Load-to-disk path for one chapter file.
    pub fn run_chapter(
        &self,
        chapter: &ChapterSpec,
        store: &dyn FileStore,
        renderer: &dyn Renderer,
    ) -> Result<GenerationReport, PipelineError> {
        check_engine_version(chapter)?;
        let answer = chapter.answer_spec()?;
        let plan = chapter.plan(&answer)?;
        let ctx = GenerationContext::new(&chapter.collection_id, &answer, &chapter.style, store, renderer)?;
        self.run(&ctx, &plan)
    }
}

impl Default for GenerationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Mechanical slots must decode cleanly before they are drawn.
fn self_check(entry: &LayerPlanEntry) -> Result<(), String> {
    if !entry.scheme.is_mechanical() {
        return Ok(());
    }
    match entry.decode() {
        Ok(letter) if entry.is_decoy || letter == entry.expected_letter => Ok(()),
        Ok(letter) => Err(format!(
            "decodes to {} instead of {}",
            letter, entry.expected_letter
        )),
        Err(e) => Err(e.to_string()),
    }
}

pub fn check_engine_version(chapter: &ChapterSpec) -> Result<(), PipelineError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|e| ConfigError::InvalidChapter(format!("engine version: {}", e)))?;
    let min_ver = semver::Version::parse(&chapter.engine_min_version).map_err(|e| {
        ConfigError::InvalidChapter(format!(
            "engineMinVersion {:?}: {}",
            chapter.engine_min_version, e
        ))
    })?;

    if engine_ver < min_ver {
        return Err(PipelineError::EngineVersionMismatch {
            required: chapter.engine_min_version.clone(),
            engine: ENGINE_VERSION.to_string(),
        });
    }

    Ok(())
}
