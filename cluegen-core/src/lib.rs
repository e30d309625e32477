//! Cluegen Core - clue layer generation for multi-part treasure hunts
//!
//! # Ground Rules
//! 1. The Answer Is Fixed Before Anything Is Drawn
//! 2. Every Letter Slot Decodes Back To Its Letter
//! 3. Decoys Never Reveal The Letter They Impersonate
//! 4. Validation Runs Before Any Write
//! 5. Same Plan And Style, Same Layout

pub mod answer;
pub mod chapter;
pub mod compositor;
pub mod error;
pub mod hashing;
pub mod layout;
pub mod pipeline;
pub mod plan;
pub mod render;
pub mod schemes;
pub mod store;
pub mod style;
pub mod validation;

pub use answer::{AnswerSpec, Decoy};
pub use chapter::{ChapterRegistry, ChapterSpec};
pub use compositor::compose;
pub use error::ConfigError;
pub use hashing::{canonical_json, compute_manifest_hash, layout_fingerprint};
pub use layout::{LayoutSpec, Primitive};
pub use pipeline::{GenerationContext, GenerationPipeline, GenerationReport, PipelineError};
pub use plan::{AssignmentPolicy, LayerPlan, LayerPlanEntry, PlanBuilder, PlanError};
pub use render::{ImageFormat, RasterImage, RenderError, Renderer, SvgRenderer};
pub use schemes::{EncodingScheme, Payload, Scheme, SchemeError, SchemeRegistry};
pub use store::{artifact_name, FileStore, FsStore, MemoryStore, StoreError};
pub use style::StyleConfig;
pub use validation::{ConsistencyValidator, Defect, DefectKind, Severity, ValidationReport};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
