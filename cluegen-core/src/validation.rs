//! Consistency Validation - checks produce defects, the report aggregates.
//!
//! The validator reads the plan, never pixels. Every check runs over the
//! whole plan; nothing stops at the first defect.

use serde::{Deserialize, Serialize};

use crate::answer::AnswerSpec;
use crate::plan::{LayerPlan, LayerPlanEntry};
use crate::schemes::SchemeError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// A letter slot decodes to something other than its expected letter.
    DecodeMismatch,
    /// A slot's payload could not be decoded at all.
    DecodeFailed,
    /// The expected letters, in answer order, do not spell the answer.
    AnswerMismatch,
    /// A decoy decodes to the true letter it impersonates.
    DecoyLeaksAnswer,
    /// A decoy points at a position the answer does not have.
    UnknownPosition,
    /// Decoding needs a human reader.
    ManualReviewRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Defect {
    /// Absent for plan-wide defects.
    pub slot_id: Option<String>,
    pub kind: DefectKind,
    pub severity: Severity,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub message: String,
}

impl Defect {
    /// One line, prefixed with the slot id when there is one.
    pub fn describe(&self) -> String {
        match &self.slot_id {
            Some(slot) => format!("{}: {}", slot, self.message),
            None => self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub answer: String,
    pub checked_slots: usize,
    pub defects: Vec<Defect>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Defect> {
        self.defects.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn count(&self, kind: DefectKind) -> usize {
        self.defects.iter().filter(|d| d.kind == kind).count()
    }

    pub fn summary(&self) -> String {
        self.errors()
            .map(Defect::describe)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One pass over the plan that yields zero or more defects.
pub trait ConsistencyCheck {
    fn name(&self) -> &'static str;
    fn check(&self, plan: &LayerPlan, answer: &AnswerSpec) -> Vec<Defect>;
}

fn letter(c: char) -> Option<String> {
    Some(c.to_string())
}

fn manual_review(entry: &LayerPlanEntry, sentence: &str) -> Defect {
    Defect {
        slot_id: Some(entry.slot_id.clone()),
        kind: DefectKind::ManualReviewRequired,
        severity: Severity::Info,
        expected: if entry.is_decoy {
            None
        } else {
            letter(entry.expected_letter)
        },
        actual: None,
        message: format!(
            "{} clue needs a human check: {:?}",
            entry.scheme_name, sentence
        ),
    }
}

// --- Concrete Checks ---

/// Each letter slot must decode to its expected letter.
pub struct EntryDecodeCheck;

impl ConsistencyCheck for EntryDecodeCheck {
    fn name(&self) -> &'static str {
        "entry_decode"
    }

    fn check(&self, plan: &LayerPlan, _answer: &AnswerSpec) -> Vec<Defect> {
        let mut defects = vec![];
        for entry in plan.entries().iter().filter(|e| !e.is_decoy) {
            match entry.decode() {
                Ok(actual) if actual == entry.expected_letter => {}
                Ok(actual) => defects.push(Defect {
                    slot_id: Some(entry.slot_id.clone()),
                    kind: DefectKind::DecodeMismatch,
                    severity: Severity::Error,
                    expected: letter(entry.expected_letter),
                    actual: letter(actual),
                    message: format!(
                        "decodes to {} instead of {}",
                        actual, entry.expected_letter
                    ),
                }),
                Err(SchemeError::ManualReviewRequired(sentence)) => {
                    defects.push(manual_review(entry, &sentence))
                }
                Err(err) => defects.push(Defect {
                    slot_id: Some(entry.slot_id.clone()),
                    kind: DefectKind::DecodeFailed,
                    severity: Severity::Error,
                    expected: letter(entry.expected_letter),
                    actual: None,
                    message: err.to_string(),
                }),
            }
        }
        defects
    }
}

/// Expected letters in answer order must spell the answer exactly.
pub struct AnswerReconstructionCheck;

impl ConsistencyCheck for AnswerReconstructionCheck {
    fn name(&self) -> &'static str {
        "answer_reconstruction"
    }

    fn check(&self, plan: &LayerPlan, answer: &AnswerSpec) -> Vec<Defect> {
        let spelled: String = plan
            .answer_entries()
            .iter()
            .map(|e| e.expected_letter)
            .collect();
        let expected = answer.as_string();
        if spelled == expected {
            return vec![];
        }
        vec![Defect {
            slot_id: None,
            kind: DefectKind::AnswerMismatch,
            severity: Severity::Error,
            message: format!("letter slots spell {:?}, answer is {:?}", spelled, expected),
            expected: Some(expected),
            actual: Some(spelled),
        }]
    }
}

/// No decoy may decode to the letter it impersonates.
pub struct DecoyLeakCheck;

impl ConsistencyCheck for DecoyLeakCheck {
    fn name(&self) -> &'static str {
        "decoy_leak"
    }

    fn check(&self, plan: &LayerPlan, answer: &AnswerSpec) -> Vec<Defect> {
        let mut defects = vec![];
        for entry in plan.decoy_entries() {
            let Some(truth) = answer.letter_at(entry.position) else {
                defects.push(Defect {
                    slot_id: Some(entry.slot_id.clone()),
                    kind: DefectKind::UnknownPosition,
                    severity: Severity::Error,
                    expected: Some(format!("position < {}", answer.len())),
                    actual: Some(entry.position.to_string()),
                    message: format!("decoy impersonates missing position {}", entry.position),
                });
                continue;
            };

            match entry.decode() {
                Ok(actual) if actual == truth => defects.push(Defect {
                    slot_id: Some(entry.slot_id.clone()),
                    kind: DefectKind::DecoyLeaksAnswer,
                    severity: Severity::Error,
                    expected: Some(format!("anything but {}", truth)),
                    actual: letter(actual),
                    message: format!(
                        "decoy reveals the true letter {} at position {}",
                        truth, entry.position
                    ),
                }),
                Ok(_) => {}
                Err(SchemeError::ManualReviewRequired(sentence)) => {
                    defects.push(manual_review(entry, &sentence))
                }
                // An unreadable decoy cannot leak; flag it without failing.
                Err(err) => defects.push(Defect {
                    slot_id: Some(entry.slot_id.clone()),
                    kind: DefectKind::DecodeFailed,
                    severity: Severity::Warning,
                    expected: None,
                    actual: None,
                    message: err.to_string(),
                }),
            }
        }
        defects
    }
}

/// Runs every check in order and folds the results into one report.
pub struct ConsistencyValidator {
    checks: Vec<Box<dyn ConsistencyCheck + Send + Sync>>,
}

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self {
            checks: vec![
                Box::new(EntryDecodeCheck),
                Box::new(AnswerReconstructionCheck),
                Box::new(DecoyLeakCheck),
            ],
        }
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn validate(&self, plan: &LayerPlan, answer: &AnswerSpec) -> ValidationReport {
        let mut defects = vec![];
        for check in &self.checks {
            let found = check.check(plan, answer);
            if !found.is_empty() {
                tracing::debug!(check = check.name(), defects = found.len(), "check reported defects");
            }
            defects.extend(found);
        }

        let ok = !defects.iter().any(|d| d.severity == Severity::Error);
        ValidationReport {
            ok,
            answer: answer.as_string(),
            checked_slots: plan.len(),
            defects,
        }
    }
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Decoy;
    use crate::plan::{AssignmentPolicy, PlanBuilder};
    use crate::schemes::SchemeRegistry;
    use std::collections::BTreeMap;

    fn plan_for(answer: &AnswerSpec, scheme: &str) -> LayerPlan {
        let registry = SchemeRegistry::with_defaults();
        PlanBuilder::new(answer, &registry, AssignmentPolicy::Uniform(scheme.into()))
            .build()
            .unwrap()
    }

    #[test]
    fn clean_plan_has_no_defects() {
        let answer = AnswerSpec::without_decoys("TAYLOR").unwrap();
        let report = ConsistencyValidator::new().validate(&plan_for(&answer, "coordinate_grid"), &answer);
        assert!(report.ok);
        assert!(report.defects.is_empty());
        assert_eq!(report.checked_slots, 6);
    }

    #[test]
    fn direct_word_entries_are_flagged_for_review_without_failing() {
        let answer = AnswerSpec::without_decoys("DANZIL").unwrap();
        let report = ConsistencyValidator::new().validate(&plan_for(&answer, "direct_word"), &answer);
        assert!(report.ok);
        assert_eq!(report.count(DefectKind::ManualReviewRequired), 6);
        assert!(report.defects.iter().all(|d| d.severity == Severity::Info));
    }

    #[test]
    fn answer_order_uses_positions_not_entry_order() {
        let answer = AnswerSpec::without_decoys("BEL").unwrap();
        let plan = plan_for(&answer, "caesar");
        let mut reversed: Vec<_> = plan.entries().to_vec();
        reversed.reverse();
        let plan = LayerPlan::from_entries(reversed).unwrap();
        let report = ConsistencyValidator::new().validate(&plan, &answer);
        assert_eq!(report.count(DefectKind::AnswerMismatch), 0);
    }

    #[test]
    fn missing_letter_slot_breaks_reconstruction() {
        let answer = AnswerSpec::without_decoys("BEL").unwrap();
        let plan = plan_for(&answer, "caesar");
        let short = LayerPlan::from_entries(plan.entries()[..2].to_vec()).unwrap();
        let report = ConsistencyValidator::new().validate(&short, &answer);
        assert!(!report.ok);
        let defect = &report.defects[0];
        assert_eq!(defect.kind, DefectKind::AnswerMismatch);
        assert_eq!(defect.slot_id, None);
        assert_eq!(defect.expected.as_deref(), Some("BEL"));
        assert_eq!(defect.actual.as_deref(), Some("BE"));
    }

    #[test]
    fn undecodable_decoy_is_a_warning() {
        use crate::plan::LayerPlanEntry;
        use crate::schemes::Payload;

        let mut decoys = BTreeMap::new();
        decoys.insert("fake".to_string(), Decoy { letter: 'X', impersonates: 0 });
        let answer = AnswerSpec::new("DANZIL", decoys).unwrap();
        let plan = plan_for(&answer, "coordinate_grid");
        let mut entries: Vec<LayerPlanEntry> = plan.entries().to_vec();
        for e in entries.iter_mut().filter(|e| e.is_decoy) {
            e.payload = Payload::Grid { row: 17, col: 9 };
        }
        let plan = LayerPlan::from_entries(entries).unwrap();
        let report = ConsistencyValidator::new().validate(&plan, &answer);
        assert!(report.ok);
        assert_eq!(report.defects.len(), 1);
        assert_eq!(report.defects[0].severity, Severity::Warning);
    }

    #[test]
    fn checks_run_in_documented_order() {
        assert_eq!(
            ConsistencyValidator::new().check_names(),
            ["entry_decode", "answer_reconstruction", "decoy_leak"]
        );
    }
}
