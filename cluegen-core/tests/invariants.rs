//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use std::collections::BTreeMap;

use cluegen_core::{
    compose, layout_fingerprint, AnswerSpec, AssignmentPolicy, ConsistencyValidator, Decoy,
    DefectKind, EncodingScheme, LayerPlan, PlanBuilder, PlanError, SchemeError, SchemeRegistry,
    StyleConfig,
    schemes::{caesar::CaesarCipher, grid::LETTER_TO_COORDINATE, Payload},
};

const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn registry() -> SchemeRegistry {
    SchemeRegistry::with_defaults()
}

#[test]
fn invariant_round_trip_every_mechanical_scheme() {
    let registry = registry();
    for (name, scheme) in registry.list().filter(|(_, s)| s.is_mechanical()) {
        for letter in ALPHABET.chars() {
            let payload = scheme.encode(letter).unwrap();
            assert_eq!(
                scheme.decode(&payload).unwrap(),
                letter,
                "{} does not round trip {}",
                name,
                letter
            );
        }
    }
}

#[test]
fn invariant_direct_word_needs_a_human() {
    let scheme = registry().get("direct_word").unwrap();
    assert!(!scheme.is_mechanical());
    let payload = scheme.encode('A').unwrap();
    assert!(matches!(
        scheme.decode(&payload),
        Err(SchemeError::ManualReviewRequired(_))
    ));
}

#[test]
fn invariant_bel_ombre_caesar() {
    let forward = CaesarCipher::new(1);
    let back = CaesarCipher::new(-1);

    assert_eq!(forward.apply("BELOMBRE"), "CFMPNCSF");
    assert_eq!(back.apply("CFMPNCSF"), "BELOMBRE");
    assert_eq!(forward.apply("BEL OMBRE"), "CFM PNCSF");

    // Letter by letter through the scheme interface as well.
    let encoded: String = "BELOMBRE"
        .chars()
        .map(|c| match forward.encode(c).unwrap() {
            Payload::Cipher { text } => text,
            other => panic!("unexpected payload {:?}", other),
        })
        .collect();
    assert_eq!(encoded, "CFMPNCSF");
}

#[test]
fn invariant_grid_is_a_bijection() {
    assert_eq!(LETTER_TO_COORDINATE.len(), 26);

    let letters: std::collections::BTreeSet<char> =
        LETTER_TO_COORDINATE.iter().map(|(c, _)| *c).collect();
    let cells: std::collections::BTreeSet<(u8, u8)> = LETTER_TO_COORDINATE
        .iter()
        .map(|(_, cell)| (cell.row, cell.col))
        .collect();

    assert_eq!(letters.len(), 26);
    assert_eq!(cells.len(), 26);
    assert_eq!(letters.into_iter().collect::<String>(), ALPHABET);
}

#[test]
fn invariant_decoys_never_collide_with_the_truth() {
    let registry = registry();
    let answer_text = "DANZIL";

    for (name, scheme) in registry.list().filter(|(_, s)| s.is_mechanical()) {
        for (position, truth) in answer_text.chars().enumerate() {
            for wrong in ALPHABET.chars().filter(|&c| c != truth) {
                let mut decoys = BTreeMap::new();
                decoys.insert(
                    "decoy".to_string(),
                    Decoy {
                        letter: wrong,
                        impersonates: position,
                    },
                );
                let answer = AnswerSpec::new(answer_text, decoys).unwrap();
                let plan = PlanBuilder::new(&answer, &registry, AssignmentPolicy::Uniform(name.into()))
                    .build()
                    .unwrap();
                let decoy = plan.get("decoy").unwrap();
                assert_ne!(decoy.decode().unwrap(), truth, "{} leaks {}", name, truth);
            }
        }
    }
}

#[test]
fn invariant_compose_is_idempotent() {
    let registry = registry();
    let answer = AnswerSpec::without_decoys("BELOMBRE").unwrap();
    let plan = PlanBuilder::new(
        &answer,
        &registry,
        AssignmentPolicy::Cycle(vec![
            "coordinate_grid".into(),
            "caesar".into(),
            "geo_coordinate".into(),
            "direct_word".into(),
        ]),
    )
    .build()
    .unwrap();

    let style = StyleConfig {
        texture_seed: Some(7),
        ..StyleConfig::default()
    };

    for entry in plan.entries() {
        let first = compose(entry, &style).unwrap();
        let second = compose(entry, &style).unwrap();
        assert_eq!(first.to_json_bytes().unwrap(), second.to_json_bytes().unwrap());
        assert_eq!(
            layout_fingerprint(&first).unwrap(),
            layout_fingerprint(&second).unwrap()
        );
    }
}

#[test]
fn invariant_slot_ids_are_unique() {
    let registry = registry();
    let answer = AnswerSpec::without_decoys("TAYLOR").unwrap();
    let plan = PlanBuilder::new(&answer, &registry, AssignmentPolicy::Uniform("caesar".into()))
        .build()
        .unwrap();

    let mut entries = plan.entries().to_vec();
    entries.push(entries[0].clone());
    let err = LayerPlan::from_entries(entries).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateSlot(ref id) if id == "letter_1"));
}

#[test]
fn invariant_decoy_slot_cannot_reuse_a_letter_slot_id() {
    let registry = registry();
    let mut decoys = BTreeMap::new();
    decoys.insert(
        "letter_1".to_string(),
        Decoy {
            letter: 'Q',
            impersonates: 0,
        },
    );
    let answer = AnswerSpec::new("TAYLOR", decoys).unwrap();
    let err = PlanBuilder::new(&answer, &registry, AssignmentPolicy::Uniform("caesar".into()))
        .build()
        .unwrap_err();
    assert!(matches!(err, PlanError::DuplicateSlot(_)));
}

#[test]
fn invariant_every_letter_needs_a_scheme() {
    let registry = registry();
    let answer = AnswerSpec::without_decoys("TAYLOR").unwrap();
    let err = PlanBuilder::new(
        &answer,
        &registry,
        AssignmentPolicy::PerPosition(vec!["caesar".into(); 4]),
    )
    .build()
    .unwrap_err();
    assert!(matches!(
        err,
        PlanError::UnassignedLetter {
            position: 4,
            letter: 'O'
        }
    ));
}

#[test]
fn invariant_validator_reports_every_defect() {
    let registry = registry();
    let mut decoys = BTreeMap::new();
    // Accidentally the true letter at position 0.
    decoys.insert(
        "nft_9".to_string(),
        Decoy {
            letter: 'T',
            impersonates: 0,
        },
    );
    let answer = AnswerSpec::new("TAYLOR", decoys).unwrap();
    let plan = PlanBuilder::new(
        &answer,
        &registry,
        AssignmentPolicy::Uniform("coordinate_grid".into()),
    )
    .build()
    .unwrap();

    // Break one letter slot: its payload now points at a different letter.
    let mut entries = plan.entries().to_vec();
    let broken = entries
        .iter_mut()
        .find(|e| e.slot_id == "letter_2")
        .unwrap();
    broken.payload = broken.scheme.encode('Z').unwrap();
    let plan = LayerPlan::from_entries(entries).unwrap();

    let report = ConsistencyValidator::new().validate(&plan, &answer);

    assert!(!report.ok);
    assert_eq!(report.defects.len(), 2);
    assert_eq!(report.count(DefectKind::DecodeMismatch), 1);
    assert_eq!(report.count(DefectKind::DecoyLeaksAnswer), 1);

    let mismatch = report
        .defects
        .iter()
        .find(|d| d.kind == DefectKind::DecodeMismatch)
        .unwrap();
    assert_eq!(mismatch.slot_id.as_deref(), Some("letter_2"));
    assert_eq!(mismatch.expected.as_deref(), Some("A"));
    assert_eq!(mismatch.actual.as_deref(), Some("Z"));
}

#[test]
fn invariant_canonical_json_deterministic() {
    use cluegen_core::canonical_json;
    use serde_json::json;

    let obj1 = json!({"z": 1, "a": 2, "m": {"b": 1, "a": 2}});
    let obj2 = json!({"a": 2, "m": {"a": 2, "b": 1}, "z": 1});

    assert_eq!(canonical_json(&obj1).unwrap(), canonical_json(&obj2).unwrap());
}
