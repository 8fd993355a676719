use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use workbench_core::{DraftBook, LanguageKey, ProblemDraft, RawDraft, Sample};

fn init_logging() {
    workbench_logging::initialize_for_tests();
}

fn renormalize(draft: &ProblemDraft) -> ProblemDraft {
    ProblemDraft::normalize(RawDraft::from(draft))
}

#[test]
fn normalization_is_idempotent_for_malformed_drafts() {
    init_logging();
    let malformed = vec![
        RawDraft::default(),
        RawDraft {
            lang: Some("rust".to_string()),
            ..RawDraft::default()
        },
        RawDraft {
            lang: Some("py".to_string()),
            drafts: Some(BTreeMap::from([
                ("py".to_string(), Some("print(1)".to_string())),
                ("cpp".to_string(), None),
                ("go".to_string(), Some("package main".to_string())),
            ])),
            stdin: Some("3\n".to_string()),
            has_edited_stdin: Some(true),
        },
    ];

    for raw in malformed {
        let once = ProblemDraft::normalize(raw);
        assert_eq!(renormalize(&once), once);
        for lang in LanguageKey::ALL {
            assert!(once.drafts.contains_key(&lang), "missing {lang}");
        }
    }
}

#[test]
fn normalization_backfills_templates_and_falls_back_to_first_language() {
    let raw: RawDraft = serde_json::from_str(
        r#"{"lang":"kotlin","drafts":{"py":"print(42)"},"stdin":"1 2\n"}"#,
    )
    .unwrap();
    let draft = ProblemDraft::normalize(raw);

    assert_eq!(draft.lang, LanguageKey::first());
    assert_eq!(draft.code_for(LanguageKey::Python), "print(42)");
    assert_eq!(
        draft.code_for(LanguageKey::JavaScript),
        LanguageKey::JavaScript.template()
    );
    assert_eq!(draft.stdin, "1 2\n");
    assert!(!draft.has_edited_stdin);
}

#[test]
fn stored_code_survives_non_canonical_language_keys() {
    let raw: RawDraft = serde_json::from_str(
        r#"{"lang":"PY","drafts":{"PY":"print(7)"," js ":"console.log(7)","cpp":null}}"#,
    )
    .unwrap();
    let draft = ProblemDraft::normalize(raw);

    assert_eq!(draft.lang, LanguageKey::Python);
    assert_eq!(draft.code(), "print(7)");
    assert_eq!(draft.code_for(LanguageKey::JavaScript), "console.log(7)");
    assert_eq!(draft.code_for(LanguageKey::Cpp), LanguageKey::Cpp.template());
}

#[test]
fn canonical_key_wins_over_a_variant_spelling() {
    let raw = RawDraft {
        drafts: Some(BTreeMap::from([
            ("PY".to_string(), Some("old".to_string())),
            ("py".to_string(), Some("new".to_string())),
        ])),
        ..RawDraft::default()
    };
    let draft = ProblemDraft::normalize(raw);
    assert_eq!(draft.code_for(LanguageKey::Python), "new");
}

#[test]
fn get_draft_defaults_without_storing() {
    let book = DraftBook::new();
    let draft = book.get_draft("CF-1-A", Some("5\n"));

    assert_eq!(draft.lang, LanguageKey::Cpp);
    assert_eq!(draft.stdin, "5\n");
    assert!(book.is_empty());
}

#[test]
fn update_before_any_draft_exists_starts_from_default() {
    let mut book = DraftBook::new();
    let changed = book.update_draft("CF-1-A", None, |mut d| {
        d.set_lang(LanguageKey::Python);
        d.set_code("print(input())");
        d
    });

    assert!(changed);
    let stored = book.get("CF-1-A").unwrap();
    assert_eq!(stored.lang, LanguageKey::Python);
    assert_eq!(stored.code(), "print(input())");
    assert_eq!(stored.code_for(LanguageKey::Cpp), LanguageKey::Cpp.template());

    let unchanged = book.update_draft("CF-1-A", None, |d| d);
    assert!(!unchanged);
}

#[test]
fn auto_seed_fires_exactly_once() {
    init_logging();
    let mut book = DraftBook::new();
    book.update_draft("p", None, |d| d);

    assert!(book.seed_stdin_from_samples("p", &[Sample::new("5\n", "25\n")]));
    assert_eq!(book.get("p").unwrap().stdin, "5\n");

    book.update_draft("p", None, |mut d| {
        d.edit_stdin("5\n");
        d
    });
    assert!(book.get("p").unwrap().has_edited_stdin);

    assert!(!book.seed_stdin_from_samples("p", &[Sample::new("9\n", "81\n")]));
    assert_eq!(book.get("p").unwrap().stdin, "5\n");
}

#[test]
fn auto_seed_skips_cleared_but_edited_stdin() {
    let mut book = DraftBook::new();
    book.update_draft("p", None, |mut d| {
        d.edit_stdin("");
        d
    });

    assert!(!book.seed_stdin_from_samples("p", &[Sample::new("1\n", "1\n")]));
    assert_eq!(book.get("p").unwrap().stdin, "");
}

#[test]
fn drafts_serialize_with_language_keys() {
    let mut draft = ProblemDraft::new(None);
    draft.set_lang(LanguageKey::JavaScript);
    let json = serde_json::to_value(&draft).unwrap();

    assert_eq!(json["lang"], "js");
    assert!(json["drafts"].get("cpp").is_some());
    assert_eq!(json["hasEditedStdin"], false);

    let raw: RawDraft = serde_json::from_value(json).unwrap();
    assert_eq!(ProblemDraft::normalize(raw), draft);
}
