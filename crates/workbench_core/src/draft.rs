use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{LanguageKey, ProblemId, Sample};

/// Per-problem editor state: code per language, the active language and stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDraft {
    pub lang: LanguageKey,
    pub drafts: BTreeMap<LanguageKey, String>,
    pub stdin: String,
    pub has_edited_stdin: bool,
}

/// Lenient persisted shape of a draft. Every field may be missing and language
/// keys are free strings, so drafts written by older or newer builds still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDraft {
    pub lang: Option<String>,
    pub drafts: Option<BTreeMap<String, Option<String>>>,
    pub stdin: Option<String>,
    pub has_edited_stdin: Option<bool>,
}

impl ProblemDraft {
    /// Fresh draft: first language active, every language on its template.
    pub fn new(stdin_hint: Option<&str>) -> Self {
        Self {
            lang: LanguageKey::first(),
            drafts: LanguageKey::ALL
                .into_iter()
                .map(|lang| (lang, lang.template().to_string()))
                .collect(),
            stdin: stdin_hint.unwrap_or_default().to_string(),
            has_edited_stdin: false,
        }
    }

    /// Repairs a persisted draft: missing languages get their template and an
    /// unknown active language falls back to the first one.
    pub fn normalize(raw: RawDraft) -> Self {
        let mut stored: BTreeMap<LanguageKey, String> = BTreeMap::new();
        for (key, code) in raw.drafts.unwrap_or_default() {
            let (Some(lang), Some(code)) = (LanguageKey::from_key(&key), code) else {
                continue;
            };
            // The canonical spelling wins over variants like "PY" or " py".
            if key == lang.key() {
                stored.insert(lang, code);
            } else {
                stored.entry(lang).or_insert(code);
            }
        }
        let drafts = LanguageKey::ALL
            .into_iter()
            .map(|lang| {
                let code = stored
                    .remove(&lang)
                    .unwrap_or_else(|| lang.template().to_string());
                (lang, code)
            })
            .collect();
        Self {
            lang: raw
                .lang
                .as_deref()
                .and_then(LanguageKey::from_key)
                .unwrap_or_else(LanguageKey::first),
            drafts,
            stdin: raw.stdin.unwrap_or_default(),
            has_edited_stdin: raw.has_edited_stdin.unwrap_or(false),
        }
    }

    pub fn code(&self) -> &str {
        self.code_for(self.lang)
    }

    pub fn code_for(&self, lang: LanguageKey) -> &str {
        self.drafts
            .get(&lang)
            .map(String::as_str)
            .unwrap_or_else(|| lang.template())
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.drafts.insert(self.lang, code.into());
    }

    pub fn set_lang(&mut self, lang: LanguageKey) {
        self.lang = lang;
        self.drafts
            .entry(lang)
            .or_insert_with(|| lang.template().to_string());
    }

    /// Manual stdin edit; disables auto-seeding for good.
    pub fn edit_stdin(&mut self, stdin: impl Into<String>) {
        self.stdin = stdin.into();
        self.has_edited_stdin = true;
    }

    /// Seeds stdin from a sample input while the user has never touched it.
    pub fn seed_stdin(&mut self, input: &str) -> bool {
        if self.has_edited_stdin || !self.stdin.is_empty() || input.is_empty() {
            return false;
        }
        self.stdin = input.to_string();
        true
    }
}

impl From<&ProblemDraft> for RawDraft {
    fn from(draft: &ProblemDraft) -> Self {
        Self {
            lang: Some(draft.lang.key().to_string()),
            drafts: Some(
                draft
                    .drafts
                    .iter()
                    .map(|(lang, code)| (lang.key().to_string(), Some(code.clone())))
                    .collect(),
            ),
            stdin: Some(draft.stdin.clone()),
            has_edited_stdin: Some(draft.has_edited_stdin),
        }
    }
}

/// All drafts known to the session, keyed by problem id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftBook {
    drafts: BTreeMap<ProblemId, ProblemDraft>,
}

impl DraftBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw(raw: BTreeMap<ProblemId, RawDraft>) -> Self {
        Self {
            drafts: raw
                .into_iter()
                .map(|(id, draft)| (id, ProblemDraft::normalize(draft)))
                .collect(),
        }
    }

    pub fn from_drafts(drafts: BTreeMap<ProblemId, ProblemDraft>) -> Self {
        Self { drafts }
    }

    pub fn get(&self, problem_id: &str) -> Option<&ProblemDraft> {
        self.drafts.get(problem_id)
    }

    /// Stored draft, or the default a first visit would create.
    pub fn get_draft(&self, problem_id: &str, stdin_hint: Option<&str>) -> ProblemDraft {
        self.drafts
            .get(problem_id)
            .cloned()
            .unwrap_or_else(|| ProblemDraft::new(stdin_hint))
    }

    /// Read-modify-write. Returns whether the stored draft changed, which
    /// includes creating it.
    pub fn update_draft(
        &mut self,
        problem_id: &str,
        stdin_hint: Option<&str>,
        updater: impl FnOnce(ProblemDraft) -> ProblemDraft,
    ) -> bool {
        let previous = self.drafts.get(problem_id);
        let current = previous
            .cloned()
            .unwrap_or_else(|| ProblemDraft::new(stdin_hint));
        let next = updater(current);
        if previous == Some(&next) {
            return false;
        }
        self.drafts.insert(problem_id.to_string(), next);
        true
    }

    /// Applies the auto-seed rule for a freshly known sample set.
    pub fn seed_stdin_from_samples(&mut self, problem_id: &str, samples: &[Sample]) -> bool {
        let Some(first) = samples.first() else {
            return false;
        };
        let hint = Some(first.input.as_str());
        self.update_draft(problem_id, hint, |mut draft| {
            draft.seed_stdin(&first.input);
            draft
        })
    }

    pub fn as_map(&self) -> &BTreeMap<ProblemId, ProblemDraft> {
        &self.drafts
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
