use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use workbench_logging::workbench_warn;

pub type ProblemId = String;

/// One (input, expected output) pair shipped with a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub input: String,
    pub output: String,
}

impl Sample {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: ProblemId,
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub contest_id: Option<u32>,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default, rename = "statement_html")]
    pub statement_html: Option<String>,
    #[serde(default)]
    pub statement_md: Option<String>,
    #[serde(default)]
    pub statement_translations: BTreeMap<String, String>,
}

/// Structured statement data as returned by the problem source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementData {
    pub contest_id: u32,
    pub index: String,
    pub url: String,
    pub statement_html: String,
    pub samples: Vec<Sample>,
}

/// Why an asynchronous enrichment could not be attached to a problem record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("problem {0} is not in the current list")]
    UnknownProblem(ProblemId),
    #[error("statement for {contest_id}{index} does not belong to problem {problem_id}")]
    IdentityMismatch {
        problem_id: ProblemId,
        contest_id: u32,
        index: String,
    },
}

impl ProblemSummary {
    pub fn new(id: impl Into<ProblemId>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source: source.into(),
            url: None,
            contest_id: None,
            index: None,
            rating: None,
            tags: Vec::new(),
            samples: Vec::new(),
            statement_html: None,
            statement_md: None,
            statement_translations: BTreeMap::new(),
        }
    }

    /// Contest/index pair needed to fetch the statement, if the record carries one.
    pub fn fetch_identity(&self) -> Option<(u32, &str)> {
        let contest_id = self.contest_id?;
        let index = self.index.as_deref().map(str::trim).filter(|i| !i.is_empty())?;
        Some((contest_id, index))
    }

    pub fn needs_statement(&self) -> bool {
        self.statement_html.is_none() && self.fetch_identity().is_some()
    }

    pub fn first_sample_input(&self) -> Option<&str> {
        self.samples.first().map(|s| s.input.as_str())
    }

    /// Attaches fetched statement data. Touches only the statement markup, the
    /// sample set (when the fetch found any) and a missing url.
    pub fn attach_statement(&mut self, data: &StatementData) -> Result<(), MergeError> {
        let matches = self.contest_id == Some(data.contest_id)
            && self.index.as_deref() == Some(data.index.as_str());
        if !matches {
            return Err(MergeError::IdentityMismatch {
                problem_id: self.id.clone(),
                contest_id: data.contest_id,
                index: data.index.clone(),
            });
        }
        self.statement_html = Some(data.statement_html.clone());
        if !data.samples.is_empty() {
            self.samples = data.samples.clone();
        }
        if self.url.is_none() {
            self.url = Some(data.url.clone());
        }
        Ok(())
    }

    /// Attaches a translated statement for `lang`. Touches only that translation.
    pub fn attach_translation(&mut self, lang: &str, html: String) {
        self.statement_translations.insert(lang.to_string(), html);
    }

    pub fn translation(&self, lang: &str) -> Option<&str> {
        self.statement_translations.get(lang).map(String::as_str)
    }

    fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.id.to_lowercase().contains(&query)
            || self.title.to_lowercase().contains(&query)
            || self.tags.iter().any(|tag| tag.to_lowercase() == query)
    }
}

/// In-memory problem list. Records are addressed by id, never by position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProblemList {
    items: Vec<ProblemSummary>,
}

impl ProblemList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list. Later records reusing an id already seen are
    /// dropped so that merge-by-id stays unambiguous; returns how many were dropped.
    ///
    /// Statement and translation data already attached to a record with the same
    /// id and the same contest/index survive the refresh.
    pub fn replace_all(&mut self, incoming: Vec<ProblemSummary>) -> usize {
        let previous: BTreeMap<ProblemId, ProblemSummary> = self
            .items
            .drain(..)
            .map(|p| (p.id.clone(), p))
            .collect();
        let mut seen = HashSet::new();
        let mut dropped = 0;
        for mut problem in incoming {
            if !seen.insert(problem.id.clone()) {
                workbench_warn!("Duplicate problem id {} in list; keeping first", problem.id);
                dropped += 1;
                continue;
            }
            if let Some(old) = previous.get(&problem.id) {
                if old.fetch_identity() == problem.fetch_identity() {
                    carry_enrichment(old, &mut problem);
                }
            }
            self.items.push(problem);
        }
        dropped
    }

    pub fn get(&self, id: &str) -> Option<&ProblemSummary> {
        self.items.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProblemSummary> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn filter<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a ProblemSummary> + 'a {
        let query = query.trim();
        self.items
            .iter()
            .filter(move |p| query.is_empty() || p.matches_query(query))
    }

    pub fn merge_statement(&mut self, id: &str, data: &StatementData) -> Result<(), MergeError> {
        self.get_mut(id)?.attach_statement(data)
    }

    pub fn merge_translation(&mut self, id: &str, lang: &str, html: String) -> Result<(), MergeError> {
        self.get_mut(id)?.attach_translation(lang, html);
        Ok(())
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut ProblemSummary, MergeError> {
        self.items
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| MergeError::UnknownProblem(id.to_string()))
    }
}

fn carry_enrichment(old: &ProblemSummary, fresh: &mut ProblemSummary) {
    if fresh.statement_html.is_none() {
        fresh.statement_html = old.statement_html.clone();
    }
    if fresh.samples.is_empty() {
        fresh.samples = old.samples.clone();
    }
    for (lang, html) in &old.statement_translations {
        fresh
            .statement_translations
            .entry(lang.clone())
            .or_insert_with(|| html.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cf(contest_id: u32, index: &str) -> ProblemSummary {
        let mut p = ProblemSummary::new(format!("CF-{contest_id}-{index}"), "T", "Codeforces");
        p.contest_id = Some(contest_id);
        p.index = Some(index.to_string());
        p
    }

    fn statement(contest_id: u32, index: &str) -> StatementData {
        StatementData {
            contest_id,
            index: index.to_string(),
            url: format!("https://codeforces.com/problemset/problem/{contest_id}/{index}"),
            statement_html: "<div>stmt</div>".to_string(),
            samples: vec![Sample::new("1\n", "2\n")],
        }
    }

    #[test]
    fn merge_rejects_statement_for_other_identity() {
        let mut list = ProblemList::new();
        list.replace_all(vec![cf(1, "A"), cf(1, "B")]);

        let err = list.merge_statement("CF-1-A", &statement(1, "B")).unwrap_err();
        assert!(matches!(err, MergeError::IdentityMismatch { .. }));
        assert!(list.get("CF-1-A").unwrap().statement_html.is_none());
        assert!(list.get("CF-1-B").unwrap().statement_html.is_none());
    }

    #[test]
    fn merge_only_touches_target_record() {
        let mut list = ProblemList::new();
        list.replace_all(vec![cf(1, "A"), cf(1, "B")]);
        list.merge_statement("CF-1-B", &statement(1, "B")).unwrap();

        assert!(list.get("CF-1-A").unwrap().statement_html.is_none());
        let b = list.get("CF-1-B").unwrap();
        assert_eq!(b.statement_html.as_deref(), Some("<div>stmt</div>"));
        assert_eq!(b.samples.len(), 1);
        assert_eq!(b.title, "T");
    }

    #[test]
    fn duplicate_ids_are_dropped_on_replace() {
        let mut list = ProblemList::new();
        let dropped = list.replace_all(vec![cf(1, "A"), cf(1, "A"), cf(2, "A")]);
        assert_eq!(dropped, 1);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn refresh_keeps_enrichment_only_for_same_identity() {
        let mut list = ProblemList::new();
        list.replace_all(vec![cf(1, "A")]);
        list.merge_statement("CF-1-A", &statement(1, "A")).unwrap();

        list.replace_all(vec![cf(1, "A")]);
        assert!(list.get("CF-1-A").unwrap().statement_html.is_some());

        let mut reassigned = cf(9, "Z");
        reassigned.id = "CF-1-A".to_string();
        list.replace_all(vec![reassigned]);
        assert!(list.get("CF-1-A").unwrap().statement_html.is_none());
    }

    #[test]
    fn unknown_problem_is_reported() {
        let mut list = ProblemList::new();
        let err = list.merge_translation("nope", "zh", String::new()).unwrap_err();
        assert_eq!(err, MergeError::UnknownProblem("nope".to_string()));
    }
}
