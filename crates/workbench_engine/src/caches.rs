use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use workbench_core::{
    DraftBook, ProblemDraft, ProblemId, ProblemSummary, RawDraft, StatementData, StatementLang,
};
use workbench_logging::{workbench_debug, workbench_warn};

use crate::store::LocalCacheStore;
use crate::ttl::{Clock, TtlCache};

pub const PROBLEM_LIST_KEY: &str = "problem_list_cache";
pub const STATEMENT_KEY: &str = "statement_cache";
pub const TRANSLATION_KEY: &str = "translation_cache";
pub const DRAFT_KEY: &str = "draft_cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub problem_list: Duration,
    pub statement: Duration,
    pub translation: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            problem_list: Duration::from_secs(30 * 60),
            statement: Duration::from_secs(7 * 24 * 60 * 60),
            translation: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// The three remote-data caches, sharing one store and one clock.
#[derive(Clone)]
pub struct WorkbenchCaches {
    problem_list: TtlCache<Vec<ProblemSummary>>,
    statements: TtlCache<StatementData>,
    translations: TtlCache<String>,
}

impl WorkbenchCaches {
    pub fn new(store: LocalCacheStore, clock: Arc<dyn Clock>, ttls: CacheTtls) -> Self {
        Self {
            problem_list: TtlCache::new(
                store.clone(),
                Arc::clone(&clock),
                PROBLEM_LIST_KEY,
                ttls.problem_list,
            ),
            statements: TtlCache::new(
                store.clone(),
                Arc::clone(&clock),
                STATEMENT_KEY,
                ttls.statement,
            ),
            translations: TtlCache::new(store, clock, TRANSLATION_KEY, ttls.translation),
        }
    }

    pub fn problem_list(&self) -> Option<Vec<ProblemSummary>> {
        self.problem_list.read_fresh(&[])
    }

    pub fn store_problem_list(&self, problems: &[ProblemSummary]) {
        self.problem_list.write(&[], &problems.to_vec());
    }

    /// Cached statement, only if it still belongs to the requested identity.
    pub fn statement(&self, problem_id: &str, contest_id: u32, index: &str) -> Option<StatementData> {
        self.statements
            .read_fresh(&[problem_id])
            .filter(|data| data.contest_id == contest_id && data.index == index)
    }

    pub fn store_statement(&self, problem_id: &str, statement: &StatementData) {
        self.statements.write(&[problem_id], statement);
    }

    pub fn translation(&self, problem_id: &str, lang: StatementLang) -> Option<String> {
        self.translations.read_fresh(&[problem_id, lang.code()])
    }

    pub fn store_translation(&self, problem_id: &str, lang: StatementLang, html: &str) {
        self.translations
            .write(&[problem_id, lang.code()], &html.to_string());
    }
}

/// Drafts persist without expiry; every load is normalized entry by entry.
#[derive(Debug, Clone)]
pub struct DraftStore {
    store: LocalCacheStore,
}

impl DraftStore {
    pub fn new(store: LocalCacheStore) -> Self {
        Self { store }
    }

    pub fn load(&self) -> DraftBook {
        let Some(root) = self.store.read::<BTreeMap<String, Value>>(DRAFT_KEY) else {
            return DraftBook::new();
        };
        let mut raw = BTreeMap::new();
        for (problem_id, value) in root {
            match serde_json::from_value::<RawDraft>(value) {
                Ok(draft) => {
                    raw.insert(problem_id, draft);
                }
                Err(err) => workbench_warn!("Dropping unreadable draft {}: {}", problem_id, err),
            }
        }
        workbench_debug!("Loaded {} drafts", raw.len());
        DraftBook::from_raw(raw)
    }

    pub fn save(&self, drafts: &BTreeMap<ProblemId, ProblemDraft>) {
        self.store.write(DRAFT_KEY, drafts);
    }
}
