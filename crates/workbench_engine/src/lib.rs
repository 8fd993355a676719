//! Workbench engine: caches, problem source, code execution, statement
//! rendering and the translation backend, driven by effects from the core.
mod caches;
mod config;
mod engine;
mod exec;
mod fetch;
mod labels;
mod markup;
mod math;
mod parse;
mod poller;
mod render;
mod runner;
mod store;
mod translate;
mod ttl;
mod types;

pub use caches::{
    CacheTtls, DraftStore, WorkbenchCaches, DRAFT_KEY, PROBLEM_LIST_KEY, STATEMENT_KEY,
    TRANSLATION_KEY,
};
pub use config::EngineConfig;
pub use engine::{EngineError, EngineHandle, EngineServices};
pub use exec::{CodeExecutor, ExecError, ExecSettings, LocalProcessExecutor, SingleSlotExecutor};
pub use fetch::{CodeforcesSource, FetchSettings, ProblemSource};
pub use labels::localize_section_labels;
pub use math::{rewrite_math, LazyTypesetter, MarkupTypesetter, TypesetError, Typesetter};
pub use parse::{parse_problem_list, parse_statement_page, problem_url};
pub use poller::{InstallPoller, PollResult};
pub use render::{plain_text, StatementRenderer};
pub use runner::{run_once, run_samples};
pub use store::{ensure_data_dir, FileStore, KeyValueStore, LocalCacheStore, MemoryStore, PersistError};
pub use translate::{
    CommandTranslationBackend, TranslationBackend, TranslationError, TranslatorSettings,
};
pub use ttl::{CacheEntry, Clock, ManualClock, TtlCache};
pub use types::{EngineEvent, FailureKind, FetchError};
