use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::caches::CacheTtls;
use crate::exec::ExecSettings;
use crate::fetch::FetchSettings;
use crate::translate::TranslatorSettings;
use crate::ttl::Clock;

/// Everything needed to build the default engine services.
#[derive(Clone)]
pub struct EngineConfig {
    /// Directory holding the `{key}.json` cache files.
    pub data_dir: PathBuf,
    pub ttls: CacheTtls,
    pub fetch: FetchSettings,
    pub exec: ExecSettings,
    pub translator: TranslatorSettings,
    pub install_poll_interval: Duration,
    pub clock: Arc<dyn Clock>,
}

impl EngineConfig {
    pub fn default_with_data_dir(data_dir: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self {
            data_dir,
            ttls: CacheTtls::default(),
            fetch: FetchSettings::default(),
            exec: ExecSettings::default(),
            translator: TranslatorSettings::default(),
            install_poll_interval: Duration::from_millis(800),
            clock,
        }
    }
}
