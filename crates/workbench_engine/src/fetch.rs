use std::process::Stdio;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use tokio::process::Command;
use workbench_core::{ProblemSummary, StatementData};
use workbench_logging::{workbench_debug, workbench_warn};

use crate::parse::{parse_problem_list, parse_statement_page, problem_url};
use crate::types::{FailureKind, FetchError};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const JSON_ACCEPT: &str = "application/json,text/plain,*/*";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub attempts: u32,
    /// Pause after attempt `n` is `retry_backoff * n`.
    pub retry_backoff: Duration,
    /// curl-compatible program tried once after every attempt failed. Empty
    /// disables the fallback.
    pub fallback_command: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://codeforces.com".to_string(),
            user_agent: concat!("workbench/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(10),
            attempts: 3,
            retry_backoff: Duration::from_millis(300),
            fallback_command: vec!["curl".to_string()],
        }
    }
}

/// Remote problem catalogue.
#[async_trait::async_trait]
pub trait ProblemSource: Send + Sync {
    async fn fetch_problem_list(&self) -> Result<Vec<ProblemSummary>, FetchError>;
    async fn fetch_statement(&self, contest_id: u32, index: &str) -> Result<StatementData, FetchError>;
}

#[derive(Debug, Clone)]
pub struct CodeforcesSource {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl CodeforcesSource {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self { client, settings })
    }

    async fn get_once(&self, url: &str, accept: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(bytes.to_vec())
    }

    /// GET with retries; `check` turns a body into a value and may reject it,
    /// which also counts as a failed attempt.
    async fn get_with_retries<T>(
        &self,
        url: &str,
        accept: &str,
        check: impl Fn(&[u8]) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let attempts = self.settings.attempts.max(1);
        let mut last_error = FetchError::new(FailureKind::Network, "no attempt made");
        for attempt in 1..=attempts {
            match self.get_once(url, accept).await.and_then(|body| check(&body)) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    workbench_warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, url, err);
                    last_error = err;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.settings.retry_backoff * attempt).await;
            }
        }
        let last_error = FetchError::new(
            last_error.kind,
            format!("after {attempts} attempts: {}", last_error.message),
        );
        if self.settings.fallback_command.is_empty() {
            return Err(last_error);
        }

        workbench_debug!("Falling back to {:?} for {}", self.settings.fallback_command, url);
        match self.fallback_get(url, accept).await.and_then(|body| check(&body)) {
            Ok(value) => Ok(value),
            Err(err) => {
                workbench_warn!("Fallback fetch of {} failed: {}", url, err);
                Err(FetchError::new(
                    last_error.kind,
                    format!("{}; fallback: {}", last_error.message, err.message),
                ))
            }
        }
    }

    /// One GET through an external curl, which sometimes gets through where
    /// the HTTP client is rejected.
    async fn fallback_get(&self, url: &str, accept: &str) -> Result<Vec<u8>, FetchError> {
        let Some((program, leading)) = self.settings.fallback_command.split_first() else {
            return Err(FetchError::new(FailureKind::Network, "no fallback command"));
        };
        let base = self.settings.base_url.trim_end_matches('/');
        let max_time = self.settings.request_timeout.as_secs().max(1);
        let output = Command::new(program)
            .args(leading)
            .args(["-L", "--fail", "--silent", "--show-error", "--http1.1"])
            .arg("--max-time")
            .arg(max_time.to_string())
            .arg("-A")
            .arg(&self.settings.user_agent)
            .arg("-H")
            .arg(format!("Accept: {accept}"))
            .arg("-H")
            .arg("Accept-Language: en-US,en;q=0.9")
            .arg("-H")
            .arg("Cache-Control: no-cache")
            .arg("-e")
            .arg(format!("{base}/problemset"))
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| FetchError::new(FailureKind::Network, format!("{program} failed to start: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::new(
                FailureKind::Network,
                format!("{program} exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(output.stdout)
    }
}

#[async_trait::async_trait]
impl ProblemSource for CodeforcesSource {
    async fn fetch_problem_list(&self) -> Result<Vec<ProblemSummary>, FetchError> {
        let base = self.settings.base_url.trim_end_matches('/');
        let url = format!("{base}/api/problemset.problems");
        let problems = self
            .get_with_retries(&url, JSON_ACCEPT, |body| parse_problem_list(body, base))
            .await?;
        workbench_debug!("Fetched {} problems", problems.len());
        Ok(problems)
    }

    async fn fetch_statement(&self, contest_id: u32, index: &str) -> Result<StatementData, FetchError> {
        let url = problem_url(&self.settings.base_url, contest_id, index);
        let body = self.get_with_retries(&url, HTML_ACCEPT, |body| Ok(body.to_vec())).await?;
        let html = String::from_utf8_lossy(&body);
        parse_statement_page(&html, contest_id, index, &url)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
