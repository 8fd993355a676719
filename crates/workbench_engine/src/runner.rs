use workbench_core::{LanguageKey, Sample, SampleResult, SampleRun, SampleRunOutcome};
use workbench_logging::workbench_info;

use crate::exec::CodeExecutor;

/// Run every sample in order, one execution at a time.
///
/// An execution failure is recorded for that sample and the batch goes on.
/// With no samples the executor is never called.
pub async fn run_samples(
    executor: &dyn CodeExecutor,
    lang: LanguageKey,
    code: &str,
    samples: &[Sample],
) -> SampleRunOutcome {
    if samples.is_empty() {
        return SampleRunOutcome::NoSamples;
    }

    let mut results = Vec::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        let outcome = executor
            .execute(lang, code, &sample.input)
            .await
            .map_err(|err| err.to_string());
        results.push(SampleResult::evaluate(index, sample, outcome));
    }

    let run = SampleRun::from_results(results);
    workbench_info!("Samples passed {}/{}", run.passed_count, run.total());
    SampleRunOutcome::Completed(run)
}

/// Single run against custom stdin. Failures keep their message verbatim.
pub async fn run_once(
    executor: &dyn CodeExecutor,
    lang: LanguageKey,
    code: &str,
    stdin: &str,
) -> Result<String, String> {
    executor
        .execute(lang, code, stdin)
        .await
        .map_err(|err| err.to_string())
}
