//! Terminal rendering of the view model.

use workbench_core::{AppViewModel, LineDiff, ProblemSummary};
use workbench_engine::{plain_text, StatementRenderer};

pub fn problem_row(problem: &ProblemSummary) -> String {
    let rating = problem
        .rating
        .map_or_else(|| "-".to_string(), |r| r.to_string());
    let mut row = format!("{:<12} {:>5}  {}", problem.id, rating, problem.title);
    if !problem.tags.is_empty() {
        row.push_str(&format!("  [{}]", problem.tags.join(", ")));
    }
    row
}

pub fn statement_text(view: &AppViewModel, renderer: &StatementRenderer) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(title) = &view.problem_title {
        lines.push(format!("# {title}"));
    }
    if let Some(err) = &view.statement_error {
        lines.push(format!("Statement failed: {err}"));
    }
    if let Some(err) = &view.translation_error {
        lines.push(format!("Translation failed: {err}"));
    }
    if view.translation_ready == Some(false) && !view.statement_lang.is_primary() {
        lines.push("Translation support is not ready; showing the original statement.".to_string());
    }
    if let Some(source) = &view.statement {
        lines.push(plain_text(&renderer.render(source)));
    }
    lines
}

pub fn sample_report(view: &AppViewModel) -> Vec<String> {
    if view.no_samples {
        return vec!["No samples available for this problem.".to_string()];
    }
    let mut lines = vec![format!(
        "Samples: {}/{} passed",
        view.passed_count, view.total_count
    )];
    for row in &view.sample_rows {
        let marker = if row.index == view.selected_sample { ">" } else { " " };
        let verdict = if row.ok { "ok" } else { "FAIL" };
        match &row.error {
            Some(err) => lines.push(format!("{marker} #{} {verdict}: {err}", row.index + 1)),
            None => lines.push(format!("{marker} #{} {verdict}", row.index + 1)),
        }
    }
    if let Some(diff) = &view.selected_diff {
        lines.extend(diff_lines(diff));
    }
    lines
}

pub fn diff_lines(diff: &LineDiff) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(line) = diff.first_mismatch_line {
        lines.push(format!("First difference at line {line}"));
    }
    for row in &diff.rows {
        let marker = if row.matches { ' ' } else { '!' };
        lines.push(format!(
            "{marker} {:>3} | expected: {} | got: {}",
            row.line_number, row.expected, row.got
        ));
    }
    lines
}

pub fn install_line(view: &AppViewModel) -> String {
    let install = &view.install;
    if !install.error.is_empty() {
        format!("Install failed: {}", install.error)
    } else {
        install.progress_label()
    }
}
