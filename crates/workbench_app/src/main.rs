mod platform;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use workbench_core::{LanguageKey, Msg, StatementLang};
use workbench_engine::{ensure_data_dir, EngineHandle, StatementRenderer};
use workbench_logging::{initialize, workbench_info, LogDestination};

use platform::app::Controller;
use platform::config::{load_config, ChronoClock, WorkbenchConfig};
use platform::report;

#[derive(Parser)]
#[command(name = "workbench")]
#[command(about = "Browse problems, keep drafts and check solutions against samples")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List problems, optionally filtered by id, title or tag
    List { filter: Option<String> },

    /// Print a problem statement
    Show {
        id: String,
        /// Statement language (en or zh)
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// Run a solution against every sample of a problem
    Test {
        id: String,
        file: PathBuf,
        /// cpp, py or js; guessed from the file extension when omitted
        #[arg(long)]
        lang: Option<String>,
    },

    /// Run a solution once and print its output
    Run {
        id: String,
        file: PathBuf,
        #[arg(long)]
        lang: Option<String>,
        /// File fed to stdin; the saved draft input is used when omitted
        #[arg(long)]
        stdin: Option<PathBuf>,
    },

    /// Install local translation support and report progress
    InstallTranslation,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;
    init_logging(&config, cli.verbose);

    ensure_data_dir(&config.data_dir)
        .with_context(|| format!("cannot use data directory {:?}", config.data_dir))?;
    let engine = EngineHandle::new(&config.to_engine_config(Arc::new(ChronoClock)))?;
    let mut controller = Controller::new(engine, config.engine_wait());

    match cli.command {
        Commands::List { filter } => list(&mut controller, filter.as_deref()),
        Commands::Show { id, lang } => show(&mut controller, &id, &lang),
        Commands::Test { id, file, lang } => test(&mut controller, &id, &file, lang.as_deref()),
        Commands::Run {
            id,
            file,
            lang,
            stdin,
        } => run(&mut controller, &id, &file, lang.as_deref(), stdin.as_deref()),
        Commands::InstallTranslation => install_translation(&mut controller),
    }
}

fn init_logging(config: &WorkbenchConfig, verbose: bool) {
    let (destination, level) = match (&config.log_file, verbose) {
        (Some(path), true) => (LogDestination::Both(path.clone()), LevelFilter::Debug),
        (Some(path), false) => (LogDestination::File(path.clone()), LevelFilter::Info),
        (None, true) => (LogDestination::Terminal, LevelFilter::Debug),
        (None, false) => (LogDestination::Terminal, LevelFilter::Warn),
    };
    initialize(destination, level);
}

fn start(controller: &mut Controller) -> Result<()> {
    controller.start()?;
    if let Some(err) = controller.view().list_error {
        bail!("problem list unavailable: {err}");
    }
    Ok(())
}

fn select(controller: &mut Controller, id: &str) -> Result<()> {
    start(controller)?;
    controller.send(Msg::ProblemSelected(id.to_string()))?;
    if controller.state().selected_id() != Some(id) {
        bail!("unknown problem {id}");
    }
    if let Some(err) = controller.view().statement_error {
        bail!("statement for {id} unavailable: {err}");
    }
    Ok(())
}

fn list(controller: &mut Controller, filter: Option<&str>) -> Result<()> {
    start(controller)?;
    let problems = controller.state().problems();
    let mut shown = 0;
    for problem in problems.filter(filter.unwrap_or_default()) {
        println!("{}", report::problem_row(problem));
        shown += 1;
    }
    workbench_info!("Listed {} of {} problems", shown, problems.len());
    Ok(())
}

fn show(controller: &mut Controller, id: &str, lang: &str) -> Result<()> {
    let lang = StatementLang::from_code(lang).ok_or_else(|| anyhow!("unsupported statement language {lang}"))?;
    select(controller, id)?;
    controller.send(Msg::StatementLanguageChanged(lang))?;

    let renderer = StatementRenderer::default();
    for line in report::statement_text(&controller.view(), &renderer) {
        println!("{line}");
    }
    if let Some(problem) = controller.state().selected_problem() {
        for (i, sample) in problem.samples.iter().enumerate() {
            println!("\nSample {} input:\n{}", i + 1, sample.input);
            println!("Sample {} output:\n{}", i + 1, sample.output);
        }
    }
    Ok(())
}

fn load_draft(controller: &mut Controller, file: &Path, lang: Option<&str>) -> Result<()> {
    let lang = resolve_language(lang, file)?;
    let code = fs::read_to_string(file).with_context(|| format!("cannot read {file:?}"))?;
    controller.send(Msg::LanguageChanged(lang))?;
    controller.send(Msg::CodeEdited(code))
}

fn test(controller: &mut Controller, id: &str, file: &Path, lang: Option<&str>) -> Result<()> {
    select(controller, id)?;
    load_draft(controller, file, lang)?;
    controller.send(Msg::RunSamplesClicked)?;
    for line in report::sample_report(&controller.view()) {
        println!("{line}");
    }
    Ok(())
}

fn run(
    controller: &mut Controller,
    id: &str,
    file: &Path,
    lang: Option<&str>,
    stdin: Option<&Path>,
) -> Result<()> {
    select(controller, id)?;
    load_draft(controller, file, lang)?;
    if let Some(path) = stdin {
        let input = fs::read_to_string(path).with_context(|| format!("cannot read {path:?}"))?;
        controller.send(Msg::StdinEdited(input))?;
    }
    controller.send(Msg::RunClicked)?;
    print!("{}", controller.view().run_output.unwrap_or_default());
    Ok(())
}

fn install_translation(controller: &mut Controller) -> Result<()> {
    let mut last = String::new();
    let mut printed_logs = 0;
    controller.send_observed(Msg::InstallRequested, |view| {
        for line in view.install.logs.iter().skip(printed_logs) {
            println!("  {line}");
        }
        printed_logs = view.install.logs.len();
        let line = report::install_line(view);
        if line != last {
            println!("{line}");
            last = line;
        }
    })?;

    let install = controller.state().install_state();
    if !install.error.is_empty() {
        bail!("translation install failed: {}", install.error);
    }
    Ok(())
}

fn resolve_language(arg: Option<&str>, file: &Path) -> Result<LanguageKey> {
    if let Some(key) = arg {
        return LanguageKey::from_key(key).ok_or_else(|| anyhow!("unsupported language {key}"));
    }
    let ext = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "cpp" | "cc" | "cxx" => Ok(LanguageKey::Cpp),
        "py" => Ok(LanguageKey::Python),
        "js" | "mjs" => Ok(LanguageKey::JavaScript),
        _ => bail!("cannot tell the language of {file:?}; pass --lang"),
    }
}
