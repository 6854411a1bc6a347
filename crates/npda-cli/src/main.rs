//! Command-line interface for the npda acceptance checker.

use clap::{Args, Parser, Subcommand};
use miette::{Diagnostic, NamedSource, SourceSpan};
use notify::{RecursiveMode, Watcher};
use npda_search::{
    batch_items, compile, run_batch, Automaton, BatchReport, BatchRow, Expectation, RunOutcome,
    SearchConfig, Searcher,
};
use npda_syntax::parse;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI error with source context for pretty printing.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("failed to read file: {message}")]
    IoError { message: String },

    #[error("parse error: {message}")]
    #[diagnostic(code(npda::parse_error))]
    ParseError {
        message: String,
        #[source_code]
        src: NamedSource<Arc<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("{message}")]
    Other { message: String },
}

impl CliError {
    fn from_parse_error(e: npda_syntax::ParseError, source: Arc<String>, filename: &str) -> Self {
        let span = e.span();
        CliError::ParseError {
            message: e.to_string(),
            src: NamedSource::new(filename, source),
            span: (span.start, span.len()).into(),
        }
    }
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "npda", version)]
#[command(about = "Nondeterministic pushdown automaton acceptance checker", long_about = None)]
struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Search ceilings shared by every searching subcommand.
#[derive(Args, Clone)]
struct LimitArgs {
    /// Maximum number of configurations to explore (0 = unlimited)
    #[arg(long, default_value = "1000000")]
    max_configs: usize,

    /// Maximum depth to explore (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_depth: usize,

    /// Maximum search time in seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_time: u64,

    /// Maximum memory usage in MB (0 = unlimited)
    #[arg(long, default_value = "0")]
    memory_limit: usize,
}

impl LimitArgs {
    fn to_config(&self) -> SearchConfig {
        SearchConfig {
            max_configs: self.max_configs,
            max_depth: self.max_depth,
            max_time_secs: self.max_time,
            memory_limit_mb: self.memory_limit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an automaton definition and show a summary
    Parse {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Decide acceptance of one input string
    Accept {
        /// Automaton definition file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Input string to test
        #[arg(value_name = "INPUT")]
        input: String,

        /// Print the witness trace on acceptance
        #[arg(long)]
        trace: bool,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Run accept-expected and reject-expected string batches
    Batch {
        /// Automaton definition file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Strings expected to be accepted, one per line
        #[arg(value_name = "ACCEPT_FILE")]
        accept_file: PathBuf,

        /// Strings expected to be rejected, one per line
        #[arg(value_name = "REJECT_FILE")]
        reject_file: PathBuf,

        /// Write the full report as JSON
        #[arg(long, value_name = "PATH")]
        json: Option<PathBuf>,

        /// Disable parallel evaluation
        #[arg(long)]
        no_parallel: bool,

        /// Number of threads for parallel evaluation (0 = use all available)
        #[arg(long, default_value = "0")]
        threads: usize,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Watch the definition and batch files, re-running on changes
    Watch {
        /// Automaton definition file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Strings expected to be accepted, one per line
        #[arg(value_name = "ACCEPT_FILE")]
        accept_file: PathBuf,

        /// Strings expected to be rejected, one per line
        #[arg(value_name = "REJECT_FILE")]
        reject_file: PathBuf,

        #[command(flatten)]
        limits: LimitArgs,
    },
}

fn main() {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let parse_command = matches!(&cli.command, Commands::Parse { .. });

    let result = match cli.command {
        Commands::Parse { file } => cmd_parse(&file, cli.verbose),
        Commands::Accept {
            file,
            input,
            trace,
            limits,
        } => cmd_accept(&file, &input, trace, &limits.to_config()),
        Commands::Batch {
            file,
            accept_file,
            reject_file,
            json,
            no_parallel,
            threads,
            limits,
        } => cmd_batch(
            &file,
            &accept_file,
            &reject_file,
            json.as_ref(),
            !no_parallel,
            threads,
            &limits.to_config(),
        ),
        Commands::Watch {
            file,
            accept_file,
            reject_file,
            limits,
        } => cmd_watch(&file, &accept_file, &reject_file, &limits.to_config()),
    };

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(if parse_command { 1 } else { 2 });
    }
}

fn load_automaton(file: &PathBuf) -> CliResult<Automaton> {
    let filename = file.display().to_string();
    let source = Arc::new(fs::read_to_string(file).map_err(|e| CliError::IoError {
        message: e.to_string(),
    })?);

    let def =
        parse(&source).map_err(|e| CliError::from_parse_error(e, source.clone(), &filename))?;

    let automaton = compile(&def);
    info!(
        states = automaton.state_count(),
        transitions = automaton.transition_count(),
        "loaded {}",
        filename
    );
    Ok(automaton)
}

fn read_batch_lines(file: &PathBuf) -> CliResult<Vec<String>> {
    let text = fs::read_to_string(file).map_err(|e| CliError::IoError {
        message: e.to_string(),
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

fn cmd_parse(file: &PathBuf, verbose: bool) -> CliResult<()> {
    let filename = file.display().to_string();
    let source = Arc::new(fs::read_to_string(file).map_err(|e| CliError::IoError {
        message: e.to_string(),
    })?);

    let def =
        parse(&source).map_err(|e| CliError::from_parse_error(e, source.clone(), &filename))?;

    if verbose {
        println!("{:#?}", def);
    } else {
        println!("automaton {}", filename);
        println!("  declared states: {}", def.states.join(" "));
        println!("  input alphabet: {}", def.input_alphabet.join(" "));
        println!("  stack alphabet: {}", def.stack_alphabet.join(" "));
        println!("  start: {} / {}", def.start_state, def.start_stack);
        println!("  acceptance: {}", def.mode);
        if !def.accepting.is_empty() {
            println!("  accepting states: {}", def.accepting.join(" "));
        }
        println!("  transitions: {}", def.transitions.len());
    }

    println!("parse: ok");
    Ok(())
}

fn cmd_accept(file: &PathBuf, input: &str, show_trace: bool, config: &SearchConfig) -> CliResult<()> {
    let automaton = load_automaton(file)?;
    let searcher = Searcher::new(&automaton, config.clone());

    let start = Instant::now();
    let outcome = searcher.run(input);
    let elapsed = start.elapsed();
    let stats = outcome.stats();

    println!();
    match &outcome {
        RunOutcome::Accepted { trace, .. } => {
            println!("Result: ACCEPTED");
            println!("  Configurations explored: {}", stats.configs_explored);
            println!("  Max depth: {}", stats.max_depth);
            println!("  Time: {:.2}s", elapsed.as_secs_f64());
            if show_trace {
                let symbols: Vec<char> = input.chars().collect();
                println!("  Witness ({} steps):", trace.len());
                for (i, step) in trace.iter().enumerate() {
                    println!("    {}: {}", i, step.render(&automaton, &symbols));
                }
            }
        }
        RunOutcome::Rejected { .. } => {
            println!("Result: REJECTED");
            println!("  Configurations explored: {}", stats.configs_explored);
            println!("  Max depth: {}", stats.max_depth);
            println!("  Time: {:.2}s", elapsed.as_secs_f64());
            std::process::exit(1);
        }
        RunOutcome::MemoryLimitReached { memory_mb, .. } => {
            println!("Result: MEMORY LIMIT REACHED");
            println!("  Memory usage: {} MB", memory_mb);
            println!("  Configurations explored: {}", stats.configs_explored);
            println!("  Max depth: {}", stats.max_depth);
            println!("  Time: {:.2}s", elapsed.as_secs_f64());
            std::process::exit(2);
        }
        RunOutcome::ConfigLimitReached { .. } => {
            println!("Result: CONFIG LIMIT REACHED");
            println!("  Configurations explored: {}", stats.configs_explored);
            println!("  Max depth: {}", stats.max_depth);
            println!("  Time: {:.2}s", elapsed.as_secs_f64());
            std::process::exit(2);
        }
        RunOutcome::DepthLimitReached { .. } => {
            println!("Result: DEPTH LIMIT REACHED");
            println!("  Configurations explored: {}", stats.configs_explored);
            println!("  Max depth: {}", stats.max_depth);
            println!("  Time: {:.2}s", elapsed.as_secs_f64());
            std::process::exit(2);
        }
        RunOutcome::TimeLimitReached { .. } => {
            println!("Result: TIME LIMIT REACHED");
            println!("  Configurations explored: {}", stats.configs_explored);
            println!("  Max depth: {}", stats.max_depth);
            println!("  Time: {:.2}s", elapsed.as_secs_f64());
            std::process::exit(2);
        }
    }

    Ok(())
}

fn cmd_batch(
    file: &PathBuf,
    accept_file: &PathBuf,
    reject_file: &PathBuf,
    json: Option<&PathBuf>,
    parallel: bool,
    threads: usize,
    config: &SearchConfig,
) -> CliResult<()> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| CliError::Other {
                message: format!("failed to configure thread pool: {}", e),
            })?;
    }

    let automaton = load_automaton(file)?;
    let accept = read_batch_lines(accept_file)?;
    let reject = read_batch_lines(reject_file)?;
    let items = batch_items(&accept, &reject);

    let start = Instant::now();
    let report = run_batch(&automaton, &items, config, parallel);
    let elapsed = start.elapsed();

    print_report(&report);
    print_summary(&report, elapsed);

    if let Some(path) = json {
        let rendered =
            serde_json::to_string_pretty(&report).map_err(|e| CliError::Other {
                message: format!("failed to encode report: {}", e),
            })?;
        fs::write(path, rendered).map_err(|e| CliError::IoError {
            message: e.to_string(),
        })?;
        println!("report written: {}", path.display());
    }

    if !report.all_passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report(report: &BatchReport) {
    let accept_rows: Vec<&BatchRow> = report
        .rows
        .iter()
        .filter(|row| row.expected == Expectation::Accept)
        .collect();
    let reject_rows: Vec<&BatchRow> = report
        .rows
        .iter()
        .filter(|row| row.expected == Expectation::Reject)
        .collect();

    print_rows("Expected accept:", &accept_rows);
    print_rows("Expected reject:", &reject_rows);
}

fn print_rows(title: &str, rows: &[&BatchRow]) {
    if rows.is_empty() {
        return;
    }
    let width = rows
        .iter()
        .map(|row| format!("{:?}", row.input).chars().count())
        .max()
        .unwrap_or(0)
        .max("input".len());

    println!();
    println!("{}", title);
    println!(
        "  {:<width$}  {:<8}  {:<12}  {}",
        "input",
        "expected",
        "outcome",
        "verdict",
        width = width
    );
    for row in rows {
        let expected = match row.expected {
            Expectation::Accept => "accept",
            Expectation::Reject => "reject",
        };
        println!(
            "  {:<width$}  {:<8}  {:<12}  {}",
            format!("{:?}", row.input),
            expected,
            row.outcome,
            if row.pass { "pass" } else { "FAIL" },
            width = width
        );
    }
}

fn print_summary(report: &BatchReport, elapsed: Duration) {
    println!();
    println!(
        "{} passed, {} failed, {} truncated ({:.2}s)",
        report.passed,
        report.failed,
        report.truncated,
        elapsed.as_secs_f64()
    );
}

fn cmd_watch(
    file: &PathBuf,
    accept_file: &PathBuf,
    reject_file: &PathBuf,
    config: &SearchConfig,
) -> CliResult<()> {
    println!(
        "Watching {}, {}, {} for changes... (Ctrl+C to stop)",
        file.display(),
        accept_file.display(),
        reject_file.display()
    );
    println!();

    let (tx, rx) = mpsc::channel();
    let mut watcher =
        notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                if event.kind.is_modify() {
                    let _ = tx.send(());
                }
            }
        })
        .map_err(|e| CliError::Other {
            message: format!("failed to create file watcher: {}", e),
        })?;

    for path in [file, accept_file, reject_file] {
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| CliError::Other {
                message: format!("failed to watch {}: {}", path.display(), e),
            })?;
    }

    // Run initial batch
    run_batch_iteration(file, accept_file, reject_file, config);

    // Watch loop
    loop {
        if rx.recv().is_err() {
            break;
        }

        // Debounce: wait a bit and drain any additional events
        std::thread::sleep(Duration::from_millis(250));
        while rx.try_recv().is_ok() {}

        // Clear screen
        print!("\x1B[2J\x1B[H");

        run_batch_iteration(file, accept_file, reject_file, config);
    }

    Ok(())
}

/// One watch-mode batch pass; prints errors instead of returning them so the
/// loop survives transient bad states of the watched files.
fn run_batch_iteration(
    file: &PathBuf,
    accept_file: &PathBuf,
    reject_file: &PathBuf,
    config: &SearchConfig,
) {
    let automaton = match load_automaton(file) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return;
        }
    };

    let (accept, reject) = match (read_batch_lines(accept_file), read_batch_lines(reject_file)) {
        (Ok(a), Ok(r)) => (a, r),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{:?}", miette::Report::new(e));
            return;
        }
    };

    let items = batch_items(&accept, &reject);
    let start = Instant::now();
    let report = run_batch(&automaton, &items, config, true);
    let elapsed = start.elapsed();

    print_report(&report);
    print_summary(&report, elapsed);

    println!();
    println!("Watching for changes...");
}
