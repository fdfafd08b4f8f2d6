// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info, warn};
use workshop_agent::coding::{CodingAgent, CodingOutcome, PythonRunner};
use workshop_agent::credentials::CredentialKind;
use workshop_agent::options::{
    ChainFilter, ChainQuery, ChainSide, Moneyness, OptionsDesk, SortKey, Strategy,
};
use workshop_agent::preflight::{self, SUCCESS_MARKER};
use workshop_agent::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning, init_logger,
};
use workshop_agent::{
    AgentError, AppContext, DotenvPrecedence, ExportFormat, HealthCheck, HealthReport,
    ReportExporter, ResearchAgent, SearchProvider, prompts,
};

#[derive(Parser)]
#[command(name = "workshop_agent")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Model gateway preflight, research agent and coding agent for the workshop", long_about = None)]
struct Cli {
    /// Optional TOML file layered over the built-in defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Let values from the .env file replace ones already set in the shell
    #[arg(long, action = ArgAction::SetTrue)]
    dotenv_override: bool,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[arg(long, action = ArgAction::SetTrue)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt to the model gateway and expect MODEL WORKING
    Preflight,

    /// Plan search queries, search the web and write a cited report
    Research {
        /// Question to research; read from stdin when omitted
        question: Option<String>,

        /// Also write the run to this directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
    },

    /// Have the model write Python for a task, run it and fix failures
    Code {
        /// Task description; read from stdin when omitted
        task: Option<String>,

        /// Run one of the sample tasks (see `tasks`)
        #[arg(short, long, value_name = "N", conflicts_with = "task")]
        sample: Option<usize>,
    },

    /// List the sample coding tasks
    Tasks,

    /// Show where each API key resolves from
    Credentials,

    /// Check keys, the model gateway and the search API
    Doctor {
        #[arg(long)]
        skip_search: bool,
    },

    /// Look up listed options on Yahoo Finance (market data only, no orders)
    Options {
        #[command(subcommand)]
        command: OptionsCommand,
    },
}

#[derive(Subcommand)]
enum OptionsCommand {
    /// Contracts for one expiration with liquidity and pricing metrics
    Chain {
        #[arg(default_value = "AAPL")]
        symbol: String,

        /// YYYY-MM-DD; defaults to the nearest listed expiration
        #[arg(short, long)]
        expiration: Option<NaiveDate>,

        #[arg(long, value_enum, default_value_t = ChainSide::Both)]
        side: ChainSide,

        /// Contracts per side after sorting (0 = all)
        #[arg(short, long, default_value_t = 1)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = SortKey::OpenInterest)]
        sort_by: SortKey,

        #[arg(long, default_value_t = 0)]
        min_oi: u64,

        #[arg(long, default_value_t = 0)]
        min_volume: u64,

        #[arg(long)]
        min_strike: Option<f64>,

        #[arg(long)]
        max_strike: Option<f64>,

        #[arg(long, value_enum)]
        moneyness: Option<Moneyness>,

        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },

    /// Pick a liquid contract and price a single-leg strategy
    Plan {
        #[arg(default_value = "AAPL")]
        symbol: String,

        #[arg(short, long, value_enum, default_value_t = Strategy::LongCall)]
        strategy: Strategy,

        /// YYYY-MM-DD; defaults to the nearest listed expiration
        #[arg(short, long)]
        expiration: Option<NaiveDate>,

        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format_error(&format!("{:#}", e)));
            if let Some(hint) = AgentError::hint_in(&e) {
                eprintln!("{}", format_info(hint));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if matches!(cli.command, Commands::Tasks) {
        cmd_tasks();
        return Ok(ExitCode::SUCCESS);
    }

    let precedence = if cli.dotenv_override {
        DotenvPrecedence::File
    } else {
        DotenvPrecedence::Shell
    };

    let ctx = AppContext::bootstrap(cli.config.as_deref(), Some(&cli.env_file), precedence)
        .context("Failed to load configuration")?;
    info!("Model: {}", ctx.config.gateway.model);

    let show_progress = !cli.no_progress && io::stderr().is_terminal();

    match cli.command {
        Commands::Preflight => cmd_preflight(&ctx).await,
        Commands::Research {
            question,
            output,
            format,
        } => cmd_research(&ctx, question, output, format, show_progress).await,
        Commands::Code { task, sample } => cmd_code(&ctx, task, sample).await,
        Commands::Tasks => Ok(ExitCode::SUCCESS),
        Commands::Credentials => cmd_credentials(&ctx).await,
        Commands::Doctor { skip_search } => cmd_doctor(&ctx, skip_search).await,
        Commands::Options { command } => cmd_options(&ctx, command).await,
    }
}

async fn cmd_preflight(ctx: &AppContext) -> Result<ExitCode> {
    let chat = ctx.chat_model().await?;
    let report = preflight::check(&chat).await.context("Preflight failed")?;

    info!(
        "{} answered in {:.2}s",
        report.model,
        report.elapsed.as_secs_f64()
    );
    println!("{}", SUCCESS_MARKER);
    Ok(ExitCode::SUCCESS)
}

async fn cmd_research(
    ctx: &AppContext,
    question: Option<String>,
    output: Option<PathBuf>,
    format: ExportFormat,
    show_progress: bool,
) -> Result<ExitCode> {
    let question = match question {
        Some(q) => q,
        None => prompt_line("Research question")?,
    };

    // Validate the output directory before spending any API calls.
    let exporter = output.map(ReportExporter::new).transpose()?;

    let (chat, search) = ctx.research_clients().await?;
    info!("Searching with {}", search.name());

    let run = ResearchAgent::from_config(&chat, &search, &ctx.config)
        .with_progress(show_progress)
        .run(&question)
        .await
        .context("Research run failed")?;

    println!("{}", run.report.to_markdown());

    for result in &run.search.results {
        debug!("{}", result.format_summary(160));
    }

    for failure in &run.search.failures {
        eprintln!(
            "{}",
            format_warning(&format!("Query '{}' failed: {}", failure.query, failure.error))
        );
    }
    eprintln!(
        "{}",
        format_info(&format!(
            "{} queries, {} sources, {:.0}% searches succeeded, {:.2}s total",
            run.stats.queries_planned,
            run.stats.results_collected,
            run.stats.search_success_rate(),
            run.stats.total_ms() as f64 / 1000.0
        ))
    );

    if let Some(exporter) = exporter {
        let path = exporter.export(&run, format)?;
        eprintln!(
            "{}",
            format_success(&format!("Report written to {}", path.display()))
        );
    }

    Ok(ExitCode::SUCCESS)
}

async fn cmd_code(
    ctx: &AppContext,
    task: Option<String>,
    sample: Option<usize>,
) -> Result<ExitCode> {
    let task = match (task, sample) {
        (Some(task), _) => task,
        (None, Some(n)) => match n.checked_sub(1).and_then(|i| prompts::TASKS.get(i)) {
            Some(task) => task.to_string(),
            None => bail!(
                "No sample task {}; choose 1-{}",
                n,
                prompts::TASKS.len()
            ),
        },
        (None, None) => prompt_line("Coding task")?,
    };

    let chat = ctx.chat_model().await?;
    let runner = PythonRunner::from_config(&ctx.config.coding);
    let outcome = CodingAgent::from_config(&chat, &runner, &ctx.config)
        .run(&task)
        .await
        .context("Coding agent failed")?;

    print_coding_outcome(&outcome);

    Ok(if outcome.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_coding_outcome(outcome: &CodingOutcome) {
    println!("=== TASK ===\n{}\n", outcome.task);
    println!("=== PLAN ===\n{}\n", outcome.plan.trim());
    println!("=== FINAL CODE ===\n{}\n", outcome.code);

    if let Some(run) = &outcome.last_run {
        println!("=== STDOUT ===\n{}", run.stdout.trim_end());
        if !run.stderr.trim().is_empty() {
            println!("=== STDERR ===\n{}", run.stderr.trim_end());
        }
        println!("\nexit code {} | {}", run.exit_code, run.note);
    }

    let summary = format!("{} attempt(s)", outcome.attempts);
    if outcome.succeeded() {
        eprintln!("{}", format_success(&format!("Task solved after {}", summary)));
    } else {
        eprintln!("{}", format_warning(&format!("Task not solved after {}", summary)));
    }
}

fn cmd_tasks() {
    for (i, task) in prompts::TASKS.iter().enumerate() {
        println!("{}", format_step(i + 1, prompts::TASKS.len(), task));
    }
}

async fn cmd_credentials(ctx: &AppContext) -> Result<ExitCode> {
    let mut missing = 0;

    for kind in CredentialKind::ALL {
        match ctx.resolver().resolve(kind).await {
            Ok(credential) => println!(
                "{}",
                format_success(&format!(
                    "{}: {} from {:?}",
                    kind,
                    credential.key.redacted(),
                    credential.source
                ))
            ),
            Err(e) => {
                missing += 1;
                println!("{}", format_warning(&format!("{}: {}", kind, e)));
            }
        }
    }

    if let Some(path) = ctx.env.dotenv_path() {
        println!("{}", format_info(&format!(".env loaded from {}", path.display())));
    }

    Ok(if missing == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn cmd_doctor(ctx: &AppContext, skip_search: bool) -> Result<ExitCode> {
    let mut checks = Vec::new();

    for kind in CredentialKind::ALL {
        let start = Instant::now();
        let component = kind.to_string();
        checks.push(match ctx.resolver().resolve(kind).await {
            Ok(credential) => HealthCheck::healthy_with(
                &component,
                format!("resolved from {:?}", credential.source),
                start.elapsed(),
            ),
            // Only the research command needs the search key.
            Err(e) if kind == CredentialKind::Search => {
                HealthCheck::degraded(&component, e.to_string(), start.elapsed())
            }
            Err(e) => HealthCheck::unhealthy(&component, e.to_string(), start.elapsed()),
        });
    }

    let start = Instant::now();
    let gateway = match ctx.chat_model().await {
        Ok(chat) => match preflight::check(&chat).await {
            Ok(report) => HealthCheck::healthy_with(
                "model gateway",
                format!("{} replied {}", report.model, SUCCESS_MARKER),
                report.elapsed,
            ),
            Err(e) => HealthCheck::unhealthy("model gateway", e.to_string(), start.elapsed()),
        },
        Err(e) => HealthCheck::unhealthy("model gateway", e.to_string(), start.elapsed()),
    };
    checks.push(gateway);

    if skip_search {
        warn!("Skipping search API check");
    } else {
        let start = Instant::now();
        let search = match ctx.search_provider().await {
            Ok(client) => match client.search("OpenRouter API").await {
                Ok(batch) => HealthCheck::healthy_with(
                    "search api",
                    format!("{} results", batch.results.len()),
                    start.elapsed(),
                ),
                Err(e) => HealthCheck::unhealthy("search api", e.to_string(), start.elapsed()),
            },
            Err(e) => HealthCheck::degraded("search api", e.to_string(), start.elapsed()),
        };
        checks.push(search);
    }

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
    println!("{}", report.format());

    Ok(if report.is_unhealthy() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn cmd_options(ctx: &AppContext, command: OptionsCommand) -> Result<ExitCode> {
    let market = ctx.market_data()?;
    let desk = OptionsDesk::from_config(&market, &ctx.config.options);

    match command {
        OptionsCommand::Chain {
            symbol,
            expiration,
            side,
            limit,
            sort_by,
            min_oi,
            min_volume,
            min_strike,
            max_strike,
            moneyness,
            json,
        } => {
            let query = ChainQuery {
                expiration,
                side,
                limit: (limit > 0).then_some(limit),
                sort_by,
                filter: ChainFilter {
                    min_open_interest: min_oi,
                    min_volume,
                    min_strike,
                    max_strike,
                    moneyness,
                },
            };
            let report = desk
                .detailed_chain(&symbol, &query)
                .await
                .with_context(|| format!("Failed to load the {} option chain", symbol))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.format());
            }
        }
        OptionsCommand::Plan {
            symbol,
            strategy,
            expiration,
            json,
        } => {
            let plan = desk
                .plan(&symbol, strategy, expiration)
                .await
                .with_context(|| format!("Failed to build a {} plan for {}", strategy, symbol))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{}", plan.format());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Reads one non-empty line from stdin, prompting on stderr.
fn prompt_line(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    let line = line.trim().to_string();
    if line.is_empty() {
        bail!("{} must not be empty", label);
    }
    Ok(line)
}
