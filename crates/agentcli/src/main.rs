mod printer;

use agentcore::{Agent, Block, BlockType, Design};
use agentruntime::{
    order_blocks, AgentRuntime, CyclePolicy, RunOutcome, RunRequest, RuntimeConfig,
};
use agentstream::{default_credentials_path, load_token, ClientConfig, HttpStreamingClient};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use printer::TranscriptPrinter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agents")]
#[command(about = "Run agent-block designs against a streaming agent service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a design file
    Run(RunArgs),

    /// Validate a design file
    Validate {
        /// Path to design JSON file
        file: PathBuf,
    },

    /// Print the execution order of a design
    Order {
        /// Path to design JSON file
        file: PathBuf,
    },

    /// Create an example design
    Init {
        /// Output file path
        #[arg(short, long, default_value = "design.json")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to design JSON file
    #[arg(short, long)]
    file: PathBuf,

    /// Task given to the first blocks
    #[arg(short, long)]
    task: String,

    /// Identifier the agents are confined to
    #[arg(short, long, default_value = "default")]
    scope: String,

    /// Repository forwarded with every request
    #[arg(long, env = "AGENTS_REPO", default_value = "")]
    repo: String,

    #[arg(long, env = "AGENTS_BASE_URL", default_value = "http://localhost:8000/api/agents")]
    base_url: String,

    #[arg(long, env = "AGENTS_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Bearer token; overrides the credentials file
    #[arg(long, env = "AGENTS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Credentials file holding an `access_token`
    #[arg(long, env = "AGENTS_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Run the reachable part of a design that contains a cycle
    #[arg(long)]
    allow_cycles: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            init_logging(args.verbose);
            let outcome = run_design(args).await?;
            match outcome {
                RunOutcome::Completed => {}
                RunOutcome::Cancelled => std::process::exit(130),
                RunOutcome::Failed(err) => {
                    eprintln!("Error: {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Validate { file } => {
            init_logging(false);
            validate_design(&file)?;
        }

        Commands::Order { file } => {
            init_logging(false);
            print_order(&file)?;
        }

        Commands::Init { output } => {
            create_example_design(&output)?;
        }
    }

    Ok(())
}

fn read_design(file: &Path) -> Result<Design> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read design {}", file.display()))?;
    let design: Design = serde_json::from_str(&json)
        .with_context(|| format!("Invalid design JSON in {}", file.display()))?;
    Ok(design)
}

/// Explicit token first, then the credentials file
fn resolve_token(token: Option<String>, credentials: Option<PathBuf>) -> Option<String> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        return Some(token);
    }
    let path = credentials.or_else(default_credentials_path)?;
    load_token(&path)
}

async fn run_design(args: RunArgs) -> Result<RunOutcome> {
    println!("🚀 Loading design from: {}", args.file.display());
    let design = read_design(&args.file)?;

    println!("📋 Design: {}", design.name);
    println!("   Blocks: {}", design.blocks.len());
    println!("   Connections: {}", design.connections.len());
    println!();

    let client_config = ClientConfig::new(args.base_url.clone())
        .with_token(resolve_token(args.token, args.credentials));
    let client = HttpStreamingClient::new(client_config)?;

    let config = RuntimeConfig {
        model: args.model,
        cycle_policy: if args.allow_cycles {
            CyclePolicy::RunReachable
        } else {
            CyclePolicy::Reject
        },
        ..RuntimeConfig::default()
    };
    let runtime = AgentRuntime::with_config(Arc::new(client), config);

    let events = runtime.subscribe_events();
    let event_task = tokio::spawn(TranscriptPrinter::new().listen(events));

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let request = RunRequest::new(args.task, args.scope).with_repository(args.repo);
    let report = runtime.execute(&design, request, cancellation).await;

    // Let the printer drain the last events
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Execution Summary:");
    println!("   Run ID: {}", report.run_id);
    println!("   Outcome: {}", report.outcome.as_str());
    println!("   Completed: {}/{} blocks", report.results.len(), design.blocks.len());
    if !report.skipped.is_empty() {
        println!("   Skipped: {}", report.skipped.join(", "));
    }

    if !report.results.is_empty() {
        println!();
        println!("📤 Results:");
        for block_id in &report.order {
            if let Some(result) = report.results.get(block_id) {
                println!("   {}: {}", block_id, result.text());
            }
        }
    }

    Ok(report.outcome)
}

fn validate_design(file: &Path) -> Result<()> {
    println!("🔍 Validating design: {}", file.display());

    let design = read_design(file)?;
    design.validate()?;
    let order = order_blocks(&design.blocks, &design.connections);
    if order.is_empty() {
        anyhow::bail!("No executable blocks: every block is part of or behind a cycle");
    }

    println!("✅ Design is valid:");
    println!("   Name: {}", design.name);
    println!("   Blocks: {}", design.blocks.len());
    println!("   Connections: {}", design.connections.len());
    if !order.is_complete() {
        println!("⚠️  Blocks in or behind a cycle: {}", order.unreached.join(", "));
    }

    Ok(())
}

fn print_order(file: &Path) -> Result<()> {
    let design = read_design(file)?;
    let order = order_blocks(&design.blocks, &design.connections);

    for (position, block_id) in order.order.iter().enumerate() {
        let label = design
            .find_block(block_id)
            .map(|b| format!("{} ({})", b.display_name(), b.block_type.as_str()))
            .unwrap_or_default();
        println!("{:>3}. {} {}", position + 1, block_id, label);
    }
    for block_id in &order.unreached {
        println!("  -  {} (unreachable: cycle)", block_id);
    }

    Ok(())
}

fn example_design() -> Design {
    let mut design = Design::new("example", "Example Review Pipeline");

    let research = design.add_block(
        Block::new("research", BlockType::Sequential)
            .with_name("Research")
            .with_agent(Agent::new("researcher", "Collect the facts needed for the task.")),
    );
    let drafts = design.add_block(
        Block::new("drafts", BlockType::Parallel)
            .with_name("Drafts")
            .with_agent(Agent::new("optimist", "Draft the most ambitious answer."))
            .with_agent(Agent::new("skeptic", "Draft the most conservative answer.")),
    );
    let decide = design.add_block(
        Block::new("decide", BlockType::Routing)
            .with_name("Decide")
            .with_agent(
                Agent::new("dispatcher", "Pick the specialist best suited to finish.").router(),
            )
            .with_agent(
                Agent::new("editor", "Merge the drafts into one answer.").with_role("editor"),
            )
            .with_agent(Agent::new("reviewer", "Critique the drafts.").with_role("reviewer")),
    );

    design.connect(research, decide.clone());
    design.connect(drafts, decide);
    design
}

fn create_example_design(output: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&example_design())?;
    std::fs::write(output, json)?;

    println!("✨ Created example design: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  agents run --file {} --task \"Summarize the release notes\"",
        output.display()
    );

    Ok(())
}
