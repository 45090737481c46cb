use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sluice_config::FlowDef;
use sluice_engine::{DEFAULT_MAX_ITERATIONS, EngineConfig, FlowEngine, FlowRunner, RunResult};
use sluice_flow::Flow;
use sluice_host::{
  Collaborators, FsAgentRegistry, FsFileAccessor, OpenAiCompletionService, ReqwestHttpCaller,
};
use sluice_processor::StandardProcessor;
use sluice_store::{FsRunStore, RunStore};

/// Sluice - run flows of agents, tasks and integrations
#[derive(Parser)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.sluice)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a flow file and print its shape
  Validate {
    /// Path to the flow file (JSON)
    flow_file: PathBuf,
  },

  /// Run a flow or a single node
  Run {
    #[command(flatten)]
    options: RunOptions,

    #[command(subcommand)]
    target: RunTarget,
  },

  /// Inspect stored runs
  Runs {
    #[command(subcommand)]
    command: RunsCommand,
  },
}

#[derive(Subcommand)]
enum RunTarget {
  /// Run an entire flow
  Flow {
    /// Path to the flow file (JSON)
    flow_file: PathBuf,

    /// Store the finished run under the data directory
    #[arg(long)]
    persist: bool,
  },

  /// Run a single node from a flow
  Node {
    /// Path to the flow file (JSON)
    flow_file: PathBuf,

    /// The node ID to execute
    #[arg(long)]
    node: String,
  },
}

#[derive(Subcommand)]
enum RunsCommand {
  /// List stored runs of a flow
  List { flow_id: String },

  /// Print a stored run
  Show { execution_id: String },
}

#[derive(Args)]
struct RunOptions {
  /// Maximum number of waves per run
  #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
  max_iterations: u32,

  /// Run cyclic flows instead of rejecting them
  #[arg(long)]
  allow_cycles: bool,

  /// Default per-node timeout in milliseconds
  #[arg(long)]
  node_timeout_ms: Option<u64>,

  /// Directory of agent definitions (default: <data-dir>/agents)
  #[arg(long)]
  agents_dir: Option<PathBuf>,

  /// Root directory for file integrations (default: <data-dir>/files)
  #[arg(long)]
  files_root: Option<PathBuf>,

  /// Base URL of an OpenAI-compatible completion API
  #[arg(long, env = "SLUICE_LLM_BASE_URL")]
  llm_base_url: Option<String>,

  /// API key for the completion API
  #[arg(long, env = "SLUICE_LLM_API_KEY", hide_env_values = true)]
  llm_api_key: Option<String>,

  /// Model used by agents that do not name one
  #[arg(long, env = "SLUICE_LLM_MODEL")]
  llm_model: Option<String>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sluice=info,warn")),
    )
    .with_target(false)
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".sluice"),
  };

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Some(Commands::Validate { flow_file }) => validate(&flow_file),
    Some(Commands::Run { options, target }) => match target {
      RunTarget::Flow { flow_file, persist } => {
        rt.block_on(run_flow(&flow_file, &options, &data_dir, persist))
      }
      RunTarget::Node { flow_file, node } => {
        rt.block_on(run_node(&flow_file, &node, &options, &data_dir))
      }
    },
    Some(Commands::Runs { command }) => rt.block_on(inspect_runs(command, &data_dir)),
    None => {
      println!("sluice - use --help to see available commands");
      Ok(())
    }
  }
}

fn load_flow_def(flow_file: &Path) -> Result<FlowDef> {
  let content = std::fs::read_to_string(flow_file)
    .with_context(|| format!("failed to read flow file: {}", flow_file.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse flow file: {}", flow_file.display()))
}

fn load_flow(flow_file: &Path) -> Result<Flow> {
  let def = load_flow_def(flow_file)?;
  Flow::from_def(def).with_context(|| format!("invalid flow: {}", flow_file.display()))
}

fn validate(flow_file: &Path) -> Result<()> {
  let flow = load_flow(flow_file)?;
  let graph = flow.graph();

  println!("Flow: {} ({})", flow.name, flow.flow_id);
  println!("Nodes: {}", flow.len());
  println!("Edges: {}", flow.edges().len());
  println!("Entry nodes: {}", graph.entry_points().join(", "));
  println!("Sink nodes: {}", graph.sink_nodes().join(", "));

  if let Some(cycle) = graph.find_cycle() {
    bail!("flow contains a cycle: {}", cycle.join(" -> "));
  }
  Ok(())
}

fn engine_config(options: &RunOptions) -> EngineConfig {
  EngineConfig {
    max_iterations: options.max_iterations,
    reject_cycles: !options.allow_cycles,
    node_timeout_ms: options.node_timeout_ms,
  }
}

fn build_processor(options: &RunOptions, data_dir: &Path) -> StandardProcessor {
  let agents_dir = options
    .agents_dir
    .clone()
    .unwrap_or_else(|| data_dir.join("agents"));
  let files_root = options
    .files_root
    .clone()
    .unwrap_or_else(|| data_dir.join("files"));

  let mut collaborators = Collaborators::new()
    .with_agents(Arc::new(FsAgentRegistry::new(agents_dir)))
    .with_http(Arc::new(ReqwestHttpCaller::new()))
    .with_files(Arc::new(FsFileAccessor::new(files_root)));

  // Without a key or endpoint agents fall back to placeholder results.
  if options.llm_api_key.is_some() || options.llm_base_url.is_some() {
    let service = match &options.llm_base_url {
      Some(url) => OpenAiCompletionService::with_base_url(url, options.llm_api_key.clone()),
      None => OpenAiCompletionService::new(options.llm_api_key.clone()),
    };
    collaborators = collaborators.with_completions(Arc::new(service));
  }

  let processor = StandardProcessor::new(collaborators);
  match &options.llm_model {
    Some(model) => processor.with_default_model(model),
    None => processor,
  }
}

async fn run_flow(
  flow_file: &Path,
  options: &RunOptions,
  data_dir: &Path,
  persist: bool,
) -> Result<()> {
  let flow = Arc::new(load_flow(flow_file)?);
  eprintln!("Loaded flow: {}", flow.name);

  let variables = read_variables_from_stdin()?;

  let processor = Arc::new(build_processor(options, data_dir));
  let engine = Arc::new(FlowEngine::new(processor, engine_config(options)));
  let mut runner = FlowRunner::new(flow, engine);
  if persist {
    runner = runner.with_store(Arc::new(FsRunStore::new(data_dir.join("runs"))));
  }

  let result = runner
    .execute_once(variables, CancellationToken::new())
    .await
    .context("flow run failed")?;

  print_summary(&result);
  println!("{}", serde_json::to_string_pretty(&result.final_output)?);

  if !result.success {
    bail!("run {} finished {}", result.execution_id, result.outcome);
  }
  Ok(())
}

async fn run_node(
  flow_file: &Path,
  node_id: &str,
  options: &RunOptions,
  data_dir: &Path,
) -> Result<()> {
  let flow = load_flow(flow_file)?;
  let node = flow
    .get_node(node_id)
    .with_context(|| format!("node '{}' not found in flow", node_id))?;

  eprintln!("Running node: {} (type: {})", node_id, node.kind.name());

  let variables = read_variables_from_stdin()?;

  let processor = Arc::new(build_processor(options, data_dir));
  let engine = FlowEngine::new(processor, engine_config(options));
  let result = engine.execute_node(node, variables).await;

  for entry in &result.logs {
    eprintln!("[{:?}] {}", entry.level, entry.message);
  }

  match (result.success, result.output) {
    (true, Some(output)) => {
      println!("{}", serde_json::to_string_pretty(&output)?);
      Ok(())
    }
    _ => bail!(
      "node '{}' failed: {}",
      node_id,
      result.error.unwrap_or_default()
    ),
  }
}

async fn inspect_runs(command: RunsCommand, data_dir: &Path) -> Result<()> {
  let store = FsRunStore::new(data_dir.join("runs"));
  match command {
    RunsCommand::List { flow_id } => {
      let runs = store
        .list_runs(&flow_id)
        .await
        .context("failed to list runs")?;
      for run in runs {
        println!(
          "{}  {}  {:?}  {}ms",
          run.execution_id,
          run.started_at.to_rfc3339(),
          run.status,
          run.duration_ms
        );
      }
    }
    RunsCommand::Show { execution_id } => {
      let run = store
        .get_run(&execution_id)
        .await
        .with_context(|| format!("failed to load run {}", execution_id))?;
      println!("{}", serde_json::to_string_pretty(&run)?);
    }
  }
  Ok(())
}

fn print_summary(result: &RunResult) {
  eprintln!(
    "Run {} {} in {}ms ({} executed, {} failed, {} blocked)",
    result.execution_id,
    result.outcome,
    result.duration_ms,
    result.node_results.len(),
    result.failed_nodes().len(),
    result.blocked_nodes.len()
  );
  for entry in result.log.iter().filter(|e| e.node_id.is_empty()) {
    eprintln!("  {}", entry.message);
  }
}

fn read_variables_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    Ok(serde_json::json!({}))
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read variables from stdin")?;
    parse_variables(&input)
  }
}

fn parse_variables(input: &str) -> Result<serde_json::Value> {
  if input.trim().is_empty() {
    Ok(serde_json::json!({}))
  } else {
    serde_json::from_str(input).context("failed to parse variables JSON from stdin")
  }
}
