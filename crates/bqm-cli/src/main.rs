mod config;
mod host;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bqm_core::{Assignment, DefaultFileOps};
use bqm_pool::{PoolEvent, WorkerPool};
use bqm_queue::Queue;
use bqm_task::{ActionStatus, TaskOutcome};
use bqm_workflow::WorkflowStore;
use clap::{Parser, Subcommand};

use config::BqmConfig;
use host::{DefaultPreviewLoader, FsSidecarHelper, NoInfoProvider};

#[derive(Parser)]
#[command(name = "bqm", about = "Batch queue manager command-line interface")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered batch tools.
    Tools,
    /// Run a directory of images through a tool chain.
    Run {
        input: PathBuf,
        output: PathBuf,
        /// Name of a saved workflow to load the tool chain from.
        #[arg(long)]
        workflow: Option<String>,
    },
    /// List saved workflows.
    Workflows,
    /// Start the MJPEG preview stream for a directory of images.
    Stream {
        album: PathBuf,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn install_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    install_logging();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(BqmConfig::default_path)
        .context("could not determine a config file location")?;
    let config = BqmConfig::from_path(&config_path)?;

    match cli.command {
        Command::Tools => run_tools(),
        Command::Run { input, output, workflow } => run_queue(&config, input, output, workflow).await,
        Command::Workflows => run_workflows(&config),
        Command::Stream { album, port } => run_stream(&config, album, port).await,
    }
}

fn run_tools() -> Result<()> {
    let registry = bqm_registry::default_registry();
    for descriptor in registry.list() {
        println!("{:?}/{} (v{})", descriptor.group, descriptor.name, descriptor.version);
    }
    Ok(())
}

fn run_workflows(config: &BqmConfig) -> Result<()> {
    let registry = bqm_registry::default_registry();
    let mut store = WorkflowStore::new(config.workflows_path());
    let failed = store.load(&registry)?;
    for workflow in store.queue_settings_list() {
        println!("{} - {} tool(s)", workflow.title, workflow.tools.len());
    }
    for title in failed {
        eprintln!("warning: workflow `{title}` skipped, incompatible with the current tool registry");
    }
    Ok(())
}

async fn run_queue(config: &BqmConfig, input: PathBuf, output: PathBuf, workflow_name: Option<String>) -> Result<()> {
    let registry = Arc::new(bqm_registry::default_registry());

    let mut queue_settings = config.default_queue_settings.clone();
    queue_settings.working_url = Some(output.clone());

    let mut tools = Vec::new();
    if let Some(name) = &workflow_name {
        let mut store = WorkflowStore::new(config.workflows_path());
        store.load(&registry)?;
        let workflow = store
            .find_by_title(name)
            .with_context(|| format!("no workflow named `{name}`"))?;
        queue_settings = workflow.queue_settings.clone();
        queue_settings.working_url = Some(output.clone());
        tools = workflow.tools.clone();
    }

    let mut queue = Queue::new(workflow_name.unwrap_or_else(|| "ad-hoc queue".to_string()), queue_settings);

    for entry in std::fs::read_dir(&input).with_context(|| format!("reading {}", input.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output").to_string();
        let mut assignment = Assignment::new(path, stem);
        assignment.tools = tools.clone();
        queue.push(assignment);
    }

    if queue.is_empty() {
        println!("no input files found in {}", input.display());
        return Ok(());
    }

    std::fs::create_dir_all(&output)?;

    let pool = WorkerPool::new(registry, Arc::new(FsSidecarHelper), Arc::new(DefaultFileOps));
    let events = pool.process_queues(vec![queue], output);

    for event in events {
        match event {
            PoolEvent::Starting { item } => println!("starting {}", item.display()),
            PoolEvent::Progress { item, event } => {
                if event.status != ActionStatus::BatchStarted {
                    println!("{}: {:?} - {}", item.display(), event.status, event.message);
                }
            }
            PoolEvent::Finished { item, outcome } => match outcome {
                TaskOutcome::Done(dest) => println!("done {} -> {}", item.display(), dest.display()),
                TaskOutcome::Failed(message) => println!("failed {}: {}", item.display(), message),
                TaskOutcome::Canceled => println!("canceled {}", item.display()),
                TaskOutcome::Skipped => println!("skipped {}", item.display()),
            },
            PoolEvent::QueueProcessed { queue_title } => println!("queue `{queue_title}` finished"),
            PoolEvent::AllDone => println!("all queues finished"),
        }
    }

    Ok(())
}

async fn run_stream(config: &BqmConfig, album: PathBuf, port: u16) -> Result<()> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(&album).with_context(|| format!("reading {}", album.display()))? {
        let entry = entry?;
        if entry.path().is_file() {
            images.push(entry.path());
        }
    }
    images.sort();
    if images.is_empty() {
        anyhow::bail!("no images found in {}", album.display());
    }

    let mut settings = config.mjpeg.clone();
    settings.port = port;
    settings.input_images = images;

    let mut handle = bqm_mjpeg::MjpegServiceHandle::new(false);
    handle
        .start(settings, Arc::new(DefaultPreviewLoader), Arc::new(NoInfoProvider))
        .await?;

    println!("streaming on port {port}, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    handle.stop();
    Ok(())
}
