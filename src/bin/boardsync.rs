//! Command-line host for the work item board.
//!
//! Usage:
//!
//! ```text
//! boardsync [--config <path>] <command>
//! ```
//!
//! Settings come from `boardsync.json` (or `--config`, or
//! `BOARDSYNC_CONFIG`) with `BOARDSYNC_*` environment overrides. Logging is
//! controlled with `BOARDSYNC_LOG` and written to stderr.

use boardsync::settings::{Settings, SettingsError};
use boardsync::work_item::{
    adapters::{SystemUrlOpener, azure::AzureDevOpsClient, git_cli::GitCli},
    domain::{
        BranchName, MissingContext, UnknownWorkItemField, WorkItem, WorkItemDomainError,
        WorkItemField, WorkItemId, mention_text,
    },
    ports::{BranchNamePrompt, RemoteServiceError, VersionControlError},
    services::{
        BoardTree, ItemHydrator, QueryExecutor, ReadPipeline, RefreshSignal, TreeError, TreeNode,
        WorkflowEngine, WorkflowError, WorkflowReport,
    },
};
use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_ENV: &str = "BOARDSYNC_LOG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Azure Boards work items next to your git checkout")]
struct Cli {
    /// Settings file to read instead of `boardsync.json`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every saved query with its item hierarchy.
    Tree,
    /// Show one work item.
    Show {
        /// Work item id.
        id: u32,
    },
    /// Check out, sync and rebase the item's branch, then activate the item.
    Start {
        /// Work item id.
        id: u32,
    },
    /// Push the item's branch, open a pull request and resolve the item.
    Finish {
        /// Work item id.
        id: u32,
    },
    /// Check out the item's linked branch.
    Checkout {
        /// Work item id.
        id: u32,
    },
    /// Create a remote branch for the item and link it.
    CreateBranch {
        /// Work item id.
        id: u32,
        /// Accept the proposed name without prompting.
        #[arg(long)]
        yes: bool,
    },
    /// Create a work item.
    CreateItem {
        /// Work item type, for example `Bug`.
        #[arg(long = "type")]
        work_item_type: String,
        /// Title.
        #[arg(long)]
        title: String,
        /// Markdown description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Replace a field; rich-text fields take Markdown.
    Update {
        /// Work item id.
        id: u32,
        /// Field reference name, for example `System.Title`.
        field: String,
        /// New value.
        value: String,
    },
    /// Print a reference to the item.
    Mention {
        /// Work item id.
        id: u32,
        /// Print the commit message suffix that resolves the item instead.
        #[arg(long)]
        commit_message: Option<String>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("{}", .0.user_message())]
    VersionControl(#[from] VersionControlError),
    #[error(transparent)]
    Domain(#[from] WorkItemDomainError),
    #[error(transparent)]
    UnknownField(#[from] UnknownWorkItemField),
    #[error("no git repository found in the current directory")]
    NoRepository,
    #[error("work item {0} was not found")]
    NotFound(WorkItemId),
    #[error("output failed: {0}")]
    Output(#[from] io::Error),
}

impl From<MissingContext> for CliError {
    fn from(missing: MissingContext) -> Self {
        Self::Settings(SettingsError::from(missing))
    }
}

type Engine = WorkflowEngine<GitCli, AzureDevOpsClient, AzureDevOpsClient, SystemUrlOpener>;

/// Reads the branch name from stdin; an empty line accepts the proposal.
struct TerminalPrompt {
    accept: bool,
}

#[async_trait::async_trait]
impl BranchNamePrompt for TerminalPrompt {
    async fn confirm_branch_name(&self, proposed: &str) -> Option<String> {
        if self.accept {
            return Some(proposed.to_owned());
        }
        let owned = proposed.to_owned();
        tokio::task::spawn_blocking(move || read_branch_name(&owned))
            .await
            .ok()
            .flatten()
    }
}

fn read_branch_name(proposed: &str) -> Option<String> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "Branch name [{proposed}]: ").ok()?;
    stderr.flush().ok()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line).ok()?;
    if read == 0 {
        return None;
    }
    let answer = line.trim();
    Some(if answer.is_empty() { proposed } else { answer }.to_owned())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("boardsync=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "error: {err}").is_err() {
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::discover(cli.config.as_deref())?;
    let client = Arc::new(AzureDevOpsClient::new(&settings.azure_config()?)?);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Tree => print_tree(&settings, &client, &mut out).await,
        Command::Show { id } => {
            let item = fetch_item(&settings, &client, id).await?;
            print_item(&mut out, &item)
        }
        Command::Start { id } => {
            let item = fetch_item(&settings, &client, id).await?;
            let report = engine(&settings, &client)?
                .start_work(item.id(), linked_branch(&item)?)
                .await?;
            print_report(&mut out, &report)
        }
        Command::Finish { id } => {
            let item = fetch_item(&settings, &client, id).await?;
            let report = engine(&settings, &client)?
                .finish_work(item.id(), linked_branch(&item)?)
                .await?;
            print_report(&mut out, &report)
        }
        Command::Checkout { id } => {
            let item = fetch_item(&settings, &client, id).await?;
            let report = engine(&settings, &client)?
                .checkout(linked_branch(&item)?)
                .await?;
            print_report(&mut out, &report)
        }
        Command::CreateBranch { id, yes } => {
            let item = fetch_item(&settings, &client, id).await?;
            let created = engine(&settings, &client)?
                .create_branch(item.id(), item.title(), &TerminalPrompt { accept: yes })
                .await?;
            writeln!(out, "created and linked {}", created.branch)?;
            Ok(())
        }
        Command::CreateItem {
            work_item_type,
            title,
            description,
        } => {
            let created = engine(&settings, &client)?
                .create_work_item(&work_item_type, &title, description.as_deref())
                .await?;
            writeln!(out, "created work item {}", created.id)?;
            Ok(())
        }
        Command::Update { id, field, value } => {
            let parsed = WorkItemField::try_from(field.as_str())?;
            let report = engine(&settings, &client)?
                .update_field(WorkItemId::new(id)?, parsed, &value)
                .await?;
            print_report(&mut out, &report)
        }
        Command::Mention { id, commit_message } => {
            let text = match commit_message {
                Some(message) => {
                    engine(&settings, &client)?
                        .commit_mention(&message, WorkItemId::new(id)?)
                        .await?
                }
                None => {
                    let item = fetch_item(&settings, &client, id).await?;
                    mention_text(item.id(), item.title())
                }
            };
            writeln!(out, "{text}")?;
            Ok(())
        }
    }
}

fn engine(settings: &Settings, client: &Arc<AzureDevOpsClient>) -> Result<Engine, CliError> {
    let context = settings.workflow_context()?;
    let cwd = std::env::current_dir()?;
    let git = GitCli::discover(&[cwd], &context.remote).ok_or(CliError::NoRepository)?;
    Ok(WorkflowEngine::new(
        Arc::new(git),
        Arc::clone(client),
        Arc::clone(client),
        Arc::new(SystemUrlOpener),
        context,
        RefreshSignal::new(),
    ))
}

fn hydrator(
    client: &Arc<AzureDevOpsClient>,
) -> ItemHydrator<AzureDevOpsClient, AzureDevOpsClient, DefaultClock> {
    ItemHydrator::new(
        Arc::clone(client),
        Arc::clone(client),
        Arc::new(DefaultClock),
    )
}

async fn fetch_item(
    settings: &Settings,
    client: &Arc<AzureDevOpsClient>,
    raw_id: u32,
) -> Result<WorkItem, CliError> {
    let id = WorkItemId::new(raw_id)?;
    let scope = settings.project_scope()?;
    let hydrated = hydrator(client).hydrate(&scope, &[id]).await?;
    hydrated
        .items
        .into_iter()
        .next()
        .ok_or(CliError::NotFound(id))
}

fn linked_branch(item: &WorkItem) -> Result<&BranchName, CliError> {
    item.branch()
        .map(|branch| branch.name())
        .ok_or_else(|| WorkflowError::MissingBranch(item.id()).into())
}

async fn print_tree(
    settings: &Settings,
    client: &Arc<AzureDevOpsClient>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    let workspace_open = GitCli::discover(&[cwd], &settings.remote).is_some();
    let pipeline = ReadPipeline::new(
        QueryExecutor::new(Arc::clone(client), settings.project_scope()),
        hydrator(client),
    );
    let tree = BoardTree::new(
        Arc::new(pipeline),
        settings.tree_context(workspace_open)?,
        RefreshSignal::new(),
    );

    for root in tree.roots() {
        writeln!(out, "{}", root.label())?;
        let children = tree.children(&root).await?;
        write_nodes(out, &children, 1)?;
    }
    Ok(())
}

fn write_nodes(out: &mut impl Write, nodes: &[TreeNode], depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            TreeNode::Item(item) => {
                writeln!(out, "{indent}{}  ({})", item.label(), item.description())?;
                write_nodes(out, &item.children(), depth + 1)?;
            }
            other => writeln!(out, "{indent}{}", other.label())?,
        }
    }
    Ok(())
}

fn print_item(out: &mut impl Write, item: &WorkItem) -> Result<(), CliError> {
    writeln!(
        out,
        "{} {} {}: {}",
        item.state_glyph(),
        item.work_item_type(),
        item.id(),
        item.title()
    )?;
    writeln!(out, "State:       {}", item.state())?;
    writeln!(out, "Assigned to: {}", item.assignee_label())?;
    if let Some(points) = item.story_points() {
        writeln!(out, "Points:      {points}")?;
    }
    if let Some(branch) = item.branch() {
        writeln!(
            out,
            "Branch:      {} (+{} -{})",
            branch.name(),
            branch.ahead_count(),
            branch.behind_count()
        )?;
    }
    if let Some(url) = item.web_url() {
        writeln!(out, "Web:         {url}")?;
    }
    if let Some(description) = item.description() {
        writeln!(out, "\n{description}")?;
    }
    Ok(())
}

fn print_report(out: &mut impl Write, report: &WorkflowReport) -> Result<(), CliError> {
    let stages = report
        .stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    writeln!(out, "{}: {stages}", report.sequence)?;
    Ok(())
}
