mod grid_args;
mod render;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use oi_catalog::{CatalogController, OperationName, OperationStatus, SortSpec, TriggerOutcome};
use oi_graphql::{GraphqlClient, Transport};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "oi")]
#[command(about = "Browse and refresh the crawled article catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Show the stored articles.
    Scan,
    /// Re-crawl every source, store the result and show it.
    FullCrawl,
    /// Show the stored articles and whether they are up to date.
    IsLatest,
    /// Crawl only what is new and merge it into the stored articles.
    Update,
}

impl Commands {
    fn operation(self) -> OperationName {
        match self {
            Commands::Scan => OperationName::Scan,
            Commands::FullCrawl => OperationName::FullCrawlAndStore,
            Commands::IsLatest => OperationName::IsLatest,
            Commands::Update => OperationName::Update,
        }
    }

    /// Whether the stored rows are loaded before the operation runs.
    fn needs_initial_scan(self) -> bool {
        matches!(self, Commands::IsLatest | Commands::Update)
    }

    /// Whether the operation's result is merged into the stored rows, so it
    /// is meaningless without them.
    fn merges_into_scan(self) -> bool {
        self == Commands::Update
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Sort column, optionally with direction: `title`, `createdAt:desc`.
    #[arg(long, global = true, value_parser = grid_args::parse_sort)]
    sort: Option<SortSpec>,

    /// Column filter `<column>:<op>[:<value>]`, e.g. `media:equals:qiita`.
    /// Repeatable; all filters must match.
    #[arg(long = "filter", global = true, value_parser = grid_args::parse_filter)]
    filters: Vec<grid_args::FilterArg>,

    /// One-based page number.
    #[arg(long, global = true, default_value_t = 1)]
    page: usize,

    /// Rows per page; defaults to `OI_PAGE_SIZE`.
    #[arg(long, global = true)]
    page_size: Option<usize>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = oi_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = GraphqlClient::from_config(&config)?;
    let mut builder = CatalogController::builder(Arc::new(client) as Arc<dyn Transport>);
    if let Some(secs) = config.operation_timeout_secs {
        builder = builder.operation_timeout(Duration::from_secs(secs));
    }
    let controller = builder.build();

    let operation = cli.command.operation();
    tracing::info!(%operation, endpoint = %config.graphql_endpoint, "running");
    let outcome = run(&controller, cli.command).await;

    if let Some(spec) = cli.view.sort {
        controller.set_sort(spec.field, spec.direction);
    }
    for filter in cli.view.filters {
        controller.set_filter(filter.field, filter.predicate);
    }

    let page_size = cli.view.page_size.unwrap_or(config.page_size).max(1);
    let page = render::Page {
        index: cli.view.page.saturating_sub(1),
        size: page_size,
    };
    let vm = controller.view_model();
    let view = controller.grid_view();
    match cli.view.format {
        OutputFormat::Table => {
            let sort = controller.grid_query().sort;
            render::print_table(operation, &outcome, &vm, &view, page, sort);
        }
        OutputFormat::Json => render::print_json(operation, &outcome, &vm, &view, page)?,
    }

    Ok(if failed(&outcome) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run(controller: &CatalogController, command: Commands) -> TriggerOutcome {
    if command == Commands::Scan {
        return controller
            .mount()
            .await
            .unwrap_or(TriggerOutcome::Unsupported);
    }
    if command.needs_initial_scan() {
        if let Some(TriggerOutcome::Completed(status @ OperationStatus::Error { .. })) =
            controller.mount().await
        {
            if command.merges_into_scan() {
                tracing::error!(%status, "initial scan failed, not merging into an empty catalog");
                return TriggerOutcome::Completed(status);
            }
            tracing::warn!(%status, "initial scan failed");
        }
    }
    controller.trigger(command.operation()).await
}

fn failed(outcome: &TriggerOutcome) -> bool {
    matches!(
        outcome,
        TriggerOutcome::Completed(OperationStatus::Error { .. }) | TriggerOutcome::Unsupported
    )
}
