//! keyset - browse PostgreSQL tables and views page by page.
//!
//! Any relation exposing `id uuid`, `created_at timestamptz` and
//! `updated_at timestamptz` can be paged through. Relations are always
//! opened read-only.
//!
//! # Usage
//!
//! ```bash
//! # First page of a table
//! keyset page payments --first 10
//!
//! # Continue after the last cursor, restricted to one owner
//! keyset page combined_payments --after <ID> --scope owner_id=<UUID>
//!
//! # Page backward
//! DATABASE_URL=postgres://localhost/app keyset page payments --last 5 --before <ID>
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use keyset_core::metrics::init_metrics;
use keyset_core::models::{PersistedRecord, Record, format_timestamp};
use keyset_core::ports::{Connection, Cursor, Pagination};
use keyset_core::services::KeysetPaginator;
use keyset_storage::{Database, DatabaseConfig, JsonData, PgRelation, PgScope, PgView, ScopeValue};

/// keyset CLI - keyset pagination explorer.
#[derive(Parser, Debug)]
#[command(name = "keyset")]
#[command(about = "Browse PostgreSQL tables and views with keyset cursors")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost/keyset",
        global = true
    )]
    database_url: String,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS", global = true)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of a relation as JSON.
    Page(PageArgs),
}

#[derive(Args, Debug)]
struct PageArgs {
    /// Table or view name, optionally schema-qualified.
    relation: String,

    /// Page size for forward pagination.
    #[arg(long)]
    first: Option<i32>,

    /// Return records strictly after this id.
    #[arg(long)]
    after: Option<String>,

    /// Page size for backward pagination (requires --before).
    #[arg(long)]
    last: Option<i32>,

    /// Return records strictly before this id.
    #[arg(long)]
    before: Option<String>,

    /// Equality filter `column=value`, compared as text; repeat to combine.
    #[arg(long = "scope", value_parser = parse_scope)]
    scopes: Vec<(String, String)>,
}

impl PageArgs {
    fn pagination(&self) -> Pagination {
        Pagination {
            first: self.first,
            after: self.after.clone().map(Cursor::new),
            last: self.last,
            before: self.before.clone().map(Cursor::new),
        }
    }

    fn scope(&self) -> Result<PgScope> {
        self.scopes
            .iter()
            .try_fold(PgScope::new(), |scope, (column, value)| {
                scope.eq(column, ScopeValue::Text(value.clone()))
            })
            .context("Invalid --scope column")
    }
}

/// Parse a `column=value` scope argument.
fn parse_scope(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid scope '{}'. Use 'column=value'.", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);
    init_metrics();

    debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");

    let db = Database::connect(&DatabaseConfig::for_cli(&cli.database_url))
        .await
        .context("Failed to connect to database")?;

    let result = match &cli.command {
        Command::Page(args) => run_page(&db, args).await,
    };

    db.close().await;
    result
}

async fn run_page(db: &Database, args: &PageArgs) -> Result<()> {
    let relation = PgRelation::<JsonData>::new(db, &args.relation)
        .context("Invalid relation name")?
        .scoped(args.scope()?);
    let view = PgView::new(relation);

    let connection = KeysetPaginator::new(&view)
        .paginate(&args.pagination())
        .await
        .with_context(|| format!("Failed to paginate {}", args.relation))?;

    info!(
        relation = %args.relation,
        records = connection.edges.len(),
        "📄 Page fetched"
    );

    let output = serde_json::to_string_pretty(&PageOutput::from(connection))
        .context("Failed to render page")?;
    println!("{output}");
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageOutput {
    edges: Vec<EdgeOutput>,
    page_info: PageInfoOutput,
}

#[derive(Debug, Serialize)]
struct EdgeOutput {
    cursor: String,
    node: NodeOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeOutput {
    id: String,
    created_at: String,
    updated_at: String,
    data: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageInfoOutput {
    has_next_page: bool,
    has_previous_page: bool,
    start_cursor: Option<String>,
    end_cursor: Option<String>,
}

impl From<Record<JsonData>> for NodeOutput {
    fn from(record: Record<JsonData>) -> Self {
        Self {
            id: record.id().to_string(),
            created_at: format_timestamp(&record.created_at()),
            updated_at: format_timestamp(&record.updated_at()),
            data: record.data.data,
        }
    }
}

impl From<Connection<Record<JsonData>>> for PageOutput {
    fn from(conn: Connection<Record<JsonData>>) -> Self {
        Self {
            edges: conn
                .edges
                .into_iter()
                .map(|e| EdgeOutput {
                    cursor: e.cursor.value,
                    node: NodeOutput::from(e.node),
                })
                .collect(),
            page_info: PageInfoOutput {
                has_next_page: conn.page_info.has_next_page,
                has_previous_page: conn.page_info.has_previous_page,
                start_cursor: conn.page_info.start_cursor.map(|c| c.value),
                end_cursor: conn.page_info.end_cursor.map(|c| c.value),
            },
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Initialize tracing subscriber. Logs go to stderr so stdout stays JSON.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}
