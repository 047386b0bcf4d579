//! findash command line entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use fd_charts::ChartType;
use fd_data::{FilterClause, FilterLogic};

mod commands;
mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "findash")]
#[command(about = "Explore financial and economic datasets from the terminal")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./findash.json when it exists)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the rows come from
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Local CSV or JSON file
    #[arg(long, conflicts_with = "source")]
    pub file: Option<PathBuf>,

    /// Data source name on the backend
    #[arg(long)]
    pub source: Option<String>,
}

/// Local filter clauses
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Clause as column:operator:value[:value2], repeatable
    #[arg(long = "where", value_parser = commands::parse_clause)]
    pub filters: Vec<FilterClause>,

    /// How clauses combine (AND or OR)
    #[arg(long)]
    pub logic: Option<FilterLogic>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show column types and axis candidates
    Columns {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Filter rows and print them as CSV
    Filter {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Columns to output, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Write the CSV to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Build chart data and print it as JSON
    Chart {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// line, bar, area or scatter
        #[arg(long = "type")]
        chart_type: Option<ChartType>,

        /// X axis column
        #[arg(long)]
        x: Option<String>,

        /// Metric column, repeatable
        #[arg(long = "y")]
        y: Vec<String>,

        /// Column splitting metrics into one series per value
        #[arg(long)]
        group: Option<String>,
    },

    /// Fetch time series for several entities in one request
    Series {
        /// Entity identifiers, e.g. tickers
        #[arg(required = true)]
        entities: Vec<String>,
    },

    /// List saved queries
    Queries,

    /// Save filters and columns as a query on the backend
    SaveQuery {
        /// Query name
        #[arg(long)]
        name: String,

        /// Data source the query runs against
        #[arg(long)]
        source: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// Columns to select, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        #[arg(long, default_value = "")]
        description: String,

        /// Share the query with other users
        #[arg(long)]
        public: bool,
    },

    /// Execute a saved query and print its rows as CSV
    RunQuery {
        /// Saved query id
        id: i64,

        /// Write the CSV to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Exchange an identity provider credential for a session
    Login {
        /// Credential issued by the identity provider
        #[arg(long)]
        credential: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| Some(config::default_path()).filter(|path| path.exists()));
    let config = AppConfig::load(config_path.as_deref())?;
    info!("Using API at {}", config.api_base_url);

    match cli.command {
        Commands::Columns { input } => commands::columns(&config, &input).await,
        Commands::Filter {
            input,
            filter,
            columns,
            output,
        } => commands::filter(&config, &input, &filter, &columns, output.as_deref()).await,
        Commands::Chart {
            input,
            filter,
            chart_type,
            x,
            y,
            group,
        } => {
            let chart = commands::chart_config(&config.default_chart, chart_type, x, y, group);
            commands::chart(&config, &input, &filter, &chart).await
        }
        Commands::Series { entities } => commands::series(&config, &entities).await,
        Commands::Queries => commands::queries(&config).await,
        Commands::SaveQuery {
            name,
            source,
            filter,
            columns,
            description,
            public,
        } => commands::save_query(&config, &name, &source, &filter, &columns, &description, public).await,
        Commands::RunQuery { id, output } => commands::run_query(&config, id, output.as_deref()).await,
        Commands::Login { credential } => commands::login(&config, credential).await,
    }
}
