//! Command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use fd_charts::{build_chart, format_axis_value, ChartConfig, ChartType};
use fd_core::events::events::{DatasetFailed, ResponseSuperseded};
use fd_core::events::handler_from_fn;
use fd_core::{AuthProvider, Credential, Dataset, EventBus, Row, StaticCredentialProvider};
use fd_data::schema::{axis_candidates, numeric_columns};
use fd_data::sources::csv_source::CsvOptions;
use fd_data::sources::{decode_payload_str, fetch_time_series, CsvSource, DataApi, HttpDataApi};
use fd_data::{
    apply_filters, export_csv, infer_column_types, save_csv, DatasetLoader, FilterClause, LoadState, Operator,
    QueryConfig, SaveQueryRequest,
};

use crate::config::AppConfig;
use crate::{FilterArgs, InputArgs};

/// Parse `column:operator:value[:value2]`
pub fn parse_clause(arg: &str) -> Result<FilterClause, String> {
    let mut parts = arg.splitn(3, ':');
    let (Some(column), Some(operator), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected column:operator:value, got '{}'", arg));
    };
    let operator: Operator = operator.parse()?;

    if operator.is_range() {
        let Some((low, high)) = rest.split_once(':') else {
            return Err(format!("'{}' needs two values, e.g. {}:{}:1:10", operator, column, operator));
        };
        Ok(FilterClause::new(column, operator, low).with_value2(high))
    } else {
        Ok(FilterClause::new(column, operator, rest))
    }
}

/// Chart settings from the config, overridden by command flags
pub fn chart_config(
    defaults: &ChartConfig,
    chart_type: Option<ChartType>,
    x: Option<String>,
    y: Vec<String>,
    group: Option<String>,
) -> ChartConfig {
    let mut config = defaults.clone();
    if let Some(chart_type) = chart_type {
        config.chart_type = chart_type;
    }
    if let Some(x) = x {
        config.x_key = x;
    }
    if !y.is_empty() {
        config.y_keys = y;
    }
    if group.is_some() {
        config.group_key = group;
    }
    config
}

fn api(config: &AppConfig) -> Arc<HttpDataApi> {
    let api = HttpDataApi::new(config.api_base_url.clone());
    Arc::new(match &config.api_token {
        Some(token) => api.with_token(token.clone()),
        None => api,
    })
}

fn event_bus() -> EventBus {
    let events = EventBus::new();
    events.subscribe::<DatasetFailed>(handler_from_fn(|event| {
        if let Some(e) = event.as_any().downcast_ref::<DatasetFailed>() {
            eprintln!("Could not load {}: {}", e.source_name, e.error);
        }
    }));
    events.subscribe::<ResponseSuperseded>(handler_from_fn(|event| {
        if let Some(e) = event.as_any().downcast_ref::<ResponseSuperseded>() {
            tracing::debug!("Ignored stale response for {} (generation {})", e.source_name, e.generation);
        }
    }));
    events
}

fn loader(config: &AppConfig) -> DatasetLoader {
    DatasetLoader::new(api(config), event_bus())
}

/// The dataset the loader holds, or its error
fn loaded(loader: &DatasetLoader) -> Result<Dataset> {
    match loader.state() {
        LoadState::Loaded { dataset, .. } => Ok((*dataset).clone()),
        LoadState::Failed { source, message } => bail!("loading {} failed: {}", source, message),
        LoadState::Idle | LoadState::Loading { .. } => bail!("no dataset loaded"),
    }
}

/// Read a local file: `.json` as a dataset payload, anything else as CSV
pub async fn load_file(path: &Path, options: &CsvOptions) -> Result<Dataset> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(decode_payload_str(&text)?)
    } else {
        let source = CsvSource::open(path.to_path_buf(), options.clone()).await?;
        Ok(source.load().await?)
    }
}

async fn load_input(config: &AppConfig, input: &InputArgs) -> Result<Dataset> {
    match (&input.file, &input.source) {
        (Some(path), _) => load_file(path, &config.csv).await,
        (None, Some(source)) => {
            let loader = loader(config);
            loader.load(source).await;
            loaded(&loader)
        }
        (None, None) => bail!("pass --file <path> or --source <name>"),
    }
}

/// Apply the command's filter clauses to the dataset rows
pub fn filter_rows(dataset: &Dataset, filter: &FilterArgs, config: &AppConfig) -> Vec<Row> {
    let types = infer_column_types(&dataset.rows, &dataset.columns);
    let logic = filter.logic.unwrap_or(config.logic);
    apply_filters(&dataset.rows, &filter.filters, logic, &types)
}

fn write_csv(rows: &[Row], columns: &[String], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => save_csv(path, rows, columns)?,
        None => println!("{}", export_csv(rows, columns)?),
    }
    Ok(())
}

pub async fn columns(config: &AppConfig, input: &InputArgs) -> Result<()> {
    let dataset = load_input(config, input).await?;
    let types = infer_column_types(&dataset.rows, &dataset.columns);

    println!("{} rows", dataset.len());
    for (column, column_type) in &types {
        let range = dataset
            .rows
            .iter()
            .filter_map(|row| row.get(column).and_then(|v| v.as_number()))
            .filter(|v| v.is_finite())
            .fold(None, |range: Option<(f64, f64)>, v| match range {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });
        match range {
            Some((lo, hi)) => println!(
                "{:<24} {:<8} {}..{}",
                column,
                column_type,
                format_axis_value(lo),
                format_axis_value(hi)
            ),
            None => println!("{:<24} {}", column, column_type),
        }
    }

    println!("axis candidates: {}", axis_candidates(&dataset.rows, &dataset.columns).join(", "));
    println!("metrics: {}", numeric_columns(&types).join(", "));
    Ok(())
}

pub async fn filter(
    config: &AppConfig,
    input: &InputArgs,
    filter: &FilterArgs,
    columns: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let dataset = load_input(config, input).await?;
    let rows = filter_rows(&dataset, filter, config);
    tracing::info!("{} of {} rows match", rows.len(), dataset.len());

    let columns = if columns.is_empty() { &dataset.columns[..] } else { columns };
    write_csv(&rows, columns, output)
}

pub async fn chart(config: &AppConfig, input: &InputArgs, filter: &FilterArgs, chart: &ChartConfig) -> Result<()> {
    let dataset = load_input(config, input).await?;
    let rows = filter_rows(&dataset, filter, config);

    let data = build_chart(&rows, chart);
    if data.is_empty() {
        eprintln!("No data to plot for {} chart of {:?} by '{}'", chart.chart_type, chart.y_keys, chart.x_key);
    }
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

pub async fn series(config: &AppConfig, entities: &[String]) -> Result<()> {
    let api = api(config);
    let series = fetch_time_series(&*api, entities).await?;
    for (entity, dataset) in &series {
        println!("{:<12} {} points", entity, dataset.len());
    }
    Ok(())
}

pub async fn queries(config: &AppConfig) -> Result<()> {
    let queries = loader(config).saved_queries().await?;
    if queries.is_empty() {
        println!("No saved queries");
    }
    for query in queries {
        let visibility = if query.is_public { "public" } else { "private" };
        println!("#{:<6} {:<32} {:<20} {}", query.id, query.name, query.data_source, visibility);
    }
    Ok(())
}

pub async fn save_query(
    config: &AppConfig,
    name: &str,
    source: &str,
    filter: &FilterArgs,
    columns: &[String],
    description: &str,
    public: bool,
) -> Result<()> {
    let query_config = QueryConfig::from_ui(&filter.filters, columns, filter.logic.unwrap_or(config.logic));
    let request = SaveQueryRequest::new(name, source, query_config)
        .with_description(description)
        .public(public);

    let saved = loader(config).save_query(request).await?;
    println!("Saved query #{} '{}'", saved.id, saved.name);
    Ok(())
}

pub async fn run_query(config: &AppConfig, id: i64, output: Option<&Path>) -> Result<()> {
    let loader = loader(config);
    let query = loader
        .saved_queries()
        .await?
        .into_iter()
        .find(|q| q.id == id)
        .with_context(|| format!("no saved query with id {}", id))?;

    loader.run_saved_query(&query).await;
    let dataset = loaded(&loader)?;

    let selected = query.query_config.selected_columns();
    let columns = if selected.is_empty() { dataset.columns.clone() } else { selected };
    write_csv(&dataset.rows, &columns, output)
}

pub async fn login(config: &AppConfig, credential: Option<String>) -> Result<()> {
    let credential = credential
        .or_else(|| std::env::var("FINDASH_CREDENTIAL").ok())
        .context("pass --credential or set FINDASH_CREDENTIAL")?;
    let provider = StaticCredentialProvider::new(Credential::new(credential));

    let credential = provider.sign_in().await?;
    let api = api(config);
    let session = api.exchange_credential(&credential).await?;
    tracing::info!("Signed in via {}", provider.provider_name());

    println!("Signed in as {}", session.email.as_deref().or(session.name.as_deref()).unwrap_or("unknown user"));
    println!("export {}={}", crate::config::API_TOKEN_VAR, session.access_token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use fd_core::CellValue;
    use fd_data::FilterLogic;

    #[test]
    fn test_parse_clause() {
        let clause = parse_clause("revenue:gt:100").unwrap();
        assert_eq!(clause, FilterClause::new("revenue", Operator::Gt, "100"));

        let clause = parse_clause("auction_date:between:2024-01-01:2024-06-30").unwrap();
        assert_eq!(clause.value, "2024-01-01");
        assert_eq!(clause.value2.as_deref(), Some("2024-06-30"));

        let clause = parse_clause("note:contains:a:b").unwrap();
        assert_eq!(clause.value, "a:b");

        assert!(parse_clause("revenue:gt").is_err());
        assert!(parse_clause("revenue:above:3").is_err());
        assert!(parse_clause("year:between:2020").is_err());
    }

    #[test]
    fn test_chart_flags_override_defaults() {
        let defaults = ChartConfig::new(ChartType::Bar, "year").with_y("revenue");
        let config = chart_config(&defaults, None, None, vec![], Some("ticker".into()));
        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.y_keys, vec!["revenue".to_string()]);
        assert_eq!(config.group_key.as_deref(), Some("ticker"));

        let config = chart_config(&defaults, Some(ChartType::Scatter), Some("pe".into()), vec!["growth".into()], None);
        assert_eq!(config.chart_type, ChartType::Scatter);
        assert_eq!(config.x_key, "pe");
        assert_eq!(config.y_keys, vec!["growth".to_string()]);
    }

    #[tokio::test]
    async fn test_filter_local_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"data": [{{"d": "2020", "v": 10}}, {{"d": "2020", "v": 20}}, {{"d": "2021", "v": 5}}]}}"#).unwrap();

        let dataset = load_file(file.path(), &CsvOptions::default()).await.unwrap();
        let args = FilterArgs {
            filters: vec![parse_clause("v:gt:8").unwrap()],
            logic: Some(FilterLogic::And),
        };
        let rows = filter_rows(&dataset, &args, &AppConfig::default());
        let values: Vec<&CellValue> = rows.iter().map(|row| &row["v"]).collect();
        assert_eq!(values, vec![&CellValue::Number(10.0), &CellValue::Number(20.0)]);
    }

    #[tokio::test]
    async fn test_csv_file_through_chart_pipeline() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "fiscal_year,ticker,revenue").unwrap();
        writeln!(file, "2022,AAPL,394.3").unwrap();
        writeln!(file, "2023,AAPL,383.3").unwrap();
        writeln!(file, "2023,MSFT,211.9").unwrap();

        let dataset = load_file(file.path(), &CsvOptions::default()).await.unwrap();
        let chart = ChartConfig::new(ChartType::Line, "fiscal_year").with_y("revenue").with_group("ticker");
        let value = serde_json::to_value(build_chart(&dataset.rows, &chart)).unwrap();

        assert_eq!(value["kind"], "keyed");
        assert_eq!(value["data"][1]["MSFT_revenue"], 211.9);
        assert_eq!(value["series"].as_array().map(|s| s.len()), Some(2));
    }
}
