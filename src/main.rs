use std::io::{stderr, stdout};
use std::path::Path;
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use cashflow_client::api::{CashflowApi, HttpApi, InMemoryApi};
use cashflow_client::config::Settings;
use cashflow_client::filters::FilterState;
use cashflow_client::list::{ListController, LoadStatus};
use cashflow_client::models::Record;
use cashflow_client::render::{FixedAnswer, RecordingRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: Positional arguments keep the interface scriptable; anything richer would warrant clap.
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cashflow-client [base-url|seed.json] [page:optional] [log_level:optional] [field=value ...] > [output].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        eprintln!("Filter fields: status, type, category, subcategory, date-from, date-to, amount-min, amount-max, search");
        exit(1);
    }

    let source = &args[1];
    let page = args.get(2)
        .map(|s| parse_page(s)).unwrap_or(1);
    let log_level = args.get(3)
        .map(|s| parse_log_level(s)).unwrap_or_else(|| LevelFilter::ERROR);
    let filters = FilterState::from_inputs(args.iter().skip(4).filter_map(|pair| pair.split_once('=')));

    setup_logging(log_level);

    let settings = Settings::from_env();

    let records = if Path::new(source).is_file() {
        let seed = std::fs::read_to_string(source)?;
        run(Arc::new(InMemoryApi::from_json(&seed)?), settings, page, filters).await?
    } else {
        let settings = settings.with_base_url(source.as_str());
        run(Arc::new(HttpApi::new(&settings)?), settings, page, filters).await?
    };

    write_records_to_stdout(&records)?;

    Ok(())
}

async fn run<A: CashflowApi>(api: Arc<A>, settings: Settings, page: u32, filters: FilterState) -> Result<Vec<Record>> {
    let renderer = Arc::new(RecordingRenderer::new());
    let controller = ListController::new(api, renderer.clone(), Arc::new(FixedAnswer(false)), settings);

    let timer = Instant::now();
    controller.set_filters(filters).await;
    let report = controller.load(page).await;
    let duration = timer.elapsed();

    info!("Loaded page [{}] in: {duration:?}", controller.current_page().await);

    if report.records != LoadStatus::Applied {
        bail!("Transactions could not be loaded");
    }

    if let Some(controls) = renderer.last_page_controls() {
        info!("Page {} of {}, showing pages {:?}", controls.current_page, controls.total_pages, controls.window);
    }

    if let Some(totals) = renderer.last_summary() {
        info!("Transactions: {}, income: {}, expense: {}, balance: {}", totals.count, totals.income, totals.expense, totals.balance);
    }

    Ok(renderer.last_records().unwrap_or_default())
}

fn parse_page(page: &str) -> u32 {
    match page.parse::<u32>() {
        Ok(page) if page > 0 => page,
        _ => {
            eprintln!("Invalid page '{}', defaulting to 1", page);
            1
        }
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', defaulting to 'error'", level);
        LevelFilter::ERROR
    })
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the CSV, so logging goes to stderr. HTTP internals stay at warn at most.
    let targets = Targets::new()
        .with_default(level)
        .with_target("reqwest", level.min(LevelFilter::WARN))
        .with_target("hyper_util", level.min(LevelFilter::WARN))
        .with_target("rustls", level.min(LevelFilter::WARN));

    let terminal_log = fmt::layer()
        .with_target(level >= LevelFilter::DEBUG)
        .with_writer(stderr)
        .with_filter(targets);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_records_to_stdout(records: &[Record]) -> Result<()> {
    let mut output = csv::Writer::from_writer(stdout().lock());

    output.write_record(["id", "date", "status", "type", "category", "subcategory", "amount", "comment"])?;

    for record in records {
        output.write_record([
            record.id.to_string(),
            record.date.to_string(),
            name_or_id(record.status_name.as_deref(), record.status_id),
            name_or_id(record.transaction_type_name.as_deref(), record.type_id),
            name_or_id(record.category_name.as_deref(), record.category_id),
            name_or_id(record.subcategory_name.as_deref(), record.subcategory_id),
            record.amount.to_string(),
            record.comment.clone()
        ])?;
    }

    output.flush()?;

    Ok(())
}

fn name_or_id(name: Option<&str>, id: u32) -> String {
    name.map(str::to_string).unwrap_or_else(|| id.to_string())
}
