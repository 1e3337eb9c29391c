use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trigger_view::api::HttpTriggerApi;
use trigger_view::config::ViewConfig;
use trigger_view::models::Maintenance;
use trigger_view::sorting::SortKey;
use trigger_view::view::{PageView, Tab, TriggerPage, TriggerViewController, ViewAction};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and act on a single alerting trigger", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trigger to load
    trigger_id: String,

    /// Metric column to sort by (state, name, event, value)
    #[arg(long, default_value_t = SortKey::State)]
    sort: SortKey,

    /// Select the sort column a second time, flipping its direction
    #[arg(long)]
    flip: bool,

    /// Page of the event log to show
    #[arg(long, default_value_t = 0)]
    events_page: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the trigger page
    Show,
    /// Clear notification throttling
    DisableThrottling,
    /// Put one metric into maintenance for the given number of minutes
    Maintenance { metric: String, minutes: i64 },
    /// Stop tracking one metric
    RemoveMetric { metric: String },
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "trigger-view.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

fn print_page(page: &PageView) {
    let page: &TriggerPage = match page {
        PageView::Failed { message } => {
            println!("!! {message}");
            return;
        }
        PageView::Loading => {
            println!("Loading...");
            return;
        }
        PageView::Ready(page) => page,
    };

    println!("{} ({})", page.trigger.name, page.trigger.id);
    if let Some(until) = page.throttled_until {
        println!("Throttled until {}", until.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if page.tabs.is_empty() {
        println!("No metrics or events.");
    }

    for tab in &page.tabs {
        match tab {
            Tab::Metrics(metrics) => {
                let direction = if page.sorting.descending_first { "" } else { ", flipped" };
                println!("\nMetrics (by {}{direction}):", page.sorting.key);
                for (name, metric) in metrics.iter() {
                    let value = metric
                        .value
                        .map(|v| format!("{v:.2}"))
                        .unwrap_or_else(|| "-".to_string());
                    let maintenance = metric
                        .maintenance_until()
                        .map(|until| format!("  maintenance until {}", until.format("%Y-%m-%d %H:%M")))
                        .unwrap_or_default();
                    println!("  {:<10} {:>12}  {name}{maintenance}", metric.state, value);
                }
            }
            Tab::Events(events) => {
                println!(
                    "\nEvents (page {}, {} of {}):",
                    events.page,
                    events.list.len(),
                    events.total
                );
                for event in &events.list {
                    let at = Utc
                        .timestamp_opt(event.timestamp, 0)
                        .single()
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| event.timestamp.to_string());
                    println!("  {at}  {} -> {}  {}", event.old_state, event.state, event.metric);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = ViewConfig::load(args.config.as_deref())?;
    init_logging(&config.log_dir);
    info!(trigger_id = %args.trigger_id, "Starting trigger view.");

    let api = Arc::new(HttpTriggerApi::from_config(&config)?);
    let controller = TriggerViewController::new(api, Some(&args.trigger_id));

    if controller.state().sorting().key != args.sort {
        controller.select_sort(args.sort);
    }
    if args.flip {
        controller.select_sort(args.sort);
    }

    if args.events_page > 0 {
        controller.show_events_page(args.events_page).await;
    } else {
        controller.refresh().await;
    }

    let action = match args.command.unwrap_or(Command::Show) {
        Command::Show => None,
        Command::DisableThrottling => Some(ViewAction::DisableThrottling),
        Command::Maintenance { metric, minutes } => Some(ViewAction::SetMaintenance {
            metric,
            maintenance: Maintenance::Minutes(minutes),
        }),
        Command::RemoveMetric { metric } => Some(ViewAction::RemoveMetric { metric }),
    };
    if let Some(action) = action {
        if let Err(e) = controller.dispatch(action).await {
            error!(error = %e, "Action failed.");
        }
    }

    print_page(&controller.page());
    Ok(())
}
