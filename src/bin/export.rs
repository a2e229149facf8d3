//! Offline reports over the subscriber store. Never writes to the store.
//!
//! ```sh
//!     newsletter-export emails --status confirmed > confirmed.txt
//!     newsletter-export --store ./data/subscribers.json csv --out subscribers.csv
//!     newsletter-export stats
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use footballdecoded::configuration::get_configuration;
use footballdecoded::export::filter_records;
use footballdecoded::export::render_csv;
use footballdecoded::export::render_email_list;
use footballdecoded::export::StatusFilter;
use footballdecoded::export::Summary;
use footballdecoded::store::SubscriberStore;
use footballdecoded::telemetry::get_subscriber;
use footballdecoded::telemetry::init_subscriber;

#[derive(Parser)]
#[command(name = "newsletter-export", about = "Reports over the newsletter subscriber store")]
struct Cli {
    /// Subscriber store file (default: `store.subscribers_path` from the
    /// configuration files)
    #[arg(long, env = "NEWSLETTER_STORE", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plain list of addresses, one per line
    Emails(ReportArgs),
    /// CSV with one row per record
    Csv(ReportArgs),
    /// Counts by status, plus duplicate addresses
    Stats(OutputArgs),
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    status: StatusFilter,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct OutputArgs {
    /// Write here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // stdout is reserved for the report
    let subscriber = get_subscriber("newsletter-export", "warn", std::io::stderr);
    init_subscriber(subscriber)?;

    let cli = Cli::parse();

    let path = match cli.store {
        Some(path) => path,
        None => {
            get_configuration()
                .context("No --store given and the configuration could not be loaded")?
                .store
                .subscribers_path
        }
    };

    let store = SubscriberStore::new(path);
    let records = store
        .load()
        .await
        .with_context(|| format!("Failed to read subscriber store {:?}", store.path()))?;
    tracing::info!(n_records = records.len(), "loaded subscriber store");

    let (report, output) = match cli.cmd {
        Command::Emails(args) => (
            render_email_list(&filter_records(&records, args.status)),
            args.output,
        ),
        Command::Csv(args) => (
            render_csv(&filter_records(&records, args.status)),
            args.output,
        ),
        Command::Stats(output) => (Summary::from_records(&records).to_string(), output),
    };

    match output.out {
        Some(path) => tokio::fs::write(&path, report)
            .await
            .with_context(|| format!("Failed to write report to {path:?}"))?,
        None => print!("{report}"),
    }
    Ok(())
}
