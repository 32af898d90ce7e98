use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use splitfund::application::allocation::{
    allocate, limits_for_display, maximum_contribution, minimum_contribution,
};
use splitfund::application::reconcile::Reconciler;
use splitfund::domain::money::Money;
use splitfund::domain::ports::DonationRecord;
use splitfund::domain::recipient::AllocatorConfig;
use splitfund::infrastructure::in_memory::InMemoryContributionStore;
use splitfund::interfaces::catalog::read_catalog;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Disable service-fee extraction.
    #[arg(long, global = true)]
    no_fees: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the minimum and maximum contribution for a recipient catalog.
    Limits {
        /// Recipient catalog JSON file.
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Split an amount into per-recipient line items.
    Preview {
        /// Recipient catalog JSON file.
        #[arg(long)]
        catalog: PathBuf,
        /// Contribution amount in dollars, e.g. 100.00.
        amount: Decimal,
        /// Seed for the leftover-cent distribution.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Report discrepancies between a processor donation dump and local
    /// contribution records.
    Reconcile {
        /// Processor donations JSON file.
        #[arg(long)]
        donations: PathBuf,
        /// Local contributions JSON file.
        #[arg(long)]
        contributions: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitfund=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = if cli.no_fees {
        AllocatorConfig::without_fees()
    } else {
        AllocatorConfig::default()
    };

    match cli.command {
        Command::Limits { catalog } => {
            let recipients = read_catalog(File::open(catalog).into_diagnostic()?)
                .into_diagnostic()?;
            let min = minimum_contribution(&config, &recipients).into_diagnostic()?;
            let max = maximum_contribution(&config, &recipients).into_diagnostic()?;
            let (display_min, display_max) = limits_for_display(min, max);
            println!("minimum: {min}");
            println!("maximum: {max}");
            println!("display: {display_min} to {display_max}");
        }
        Command::Preview {
            catalog,
            amount,
            seed,
        } => {
            let recipients = read_catalog(File::open(catalog).into_diagnostic()?)
                .into_diagnostic()?;
            // Sub-cent input is rounded to the charged amount before splitting.
            let allocation =
                allocate(&config, &recipients, Money::half_even(amount), seed).into_diagnostic()?;
            for li in &allocation.line_items {
                println!("{},{},{}", li.recipient.id, li.recipient.name, li.amount);
            }
            if !allocation.fee.is_zero() {
                println!("fees,Fees,{}", allocation.fee);
            }
            println!("total,,{}", allocation.total);
        }
        Command::Reconcile {
            donations,
            contributions,
        } => {
            let donations: Vec<DonationRecord> =
                serde_json::from_reader(File::open(donations).into_diagnostic()?)
                    .into_diagnostic()?;
            let store = InMemoryContributionStore::new();
            store
                .load(
                    serde_json::from_reader(File::open(contributions).into_diagnostic()?)
                        .into_diagnostic()?,
                )
                .await;

            let reconciler = Reconciler::new(Box::new(store));
            let discrepancies = reconciler.reconcile(&donations).await.into_diagnostic()?;
            for discrepancy in &discrepancies {
                println!("{discrepancy}");
            }
            println!("{} discrepancies", discrepancies.len());
        }
    }

    Ok(())
}
