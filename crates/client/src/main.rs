//! `retailerp` command-line entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use retailerp_client::{AppContext, ClientConfig};
use retailerp_purchasing::GrnId;

#[derive(Debug, Parser)]
#[command(name = "retailerp", version, about = "RetailERP back-office client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the signed-in user.
    Whoami,
    /// List stock locations.
    Stocks,
    /// Quote shipping for a parcel weight in kilograms.
    Quote {
        #[arg(long)]
        weight: Decimal,
    },
    /// Apply an approved GRN's stock and mark it completed.
    FinalizeGrn {
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    retailerp_observability::init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("reading client configuration")?;
    tracing::debug!(api_url = %config.api_url, "client configured");
    let ctx = AppContext::new(&config)?;

    match cli.command {
        Command::Whoami => {
            let user = ctx.load_session().await?;
            print_json(&user)?;
        }
        Command::Stocks => {
            let stocks = ctx.stock_locations().await?;
            print_json(&stocks)?;
        }
        Command::Quote { weight } => {
            let quote = ctx
                .quote(weight)
                .await
                .with_context(|| format!("quoting shipping for {weight} kg"))?;
            print_json(&quote)?;
        }
        Command::FinalizeGrn { id } => {
            ctx.load_session().await?;
            let id = GrnId::new(id)?;
            let grn = ctx.get_grn(&id).await?;
            let finalized = ctx
                .finalize_grn(&grn)
                .await
                .with_context(|| format!("finalizing grn {}", grn.grn_number()))?;
            if finalized.inventory_applied {
                println!("stock applied for {}", finalized.grn.grn_number());
            } else {
                println!("stock for {} was already applied", finalized.grn.grn_number());
            }
            print_json(&finalized.grn)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
