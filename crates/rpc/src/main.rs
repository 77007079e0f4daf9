//! CDP CLI - Main entry point

use cdp_rpc::context::DEFAULT_MAX_PRICE_AGE;
use cdp_rpc::{commands, AppContext};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cdp")]
#[command(about = "CDP engine - collateralized debt positions over a persisted state", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Protocol parameters (JSON); defaults to <data>/config.json when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reject oracle prices older than this many seconds
    #[arg(long, default_value_t = DEFAULT_MAX_PRICE_AGE)]
    max_price_age: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Credit external collateral to a wallet
    Fund {
        /// User ID (will be uppercased)
        user: String,
        amount: Decimal,
    },

    /// Move stable asset between wallets
    Transfer {
        from: String,
        to: String,
        amount: Decimal,
    },

    /// Publish the collateral price
    SetPrice { price: Decimal },

    /// Open a position
    Open {
        user: String,
        /// Collateral to lock
        collateral: Decimal,
        /// Stable asset to borrow (fee and gas compensation are added)
        borrow: Decimal,
    },

    /// Adjust a position; negative values withdraw or repay
    Adjust {
        user: String,
        /// Position ID (OWNER#INDEX)
        id: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        collateral: Decimal,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        debt: Decimal,
    },

    /// Repay and close a position
    Close { user: String, id: String },

    /// Claim surplus collateral from the escrow
    Claim { user: String },

    /// Deposit stable asset into the Stability Reserve
    Deposit { user: String, amount: Decimal },

    /// Withdraw from the Stability Reserve (0 claims the collateral gain only)
    Withdraw { user: String, amount: Decimal },

    /// Liquidate positions
    Liquidate {
        /// Liquidator receiving gas compensation
        liquidator: String,
        /// Specific positions; scans from the riskiest when omitted
        #[arg(long = "position")]
        positions: Vec<String>,
        /// Maximum positions to scan
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Redeem stable asset for collateral
    Redeem {
        user: String,
        amount: Decimal,
        /// Stop at positions above this collateral ratio
        #[arg(long, default_value = "1000")]
        max_ratio: Decimal,
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// System status at the current price
    Status,

    /// Show one position with pending rewards
    Position { id: String },

    /// Show recent journal events
    Events {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut ctx = AppContext::new(&cli.data, cli.config.as_deref(), cli.max_price_age).await?;

    match cli.command {
        Commands::Fund { user, amount } => {
            commands::fund(&mut ctx, &user, amount).await?;
        }
        Commands::Transfer { from, to, amount } => {
            commands::transfer(&mut ctx, &from, &to, amount).await?;
        }
        Commands::SetPrice { price } => {
            commands::set_price(&mut ctx, price).await?;
        }
        Commands::Open {
            user,
            collateral,
            borrow,
        } => {
            commands::open(&mut ctx, &user, collateral, borrow).await?;
        }
        Commands::Adjust {
            user,
            id,
            collateral,
            debt,
        } => {
            commands::adjust(&mut ctx, &user, &id, collateral, debt).await?;
        }
        Commands::Close { user, id } => {
            commands::close(&mut ctx, &user, &id).await?;
        }
        Commands::Claim { user } => {
            commands::claim(&mut ctx, &user).await?;
        }
        Commands::Deposit { user, amount } => {
            commands::deposit(&mut ctx, &user, amount).await?;
        }
        Commands::Withdraw { user, amount } => {
            commands::withdraw(&mut ctx, &user, amount).await?;
        }
        Commands::Liquidate {
            liquidator,
            positions,
            max,
        } => {
            commands::liquidate(&mut ctx, &liquidator, &positions, max).await?;
        }
        Commands::Redeem {
            user,
            amount,
            max_ratio,
            max_iterations,
        } => {
            commands::redeem(&mut ctx, &user, amount, max_ratio, max_iterations).await?;
        }
        Commands::Status => {
            commands::status(&ctx).await?;
        }
        Commands::Position { id } => {
            commands::position(&ctx, &id).await?;
        }
        Commands::Events { limit } => {
            commands::events(&ctx, limit).await?;
        }
    }

    Ok(())
}
