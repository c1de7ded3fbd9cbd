use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use fairval::cli::dcf::DcfOverrides;
use fairval::cli::dividend::GordonArgs;
use fairval::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Use configured reference snapshots only, without network access
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct DcfArgs {
    /// Free cash flow to the firm in the base year
    #[arg(long = "fcff", allow_negative_numbers = true)]
    initial_fcff: Option<f64>,
    /// Stage one growth rate in percent
    #[arg(long = "stage1-growth", allow_negative_numbers = true)]
    stage1_growth_pct: Option<f64>,
    /// Length of stage one in years (1-15)
    #[arg(long = "years")]
    stage1_years: Option<u32>,
    /// Perpetual growth rate in percent
    #[arg(long = "stage2-growth", allow_negative_numbers = true)]
    stage2_growth_pct: Option<f64>,
    /// Weighted average cost of capital in percent
    #[arg(long = "wacc", allow_negative_numbers = true)]
    wacc_pct: Option<f64>,
    /// Shares outstanding, in the same unit scale as FCFF
    #[arg(long = "shares")]
    shares_outstanding: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    net_debt: Option<f64>,
    #[arg(long = "cash")]
    cash_and_equivalents: Option<f64>,
}

impl From<DcfArgs> for DcfOverrides {
    fn from(args: DcfArgs) -> Self {
        DcfOverrides {
            initial_fcff: args.initial_fcff,
            stage1_growth_pct: args.stage1_growth_pct,
            stage1_years: args.stage1_years,
            stage2_growth_pct: args.stage2_growth_pct,
            wacc_pct: args.wacc_pct,
            shares_outstanding: args.shares_outstanding,
            net_debt: args.net_debt,
            cash_and_equivalents: args.cash_and_equivalents,
        }
    }
}

impl From<Commands> for fairval::AppCommand {
    fn from(cmd: Commands) -> fairval::AppCommand {
        match cmd {
            Commands::Normalize { ticker } => fairval::AppCommand::Normalize { ticker },
            Commands::Multiples { ticker } => fairval::AppCommand::Multiples { ticker },
            Commands::Gordon {
                ticker,
                growth,
                required_return,
                sensitivity,
            } => fairval::AppCommand::Gordon {
                ticker,
                args: GordonArgs {
                    growth_pct: growth,
                    required_return_pct: required_return,
                    sensitivity,
                },
            },
            Commands::Dcf {
                ticker,
                assumptions,
                sensitivity,
            } => fairval::AppCommand::Dcf {
                ticker,
                overrides: assumptions.into(),
                sensitivity,
            },
            Commands::Report { tickers } => fairval::AppCommand::Report { tickers },
            Commands::Sectors => fairval::AppCommand::Sectors,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show reported and normalized fundamentals
    Normalize { ticker: String },
    /// Target prices from P/E, P/B and EV/EBITDA multiples
    Multiples { ticker: String },
    /// Gordon growth fair value from the dividend yield
    Gordon {
        ticker: String,
        /// Dividend growth rate in percent
        #[arg(long, allow_negative_numbers = true)]
        growth: Option<f64>,
        /// Required rate of return in percent
        #[arg(long)]
        required_return: Option<f64>,
        /// Print fair values around the chosen rates
        #[arg(long)]
        sensitivity: bool,
    },
    /// Two-stage discounted cash flow
    Dcf {
        ticker: String,
        #[command(flatten)]
        assumptions: DcfArgs,
        /// Print values per share around perpetual growth and WACC
        #[arg(long)]
        sensitivity: bool,
    },
    /// Every valuation method for one or more tickers
    Report {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    /// Display sector benchmark multiples
    Sectors,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fairval::cli::setup::setup_at_path(path),
            None => fairval::cli::setup::setup(),
        },
        Some(cmd) => {
            fairval::run_command(cmd.into(), cli.config_path.as_deref(), cli.offline).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
