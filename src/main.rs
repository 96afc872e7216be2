use anyhow::Result;
use cambio::cli::RateOverrides;
use cambio::core::log::init_logging;
use cambio::core::scheduler::Variant;
use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Copy)]
struct PercentArgs {
    /// Card surcharge over the official dollar, in percent
    #[arg(long, allow_negative_numbers = true)]
    tax: Option<f64>,

    /// MEP/Blue premium over the official dollar, in percent
    #[arg(long, allow_negative_numbers = true)]
    mep: Option<f64>,
}

impl From<PercentArgs> for RateOverrides {
    fn from(args: PercentArgs) -> RateOverrides {
        RateOverrides {
            tax_percent: args.tax,
            mep_percent: args.mep,
        }
    }
}

fn variant(simple: bool) -> Variant {
    if simple {
        Variant::Simple
    } else {
        Variant::Extended
    }
}

impl From<Commands> for cambio::AppCommand {
    fn from(cmd: Commands) -> cambio::AppCommand {
        match cmd {
            Commands::Rates { percents } => cambio::AppCommand::Rates {
                overrides: percents.into(),
            },
            Commands::Convert {
                amount,
                simple,
                percents,
            } => cambio::AppCommand::Convert {
                amount,
                variant: variant(simple),
                overrides: percents.into(),
            },
            Commands::Watch {
                amount,
                simple,
                percents,
            } => cambio::AppCommand::Watch {
                amount,
                variant: variant(simple),
                overrides: percents.into(),
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the current BRL, official, MEP and card dollar rates
    Rates {
        #[command(flatten)]
        percents: PercentArgs,
    },
    /// Convert a BRL amount into ARS
    Convert {
        /// Amount in BRL
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Convert at the official rate only, without the card/MEP split
        #[arg(long)]
        simple: bool,

        #[command(flatten)]
        percents: PercentArgs,
    },
    /// Keep rates refreshed and convert amounts typed on stdin
    Watch {
        /// Amount in BRL to convert on startup
        #[arg(short, long)]
        amount: Option<String>,

        /// Convert at the official rate only, without the card/MEP split
        #[arg(long)]
        simple: bool,

        #[command(flatten)]
        percents: PercentArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cambio::cli::setup::setup(),
        Some(cmd) => cambio::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
