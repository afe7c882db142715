use crate::report::{run_rank, run_weights, RankArgs, WeightsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use freight_decision::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Freight Decision Engine",
    about = "Rank freight forwarders with AHP-weighted TOPSIS from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rank the forwarders found in a shipment CSV export
    Rank(RankArgs),
    /// Derive criteria weights from pairwise judgments
    Weights(WeightsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rank(args) => run_rank(args),
        Command::Weights(args) => run_weights(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rank_accepts_explicit_weights() {
        let cli = Cli::try_parse_from([
            "freight-decision",
            "rank",
            "--csv",
            "shipments.csv",
            "--cost",
            "0.5",
            "--time",
            "0.25",
            "--reliability",
            "0.25",
            "--explain",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Rank(args)) => {
                assert_eq!(args.cost, Some(0.5));
                assert!(args.explain);
            }
            other => panic!("expected rank command, got {other:?}"),
        }
    }

    #[test]
    fn judgments_conflict_with_explicit_weights() {
        let result = Cli::try_parse_from([
            "freight-decision",
            "rank",
            "--csv",
            "shipments.csv",
            "--cost",
            "0.5",
            "--judgments",
            "[]",
        ]);
        assert!(result.is_err());
    }
}
