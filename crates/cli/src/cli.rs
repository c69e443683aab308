use tokenboard_core::config::Config;

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{query, tokens};

#[derive(Parser, Debug)]
#[command(name = "tokenboard", about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the wallet's token holdings and their USD value
    Holdings(query::Holdings),

    /// Show the wallet's most recent token transfers
    Transfers(query::Transfers),

    /// Show prices (and on-chain balances) of the tracked tokens
    Prices(query::Prices),

    /// Compare sent and received totals of two tokens in the transfer feed
    Compare(query::Compare),

    /// Write the wallet's holdings to a CSV file
    Export(query::Export),

    /// Manage the tracked token list
    #[command(subcommand)]
    Tokens(tokens::Tokens),
}

impl Cli {
    pub(crate) async fn run(
        self,
        config: Config,
        shutdown_token: CancellationToken,
    ) -> eyre::Result<()> {
        info!(network.key = %config.network, "running command");

        let command = async {
            match self.command {
                Commands::Holdings(cmd) => cmd.run(&config).await,
                Commands::Transfers(cmd) => cmd.run(&config).await,
                Commands::Prices(cmd) => cmd.run(&config).await,
                Commands::Compare(cmd) => cmd.run(&config).await,
                Commands::Export(cmd) => cmd.run(&config).await,
                Commands::Tokens(cmd) => cmd.run(&config).await,
            }
        };

        select! {
            () = shutdown_token.cancelled() => Err(eyre::eyre!("command interrupted")),
            res = command => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_commands() {
        let cli = Cli::try_parse_from([
            "tokenboard",
            "holdings",
            "--network",
            "polygon",
            "--wallet",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "--json",
        ])
        .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Holdings(_)));

        let cli = Cli::try_parse_from(["tokenboard", "compare", "PLSX", "HEX"])
            .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Compare(_)));
    }

    #[test]
    fn parses_token_subcommands() {
        let cli = Cli::try_parse_from([
            "tokenboard",
            "tokens",
            "add",
            "--symbol",
            "HEX",
            "--api",
            "https://gopulse.com/api/token/HEX",
            "--chain",
            "PulseChain",
        ])
        .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Tokens(tokens::Tokens::Add(_))));

        assert!(Cli::try_parse_from(["tokenboard", "tokens", "add", "--symbol", "HEX"]).is_err());
    }

    #[test]
    fn rejects_malformed_wallet() {
        assert!(
            Cli::try_parse_from(["tokenboard", "transfers", "--wallet", "0xnope"]).is_err()
        );
    }
}
