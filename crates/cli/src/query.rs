//! One-shot reads over the dashboard's resolvers.
use tokenboard_core::{
    chain::Network,
    compare::compare_tokens,
    config::Config,
    dashboard::Dashboard,
    export::export_to_file,
    resolver::Resolution,
    store::{JsonFileStore, TokenStore},
};
use std::{path::PathBuf, sync::Arc};

use alloy::primitives::Address;
use color_eyre::eyre::{self, WrapErr as _};
use tracing::debug;

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct Target {
    /// Network key, defaults to the configured network
    #[arg(long)]
    network: Option<String>,

    /// Wallet address, defaults to the configured wallet
    #[arg(long)]
    wallet: Option<Address>,
}

impl Target {
    /// The dashboard plus the network and wallet the command runs against.
    fn resolve(&self, config: &Config) -> eyre::Result<(Dashboard, Network, Option<Address>)> {
        let tokens = TokenStore::new(Arc::new(JsonFileStore::new(config.store.path.clone())));
        let dashboard = Dashboard::from_config(config, tokens)?;

        let key = self.network.as_deref().unwrap_or(&config.network);
        let network = dashboard
            .registry()
            .get(&key.to_ascii_lowercase())
            .cloned()
            .wrap_err("unknown network")?;

        let wallet = match self.wallet {
            Some(wallet) => Some(wallet),
            None => config.wallet_address()?,
        };

        debug!(network.key = %network.key, ?wallet, "resolved command target");
        Ok((dashboard, network, wallet))
    }
}

/// Prints the reason behind an outcome without items.
fn print_no_data<T>(what: &str, resolution: &Resolution<T>) {
    match resolution.condition() {
        Some(condition) => println!("no {what}: {condition}"),
        None => println!("no {what}"),
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct Holdings {
    #[command(flatten)]
    target: Target,

    /// Print holdings as JSON
    #[arg(long)]
    json: bool,
}

impl Holdings {
    pub(crate) async fn run(&self, config: &Config) -> eyre::Result<()> {
        let (dashboard, network, wallet) = self.target.resolve(config)?;
        let holdings = dashboard.holdings(&network, wallet).await;

        if self.json {
            let json = serde_json::to_string_pretty(holdings.items())
                .wrap_err("failed to serialize holdings")?;
            println!("{json}");
            return Ok(());
        }

        if holdings.is_no_data() {
            print_no_data("holdings", &holdings);
            return Ok(());
        }

        let total: f64 = holdings.items().iter().map(|h| h.usd_value()).sum();
        for holding in holdings.items() {
            println!("{holding}");
        }
        println!("total: ${total:.2} on {network}");
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct Transfers {
    #[command(flatten)]
    target: Target,
}

impl Transfers {
    pub(crate) async fn run(&self, config: &Config) -> eyre::Result<()> {
        let (dashboard, network, wallet) = self.target.resolve(config)?;
        let transfers = dashboard.transfers(&network, wallet).await;

        if transfers.is_no_data() {
            print_no_data("transfers", &transfers);
        }
        for transfer in transfers.items() {
            println!("{transfer} {}", transfer.explorer_url(&network));
        }
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct Prices {
    #[command(flatten)]
    target: Target,
}

impl Prices {
    pub(crate) async fn run(&self, config: &Config) -> eyre::Result<()> {
        let (dashboard, network, wallet) = self.target.resolve(config)?;

        for token in dashboard.watchlist(&network, wallet).await {
            println!(
                "{:<8} ${:<14.8} balance {:.4} (${:.2})",
                token.symbol,
                token.usd_price,
                token.balance,
                token.usd_value()
            );
        }
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct Compare {
    /// Token whose outbound total is reported
    symbol_a: String,

    /// Token whose inbound total is reported
    symbol_b: String,

    #[command(flatten)]
    target: Target,
}

impl Compare {
    pub(crate) async fn run(&self, config: &Config) -> eyre::Result<()> {
        let (dashboard, network, wallet) = self.target.resolve(config)?;
        let transfers = dashboard.transfers(&network, wallet).await;
        if transfers.is_no_data() {
            print_no_data("transfers", &transfers);
            return Ok(());
        }

        let comparison = compare_tokens(&self.symbol_a, &self.symbol_b, transfers.items());
        println!("{} sent: {}", comparison.symbol_a, comparison.sent_a());
        println!("{} received: {}", comparison.symbol_b, comparison.received_b());
        for record in &comparison.recent {
            println!("  {record}");
        }
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct Export {
    /// Destination CSV file
    path: PathBuf,

    #[command(flatten)]
    target: Target,
}

impl Export {
    pub(crate) async fn run(&self, config: &Config) -> eyre::Result<()> {
        let (dashboard, network, wallet) = self.target.resolve(config)?;
        let holdings = dashboard.holdings(&network, wallet).await;
        if holdings.is_no_data() {
            print_no_data("holdings", &holdings);
        }

        export_to_file(&self.path, holdings.items()).await?;
        println!(
            "exported {} holdings to {}",
            holdings.items().len(),
            self.path.display()
        );
        Ok(())
    }
}
