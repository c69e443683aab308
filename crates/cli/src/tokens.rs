use tokenboard_core::{
    config::Config,
    store::{JsonFileStore, TokenStore, TrackedToken},
};
use std::sync::Arc;

use color_eyre::eyre;

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Tokens {
    /// List the tracked tokens
    List,

    /// Track a custom token
    Add(AddToken),
}

#[derive(clap::Args, Debug)]
pub(crate) struct AddToken {
    #[arg(long)]
    pub symbol: String,

    /// URL of the token's price document
    #[arg(long)]
    pub api: String,

    /// Chain label shown next to the token
    #[arg(long)]
    pub chain: String,

    /// ERC-20 contract address, enables on-chain balance reads
    #[arg(long)]
    pub address: Option<String>,
}

impl Tokens {
    pub(crate) async fn run(&self, config: &Config) -> eyre::Result<()> {
        let store = TokenStore::new(Arc::new(JsonFileStore::new(config.store.path.clone())));

        match self {
            Tokens::List => {
                for token in store.load_or_featured().await {
                    println!(
                        "{:<8} {:<12} {}",
                        token.symbol,
                        token.chain,
                        token.address.as_deref().unwrap_or("-")
                    );
                }
            }
            Tokens::Add(add) => {
                let token = TrackedToken::custom(
                    &add.symbol,
                    &add.api,
                    &add.chain,
                    add.address.clone(),
                )?;
                let tokens = store.add(token).await?;
                println!(
                    "Tracking {} tokens, saved to {}",
                    tokens.len(),
                    config.store.path.display()
                );
            }
        }

        Ok(())
    }
}
