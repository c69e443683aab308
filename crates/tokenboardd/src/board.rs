use std::{sync::Arc, time::Duration};

use color_eyre::eyre::{self, WrapErr as _, eyre};
use tokenboard_core::{
    compare::compare_tokens,
    config::Config,
    dashboard::{CycleResolver, Dashboard},
    export::export_to_file,
    refresh::{self, Trigger},
    render::{Notice, Renderer},
    session::Session,
    store::{JsonFileStore, TokenStore, TrackedToken},
    wallet::{self, ConfiguredWallet, WalletProvider},
};
use tokio::{
    io::{AsyncBufReadExt as _, BufReader},
    select,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{
    command::{Command, HELP},
    console::Console,
};

pub(super) struct Board {
    shutdown_token: CancellationToken,
    session: Arc<Session>,
    dashboard: Arc<Dashboard>,
    wallet: Arc<dyn WalletProvider>,
    console: Arc<Console>,
    refresh_handle: refresh::Handle,
}

impl Board {
    pub(super) fn new(cfg: Config, shutdown_token: CancellationToken) -> eyre::Result<Self> {
        let session = Arc::new(
            Session::new(cfg.network_registry(), &cfg.network)
                .wrap_err("invalid initial network")?,
        );

        let tokens = TokenStore::new(Arc::new(JsonFileStore::new(cfg.store.path.clone())));
        let dashboard = Arc::new(
            Dashboard::from_config(&cfg, tokens).wrap_err("failed to set up data sources")?,
        );
        let wallet = Arc::new(ConfiguredWallet::new(cfg.wallet_address()?));
        let console = Arc::new(Console);

        for network in dashboard.registry().iter() {
            info!(
                network.key = %network.key,
                network.id = network.chain_id(),
                network.rpc = %network.rpc_url,
                "🔗 Registered network"
            );
        }

        let refresh_handle = refresh::Builder {
            session: Arc::clone(&session),
            resolver: Arc::clone(&dashboard) as Arc<dyn CycleResolver>,
            renderer: Arc::clone(&console) as Arc<dyn Renderer>,
            countdown: cfg.refresh.countdown,
            tick: cfg.refresh.tick,
        }
        .build()
        .wrap_err("failed to build refresh scheduler")?;

        Ok(Self {
            shutdown_token,
            session,
            dashboard,
            wallet,
            console,
            refresh_handle,
        })
    }

    pub(super) async fn run(mut self) -> eyre::Result<()> {
        self.console.print(HELP);
        if let Err(e) = self.execute(Command::Connect).await {
            warn!(error = %e, "initial wallet connect failed");
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        let reason: eyre::Result<&'static str> = loop {
            select! {
                biased;

                () = self.shutdown_token.cancelled() => break Ok("received shutdown signal"),

                result = &mut self.refresh_handle => {
                    break result.and_then(|()| Err(eyre!("refresh scheduler stopped")));
                }

                line = lines.next_line(), if stdin_open => {
                    match line {
                        Ok(Some(line)) if line.trim().is_empty() => {}
                        Ok(Some(line)) => match line.parse::<Command>() {
                            Ok(Command::Quit) => break Ok("quit requested"),
                            Ok(command) => {
                                if let Err(e) = self.execute(command).await {
                                    warn!(error = %e, "command failed");
                                    self.console.print(&format!("error: {e:#}"));
                                }
                            }
                            Err(e) => self.console.print(&format!("{e}")),
                        },
                        Ok(None) => {
                            info!("stdin closed, continuing without interactive commands");
                            stdin_open = false;
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to read stdin, disabling interactive commands");
                            stdin_open = false;
                        }
                    }
                }
            }
        };

        self.shutdown(reason).await
    }

    #[instrument(skip(self))]
    async fn execute(&self, command: Command) -> eyre::Result<()> {
        match command {
            Command::Connect => match wallet::connect(&self.session, self.wallet.as_ref()).await {
                Ok(ctx) => {
                    if let Some(wallet) = ctx.wallet {
                        self.console.notice(&Notice::WalletConnected(wallet));
                    }
                }
                Err(e) => self.console.notice(&Notice::Problem(e)),
            },
            Command::Disconnect => {
                self.session.disconnect_wallet();
                self.console.notice(&Notice::WalletDisconnected);
            }
            Command::Network(key) => {
                match wallet::switch_network(&self.session, self.wallet.as_ref(), &key).await {
                    Ok((_, notices)) => {
                        for notice in &notices {
                            self.console.notice(notice);
                        }
                    }
                    Err(e) => self.console.notice(&Notice::Problem(e)),
                }
            }
            Command::Refresh => self.refresh_handle.trigger(Trigger::ManualRefresh)?,
            Command::Add {
                symbol,
                api,
                chain,
                address,
            } => {
                let token = TrackedToken::custom(&symbol, &api, &chain, address)?;
                self.dashboard.tokens().add(token).await?;
                self.console.notice(&Notice::TokenAdded { symbol });
                self.refresh_handle.trigger(Trigger::TokenAdded)?;
            }
            Command::Tokens => {
                let tokens = self.dashboard.tokens().load_or_featured().await;
                self.console.print_tokens(&tokens);
            }
            Command::Compare(a, b) => {
                let frame = self
                    .refresh_handle
                    .latest_frame()
                    .ok_or_else(|| eyre!("nothing rendered yet"))?;
                let comparison = compare_tokens(&a, &b, frame.transfers.items());
                self.console.print_comparison(&comparison);
            }
            Command::Export(path) => {
                let frame = self
                    .refresh_handle
                    .latest_frame()
                    .ok_or_else(|| eyre!("nothing rendered yet"))?;
                let holdings = frame.holdings.items();
                export_to_file(&path, holdings).await?;
                self.console
                    .print(&format!("exported {} holdings to {}", holdings.len(), path.display()));
            }
            Command::Help => self.console.print(HELP),
            Command::Quit => {}
        }
        Ok(())
    }

    #[instrument(skip_all)]
    async fn shutdown(mut self, reason: eyre::Result<&'static str>) -> eyre::Result<()> {
        const WAIT_BEFORE_ABORT: Duration = Duration::from_secs(5);

        // trigger the shutdown token in case it wasn't triggered yet
        self.shutdown_token.cancel();

        let message = format!(
            "waiting {} for the refresh scheduler to shutdown before aborting",
            humantime::format_duration(WAIT_BEFORE_ABORT)
        );
        match &reason {
            Ok(reason) => info!(%reason, message),
            Err(reason) => error!(%reason, message),
        };

        match tokio::time::timeout(WAIT_BEFORE_ABORT, self.refresh_handle.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "failed to shutdown refresh scheduler"),
            Err(_) => error!("refresh scheduler did not shut down in time"),
        }

        reason.map(|_| ())
    }
}
