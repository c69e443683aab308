//! The single owner of the active network and connected wallet.
//!
//! Every mutation bumps a generation counter and publishes an immutable
//! [`SessionContext`] snapshot. Work started for one generation can check
//! [`Session::is_current`] before committing its result.
use alloy::primitives::Address;
use tokio::sync::watch;
use tracing::info;

use crate::{
    chain::{Network, NetworkRegistry},
    error::DashboardError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub generation: u64,
    pub network: String,
    pub wallet: Option<Address>,
}

pub struct Session {
    context_tx: watch::Sender<SessionContext>,
    registry: NetworkRegistry,
}

impl Session {
    pub fn new(registry: NetworkRegistry, network: &str) -> Result<Self, DashboardError> {
        registry.get(network)?;
        let (context_tx, _) = watch::channel(SessionContext {
            generation: 0,
            network: network.to_string(),
            wallet: None,
        });
        Ok(Self {
            context_tx,
            registry,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionContext> {
        self.context_tx.subscribe()
    }

    pub fn current(&self) -> SessionContext {
        self.context_tx.borrow().clone()
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn active_network(&self) -> Result<Network, DashboardError> {
        let key = self.context_tx.borrow().network.clone();
        self.registry.get(&key).cloned()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.context_tx.borrow().generation == generation
    }

    pub fn connect_wallet(&self, wallet: Address) -> SessionContext {
        let ctx = self.update(|ctx| ctx.wallet = Some(wallet));
        info!(%wallet, generation = ctx.generation, "wallet connected");
        ctx
    }

    pub fn disconnect_wallet(&self) -> SessionContext {
        let ctx = self.update(|ctx| ctx.wallet = None);
        info!(generation = ctx.generation, "wallet disconnected");
        ctx
    }

    pub fn switch_network(&self, key: &str) -> Result<SessionContext, DashboardError> {
        let network = self.registry.get(key)?;
        let ctx = self.update(|ctx| ctx.network = network.key.clone());
        info!(network.key = %network.key, generation = ctx.generation, "active network switched");
        Ok(ctx)
    }

    fn update(&self, mutate: impl FnOnce(&mut SessionContext)) -> SessionContext {
        self.context_tx.send_modify(|ctx| {
            mutate(ctx);
            ctx.generation += 1;
        });
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn session() -> Session {
        Session::new(NetworkRegistry::with_defaults(), "pulsechain").expect("known network")
    }

    #[test]
    fn unknown_initial_network_is_rejected() {
        let err = Session::new(NetworkRegistry::with_defaults(), "solana").err();
        assert_eq!(err, Some(DashboardError::NetworkUnsupported("solana".to_string())));
    }

    #[test]
    fn every_mutation_bumps_the_generation() {
        let session = session();
        let start = session.current().generation;

        let connected = session.connect_wallet(WALLET.parse().expect("valid address"));
        let switched = session.switch_network("binance").expect("known network");
        let disconnected = session.disconnect_wallet();

        assert_eq!(connected.generation, start + 1);
        assert_eq!(switched.generation, start + 2);
        assert_eq!(disconnected.generation, start + 3);
        assert_eq!(
            session.active_network().expect("known network").chain_id(),
            0x38
        );
        assert!(disconnected.wallet.is_none());
        assert!(!session.is_current(switched.generation));
        assert!(session.is_current(disconnected.generation));
    }

    #[test]
    fn unsupported_switch_leaves_context_untouched() {
        let session = session();
        let before = session.current();

        let err = session.switch_network("dogechain");

        assert!(matches!(err, Err(DashboardError::NetworkUnsupported(_))));
        assert_eq!(session.current(), before);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let session = session();
        let mut rx = session.subscribe();

        session.switch_network("polygon").expect("known network");

        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow_and_update().network, "polygon");
    }
}
