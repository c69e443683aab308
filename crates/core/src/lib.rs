pub mod cache;
pub mod chain;
pub mod compare;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod holding;
pub mod http;
pub mod indexer;
pub mod onchain;
pub mod price;
pub mod refresh;
pub mod render;
pub mod resolver;
pub mod session;
pub mod store;
pub mod transfer;
pub mod wallet;
