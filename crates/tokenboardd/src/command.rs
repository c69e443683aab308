//! Interactive commands read from stdin, one per line.
use std::{path::PathBuf, str::FromStr};

use color_eyre::eyre::{self, bail, eyre};

pub(crate) const HELP: &str = "\
commands:
  connect                              connect the configured wallet
  disconnect                           forget the connected wallet
  network <key>                        switch the active network
  refresh                              resolve again now
  add <symbol> <price-api> <chain> [address]
                                       track a custom token
  tokens                               list tracked tokens
  compare <symbol-a> <symbol-b>        compare two tokens from the transfer feed
  export <path>                        write rendered holdings as CSV
  quit                                 stop the dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Network(String),
    Refresh,
    Add {
        symbol: String,
        api: String,
        chain: String,
        address: Option<String>,
    },
    Tokens,
    Compare(String, String),
    Export(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = eyre::Report;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let args = words.collect::<Vec<_>>();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("connect", []) => Self::Connect,
            ("disconnect", []) => Self::Disconnect,
            ("network", [key]) => Self::Network(key.to_ascii_lowercase()),
            ("refresh", []) => Self::Refresh,
            ("add", [symbol, api, chain, rest @ ..]) if rest.len() <= 1 => Self::Add {
                symbol: symbol.to_string(),
                api: api.to_string(),
                chain: chain.to_string(),
                address: rest.first().map(|addr| addr.to_string()),
            },
            ("tokens", []) => Self::Tokens,
            ("compare", [a, b]) => Self::Compare(a.to_string(), b.to_string()),
            ("export", [path]) => Self::Export(PathBuf::from(path)),
            ("help", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            (verb, _) => return Err(eyre!("unrecognized command `{verb}`, try `help`")),
        };
        Ok(command)
    }
}
