//! CSV export of rendered holdings.
use std::{io, path::Path};

use color_eyre::eyre::{self, WrapErr as _};
use serde::Serialize;

use crate::holding::Holding;

#[derive(Serialize)]
struct Row<'a> {
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Balance")]
    balance: f64,
    #[serde(rename = "USD Value")]
    usd_value: f64,
    #[serde(rename = "Chain")]
    chain: &'a str,
}

impl<'a> From<&'a Holding> for Row<'a> {
    fn from(holding: &'a Holding) -> Self {
        Self {
            symbol: &holding.symbol,
            name: &holding.name,
            balance: holding.balance,
            usd_value: holding.usd_value(),
            chain: &holding.network,
        }
    }
}

/// Writes one header line followed by one row per holding.
pub fn write_csv<W: io::Write>(writer: W, holdings: &[Holding]) -> eyre::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written explicitly so an empty export still carries the header.
    csv.write_record(["Symbol", "Name", "Balance", "USD Value", "Chain"])?;
    for holding in holdings {
        csv.serialize(Row::from(holding))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn to_csv_string(holdings: &[Holding]) -> eyre::Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, holdings)?;
    String::from_utf8(buf).wrap_err("csv output is not utf-8")
}

pub async fn export_to_file(path: &Path, holdings: &[Holding]) -> eyre::Result<()> {
    let document = to_csv_string(holdings)?;
    tokio::fs::write(path, document)
        .await
        .wrap_err_with(|| format!("failed to write export to {}", path.display()))
}
