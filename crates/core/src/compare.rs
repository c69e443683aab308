//! Pairwise token comparison over the resolved transfer feed.
use serde::Serialize;

use crate::transfer::{Direction, TransferRecord};

/// Number of matching records kept in a comparison.
pub const RECENT_LIMIT: usize = 5;

/// Inbound and outbound totals of one token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Flow {
    pub sent: f64,
    pub received: f64,
}

impl Flow {
    fn record(&mut self, record: &TransferRecord) {
        match record.direction {
            Direction::Outbound => self.sent += record.amount,
            Direction::Inbound => self.received += record.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub symbol_a: String,
    pub symbol_b: String,
    pub flow_a: Flow,
    pub flow_b: Flow,
    /// Matching records, newest first
    pub recent: Vec<TransferRecord>,
}

impl Comparison {
    /// Total sent of the first token.
    pub fn sent_a(&self) -> f64 {
        self.flow_a.sent
    }

    /// Total received of the second token.
    pub fn received_b(&self) -> f64 {
        self.flow_b.received
    }
}

fn same_symbol(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub fn compare_tokens(symbol_a: &str, symbol_b: &str, records: &[TransferRecord]) -> Comparison {
    let mut flow_a = Flow::default();
    let mut flow_b = Flow::default();
    let mut matching = Vec::new();

    for record in records {
        let is_a = same_symbol(&record.symbol, symbol_a);
        let is_b = same_symbol(&record.symbol, symbol_b);
        if is_a {
            flow_a.record(record);
        }
        if is_b {
            flow_b.record(record);
        }
        if is_a || is_b {
            matching.push(record.clone());
        }
    }

    matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matching.truncate(RECENT_LIMIT);

    Comparison {
        symbol_a: symbol_a.trim().to_string(),
        symbol_b: symbol_b.trim().to_string(),
        flow_a,
        flow_b,
        recent: matching,
    }
}

/// Unique symbols present in the feed, in first-seen order.
pub fn comparable_symbols(records: &[TransferRecord]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for record in records {
        if !symbols.iter().any(|s| same_symbol(s, &record.symbol)) {
            symbols.push(record.symbol.clone());
        }
    }
    symbols
}
