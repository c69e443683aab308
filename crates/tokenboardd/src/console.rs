//! Plain-text rendering of the dashboard on stdout.
use tokenboard_core::{
    compare::Comparison,
    render::{Frame, Notice, Renderer},
    resolver::Resolution,
    store::TrackedToken,
};
use tracing::debug;

#[derive(Debug, Default)]
pub(crate) struct Console;

impl Console {
    pub(crate) fn print_tokens(&self, tokens: &[TrackedToken]) {
        for token in tokens {
            let address = token.address.as_deref().unwrap_or("-");
            println!("{:<8} {:<12} {:<42} {}", token.symbol, token.chain, address, token.api);
        }
    }

    pub(crate) fn print_comparison(&self, comparison: &Comparison) {
        for line in comparison_lines(comparison) {
            println!("{line}");
        }
    }

    pub(crate) fn print(&self, message: &str) {
        println!("{message}");
    }
}

impl Renderer for Console {
    fn render(&self, frame: &Frame) {
        debug!(version = frame.version, generation = frame.context.generation, "rendering frame");
        for line in frame_lines(frame) {
            println!("{line}");
        }
    }

    fn countdown(&self, remaining: u32) {
        debug!(remaining, "refresh countdown");
        if let Some(line) = countdown_line(remaining) {
            println!("{line}");
        }
    }

    fn notice(&self, notice: &Notice) {
        println!("* {notice}");
    }
}

/// Status line for a countdown tick, shown on every fifth tick and the last three.
pub(crate) fn countdown_line(remaining: u32) -> Option<String> {
    match remaining {
        0 => None,
        n if n <= 3 || n % 5 == 0 => Some(format!("next update in {n}s")),
        _ => None,
    }
}

fn no_data<T>(resolution: &Resolution<T>) -> String {
    match resolution.condition() {
        Some(condition) => format!("  no data ({condition})"),
        None => "  no data".to_string(),
    }
}

pub(crate) fn frame_lines(frame: &Frame) -> Vec<String> {
    let network = frame
        .network
        .as_ref()
        .map_or(frame.context.network.clone(), |n| n.name.clone());
    let wallet = frame
        .context
        .wallet
        .map_or_else(|| "not connected".to_string(), |w| w.to_string());

    let mut lines = vec![
        format!(
            "== {network} | {wallet} | total ${:.2} | {} ==",
            frame.total_usd,
            frame.updated_at.format("%H:%M:%S")
        ),
        "holdings:".to_string(),
    ];

    if frame.holdings.is_no_data() {
        lines.push(no_data(&frame.holdings));
    }
    lines.extend(frame.holdings.items().iter().map(|h| format!("  {h}")));

    lines.push("recent transfers:".to_string());
    if frame.transfers.is_no_data() {
        lines.push(no_data(&frame.transfers));
    }
    lines.extend(frame.transfers.items().iter().map(|t| match &frame.network {
        Some(network) => format!("  {t} {}", t.explorer_url(network)),
        None => format!("  {t}"),
    }));

    lines.push("watchlist:".to_string());
    lines.extend(
        frame
            .watchlist
            .iter()
            .map(|h| format!("  {} ${:.6} balance {:.4}", h.symbol, h.usd_price, h.balance)),
    );

    lines
}

pub(crate) fn comparison_lines(comparison: &Comparison) -> Vec<String> {
    let mut lines = vec![
        format!("{} sent: {}", comparison.symbol_a, comparison.sent_a()),
        format!("{} received: {}", comparison.symbol_b, comparison.received_b()),
    ];
    if comparison.recent.is_empty() {
        lines.push("no matching transfers".to_string());
    }
    lines.extend(comparison.recent.iter().map(|t| format!("  {t}")));
    lines
}
