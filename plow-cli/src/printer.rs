//! # Terminal Printer
//!
//! Purpose: Render periodic [`Snapshot`]s to the terminal at the configured
//! interval, then render the final, post-`done` snapshot once.

use plow_core::{AggregatorHandle, Snapshot};

/// Drives the print loop until the aggregator reports `done`.
///
/// `interval == None` suppresses in-progress output entirely; only the
/// final snapshot is rendered. `summary` suppresses everything but the
/// final summary line.
pub async fn run(mut handle: AggregatorHandle, interval: Option<std::time::Duration>, summary: bool, render_seconds: bool, clean: bool) {
    if let Some(interval) = interval {
        if !summary {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if handle.is_done() {
                    break;
                }
                render(&handle.snapshot(), render_seconds, false);
            }
        }
    }

    handle.wait_done().await;
    let snapshot = handle.snapshot();
    if clean {
        print!("\x1b[2K\r");
    }
    render(&snapshot, render_seconds, true);
}

fn render(snapshot: &Snapshot, render_seconds: bool, is_final: bool) {
    let unit = if render_seconds { "s" } else { "ms" };
    let scale = if render_seconds { 1000.0 } else { 1.0 };
    let as_unit = |d: std::time::Duration| d.as_secs_f64() * 1000.0 / scale;

    if is_final {
        println!("--- summary ---");
    }
    println!(
        "t={:>6.1}s  total={:<8} ok={:<8} err={:<8} rps={:>9.1}  err_rate={:>5.2}%",
        snapshot.elapsed.as_secs_f64(),
        snapshot.total,
        snapshot.succeeded,
        snapshot.failed,
        snapshot.rps,
        snapshot.error_rate * 100.0,
    );
    println!(
        "latency({unit}): min={:>8.2} mean={:>8.2} p50={:>8.2} p90={:>8.2} p99={:>8.2} max={:>8.2}",
        as_unit(snapshot.latency.min),
        as_unit(snapshot.latency.mean),
        as_unit(snapshot.latency.p50),
        as_unit(snapshot.latency.p90),
        as_unit(snapshot.latency.p99),
        as_unit(snapshot.latency.max),
    );

    if is_final {
        let top = snapshot.top_status_codes(5);
        if !top.is_empty() {
            let codes: Vec<String> = top.iter().map(|(code, count)| format!("{code}={count}")).collect();
            println!("status: {}", codes.join(" "));
        }
        let errors: Vec<String> = snapshot
            .error_tally
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();
        if !errors.is_empty() {
            println!("errors: {}", errors.join(" "));
        }
        println!(
            "bytes: in={} out={}",
            snapshot.bytes_in, snapshot.bytes_out
        );
    }
}
