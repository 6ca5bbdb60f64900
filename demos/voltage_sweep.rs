//! Stepped voltage sweep with readback.
//!
//! Ramps the output from a start to an end voltage in fixed steps, reading
//! the programmed value back after each write. The output relay is closed
//! for the duration of the sweep and opened again afterwards.
//!
//! Usage:
//!   cargo run --example voltage_sweep -- <host> <port> [start] [end] [step]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::{Context, bail};
use sim928_client::{Endpoint, Sim928};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("sim928_client=info"))
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let host = args.get(1).context("usage: voltage_sweep <host> <port>")?;
    let port: u16 = args
        .get(2)
        .context("usage: voltage_sweep <host> <port>")?
        .parse()
        .context("port must be 1-65535")?;
    let start: f64 = args.get(3).map_or(Ok(0.0), |a| a.parse())?;
    let end: f64 = args.get(4).map_or(Ok(5.0), |a| a.parse())?;
    let step: f64 = args.get(5).map_or(Ok(0.5), |a| a.parse())?;

    if step <= 0.0 || end < start {
        bail!("sweep must run upwards: start <= end, step > 0");
    }

    println!("=== SIM928 voltage sweep: {start} V → {end} V, {step} V steps ===\n");

    let source = Sim928::new(Endpoint::new(host.as_str(), port)?);
    source.connect().await;
    if !source.is_connected() {
        bail!("device is not reachable");
    }
    println!("Identity: {}\n", source.identity());

    source.write_voltage(start).await?;
    source.write_output_enabled(true).await;

    let mut target = start;
    while target <= end {
        source.write_voltage(target).await?;
        tokio::time::sleep(Duration::from_millis(250)).await;

        match source.read_voltage().await {
            Ok(volts) => println!("  set {target:7.3} V   read {volts:7.3} V"),
            Err(e) => println!("  set {target:7.3} V   readback failed: {e}"),
        }

        target += step;
    }

    println!("\nSweep complete, opening output relay.");
    source.write_output_enabled(false).await;
    source.disconnect().await;

    Ok(())
}
