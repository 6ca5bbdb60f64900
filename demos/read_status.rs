//! Full status readout of a SIM928 voltage source.
//!
//! Demonstrates:
//! - Connecting with a connectivity listener
//! - Identity, voltage, and output relay queries
//! - Battery diagnostics and battery pack info fields
//!
//! Usage:
//!   cargo run --example read_status -- <host> <port>
//!   cargo run --example read_status -- <host> <port> --debug

// ============================================================================
// Imports
// ============================================================================

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
    let args: Vec<String> = std::env::args().collect();
    init_logging(args.iter().any(|a| a == "--debug"));

    let (host, port) = parse_target(&args)?;
    let endpoint = Endpoint::new(host, port).context("invalid endpoint")?;

    println!("=== SIM928 status readout ===\n");

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[1] Connecting to {endpoint}...");

    let source = Sim928::new(endpoint);
    source.add_connection_listener(Box::new(|connected| {
        println!("    listener: connected = {connected}");
    }));

    source.connect().await;
    if !source.is_connected() {
        bail!("device is not reachable");
    }
    println!("    ✓ Connected");
    println!("    Identity: {}\n", source.identity());

    // ========================================================================
    // Output
    // ========================================================================

    println!("[2] Output...");
    match source.read_voltage().await {
        Ok(volts) => println!("    Voltage: {volts:.3} V"),
        Err(e) => println!("    Voltage: unreadable ({e})"),
    }
    match source.read_output_enabled().await {
        Ok(on) => println!("    Relay:   {}\n", if on { "on" } else { "off" }),
        Err(e) => println!("    Relay:   unreadable ({e})\n"),
    }

    // ========================================================================
    // Battery
    // ========================================================================

    println!("[3] Battery...");
    let battery = source.read_battery_state().await;
    println!(
        "    Pack A:  {} | Pack B: {} | Service: {}",
        battery.battery_a_description(),
        battery.battery_b_description(),
        battery.service_description()
    );

    for code in 0..=4 {
        let info = source.read_battery_info(code).await?;
        println!("    BIDN {code}:  {info}");
    }

    if source.last_communication_timed_out() {
        println!("\n    (last command timed out; readings may be stale)");
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    println!("\n[Cleanup] Disconnecting...");
    source.disconnect().await;
    println!("          ✓ Done");

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_target(args: &[String]) -> anyhow::Result<(&str, u16)> {
    let mut positional = args.iter().skip(1).filter(|a| !a.starts_with("--"));
    let host = positional.next().context("usage: read_status <host> <port>")?;
    let port = positional
        .next()
        .context("usage: read_status <host> <port>")?
        .parse()
        .context("port must be 1-65535")?;
    Ok((host, port))
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "sim928_client=debug"
    } else {
        "sim928_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
