//! Classifier Tape Demo
//!
//! Records a circuit-centric classifier, then prepares it for a device and
//! reports how the measurements were rewritten.

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use qtape_demos::circuits::classifier_tape;
use qtape_demos::{print_header, print_measurements, print_section, print_specs, print_success};
use qtape_device::{Capabilities, Device, ReferenceDevice};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeviceKind {
    /// Returns the state and measures any qubit observable
    Statevector,
    /// Computational-basis sampling only
    Sampling,
}

#[derive(Parser, Debug)]
#[command(name = "demo-classifier")]
#[command(about = "Record a classifier tape and prepare it for a device")]
struct Args {
    /// Number of wires
    #[arg(short, long, default_value = "4")]
    wires: usize,

    /// Number of classifier blocks
    #[arg(short, long, default_value = "2")]
    blocks: usize,

    /// Target device
    #[arg(short, long, value_enum, default_value = "sampling")]
    device: DeviceKind,

    /// Print the prepared tape summary as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let capabilities = match args.device {
        DeviceKind::Statevector => Capabilities::statevector("demo.statevector"),
        DeviceKind::Sampling => Capabilities::sampling("demo.sampling"),
    };
    let device = ReferenceDevice::new(capabilities.with_num_wires(args.wires));

    let data: Vec<f64> = (0..args.wires).map(|i| 0.3 * i as f64).collect();
    let tape = classifier_tape(args.wires, args.blocks, &data)?;
    info!(operations = tape.operations().len(), "Recorded classifier tape");

    let prepared = device.prepare(&tape)?;

    if args.json {
        let report = serde_json::json!({
            "device": device.capabilities(),
            "recorded": tape.specs(),
            "prepared": prepared.specs(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_header("Circuit-Centric Classifier");

    print_section("Recorded Tape");
    print_specs(&tape.specs());
    print_measurements(&tape);

    print_section(&format!("Prepared for {}", device.name()));
    print_specs(&prepared.specs());
    print_measurements(&prepared);

    print_success(&format!(
        "{} basis rotation(s) appended",
        prepared.operations().len() - tape.operations().len()
    ));
    Ok(())
}
