//! Command line tool: query one Mijia temperature/humidity sensor.
//!
//! Run with: mijia-ht 4C:65:A8:D0:0A:1F --json

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use mijia_ht_ble::{
    read_sensor, DeviceAddress, GattToolTransport, NativeTransport, ReadSelection, Report,
    Result, SessionConfig, Transport,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Backend {
    /// Platform Bluetooth stack (default)
    #[default]
    Native,
    /// BlueZ gatttool in interactive mode
    Gatttool,
}

#[derive(Parser)]
#[command(name = "mijia-ht")]
#[command(about = "Read a Xiaomi Mijia Bluetooth temperature/humidity sensor", long_about = None)]
struct Cli {
    /// Bluetooth address of the sensor
    #[arg(value_name = "ADDRESS")]
    address: DeviceAddress,

    /// Read temperature and humidity
    #[arg(short, long)]
    measure: bool,

    /// Read the battery level
    #[arg(short, long)]
    battery: bool,

    /// Read the device information
    #[arg(short, long)]
    info: bool,

    /// Print the report as JSON
    #[arg(short, long)]
    json: bool,

    /// Transport backend
    #[arg(long, value_enum, default_value_t = Backend::Native)]
    backend: Backend,

    /// Bluetooth adapter, e.g. hci0
    #[arg(long)]
    adapter: Option<String>,

    /// Timeout for every device operation, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Pause after reads and disconnect, in milliseconds
    #[arg(long, default_value_t = 100)]
    settle_ms: u64,
}

impl Cli {
    fn config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_settle_delay(Duration::from_millis(self.settle_ms))
            .with_reads(ReadSelection::from_flags(
                self.info,
                self.battery,
                self.measure,
            ))
    }
}

async fn query<T: Transport>(transport: T, cli: &Cli) -> Result<Report> {
    read_sensor(transport, cli.address, cli.config()).await
}

async fn run(cli: &Cli) -> Result<Report> {
    let adapter = cli.adapter.as_deref();
    debug!("Using {:?} backend", cli.backend);

    match cli.backend {
        Backend::Native => query(NativeTransport::new(adapter).await?, cli).await,
        Backend::Gatttool => {
            let transport = GattToolTransport::spawn(GattToolTransport::DEFAULT_PROGRAM, adapter)?;
            query(transport, cli).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mijia_ht_ble=info")),
        )
        .init();

    let cli = Cli::parse();

    let report = match run(&cli).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", report);
    }

    ExitCode::SUCCESS
}
