// src/main.rs
//
// CLI entry point. Stands in for the external fan-out supervisor that
// would normally spawn one of these processes per configured data source.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal;

use acqsrv::config::Config;
use acqsrv::logging::WorkerLog;

#[derive(Parser, Debug)]
#[command(name = "acqsrv", about = "Modbus/TCP acquisition worker")]
struct Args {
    #[arg(long)]
    data_source_id: i64,

    #[arg(long)]
    host: String,

    #[arg(long)]
    port: u16,

    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("acqsrv panicked: {info}");
    }));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("acqsrv: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log = WorkerLog::new(args.data_source_id);

    let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    runtime.block_on(async {
        tokio::select! {
            _ = acqsrv::run(&config, args.data_source_id, &args.host, args.port, &log) => {}
            _ = signal::ctrl_c() => {
                log.info("received ctrl-c, shutting down");
            }
        }
    });

    ExitCode::SUCCESS
}
