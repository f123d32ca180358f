use anyhow::Context;
use clap::Parser;
use ppsmon::logging::log_error;
use ppsmon::output::netdata::{DEFAULT_UPDATE_EVERY, NETDATA_ENV};
use ppsmon::output::{open_output, CsvEmitter, NetdataEmitter, ReadingSink, TextEmitter};
use ppsmon::pps::serial::{open_serial, SerialConfig};
use ppsmon::{init_logger, log_info, Monitor, MonitorConfig, MonitorEvent, ValueStore};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};

#[derive(Parser)]
#[command(name = "ppsmon")]
#[command(about = "PPS monitoring program")]
struct Cli {
    /// Output CSV records
    #[arg(short, long)]
    csv: bool,
    /// Print CSV header
    #[arg(short = 'H', long)]
    header: bool,
    /// Number of messages to process (default: infinite)
    #[arg(short, long)]
    nmessage: Option<u64>,
    /// Act as a netdata external plugin
    #[arg(short = 'N', long)]
    netdata: bool,
    /// Append output to this file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Serial port to access
    #[arg(short, long, default_value = "/dev/serial0")]
    port: String,
    /// Show telegrams also in raw format
    #[arg(short, long)]
    raw: bool,
    /// Show unknown telegrams
    #[arg(short, long)]
    unknown: bool,
    /// Seconds between netdata updates, passed by netdata
    update_every: Option<u64>,
}

impl Cli {
    fn update_every(&self) -> u64 {
        self.update_every
            .or_else(|| std::env::var(NETDATA_ENV).ok()?.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_UPDATE_EVERY)
    }

    /// The per-reading output. In netdata mode stdout carries the plugin
    /// protocol, so text and CSV need an explicit `-c` or `-o`.
    fn sink(&self) -> anyhow::Result<Option<Box<dyn ReadingSink + Send>>> {
        if self.netdata && !self.csv && self.output.is_none() {
            return Ok(None);
        }
        let out: Box<dyn Write + Send> =
            open_output(self.output.as_deref()).context("Failed to open output")?;
        Ok(Some(if self.csv {
            Box::new(CsvEmitter::new(out, self.header))
        } else {
            Box::new(TextEmitter::new(out, self.raw))
        }))
    }
}

fn spawn_netdata(store: Arc<ValueStore>, every: Duration) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let mut emitter = NetdataEmitter::new(std::io::stdout());
    emitter.write_banner().context("Failed to write netdata charts")?;

    Ok(tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<Instant> = None;
        loop {
            let now = ticker.tick().await;
            let since_last = last.map_or(Duration::ZERO, |t| now - t);
            if let Err(e) = emitter.write_update(&store.snapshot(), since_last) {
                log_error(&format!("netdata update failed: {e}"));
                break;
            }
            last = Some(now);
        }
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let mut sink = cli.sink()?;

    #[cfg(feature = "raspberry-pi")]
    let _supply = ppsmon::gpio::BoardSupply::enable().context("Failed to power the interface board")?;

    let source = open_serial(&cli.port, &SerialConfig::default())
        .with_context(|| format!("Failed to open {}", cli.port))?;
    log_info(&format!("Monitoring {}", cli.port));

    let config = MonitorConfig {
        limit: cli.nmessage,
        show_unknown: cli.unknown,
    };
    let mut monitor = Monitor::new(source, config);

    let shutdown = monitor.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_info("Interrupted, stopping");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    let poller = if cli.netdata {
        Some(spawn_netdata(
            monitor.store(),
            Duration::from_secs(cli.update_every()),
        )?)
    } else {
        None
    };

    let store = monitor.store();
    while let Some(event) = monitor.next_event().await? {
        let Some(sink) = sink.as_mut() else {
            continue;
        };
        match event {
            MonitorEvent::Reading { reading, telegram } => {
                sink.on_reading(&reading, &telegram, &store)?;
            }
            MonitorEvent::Unknown(unknown) => sink.on_unknown(&unknown)?,
        }
    }

    if let Some(poller) = poller {
        poller.abort();
    }

    let stats = monitor.stats();
    log_info(&format!(
        "Processed {} telegrams: {} decoded, {} unknown, {} checksum errors, {} short",
        stats.telegrams_valid,
        stats.telegrams_decoded,
        stats.telegrams_unknown,
        stats.checksum_errors,
        stats.short_telegrams
    ));

    Ok(())
}
