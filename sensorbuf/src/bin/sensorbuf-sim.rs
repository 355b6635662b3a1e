use clap::Parser;
use eyre::{Context, Result};
use sensorbuf::sim::{synthetic_event, synthetic_sample, Pacer, SimDriver};
use sensorbuf::{BufferInstance, Config};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sensorbuf-sim")]
#[command(about = "drive buffer instances from a simulated sensor driver")]
struct Args {
    #[arg(short, long, help = "configuration file path (toml format)")]
    config: Option<String>,

    #[arg(short, long, help = "number of buffer instances")]
    instances: Option<usize>,

    #[arg(short, long, help = "samples per second pushed by the driver")]
    rate: Option<u32>,

    #[arg(long, help = "sample queue capacity per instance")]
    sample_capacity: Option<usize>,

    #[arg(long, help = "event queue capacity per instance")]
    event_capacity: Option<usize>,

    #[arg(
        short,
        long,
        default_value = "5s",
        value_parser = humantime::parse_duration,
        help = "how long to run (e.g. 10s, 1m)"
    )]
    duration: Duration,
}

#[derive(Debug, Default)]
struct Tally {
    samples: u64,
    events: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config path={}", path))?,
        None => Config::default(),
    };
    if let Some(instances) = args.instances {
        config.simulation.instances = instances;
    }
    if let Some(rate) = args.rate {
        config.simulation.sample_rate = rate;
    }
    if let Some(capacity) = args.sample_capacity {
        config.buffer.sample_capacity = capacity;
    }
    if let Some(capacity) = args.event_capacity {
        config.buffer.event_capacity = capacity;
    }

    let driver = Arc::new(SimDriver::new());
    let mut buffers = Vec::with_capacity(config.simulation.instances);
    for _ in 0..config.simulation.instances {
        let buffer = BufferInstance::with_config(
            driver.clone(),
            sensorbuf::Registry::global(),
            config.buffer.clone(),
        );
        buffer
            .start_sample_buffering()
            .wrap_err("failed to start sample buffering")?;
        buffer
            .start_event_buffering()
            .wrap_err("failed to start event buffering")?;
        buffers.push(Arc::new(buffer));
    }
    info!(
        instances = buffers.len(),
        sample_rate = config.simulation.sample_rate,
        sample_capacity = config.buffer.sample_capacity,
        event_capacity = config.buffer.event_capacity,
        "buffering started"
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            info!("received ctrl+c, shutting down gracefully...");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let driver_thread = {
        let driver = driver.clone();
        let running = running.clone();
        let rate = config.simulation.sample_rate;
        let event_interval = u64::from(config.simulation.event_interval.max(1));
        let deadline = Instant::now() + args.duration;
        thread::Builder::new()
            .name("sim-driver".to_string())
            .spawn(move || {
                let mut pacer = Pacer::new(rate);
                let mut seq = 0u64;
                while running.load(Ordering::Relaxed) && Instant::now() < deadline {
                    driver.emit_sample(synthetic_sample(seq));
                    if seq % event_interval == 0 {
                        driver.emit_event(synthetic_event(seq / event_interval));
                    }
                    seq += 1;
                    pacer.wait();
                }
                running.store(false, Ordering::SeqCst);
                seq
            })?
    };

    let poll_interval = Duration::from_millis(config.simulation.poll_interval_ms);
    let consumers: Vec<_> = buffers
        .iter()
        .map(|buffer| {
            let buffer = buffer.clone();
            let running = running.clone();
            thread::Builder::new()
                .name(format!("consumer-{}", buffer.id()))
                .spawn(move || {
                    let mut tally = Tally::default();
                    loop {
                        let active = running.load(Ordering::Relaxed);
                        tally.samples += buffer.get_samples().len() as u64;
                        tally.events += buffer.get_events().len() as u64;
                        if !active {
                            break;
                        }
                        thread::sleep(poll_interval);
                    }
                    tally
                })
        })
        .collect::<std::io::Result<_>>()?;

    let emitted = match driver_thread.join() {
        Ok(emitted) => emitted,
        Err(_) => {
            warn!("driver thread panicked");
            0
        }
    };

    for (buffer, consumer) in buffers.iter().zip(consumers) {
        match consumer.join() {
            Ok(tally) => info!(
                instance = buffer.id(),
                emitted,
                samples = tally.samples,
                events = tally.events,
                dropped_samples = buffer.dropped_samples(),
                dropped_events = buffer.dropped_events(),
                "consumer finished"
            ),
            Err(_) => warn!(instance = buffer.id(), "consumer thread panicked"),
        }
    }

    for buffer in &buffers {
        buffer.stop_sample_buffering(true);
        buffer.stop_event_buffering(true);
    }

    Ok(())
}
