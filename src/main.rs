//! SQ GW - OSC to Allen & Heath SQ MIDI gateway

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sq_gw::config::{AppConfig, OutputConfig};
use sq_gw::dispatch::Dispatcher;
use sq_gw::midi::format_hex;
use sq_gw::probe::ProbeSpec;
use sq_gw::protocol::DeviceChannel;
use sq_gw::sink::{self, FrameSink, MidiPortSink, UdpSink};
use sq_gw::{server, simulator};

/// SQ Gateway - drive an Allen & Heath SQ mixer from OSC controllers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run the SQ console simulator instead of the gateway
    #[arg(long)]
    simulate: bool,

    /// Send one test frame and exit
    /// (fader:<ch>:<value>, mute:<ch>:<on|off>, scene:<n>)
    #[arg(long, value_name = "SPEC")]
    probe: Option<ProbeSpec>,

    /// List available MIDI output ports
    #[arg(long)]
    list_ports: bool,

    /// Override the OSC listen address
    #[arg(long, value_name = "ADDR")]
    osc_bind: Option<String>,

    /// Override the SQ MIDI channel (1-16)
    #[arg(long, env = "SQ_MIDI_CHANNEL", value_name = "CH")]
    midi_channel: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        list_ports_formatted();
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&args.config).await?;
    if let Some(bind) = args.osc_bind {
        config.osc.bind = bind;
    }
    if let Some(channel) = args.midi_channel {
        config.midi.device_channel = channel;
    }

    // Simulator mode needs no outbound sink
    if args.simulate {
        return simulator::run(&config.simulator.bind, shutdown_signal()).await;
    }

    let device_channel = DeviceChannel::new(config.midi.device_channel)?;
    let sink = open_sink(&config.midi.output).await?;

    if let Some(spec) = args.probe {
        let frame = spec.encode(device_channel)?;
        sink.send(&frame).await?;
        info!("Sent {}", format_hex(&frame));
        return Ok(());
    }

    info!("Starting SQ GW...");
    info!("SQ MIDI channel: {}", device_channel);

    let dispatcher = Arc::new(Dispatcher::new(device_channel, sink));
    server::run(&config.osc.bind, dispatcher, shutdown_signal()).await?;

    info!("SQ GW shutdown complete");
    Ok(())
}

async fn open_sink(output: &OutputConfig) -> Result<Arc<dyn FrameSink>> {
    Ok(match output {
        OutputConfig::Udp { target } => Arc::new(UdpSink::connect(target).await?),
        OutputConfig::Port { name } => Arc::new(MidiPortSink::open(name)?),
    })
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}

fn list_ports_formatted() {
    println!("\n{}", "=== Available MIDI Output Ports ===".bold().cyan());

    match sink::output_port_names() {
        Ok(ports) if ports.is_empty() => {
            println!("  {}", "No output ports found".dimmed());
        }
        Ok(ports) => {
            for (index, name) in ports.iter().enumerate() {
                println!("  {} {}", format!("[{}]", index).green(), name);
            }
        }
        Err(e) => println!("  {} {}", "Failed to enumerate ports:".red(), e),
    }

    println!();
}
