//! SQ console simulator
//!
//! Stands in for the desk during development: binds the console's
//! MIDI-over-UDP port and prints every frame it receives together with the
//! decoded action, validating what the gateway actually puts on the wire.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::*;
use tokio::net::UdpSocket;
use tracing::warn;

use crate::midi::{format_hex, MidiMessage};
use crate::protocol::{decode, SqAction};

pub async fn run(bind: &str, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
    let socket = UdpSocket::bind(bind)
        .await
        .with_context(|| format!("Failed to bind simulator socket on {}", bind))?;

    println!("{}", "=== SQ Console Simulator ===".bold().cyan());
    println!("Listening on {}", bind);
    println!("Press Ctrl+C to exit\n");
    println!("{}", "Format: [timestamp] PEER | HEX => ACTION".dimmed());
    println!("{}\n", "─".repeat(72).dimmed());

    let start = Instant::now();
    let mut buf = [0u8; 1024];
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, peer)) => print_frame(&start, peer, &buf[..len]),
                    Err(e) => warn!("Simulator socket error: {}", e),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    println!("\n{}", "Simulator stopped".yellow());
    Ok(())
}

fn print_frame(start: &Instant, peer: SocketAddr, data: &[u8]) {
    let timestamp = format!("{:08}", start.elapsed().as_millis());
    let hex = format_hex(data);

    // Color the hex dump by frame kind, unparseable bytes stay dim
    let hex_colored = match MidiMessage::parse(data) {
        Some(MidiMessage::NoteOn { .. }) => hex.bright_green(),
        Some(MidiMessage::NoteOff { .. }) => hex.bright_red(),
        Some(MidiMessage::ControlChange { .. }) => hex.bright_yellow(),
        Some(MidiMessage::ProgramChange { .. }) => hex.bright_magenta(),
        None => hex.bright_black(),
    };

    let action = decode(data);
    let action_colored = match action {
        SqAction::Unsupported { .. } | SqAction::Incomplete => {
            action.to_string().red()
        }
        _ => action.to_string().bright_blue(),
    };

    println!(
        "[{}ms] {} | {} => {}",
        timestamp.dimmed(),
        peer,
        hex_colored,
        action_colored
    );
}
