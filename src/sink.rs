//! Outbound frame endpoints
//!
//! The dispatcher hands encoded frames to a `FrameSink` it was constructed
//! with. Two transports exist: MIDI-over-UDP (one frame per datagram, the
//! console's network control port) and a local MIDI output port.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::midi::format_hex;

/// Destination for encoded MIDI frames.
///
/// All methods take `&self`; implementations serialize their own writes so
/// callers may send from concurrent tasks. Sends are fire-and-forget - no
/// acknowledgment, no retry.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Deliver one complete frame
    async fn send(&self, frame: &[u8]) -> Result<()>;
}

/// Sends each frame as a single UDP datagram.
///
/// Datagram delivery keeps a frame's bytes atomic on the wire, so no
/// additional write lock is needed.
pub struct UdpSink {
    socket: UdpSocket,
    target: String,
}

impl UdpSink {
    pub async fn connect(target: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .context("Failed to bind UDP send socket")?;
        info!("Sending MIDI over UDP to {}", target);

        Ok(Self {
            socket,
            target: target.to_string(),
        })
    }
}

#[async_trait]
impl FrameSink for UdpSink {
    async fn send(&self, frame: &[u8]) -> Result<()> {
        self.socket
            .send_to(frame, &self.target)
            .await
            .with_context(|| format!("Failed to send frame to {}", self.target))?;
        debug!("→ {} | {}", self.target, format_hex(frame));
        Ok(())
    }
}

/// Sends frames to a real or virtual MIDI output port via midir.
pub struct MidiPortSink {
    port_name: String,
    conn: Mutex<midir::MidiOutputConnection>,
}

// The port connection is a platform handle; every access goes through the
// mutex, so sharing the sink across tasks is safe.
unsafe impl Send for MidiPortSink {}
unsafe impl Sync for MidiPortSink {}

impl MidiPortSink {
    /// Open the first output port whose name contains `pattern`
    /// (case-insensitive), the same matching the console's own MIDI driver
    /// advertises ports with.
    pub fn open(pattern: &str) -> Result<Self> {
        let midi_out = midir::MidiOutput::new("sq-gw")?;

        for port in midi_out.ports() {
            let Ok(name) = midi_out.port_name(&port) else {
                continue;
            };
            if name.to_lowercase().contains(&pattern.to_lowercase()) {
                let conn = midi_out
                    .connect(&port, "sq-gw-out")
                    .map_err(|e| anyhow!("Failed to connect to '{}': {}", name, e))?;
                info!("MIDI output on '{}'", name);
                return Ok(Self {
                    port_name: name,
                    conn: Mutex::new(conn),
                });
            }
        }

        anyhow::bail!("No MIDI output port matching '{}'", pattern)
    }
}

#[async_trait]
impl FrameSink for MidiPortSink {
    async fn send(&self, frame: &[u8]) -> Result<()> {
        self.conn
            .lock()
            .send(frame)
            .map_err(|e| anyhow!("MIDI send on '{}' failed: {}", self.port_name, e))?;
        debug!("→ {} | {}", self.port_name, format_hex(frame));
        Ok(())
    }
}

/// Enumerate MIDI output port names for `--list-ports`
pub fn output_port_names() -> Result<Vec<String>> {
    let midi_out = midir::MidiOutput::new("sq-gw")?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect())
}
