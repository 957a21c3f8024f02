//! OSC receive loop
//!
//! Binds the UDP socket controllers talk to, decodes each datagram, and
//! feeds every contained message through the dispatcher. A datagram that
//! fails to decode is logged and skipped; the loop only exits on shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use rosc::OscPacket;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use crate::dispatch::Dispatcher;

pub async fn run(
    bind: &str,
    dispatcher: Arc<Dispatcher>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let socket = UdpSocket::bind(bind)
        .await
        .with_context(|| format!("Failed to bind OSC socket on {}", bind))?;
    info!("Listening for OSC on {}", bind);

    let mut buf = vec![0u8; rosc::decoder::MTU];
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, peer)) => match rosc::decoder::decode_udp(&buf[..len]) {
                        Ok((_, packet)) => dispatch_packet(&dispatcher, packet).await,
                        Err(e) => warn!("Undecodable packet from {}: {:?}", peer, e),
                    },
                    Err(e) => warn!("OSC socket error: {}", e),
                }
            }
            _ = &mut shutdown => {
                info!("OSC server stopping");
                break;
            }
        }
    }

    Ok(())
}

/// Unpack a packet, recursing into (possibly nested) bundles
async fn dispatch_packet(dispatcher: &Dispatcher, packet: OscPacket) {
    match packet {
        OscPacket::Message(msg) => dispatcher.handle(&msg).await,
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                Box::pin(dispatch_packet(dispatcher, inner)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DeviceChannel;
    use crate::sink::FrameSink;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rosc::{OscBundle, OscMessage, OscTime, OscType};

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send(&self, frame: &[u8]) -> anyhow::Result<()> {
            self.frames.lock().push(frame.to_vec());
            Ok(())
        }
    }

    fn fader_msg(channel: u16, value: i32) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: format!("/sq/input/{}/fader", channel),
            args: vec![OscType::Int(value)],
        })
    }

    #[tokio::test]
    async fn test_bundles_unpack_recursively() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(DeviceChannel::new(1).unwrap(), sink.clone());

        let inner = OscBundle {
            timetag: OscTime { seconds: 0, fractional: 0 },
            content: vec![fader_msg(2, 40)],
        };
        let outer = OscPacket::Bundle(OscBundle {
            timetag: OscTime { seconds: 0, fractional: 0 },
            content: vec![fader_msg(1, 20), OscPacket::Bundle(inner)],
        });

        dispatch_packet(&dispatcher, outer).await;

        assert_eq!(
            *sink.frames.lock(),
            vec![vec![0xB0, 0, 20], vec![0xB0, 1, 40]]
        );
    }
}
