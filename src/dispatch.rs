//! Translation dispatcher
//!
//! One inbound OSC message in, at most one MIDI frame out. Everything that
//! can go wrong with a single message is caught and reported here - nothing
//! on this path is allowed to take the receive loop down.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use rosc::OscMessage;
use tracing::{info, warn};

use crate::osc::{self, ControlAddress, InputFunction};
use crate::protocol::{self, DeviceChannel};
use crate::sink::FrameSink;

/// Stateless per message: holds only the fixed device channel and the
/// injected output endpoint, so concurrent `handle` calls need no locking.
pub struct Dispatcher {
    device_channel: DeviceChannel,
    sink: Arc<dyn FrameSink>,
}

impl Dispatcher {
    pub fn new(device_channel: DeviceChannel, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            device_channel,
            sink,
        }
    }

    /// Translate one inbound message and forward the encoded frame.
    ///
    /// Malformed input is logged and dropped; the service keeps running.
    pub async fn handle(&self, msg: &OscMessage) {
        info!("OSC {} {:?}", msg.addr, msg.args);

        if let Err(e) = self.translate(msg).await {
            warn!("Dropping {}: {}", msg.addr, e);
        }
    }

    async fn translate(&self, msg: &OscMessage) -> Result<()> {
        match ControlAddress::parse(&msg.addr) {
            ControlAddress::Input { channel, function: InputFunction::Fader } => {
                let value = osc::value_arg(&msg.args)
                    .ok_or_else(|| anyhow!("missing or non-numeric fader argument"))?;
                let frame = protocol::encode_fader(self.device_channel, channel, value)?;
                self.sink.send(&frame.encode()).await
            }
            ControlAddress::Input { channel, function: InputFunction::Mute } => {
                let on = osc::flag_arg(&msg.args)
                    .ok_or_else(|| anyhow!("missing or non-numeric mute argument"))?;
                let frame = protocol::encode_mute(self.device_channel, channel, on)?;
                self.sink.send(&frame.encode()).await
            }
            // Unmapped functions are dropped without a log line on purpose
            ControlAddress::Unsupported => Ok(()),
            ControlAddress::Unrecognized => Err(anyhow!("unrecognized address pattern")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rosc::OscType;

    /// Captures every frame the dispatcher sends
    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send(&self, frame: &[u8]) -> Result<()> {
            self.frames.lock().push(frame.to_vec());
            Ok(())
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(DeviceChannel::new(1).unwrap(), sink.clone());
        (dispatcher, sink)
    }

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[tokio::test]
    async fn test_fader_message_sends_control_change() {
        let (dispatcher, sink) = dispatcher();

        dispatcher
            .handle(&msg("/sq/input/5/fader", vec![OscType::Int(100)]))
            .await;

        assert_eq!(*sink.frames.lock(), vec![vec![0xB0, 4, 100]]);
    }

    #[tokio::test]
    async fn test_fader_float_argument_truncates_and_clamps() {
        let (dispatcher, sink) = dispatcher();

        dispatcher
            .handle(&msg("/sq/input/1/fader", vec![OscType::Float(100.7)]))
            .await;
        dispatcher
            .handle(&msg("/sq/input/1/fader", vec![OscType::Float(400.0)]))
            .await;

        assert_eq!(*sink.frames.lock(), vec![vec![0xB0, 0, 100], vec![0xB0, 0, 127]]);
    }

    #[tokio::test]
    async fn test_mute_messages_send_note_frames() {
        let (dispatcher, sink) = dispatcher();

        dispatcher
            .handle(&msg("/sq/input/3/mute", vec![OscType::Int(1)]))
            .await;
        dispatcher
            .handle(&msg("/sq/input/3/mute", vec![OscType::Int(0)]))
            .await;

        assert_eq!(*sink.frames.lock(), vec![vec![0x90, 2, 1], vec![0x90, 2, 0]]);
    }

    #[tokio::test]
    async fn test_out_of_range_channel_is_dropped() {
        let (dispatcher, sink) = dispatcher();

        dispatcher
            .handle(&msg("/sq/input/99/fader", vec![OscType::Int(64)]))
            .await;

        assert!(sink.frames.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unmapped_function_is_ignored() {
        let (dispatcher, sink) = dispatcher();

        dispatcher
            .handle(&msg("/sq/input/5/pan", vec![OscType::Int(64)]))
            .await;

        assert!(sink.frames.lock().is_empty());
    }

    #[tokio::test]
    async fn test_garbage_address_is_dropped() {
        let (dispatcher, sink) = dispatcher();

        dispatcher.handle(&msg("/totally/wrong", vec![])).await;
        dispatcher
            .handle(&msg("/sq/input/five/fader", vec![OscType::Int(1)]))
            .await;

        assert!(sink.frames.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument_is_dropped() {
        let (dispatcher, sink) = dispatcher();

        dispatcher.handle(&msg("/sq/input/5/fader", vec![])).await;
        dispatcher
            .handle(&msg("/sq/input/5/mute", vec![OscType::String("on".into())]))
            .await;

        assert!(sink.frames.lock().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_handles_never_interleave_frames() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Arc::new(Dispatcher::new(
            DeviceChannel::new(1).unwrap(),
            sink.clone(),
        ));

        let mut tasks = Vec::new();
        for channel in 1..=48u16 {
            let dispatcher = dispatcher.clone();
            tasks.push(tokio::spawn(async move {
                dispatcher
                    .handle(&msg(
                        &format!("/sq/input/{}/fader", channel),
                        vec![OscType::Int(channel as i32)],
                    ))
                    .await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let frames = sink.frames.lock();
        assert_eq!(frames.len(), 48);

        // Every frame is a complete, well-formed control change; each control
        // id appears exactly once regardless of scheduling order.
        let mut seen: Vec<u8> = frames
            .iter()
            .map(|frame| {
                assert_eq!(frame.len(), 3);
                assert_eq!(frame[0], 0xB0);
                frame[1]
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..48).collect::<Vec<u8>>());
    }
}
