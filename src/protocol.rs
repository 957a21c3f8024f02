//! Allen & Heath SQ MIDI control protocol
//!
//! Mapping between mixer parameters and the console's compact MIDI encoding.
//! Continuous controls (faders, sends) travel as Control Change, mute states
//! as Note On/Off, scene recalls as Bank Select + Program Change. Identifiers
//! are offset based: input N maps to CC/note N-1 on the configured device
//! channel.

use std::fmt;

use thiserror::Error;

use crate::midi::{convert, MidiMessage};

/// Highest input channel on the largest SQ desk
pub const MAX_INPUT: u16 = 48;

/// Highest recallable scene
pub const MAX_SCENE: u16 = 300;

/// Encoding errors - raised before any frame is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("input channel {0} is outside 1-48")]
    InvalidChannel(u16),

    #[error("scene {0} is outside 1-300")]
    InvalidScene(u16),

    #[error("MIDI device channel {0} is outside 1-16")]
    InvalidDeviceChannel(u8),
}

/// The MIDI channel the console listens on (Utility > General > MIDI),
/// fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceChannel(u8);

impl DeviceChannel {
    pub fn new(channel: u8) -> Result<Self, ProtocolError> {
        if (1..=16).contains(&channel) {
            Ok(Self(channel))
        } else {
            Err(ProtocolError::InvalidDeviceChannel(channel))
        }
    }

    /// Zero-based channel nibble as it appears in the status byte
    pub fn wire(self) -> u8 {
        self.0 - 1
    }
}

impl fmt::Display for DeviceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map an input channel (1-48) to its wire identifier (0-47)
fn input_id(input: u16) -> Result<u8, ProtocolError> {
    if (1..=MAX_INPUT).contains(&input) {
        Ok((input - 1) as u8)
    } else {
        Err(ProtocolError::InvalidChannel(input))
    }
}

/// Encode an input fader move. The value is saturated into 0-127, not
/// rejected; only the channel is validated.
pub fn encode_fader(
    device: DeviceChannel,
    input: u16,
    value: i32,
) -> Result<MidiMessage, ProtocolError> {
    let cc = input_id(input)?;
    Ok(MidiMessage::ControlChange {
        channel: device.wire(),
        cc,
        value: convert::clamp_7bit(value),
    })
}

/// Encode an input mute change.
///
/// The console expects velocity 1 for mute-on (a protocol sentinel, not a
/// musical velocity) and a velocity-0 Note On for mute-off.
pub fn encode_mute(
    device: DeviceChannel,
    input: u16,
    on: bool,
) -> Result<MidiMessage, ProtocolError> {
    let note = input_id(input)?;
    Ok(MidiMessage::NoteOn {
        channel: device.wire(),
        note,
        velocity: if on { 1 } else { 0 },
    })
}

/// Encode a scene recall as one Bank Select + Program Change frame.
///
/// Scenes beyond 128 spill into the next bank, so the pair always travels
/// together in a single datagram.
pub fn encode_scene_recall(device: DeviceChannel, scene: u16) -> Result<Vec<u8>, ProtocolError> {
    if !(1..=MAX_SCENE).contains(&scene) {
        return Err(ProtocolError::InvalidScene(scene));
    }

    let bank = ((scene - 1) / 128) as u8;
    let program = ((scene - 1) % 128) as u8;

    let mut frame = MidiMessage::ControlChange {
        channel: device.wire(),
        cc: 0x00,
        value: bank,
    }
    .encode();
    frame.extend(MidiMessage::ProgramChange {
        channel: device.wire(),
        program,
    }
    .encode());
    Ok(frame)
}

/// Mute target referenced by a Note On/Off frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteTarget {
    Input(u8),
    Mix(u8),
    FxReturn(u8),
    MainLr,
    /// Note number outside every known range, kept verbatim
    Unknown(u8),
}

/// A frame decoded back into console terms.
///
/// Decoding is total: frames this gateway does not understand come back as
/// `UnknownCc` / `Unsupported` / `Incomplete` values rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqAction {
    InputFader { input: u8, percent: u8 },
    MixSend { mix: u8, input: u8, percent: u8 },
    FxReturnFader { fx: u8, percent: u8 },
    MainFader { percent: u8 },
    MuteState { target: MuteTarget, muted: bool },
    SceneRecall { scene: u16 },
    UnknownCc { cc: u8, value: u8 },
    Unsupported { status: u8 },
    Incomplete,
}

/// Decode one frame. Looks at the leading command only; trailing bytes are
/// ignored, as the console does.
pub fn decode(data: &[u8]) -> SqAction {
    if data.len() < 2 {
        return SqAction::Incomplete;
    }

    let status = data[0];
    match status & 0xF0 {
        0xB0 if data.len() >= 3 => decode_control_change(data[1], data[2]),
        0x90 if data.len() >= 3 => decode_note_on(data[1], data[2]),
        0xC0 => SqAction::SceneRecall {
            scene: data[1] as u16 + 1,
        },
        _ => SqAction::Unsupported { status },
    }
}

fn decode_control_change(cc: u8, value: u8) -> SqAction {
    let percent = convert::to_percent(value);
    match cc {
        0x00..=0x1F => SqAction::InputFader { input: cc + 1, percent },
        0x20..=0x3F => SqAction::MixSend { mix: 1, input: cc - 0x20 + 1, percent },
        0x40..=0x5F => SqAction::MixSend { mix: 2, input: cc - 0x40 + 1, percent },
        0x60..=0x63 => SqAction::FxReturnFader { fx: cc - 0x60 + 1, percent },
        0x7F => SqAction::MainFader { percent },
        _ => SqAction::UnknownCc { cc, value },
    }
}

fn decode_note_on(note: u8, velocity: u8) -> SqAction {
    let muted = velocity > 0;
    let target = match note {
        0x00..=0x1F => MuteTarget::Input(note + 1),
        0x20..=0x2F => MuteTarget::Mix(note - 0x20 + 1),
        0x30..=0x33 => MuteTarget::FxReturn(note - 0x30 + 1),
        0x3F => MuteTarget::MainLr,
        _ => MuteTarget::Unknown(note),
    };
    SqAction::MuteState { target, muted }
}

impl fmt::Display for SqAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SqAction::InputFader { input, percent } => {
                write!(f, "Set Input {} fader to {}%", input, percent)
            }
            SqAction::MixSend { mix, input, percent } => {
                write!(f, "Set Mix Send to Mix {} from Input {} to {}%", mix, input, percent)
            }
            SqAction::FxReturnFader { fx, percent } => {
                write!(f, "Set FX Return {} fader to {}%", fx, percent)
            }
            SqAction::MainFader { percent } => {
                write!(f, "Set Main LR fader to {}%", percent)
            }
            SqAction::MuteState { target, muted } => {
                let state = if muted { "Mute" } else { "Unmute" };
                match target {
                    MuteTarget::Input(n) => write!(f, "{} Input {}", state, n),
                    MuteTarget::Mix(n) => write!(f, "{} Mix {}", state, n),
                    MuteTarget::FxReturn(n) => write!(f, "{} FX Return {}", state, n),
                    MuteTarget::MainLr => write!(f, "{} Main LR", state),
                    MuteTarget::Unknown(note) => {
                        write!(f, "{} Unknown Note {:02X}", state, note)
                    }
                }
            }
            SqAction::SceneRecall { scene } => write!(f, "Recall Scene {}", scene),
            SqAction::UnknownCc { cc, value } => {
                write!(f, "Unknown CC {:02X} with value {}", cc, value)
            }
            SqAction::Unsupported { status } => {
                write!(f, "Unknown or unsupported MIDI command: {:02X}", status)
            }
            SqAction::Incomplete => write!(f, "Incomplete MIDI message"),
        }
    }
}
