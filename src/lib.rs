//! OSC to Allen & Heath SQ MIDI gateway
//!
//! Translates OSC control messages (`/sq/input/<ch>/<fader|mute>`) into the
//! SQ-series MIDI control protocol and ships the frames over UDP or a local
//! MIDI port. A bundled simulator decodes frames back into console terms to
//! validate the encoding from the other side of the wire.

pub mod config;
pub mod dispatch;
pub mod midi;
pub mod osc;
pub mod probe;
pub mod protocol;
pub mod server;
pub mod simulator;
pub mod sink;
