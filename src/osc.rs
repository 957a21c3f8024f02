//! OSC address and argument handling
//!
//! Controllers address the desk as `/sq/input/<channel>/<function>`. The
//! parser returns a tagged variant so every malformed-input path is explicit
//! instead of being caught as an indexing error downstream.

use rosc::OscType;

/// Function segment of an input address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFunction {
    Fader,
    Mute,
}

/// Result of parsing an inbound address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAddress {
    /// `/sq/input/<channel>/<function>` with a function this gateway maps
    Input { channel: u16, function: InputFunction },

    /// Well-formed input address whose function segment is not mapped.
    /// Dropped without logging - deliberate, controllers spray these.
    Unsupported,

    /// Anything else: wrong prefix, wrong segment count, non-numeric channel
    Unrecognized,
}

impl ControlAddress {
    pub fn parse(addr: &str) -> Self {
        let parts: Vec<&str> = addr.trim_matches('/').split('/').collect();

        if parts.len() != 4 || parts[0] != "sq" || parts[1] != "input" {
            return ControlAddress::Unrecognized;
        }

        let channel = match parts[2].parse::<u16>() {
            Ok(channel) => channel,
            Err(_) => return ControlAddress::Unrecognized,
        };

        match parts[3] {
            "fader" => ControlAddress::Input { channel, function: InputFunction::Fader },
            "mute" => ControlAddress::Input { channel, function: InputFunction::Mute },
            _ => ControlAddress::Unsupported,
        }
    }
}

/// First argument as an integer, truncating any fractional part
pub fn value_arg(args: &[OscType]) -> Option<i32> {
    match args.first()? {
        OscType::Int(v) => Some(*v),
        OscType::Long(v) => Some(*v as i32),
        OscType::Float(v) => Some(*v as i32),
        OscType::Double(v) => Some(*v as i32),
        _ => None,
    }
}

/// First argument as a boolean via integer truthiness (any nonzero is true)
pub fn flag_arg(args: &[OscType]) -> Option<bool> {
    match args.first()? {
        OscType::Bool(b) => Some(*b),
        _ => value_arg(args).map(|v| v != 0),
    }
}
