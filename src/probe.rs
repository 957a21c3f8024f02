//! One-shot test frames
//!
//! `--probe` sends a single hand-built frame through the configured sink,
//! which exercises the whole encode path without needing an OSC controller
//! on the network.

use std::str::FromStr;

use anyhow::{anyhow, bail, Result};

use crate::protocol::{self, DeviceChannel};

/// A frame spec given on the command line: `fader:<ch>:<0-127>`,
/// `mute:<ch>:<on|off|1|0>`, or `scene:<1-300>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSpec {
    Fader { channel: u16, value: i32 },
    Mute { channel: u16, on: bool },
    Scene { scene: u16 },
}

impl FromStr for ProbeSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            ["fader", channel, value] => Ok(ProbeSpec::Fader {
                channel: parse_num(channel, "channel")?,
                value: parse_num(value, "fader value")?,
            }),
            ["mute", channel, state] => Ok(ProbeSpec::Mute {
                channel: parse_num(channel, "channel")?,
                on: parse_state(state)?,
            }),
            ["scene", scene] => Ok(ProbeSpec::Scene {
                scene: parse_num(scene, "scene")?,
            }),
            _ => bail!("expected fader:<ch>:<value>, mute:<ch>:<on|off>, or scene:<n>"),
        }
    }
}

fn parse_num<T: FromStr>(s: &str, what: &str) -> Result<T> {
    s.parse()
        .map_err(|_| anyhow!("{} must be an integer, got '{}'", what, s))
}

fn parse_state(s: &str) -> Result<bool> {
    match s {
        "on" | "1" => Ok(true),
        "off" | "0" => Ok(false),
        other => Err(anyhow!("mute state must be on or off, got '{}'", other)),
    }
}

impl ProbeSpec {
    /// Encode the spec into wire bytes; bounds errors surface here
    pub fn encode(&self, device: DeviceChannel) -> Result<Vec<u8>> {
        Ok(match *self {
            ProbeSpec::Fader { channel, value } => {
                protocol::encode_fader(device, channel, value)?.encode()
            }
            ProbeSpec::Mute { channel, on } => {
                protocol::encode_mute(device, channel, on)?.encode()
            }
            ProbeSpec::Scene { scene } => protocol::encode_scene_recall(device, scene)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch1() -> DeviceChannel {
        DeviceChannel::new(1).unwrap()
    }

    #[test]
    fn test_parse_fader_spec() {
        assert_eq!(
            "fader:5:100".parse::<ProbeSpec>().unwrap(),
            ProbeSpec::Fader { channel: 5, value: 100 }
        );
    }

    #[test]
    fn test_parse_mute_spec() {
        assert_eq!(
            "mute:3:on".parse::<ProbeSpec>().unwrap(),
            ProbeSpec::Mute { channel: 3, on: true }
        );
        assert_eq!(
            "mute:3:0".parse::<ProbeSpec>().unwrap(),
            ProbeSpec::Mute { channel: 3, on: false }
        );
    }

    #[test]
    fn test_parse_scene_spec() {
        assert_eq!(
            "scene:12".parse::<ProbeSpec>().unwrap(),
            ProbeSpec::Scene { scene: 12 }
        );
    }

    #[test]
    fn test_parse_rejects_malformed_specs() {
        assert!("".parse::<ProbeSpec>().is_err());
        assert!("fader:5".parse::<ProbeSpec>().is_err());
        assert!("fader:x:100".parse::<ProbeSpec>().is_err());
        assert!("mute:3:maybe".parse::<ProbeSpec>().is_err());
        assert!("solo:3:on".parse::<ProbeSpec>().is_err());
    }

    #[test]
    fn test_encode_specs() {
        assert_eq!(
            ProbeSpec::Fader { channel: 5, value: 100 }.encode(ch1()).unwrap(),
            vec![0xB0, 4, 100]
        );
        assert_eq!(
            ProbeSpec::Mute { channel: 3, on: true }.encode(ch1()).unwrap(),
            vec![0x90, 2, 1]
        );
        assert_eq!(
            ProbeSpec::Scene { scene: 129 }.encode(ch1()).unwrap().len(),
            5
        );
    }

    #[test]
    fn test_encode_surfaces_bounds_errors() {
        assert!(ProbeSpec::Fader { channel: 49, value: 0 }.encode(ch1()).is_err());
        assert!(ProbeSpec::Scene { scene: 301 }.encode(ch1()).is_err());
    }
}
