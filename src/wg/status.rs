//! Decoder for the human readable report printed by `wg show <iface>`.
//!
//! ```text
//! interface: wg0
//!   public key: ...
//!   listening port: 51820
//!
//! peer: ...
//!   endpoint: 10.56.88.33:51820
//!   allowed ips: 0.0.0.0/0
//!   latest handshake: 1 minute, 5 seconds ago
//!   transfer: 22.40 KiB received, 21.41 KiB sent
//!   persistent keepalive: every 25 seconds
//! ```

use std::{str::FromStr, time::Duration};

use super::{
    Conf,
    config::{ParseError, append_list, current_peer, parse_float, parse_int},
    peer::Peer,
};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
// no leap years
const YEAR: u64 = 365 * DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteUnit {
    B,
    KiB,
    MiB,
    GiB,
    TiB,
}

impl ByteUnit {
    fn scale(self) -> f64 {
        1024f64.powi(self as i32)
    }
}

impl FromStr for ByteUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "B" => ByteUnit::B,
            "KiB" => ByteUnit::KiB,
            "MiB" => ByteUnit::MiB,
            "GiB" => ByteUnit::GiB,
            "TiB" => ByteUnit::TiB,
            _ => return Err(()),
        })
    }
}

/// Byte counters of a `transfer:` line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub received: u64,
    pub sent: u64,
}

impl FromStr for Transfer {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unexpected = || ParseError::UnexpectedFormat {
            field: "transfer",
            value: s.to_string(),
        };

        let (received, sent) = s.split_once(',').ok_or_else(unexpected)?;
        let received = received
            .trim()
            .strip_suffix("received")
            .ok_or_else(unexpected)?;
        let sent = sent.trim().strip_suffix("sent").ok_or_else(unexpected)?;

        Ok(Transfer {
            received: parse_byte_count(received).ok_or_else(unexpected)??,
            sent: parse_byte_count(sent).ok_or_else(unexpected)??,
        })
    }
}

/// Parses `<float> <unit>` into whole bytes, truncating any fraction.
/// `None` means the text does not have that shape.
fn parse_byte_count(s: &str) -> Option<Result<u64, ParseError>> {
    let mut words = s.split_whitespace();
    let (amount, unit) = (words.next()?, words.next()?);
    if words.next().is_some() {
        return None;
    }

    let unit: ByteUnit = unit.parse().ok()?;
    let amount = match parse_float("transfer", amount) {
        Ok(amount) => amount,
        Err(err) => return Some(Err(err)),
    };
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    Some(Ok((amount * unit.scale()) as u64))
}

fn unit_seconds(unit: &str) -> Option<u64> {
    Some(match unit {
        "year" | "years" => YEAR,
        "day" | "days" => DAY,
        "hour" | "hours" => HOUR,
        "minute" | "minutes" => MINUTE,
        "second" | "seconds" => 1,
        _ => return None,
    })
}

/// Sums `<N> <unit>[, <N> <unit>]...` into a duration. Units may be given
/// in any subset and order. Only the unit words `wg` prints are counted;
/// any other word (`min`, `secs`, ...) contributes nothing.
fn parse_duration(field: &'static str, s: &str) -> Result<Duration, ParseError> {
    let unexpected = || ParseError::UnexpectedFormat {
        field,
        value: s.to_string(),
    };

    let mut total = 0u64;
    for part in s.split(',') {
        let mut words = part.split_whitespace();
        let (count, unit) = match (words.next(), words.next(), words.next()) {
            (Some(count), Some(unit), None) => (count, unit),
            _ => return Err(unexpected()),
        };

        let count: u64 = parse_int(field, count)?;
        match unit_seconds(unit) {
            Some(factor) => total = total.saturating_add(count.saturating_mul(factor)),
            None => log::debug!("ignoring {field} component: {}", part.trim()),
        }
    }

    Ok(Duration::from_secs(total))
}

fn parse_handshake(s: &str) -> Result<Duration, ParseError> {
    if s.eq_ignore_ascii_case("now") {
        return Ok(Duration::ZERO);
    }

    let elapsed = s
        .strip_suffix("ago")
        .ok_or_else(|| ParseError::UnexpectedFormat {
            field: "latest handshake",
            value: s.to_string(),
        })?;

    parse_duration("latest handshake", elapsed)
}

/// Accepts `every 25`, `every 25 seconds`, `every 1 minute, 5 seconds` and
/// `off`.
fn parse_keepalive(s: &str) -> Result<u16, ParseError> {
    const FIELD: &str = "persistent keepalive";
    let unexpected = || ParseError::UnexpectedFormat {
        field: FIELD,
        value: s.to_string(),
    };

    if s == "off" {
        return Ok(0);
    }

    let interval = s
        .strip_prefix("every")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .ok_or_else(unexpected)?
        .trim();

    if interval.bytes().all(|b| b.is_ascii_digit()) {
        return parse_int(FIELD, interval);
    }

    let secs = parse_duration(FIELD, interval)?.as_secs();
    u16::try_from(secs).map_err(|_| unexpected())
}

enum StatusKey {
    Interface,
    PublicKey,
    PrivateKey,
    ListeningPort,
    FwMark,
    Peer,
    Endpoint,
    AllowedIps,
    PresharedKey,
    LatestHandshake,
    Transfer,
    PersistentKeepalive,
}

impl StatusKey {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "interface" => StatusKey::Interface,
            "public key" => StatusKey::PublicKey,
            "private key" => StatusKey::PrivateKey,
            "listening port" => StatusKey::ListeningPort,
            "fwmark" => StatusKey::FwMark,
            "peer" => StatusKey::Peer,
            "endpoint" => StatusKey::Endpoint,
            "allowed ips" => StatusKey::AllowedIps,
            "preshared key" => StatusKey::PresharedKey,
            "latest handshake" => StatusKey::LatestHandshake,
            "transfer" => StatusKey::Transfer,
            "persistent keepalive" => StatusKey::PersistentKeepalive,
            _ => return None,
        })
    }
}

impl Conf {
    pub fn from_status_bytes(input: &[u8]) -> Result<Self, ParseError> {
        Self::parse_status(std::str::from_utf8(input)?)
    }

    /// Decodes the output of `wg show <iface>`, including the observed-only
    /// fields.
    pub fn parse_status(input: &str) -> Result<Self, ParseError> {
        let mut conf = Conf::default();
        let mut cursor = None;

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once(':')
                .map(|(key, value)| (key.trim(), value.trim()))
                .ok_or_else(|| ParseError::UnknownKey(line.to_string()))?;
            let key =
                StatusKey::from_key(key).ok_or_else(|| ParseError::UnknownKey(line.to_string()))?;
            let iface = &mut conf.interface;

            match key {
                StatusKey::Interface => {}
                StatusKey::PublicKey => iface.public_key = value.to_string(),
                StatusKey::PrivateKey => iface.private_key = value.to_string(),
                StatusKey::ListeningPort => {
                    iface.listen_port = parse_int("listening port", value)?
                }
                StatusKey::FwMark => iface.fwmark = value.to_string(),

                StatusKey::Peer => {
                    conf.peers.push(Peer {
                        public_key: value.to_string(),
                        ..Default::default()
                    });
                    cursor = Some(conf.peers.len() - 1);
                }
                StatusKey::Endpoint => {
                    current_peer(&mut conf.peers, cursor, line)?.endpoint = value.to_string()
                }
                StatusKey::PresharedKey => {
                    current_peer(&mut conf.peers, cursor, line)?.preshared_key = value.to_string()
                }
                StatusKey::AllowedIps => {
                    let peer = current_peer(&mut conf.peers, cursor, line)?;
                    if value != "(none)" {
                        append_list(&mut peer.allowed_ips, value);
                    }
                }
                StatusKey::LatestHandshake => {
                    let peer = current_peer(&mut conf.peers, cursor, line)?;
                    peer.latest_handshake = parse_handshake(value)?;
                }
                StatusKey::Transfer => {
                    let peer = current_peer(&mut conf.peers, cursor, line)?;
                    let transfer: Transfer = value.parse()?;
                    peer.received = transfer.received;
                    peer.sent = transfer.sent;
                }
                StatusKey::PersistentKeepalive => {
                    let peer = current_peer(&mut conf.peers, cursor, line)?;
                    peer.persistent_keepalive = parse_keepalive(value)?;
                }
            }
        }

        log::trace!("decoded status with {} peers", conf.peers.len());

        Ok(conf)
    }
}
