use std::{
    num::{ParseFloatError, ParseIntError},
    result::Result,
    str::{FromStr, Utf8Error},
};

use super::{Conf, peer::Peer};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("error parsing {field}: {source}")]
    IntParseError {
        field: &'static str,
        source: ParseIntError,
    },

    #[error("error parsing {field}: {source}")]
    FloatParseError {
        field: &'static str,
        source: ParseFloatError,
    },

    #[error("unexpected {field} format: {value}")]
    UnexpectedFormat { field: &'static str, value: String },

    #[error("peer field before peer marker: {0}")]
    NoPeerSection(String),

    #[error("invalid utf-8: {0}")]
    Utf8Error(#[from] Utf8Error),
}

pub(super) fn parse_int<T>(field: &'static str, value: &str) -> Result<T, ParseError>
where
    T: FromStr<Err = ParseIntError>,
{
    value
        .parse()
        .map_err(|source| ParseError::IntParseError { field, source })
}

pub(super) fn parse_float(field: &'static str, value: &str) -> Result<f64, ParseError> {
    value
        .parse()
        .map_err(|source| ParseError::FloatParseError { field, source })
}

/// Resolves the peer the cursor points at. Peer-scoped lines seen before
/// any peer marker fail with [`ParseError::NoPeerSection`].
pub(super) fn current_peer<'a>(
    peers: &'a mut [Peer],
    cursor: Option<usize>,
    line: &str,
) -> Result<&'a mut Peer, ParseError> {
    cursor
        .and_then(|idx| peers.get_mut(idx))
        .ok_or_else(|| ParseError::NoPeerSection(line.to_string()))
}

/// Appends every non-empty, trimmed element of a comma separated list.
pub(super) fn append_list(list: &mut Vec<String>, value: &str) {
    list.extend(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
}

enum WgPropKind {
    InterfaceSection,
    PeerSection,
    ListenPort,
    FwMark,
    PrivateKey,
    PublicKey,
    PresharedKey,
    Endpoint,
    AllowedIPs,
    PersistentKeepalive,
    Unknown,
}

impl FromStr for WgPropKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "[interface]" => WgPropKind::InterfaceSection,
            "[peer]" => WgPropKind::PeerSection,
            "listenport" => WgPropKind::ListenPort,
            "fwmark" => WgPropKind::FwMark,
            "privatekey" => WgPropKind::PrivateKey,
            "publickey" => WgPropKind::PublicKey,
            "presharedkey" => WgPropKind::PresharedKey,
            "endpoint" => WgPropKind::Endpoint,
            "allowedips" => WgPropKind::AllowedIPs,
            "persistentkeepalive" => WgPropKind::PersistentKeepalive,
            _ => WgPropKind::Unknown,
        })
    }
}

/// Splits `Key = value`, `Key=value` and `Key value` into key and trimmed
/// value.
fn split_line(line: &str) -> (&str, &str) {
    let end = line
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(line.len());
    let (key, rest) = line.split_at(end);
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('=').unwrap_or(rest);

    (key, rest.trim())
}

/// Cuts a `#` comment that starts the line or follows whitespace. A `#`
/// inside a value, as in `host#1:5`, is kept.
fn strip_comment(line: &str) -> &str {
    let start = line
        .char_indices()
        .find(|&(idx, c)| {
            c == '#' && line[..idx].chars().next_back().is_none_or(char::is_whitespace)
        })
        .map_or(line.len(), |(idx, _)| idx);

    line[..start].trim()
}

impl Conf {
    pub fn from_conf_bytes(input: &[u8]) -> Result<Self, ParseError> {
        Self::parse_config(std::str::from_utf8(input)?)
    }

    /// Decodes the declarative format printed by `wg showconf`.
    pub fn parse_config(input: &str) -> Result<Self, ParseError> {
        let mut conf = Conf::default();
        let mut cursor = None;

        for line in input.lines() {
            let line = strip_comment(line);
            if line.is_empty() {
                continue;
            }

            let (key, value) = split_line(line);
            let iface = &mut conf.interface;

            match key.parse::<WgPropKind>()? {
                WgPropKind::InterfaceSection => cursor = None,
                WgPropKind::ListenPort => iface.listen_port = parse_int("ListenPort", value)?,
                WgPropKind::FwMark => iface.fwmark = value.to_string(),
                WgPropKind::PrivateKey => iface.private_key = value.to_string(),

                WgPropKind::PeerSection => {
                    conf.peers.push(Peer::default());
                    cursor = Some(conf.peers.len() - 1);
                }
                WgPropKind::PublicKey => {
                    current_peer(&mut conf.peers, cursor, line)?.public_key = value.to_string()
                }
                WgPropKind::PresharedKey => {
                    current_peer(&mut conf.peers, cursor, line)?.preshared_key = value.to_string()
                }
                WgPropKind::Endpoint => {
                    current_peer(&mut conf.peers, cursor, line)?.endpoint = value.to_string()
                }
                WgPropKind::AllowedIPs => {
                    append_list(&mut current_peer(&mut conf.peers, cursor, line)?.allowed_ips, value)
                }
                WgPropKind::PersistentKeepalive => {
                    let peer = current_peer(&mut conf.peers, cursor, line)?;
                    peer.persistent_keepalive = if value.eq_ignore_ascii_case("off") {
                        0
                    } else {
                        parse_int("PersistentKeepalive", value)?
                    };
                }

                WgPropKind::Unknown => return Err(ParseError::UnknownKey(line.to_string())),
            }
        }

        log::trace!("decoded config with {} peers", conf.peers.len());

        Ok(conf)
    }
}

impl FromStr for Conf {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Conf::parse_config(s)
    }
}

#[cfg(test)]
mod tests {
    use crate::wg::{Conf, interface::Interface, peer::Peer};

    use super::ParseError;

    #[test]
    fn test_parse_config() {
        let cfg = "[Interface]
PrivateKey = yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=
ListenPort = 51822
FwMark = 0x1234

[Peer] # Server
PublicKey = xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=
Endpoint = example.com:51821
AllowedIPs = 100.64.0.1, 192.168.0.0/24, 192.168.1.1
PersistentKeepalive = 25

[Peer] # Laptop
PublicKey = TrMvSoP4jYQlY6RIzBgbssQqY3vxI2Pi+y71lOWWXX0=
PresharedKey = FpCyhws9cxwWoV4xELtfJvjJN+zQVRPISllRWgeopVE=
AllowedIPs = 100.64.0.3
PersistentKeepalive = off
";

        let conf: Conf = cfg.parse().unwrap();

        assert_eq!(
            conf,
            Conf {
                interface: Interface {
                    listen_port: 51822,
                    fwmark: "0x1234".to_string(),
                    private_key: "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=".to_string(),
                    public_key: String::new(),
                },
                peers: vec![
                    Peer {
                        public_key: "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=".to_string(),
                        endpoint: "example.com:51821".to_string(),
                        allowed_ips: vec![
                            "100.64.0.1".to_string(),
                            "192.168.0.0/24".to_string(),
                            "192.168.1.1".to_string(),
                        ],
                        persistent_keepalive: 25,
                        ..Default::default()
                    },
                    Peer {
                        public_key: "TrMvSoP4jYQlY6RIzBgbssQqY3vxI2Pi+y71lOWWXX0=".to_string(),
                        preshared_key: "FpCyhws9cxwWoV4xELtfJvjJN+zQVRPISllRWgeopVE=".to_string(),
                        allowed_ips: vec!["100.64.0.3".to_string()],
                        ..Default::default()
                    },
                ]
            }
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Conf::from_conf_bytes(b"").unwrap(), Conf::default());
        assert_eq!(Conf::parse_config("\n  \n\n").unwrap(), Conf::default());
    }

    #[test]
    fn test_allowed_ips_accumulate() {
        let conf = Conf::parse_config("[Peer]\nAllowedIPs = a\nAllowedIPs = b,c\n").unwrap();

        assert_eq!(conf.peers[0].allowed_ips, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_allowed_ips_keep_duplicates() {
        let conf = Conf::parse_config("[Peer]\nAllowedIPs = a, a ,b,\n").unwrap();

        assert_eq!(conf.peers[0].allowed_ips, vec!["a", "a", "b"]);
    }

    #[test]
    fn test_allowed_ips_empty_elements_dropped() {
        let conf = Conf::parse_config("[Peer]\nAllowedIPs = a,,b\nAllowedIPs = , \n").unwrap();

        assert_eq!(conf.peers[0].allowed_ips, vec!["a", "b"]);
    }

    #[test]
    fn test_key_value_spacing() {
        let conf = Conf::parse_config(
            "[Interface]\nListenPort=7788\nprivatekey   =   key\n[peer]\nEndpoint 1.2.3.4:5\n",
        )
        .unwrap();

        assert_eq!(conf.interface.listen_port, 7788);
        assert_eq!(conf.interface.private_key, "key");
        assert_eq!(conf.peers[0].endpoint, "1.2.3.4:5");
    }

    #[test]
    fn test_base64_padding_kept() {
        let conf = Conf::parse_config("[Peer]\nPublicKey = abc==\n").unwrap();

        assert_eq!(conf.peers[0].public_key, "abc==");
    }

    #[test]
    fn test_unknown_key() {
        let err = Conf::parse_config("[Interface]\nBogus = 1\n").unwrap_err();

        assert!(matches!(err, ParseError::UnknownKey(line) if line == "Bogus = 1"));
    }

    #[test]
    fn test_wg_quick_keys_are_unknown() {
        let err = Conf::parse_config("[Interface]\nAddress = 10.0.0.1/24\n").unwrap_err();

        assert!(matches!(err, ParseError::UnknownKey(_)));
    }

    #[test]
    fn test_peer_key_before_peer_section() {
        let err = Conf::parse_config("[Interface]\nPublicKey = abc\n").unwrap_err();

        assert!(matches!(err, ParseError::NoPeerSection(line) if line == "PublicKey = abc"));
    }

    #[test]
    fn test_interface_section_resets_peer_cursor() {
        let err = Conf::parse_config("[Peer]\nPublicKey = a\n[Interface]\nEndpoint = b:1\n")
            .unwrap_err();

        assert!(matches!(err, ParseError::NoPeerSection(_)));
    }

    #[test]
    fn test_bad_listen_port() {
        let err = Conf::parse_config("ListenPort = abc\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::IntParseError {
                field: "ListenPort",
                ..
            }
        ));

        let err = Conf::parse_config("ListenPort = 70000\n").unwrap_err();
        assert!(matches!(err, ParseError::IntParseError { .. }));
    }

    #[test]
    fn test_bad_keepalive() {
        let err = Conf::parse_config("[Peer]\nPersistentKeepalive = often\n").unwrap_err();

        assert!(matches!(
            err,
            ParseError::IntParseError {
                field: "PersistentKeepalive",
                ..
            }
        ));
    }

    #[test]
    fn test_comments() {
        let conf = Conf::parse_config(
            "# generated\n[Interface] # local\nFwMark = 0x1#2\n[Peer]\t# remote\nEndpoint = host#1:5 # keep host#1\n",
        )
        .unwrap();

        assert_eq!(conf.interface.fwmark, "0x1#2");
        assert_eq!(conf.peers[0].endpoint, "host#1:5");
    }

    #[test]
    fn test_round_trip_hash_in_value() {
        let conf = Conf {
            interface: Interface {
                fwmark: "mark#1".to_string(),
                ..Default::default()
            },
            peers: vec![Peer {
                public_key: "key#=".to_string(),
                endpoint: "host#1:5".to_string(),
                allowed_ips: vec!["a#b".to_string()],
                ..Default::default()
            }],
        };

        assert_eq!(Conf::from_conf_bytes(&conf.to_bytes()).unwrap(), conf);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = Conf::from_conf_bytes(&[0x5b, 0xff, 0xfe]).unwrap_err();

        assert!(matches!(err, ParseError::Utf8Error(_)));
    }
}
