use std::{ffi::OsString, path::PathBuf};

/// Arguments of `wg set <interface> ...`.
///
/// Zero and empty fields are left untouched by `wg`, so they produce no
/// tokens.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Opt {
    pub interface: String,
    pub listen_port: u16,
    pub fwmark: String,
    // file holding the private key
    pub private_key: PathBuf,
    pub peers: Vec<OptPeer>,
}

impl Opt {
    /// Tokens following `wg set`. Paths are passed through unchanged, so they
    /// need not be UTF-8.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from(&self.interface)];

        if self.listen_port != 0 {
            args.extend([
                OsString::from("listen-port"),
                self.listen_port.to_string().into(),
            ]);
        }
        if !self.fwmark.is_empty() {
            args.extend([OsString::from("fwmark"), OsString::from(&self.fwmark)]);
        }
        if !self.private_key.as_os_str().is_empty() {
            args.extend([
                OsString::from("private-key"),
                self.private_key.clone().into_os_string(),
            ]);
        }

        for peer in &self.peers {
            args.extend(peer.args());
        }

        args
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OptPeer {
    pub public_key: String,

    /// Removes the peer. No other field is sent when set.
    pub remove: bool,

    // file holding the preshared key
    pub preshared_key: PathBuf,
    pub endpoint: String,

    /// `None` leaves the interval as is, `Some(0)` disables keepalive.
    pub persistent_keepalive: Option<u16>,

    pub allowed_ips: Vec<String>,
}

impl OptPeer {
    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec!["peer".into(), OsString::from(&self.public_key)];

        if self.remove {
            args.push("remove".into());
            return args;
        }

        if !self.preshared_key.as_os_str().is_empty() {
            args.extend([
                OsString::from("preshared-key"),
                self.preshared_key.clone().into_os_string(),
            ]);
        }
        if !self.endpoint.is_empty() {
            args.extend([OsString::from("endpoint"), OsString::from(&self.endpoint)]);
        }
        if let Some(keepalive) = self.persistent_keepalive {
            args.extend([
                OsString::from("persistent-keepalive"),
                keepalive.to_string().into(),
            ]);
        }
        if !self.allowed_ips.is_empty() {
            args.extend([OsString::from("allowed-ips"), self.allowed_ips.join(",").into()]);
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::{Opt, OptPeer};

    fn peer() -> OptPeer {
        OptPeer {
            public_key: "peer_key".to_string(),
            remove: false,
            preshared_key: "/etc/wireguard/psk".into(),
            endpoint: "10.0.0.1:51820".to_string(),
            persistent_keepalive: Some(25),
            allowed_ips: vec!["10.0.0.0/8".to_string(), "192.168.0.0/16".to_string()],
        }
    }

    #[test]
    fn test_opt_peer_args() {
        assert_eq!(
            peer().args(),
            vec![
                "peer",
                "peer_key",
                "preshared-key",
                "/etc/wireguard/psk",
                "endpoint",
                "10.0.0.1:51820",
                "persistent-keepalive",
                "25",
                "allowed-ips",
                "10.0.0.0/8,192.168.0.0/16",
            ]
        );
    }

    #[test]
    fn test_remove_is_exclusive() {
        let peer = OptPeer {
            remove: true,
            ..peer()
        };

        assert_eq!(peer.args(), vec!["peer", "peer_key", "remove"]);
    }

    #[test]
    fn test_keepalive_zero_vs_unset() {
        let zero = OptPeer {
            public_key: "k".to_string(),
            persistent_keepalive: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.args(), vec!["peer", "k", "persistent-keepalive", "0"]);

        let unset = OptPeer {
            public_key: "k".to_string(),
            ..Default::default()
        };
        assert_eq!(unset.args(), vec!["peer", "k"]);
    }

    #[test]
    fn test_opt_args() {
        let opt = Opt {
            interface: "wg0".to_string(),
            listen_port: 51820,
            fwmark: "0x1234".to_string(),
            private_key: "/etc/wireguard/private".into(),
            peers: vec![
                OptPeer {
                    public_key: "gone".to_string(),
                    remove: true,
                    ..Default::default()
                },
                OptPeer {
                    public_key: "new".to_string(),
                    allowed_ips: vec!["10.1.0.0/16".to_string()],
                    ..Default::default()
                },
            ],
        };

        assert_eq!(
            opt.args(),
            vec![
                "wg0",
                "listen-port",
                "51820",
                "fwmark",
                "0x1234",
                "private-key",
                "/etc/wireguard/private",
                "peer",
                "gone",
                "remove",
                "peer",
                "new",
                "allowed-ips",
                "10.1.0.0/16",
            ]
        );
    }

    #[test]
    fn test_opt_args_only_interface() {
        let opt = Opt {
            interface: "wg0".to_string(),
            ..Default::default()
        };

        assert_eq!(opt.args(), vec!["wg0"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_key_path_kept() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt, path::PathBuf};

        let path = PathBuf::from(OsStr::from_bytes(b"/keys/\xffpsk"));
        let peer = OptPeer {
            public_key: "k".to_string(),
            preshared_key: path.clone(),
            ..Default::default()
        };

        let args = peer.args();
        assert_eq!(args[2], "preshared-key");
        assert_eq!(args[3], path.into_os_string());
        assert_eq!(args[3].as_bytes(), b"/keys/\xffpsk");
    }
}
