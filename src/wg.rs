use interface::Interface;
use opt::Opt;
use peer::Peer;

pub mod cmd;
pub mod config;
pub mod interface;
pub mod opt;
pub mod peer;
pub mod status;

/// A WireGuard interface together with its peers, in first-seen order.
///
/// The same model is filled by both decoders. Fields marked "observed only"
/// come from `wg show` and are never written back by the encoder; use
/// [`Conf::settable`] to compare against what survives an encode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Conf {
    pub interface: Interface,
    pub peers: Vec<Peer>,
}

impl Conf {
    /// Copy of the conf with every observed-only field reset.
    pub fn settable(&self) -> Conf {
        Conf {
            interface: self.interface.settable(),
            peers: self.peers.iter().map(Peer::settable).collect(),
        }
    }

    /// Encodes the conf in the declarative `wg setconf` format.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl std::fmt::Display for Conf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.interface)?;
        for peer in &self.peers {
            write!(f, "{peer}")?;
        }

        Ok(())
    }
}

pub trait WireguardApi {
    type Error;

    fn interfaces(&self) -> Result<Vec<String>, Self::Error>;
    fn show(&self, iface: &str) -> Result<Conf, Self::Error>;
    fn show_conf(&self, iface: &str) -> Result<Conf, Self::Error>;

    fn set(&mut self, opt: &Opt) -> Result<(), Self::Error>;
    fn set_conf(&mut self, iface: &str, conf: &Conf) -> Result<(), Self::Error>;
    fn add_conf(&mut self, iface: &str, conf: &Conf) -> Result<(), Self::Error>;
}
