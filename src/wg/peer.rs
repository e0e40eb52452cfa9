use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Peer {
    // PublicKey
    pub public_key: String,

    // PresharedKey
    pub preshared_key: String,

    // AllowedIPs, in the order they appeared
    pub allowed_ips: Vec<String>,

    // Endpoint
    pub endpoint: String,

    // PersistentKeepalive, 0 when disabled or unset
    pub persistent_keepalive: u16,

    // latest handshake, observed only
    pub latest_handshake: Duration,

    // transfer, observed only
    pub received: u64,
    pub sent: u64,
}

impl Peer {
    pub fn settable(&self) -> Peer {
        Peer {
            latest_handshake: Duration::ZERO,
            received: 0,
            sent: 0,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "[Peer]")?;
        if !self.public_key.is_empty() {
            writeln!(f, "PublicKey = {}", self.public_key)?;
        }
        if !self.preshared_key.is_empty() {
            writeln!(f, "PresharedKey = {}", self.preshared_key)?;
        }
        if !self.allowed_ips.is_empty() {
            writeln!(f, "AllowedIPs = {}", self.allowed_ips.join(","))?;
        }
        if !self.endpoint.is_empty() {
            writeln!(f, "Endpoint = {}", self.endpoint)?;
        }
        if self.persistent_keepalive != 0 {
            writeln!(f, "PersistentKeepalive = {}", self.persistent_keepalive)?;
        }

        writeln!(f)
    }
}
