#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Interface {
    // ListenPort, 0 when unset
    pub listen_port: u16,

    // FwMark
    pub fwmark: String,

    // PrivateKey
    pub private_key: String,

    // public key, observed only
    pub public_key: String,
}

impl Interface {
    pub fn settable(&self) -> Interface {
        Interface {
            public_key: String::new(),
            ..self.clone()
        }
    }
}

/// Writes the `[Interface]` section. Unset fields are skipped and the
/// section is closed by a blank line.
impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "[Interface]")?;
        if self.listen_port != 0 {
            writeln!(f, "ListenPort = {}", self.listen_port)?;
        }
        if !self.fwmark.is_empty() {
            writeln!(f, "FwMark = {}", self.fwmark)?;
        }
        if !self.private_key.is_empty() {
            writeln!(f, "PrivateKey = {}", self.private_key)?;
        }

        writeln!(f)
    }
}
