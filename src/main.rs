use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use wg_conf::{
    error::Error,
    wg::{
        Conf, WireguardApi,
        cmd::WgCmdBackend,
        opt::{Opt, OptPeer},
    },
};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, clap::Subcommand)]
enum Cmd {
    /// List the WireGuard interfaces
    Interfaces,

    /// Print the live state of an interface
    Show { iface: String },

    /// Print the configuration of an interface
    Showconf { iface: String },

    /// Replace the configuration of an interface with a config file
    Setconf { iface: String, file: PathBuf },

    /// Append a config file to the configuration of an interface
    Addconf { iface: String, file: PathBuf },

    /// Change interface settings and at most one peer
    Set(SetArgs),

    /// Re-encode a config file keeping only the settable fields
    Strip { file: PathBuf },
}

#[derive(Debug, clap::Args)]
struct SetArgs {
    iface: String,

    #[arg(long, default_value_t = 0)]
    listen_port: u16,

    #[arg(long)]
    fwmark: Option<String>,

    /// File holding the private key
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Public key of the peer to change
    #[arg(long)]
    peer: Option<String>,

    #[arg(long, requires = "peer")]
    remove: bool,

    /// File holding the preshared key
    #[arg(long, requires = "peer")]
    preshared_key: Option<PathBuf>,

    #[arg(long, requires = "peer")]
    endpoint: Option<String>,

    /// Seconds between keepalives, 0 disables
    #[arg(long, requires = "peer")]
    persistent_keepalive: Option<u16>,

    #[arg(long, requires = "peer", value_delimiter = ',')]
    allowed_ips: Vec<String>,
}

impl From<SetArgs> for Opt {
    fn from(args: SetArgs) -> Self {
        let peers = args
            .peer
            .map(|public_key| OptPeer {
                public_key,
                remove: args.remove,
                preshared_key: args.preshared_key.unwrap_or_default(),
                endpoint: args.endpoint.unwrap_or_default(),
                persistent_keepalive: args.persistent_keepalive,
                allowed_ips: args.allowed_ips,
            })
            .into_iter()
            .collect();

        Opt {
            interface: args.iface,
            listen_port: args.listen_port,
            fwmark: args.fwmark.unwrap_or_default(),
            private_key: args.private_key.unwrap_or_default(),
            peers,
        }
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut wg = WgCmdBackend::new();

    match args.command {
        Cmd::Interfaces => {
            for iface in wg.interfaces()? {
                println!("{iface}");
            }
        }

        Cmd::Show { iface } => {
            let conf = wg.show(&iface)?;
            log::info!("{iface}: {} peers", conf.peers.len());

            for peer in &conf.peers {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    peer.public_key,
                    peer.endpoint,
                    peer.latest_handshake.as_secs(),
                    peer.received,
                    peer.sent
                );
            }
        }

        Cmd::Showconf { iface } => print_conf(&wg.show_conf(&iface)?)?,

        Cmd::Setconf { iface, file } => {
            wg.set_conf(&iface, &load_conf(&file)?)?;
            log::info!("{iface}: configuration replaced from {}", file.display());
        }

        Cmd::Addconf { iface, file } => {
            wg.add_conf(&iface, &load_conf(&file)?)?;
            log::info!("{iface}: configuration appended from {}", file.display());
        }

        Cmd::Set(set) => {
            let opt = Opt::from(set);
            wg.set(&opt)?;
            log::info!("{}: settings applied", opt.interface);
        }

        Cmd::Strip { file } => print_conf(&load_conf(&file)?.settable())?,
    }

    Ok(())
}

fn load_conf(file: &Path) -> Result<Conf, Error> {
    let data = fs::read(file)?;

    Ok(Conf::from_conf_bytes(&data)?)
}

fn print_conf(conf: &Conf) -> Result<(), Error> {
    std::io::stdout().write_all(&conf.to_bytes())?;

    Ok(())
}
