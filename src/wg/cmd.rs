use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::PathBuf,
    process::{Command, Output, Stdio},
};

use crate::error::Error;

use super::{Conf, WireguardApi, opt::Opt};

const DEFAULT_WG: &str = "wg";

/// Runs the `wg` executable.
#[derive(Debug, Clone)]
pub struct WgCmdBackend {
    program: PathBuf,
}

impl Default for WgCmdBackend {
    fn default() -> Self {
        Self::with_program(std::env::var("WG_CMD").unwrap_or_else(|_| DEFAULT_WG.into()))
    }
}

impl WgCmdBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        log::debug!("running {cmd:?}");
        cmd
    }

    /// Runs `cmd`, writing `stdin` to it when given, and returns stdout of a
    /// successful run.
    fn run(mut cmd: Command, stdin: Option<&[u8]>) -> Result<Vec<u8>, Error> {
        let out = match stdin {
            None => cmd.stdin(Stdio::null()).output()?,
            Some(input) => {
                let mut child = cmd
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()?;

                // the pipe is dropped at the end of the arm so the child sees EOF
                let written = match child.stdin.take() {
                    Some(mut pipe) => pipe.write_all(input),
                    None => Ok(()),
                };

                // a child that failed early stops reading; its exit status and
                // stderr explain the broken pipe
                let out = child.wait_with_output()?;
                if let Err(err) = written {
                    if out.status.success() {
                        return Err(err.into());
                    }
                    log::debug!("writing to wg stdin failed: {err}");
                }

                out
            }
        };

        Self::check(out)
    }

    fn check(out: Output) -> Result<Vec<u8>, Error> {
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            log::error!("wg exited with {:?}: {stderr}", out.status.code());
            return Err(Error::WgCommandFail(out.status.code(), stderr));
        }

        Ok(out.stdout)
    }

    fn load_conf(&self, subcommand: &str, iface: &str, conf: &Conf) -> Result<(), Error> {
        let cmd = self.command([subcommand, iface, "/dev/stdin"]);
        Self::run(cmd, Some(&conf.to_bytes()))?;

        Ok(())
    }

    fn key_output(out: Vec<u8>) -> Result<String, Error> {
        let key = std::str::from_utf8(&out).map_err(crate::wg::config::ParseError::from)?;

        Ok(key.trim().to_string())
    }

    /// `wg genkey`
    pub fn gen_key(&self) -> Result<String, Error> {
        Self::key_output(Self::run(self.command(["genkey"]), None)?)
    }

    /// `wg genpsk`
    pub fn gen_psk(&self) -> Result<String, Error> {
        Self::key_output(Self::run(self.command(["genpsk"]), None)?)
    }

    /// `wg pubkey`, fed with the private key on stdin.
    pub fn pub_key(&self, private_key: &str) -> Result<String, Error> {
        let input = format!("{}\n", private_key.trim());

        Self::key_output(Self::run(self.command(["pubkey"]), Some(input.as_bytes()))?)
    }
}

impl WireguardApi for WgCmdBackend {
    type Error = Error;

    fn show(&self, iface: &str) -> Result<Conf, Self::Error> {
        let mut cmd = self.command(["show", iface]);
        cmd.env("WG_HIDE_KEYS", "never");

        let out = Self::run(cmd, None)?;

        Ok(Conf::from_status_bytes(&out)?)
    }

    fn interfaces(&self) -> Result<Vec<String>, Self::Error> {
        let out = Self::run(self.command(["show", "interfaces"]), None)?;
        let names = std::str::from_utf8(&out).map_err(crate::wg::config::ParseError::from)?;

        Ok(names.split_whitespace().map(str::to_string).collect())
    }

    fn show_conf(&self, iface: &str) -> Result<Conf, Self::Error> {
        let out = Self::run(self.command(["showconf", iface]), None)?;

        Ok(Conf::from_conf_bytes(&out)?)
    }

    fn set(&mut self, opt: &Opt) -> Result<(), Self::Error> {
        let cmd = self.command(std::iter::once(OsString::from("set")).chain(opt.args()));
        Self::run(cmd, None)?;

        Ok(())
    }

    fn set_conf(&mut self, iface: &str, conf: &Conf) -> Result<(), Self::Error> {
        self.load_conf("setconf", iface, conf)
    }

    fn add_conf(&mut self, iface: &str, conf: &Conf) -> Result<(), Self::Error> {
        self.load_conf("addconf", iface, conf)
    }
}
