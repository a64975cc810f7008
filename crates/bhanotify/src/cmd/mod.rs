use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use bhanotify_frame::{CipherSuite, SessionKey};
use bhanotify_listener::{provision, StaticKey, DEFAULT_PORTS};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{listener_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod listen;
pub mod seal;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Listen for notifications and print classified events.
    Listen(ListenArgs),
    /// Run one captured datagram through the pipeline.
    Decode(DecodeArgs),
    /// Build a notification frame, optionally sending it.
    Seal(SealArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Seal(args) => seal::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CipherArg {
    /// 8-byte nonce, MAC over unpadded lengths.
    #[default]
    Original,
    /// RFC 8439 construction with a zero-prefixed nonce.
    Ietf,
}

impl From<CipherArg> for CipherSuite {
    fn from(arg: CipherArg) -> Self {
        match arg {
            CipherArg::Original => CipherSuite::Original,
            CipherArg::Ietf => CipherSuite::Ietf,
        }
    }
}

/// Key options shared by every command that touches ciphertext.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Base64 notification key from the device.
    #[arg(long, env = "BHANOTIFY_KEY", hide_env_values = true)]
    pub key: String,
    /// AEAD construction the device seals with.
    #[arg(long, value_enum, default_value_t = CipherArg::Original)]
    pub cipher: CipherArg,
}

impl KeyArgs {
    pub fn session_key(&self) -> CliResult<SessionKey> {
        let provider = StaticKey::from_base64(&self.key)
            .map_err(|err| listener_error("invalid key", err))?;
        provision(&provider).map_err(|err| listener_error("key provisioning failed", err))
    }

    pub fn suite(&self) -> CipherSuite {
        self.cipher.into()
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Ports to bind (comma-separated).
    #[arg(
        long,
        env = "BHANOTIFY_PORTS",
        value_delimiter = ',',
        default_values_t = DEFAULT_PORTS
    )]
    pub ports: Vec<u16>,
    /// Local address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    #[command(flatten)]
    pub key: KeyArgs,
    /// Receiver user name; events for other users are dropped.
    #[arg(long, env = "BHANOTIFY_USER")]
    pub user: String,
    /// Duplicate suppression window (e.g. 750ms, 1s).
    #[arg(long, default_value = "750ms")]
    pub dedup_window: String,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Log every dropped frame at info level.
    #[arg(long)]
    pub verbose_drops: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded datagram.
    #[arg(long)]
    pub hex: String,
    #[command(flatten)]
    pub key: KeyArgs,
    /// Receiver user name.
    #[arg(long, env = "BHANOTIFY_USER")]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct SealArgs {
    /// Intercom identifier (up to 6 characters).
    #[arg(long)]
    pub intercom: String,
    /// Event code (up to 8 characters), e.g. motion or 1.
    #[arg(long)]
    pub event: String,
    /// Event time in seconds since the epoch. Default: now.
    #[arg(long)]
    pub timestamp: Option<u32>,
    /// Hex-encoded 8-byte nonce. Default: derived from the clock.
    #[arg(long)]
    pub nonce: Option<String>,
    #[command(flatten)]
    pub key: KeyArgs,
    /// Send the frame as a UDP datagram to ADDR:PORT.
    #[arg(long, value_name = "ADDR:PORT")]
    pub send_to: Option<SocketAddr>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub(crate) fn decode_hex(field: &str, input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&cleaned).map_err(|err| CliError::new(USAGE, format!("invalid {field} hex: {err}")))
}
