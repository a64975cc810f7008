use std::time::{SystemTime, UNIX_EPOCH};

use bhanotify_frame::{encode_frame, encode_plaintext, seal, NONCE_SIZE};
use bhanotify_transport::send_datagram;
use bytes::BytesMut;
use tracing::info;

use crate::cmd::{decode_hex, SealArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frame_hex, OutputFormat};

pub fn run(args: SealArgs, format: OutputFormat) -> CliResult<i32> {
    let key = args.key.session_key()?;
    let suite = args.key.suite();
    let nonce = match &args.nonce {
        Some(hex) => parse_nonce(hex)?,
        None => clock_nonce(),
    };
    let timestamp = args.timestamp.unwrap_or_else(now_secs);

    let plaintext = encode_plaintext(&args.intercom, &args.event, timestamp)
        .map_err(|err| frame_error("invalid event", err))?;
    let sealed =
        seal(&plaintext, &nonce, &key, suite).map_err(|err| frame_error("seal failed", err))?;

    let mut frame = BytesMut::new();
    encode_frame(&nonce, &sealed, &mut frame);

    let sent_to = match args.send_to {
        Some(target) => {
            send_datagram(target, &frame).map_err(|err| transport_error("send failed", err))?;
            info!(%target, len = frame.len(), cipher = suite.name(), "sent notification");
            Some(target.to_string())
        }
        None => None,
    };

    print_frame_hex(&frame, sent_to, format);
    Ok(SUCCESS)
}

fn parse_nonce(input: &str) -> CliResult<[u8; NONCE_SIZE]> {
    let bytes = decode_hex("nonce", input)?;
    bytes.as_slice().try_into().map_err(|_| {
        CliError::new(
            USAGE,
            format!("nonce must be {NONCE_SIZE} bytes, got {}", bytes.len()),
        )
    })
}

fn clock_nonce() -> [u8; NONCE_SIZE] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    nanos.to_be_bytes()
}

fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or_default()
}
