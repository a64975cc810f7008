use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use bhanotify_listener::{FrameOutcome, ListenerContext, PipelineConfig};
use bhanotify_transport::RawFrame;

use crate::cmd::{decode_hex, DecodeArgs};
use crate::exit::{CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_outcome, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = decode_hex("frame", &args.hex)?;
    let key = args.key.session_key()?;
    let config = PipelineConfig {
        suite: args.key.suite(),
        ..PipelineConfig::default()
    };

    let mut context = ListenerContext::new(0, key, &args.user, config);
    let raw = RawFrame::new(
        payload,
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        Instant::now(),
    );
    let outcome = context.process_frame(&raw);
    print_outcome(&outcome, format);

    match outcome {
        FrameOutcome::Delivered(_) => Ok(SUCCESS),
        _ => Ok(DATA_INVALID),
    }
}
