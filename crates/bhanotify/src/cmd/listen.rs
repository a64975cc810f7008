use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use bhanotify_listener::{spawn_all, ListenerHandle, PipelineConfig};
use tracing::{info, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{listener_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_notification, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    if args.ports.is_empty() {
        return Err(CliError::new(USAGE, "at least one port is required"));
    }

    let key = args.key.session_key()?;
    let config = PipelineConfig {
        suite: args.key.suite(),
        dedup_window: parse_duration(&args.dedup_window)?,
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (tx, rx) = mpsc::channel();
    let handles = spawn_all(
        args.bind,
        &args.ports,
        &key,
        &args.user,
        &config,
        args.verbose_drops,
        Arc::clone(&running),
        tx,
    )
    .map_err(|err| listener_error("bind failed", err))?;

    info!(
        ports = ?args.ports,
        bind = %args.bind,
        cipher = config.suite.name(),
        "listening for notifications"
    );

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(notification) => {
                print_notification(&notification, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    running.store(false, Ordering::SeqCst);
    drop(rx);
    join_all(handles)
}

fn join_all(handles: Vec<ListenerHandle>) -> CliResult<i32> {
    let mut first_error = None;
    for handle in handles {
        let port = handle.port();
        if let Err(err) = handle.join() {
            warn!(port, error = %err, "listener exited with error");
            first_error.get_or_insert_with(|| listener_error("listener failed", err));
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(SUCCESS),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
