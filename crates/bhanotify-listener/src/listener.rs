use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use bhanotify_frame::{DecryptFailure, SessionKey};
use bhanotify_transport::{DatagramSource, UdpListener};
use tracing::{debug, info, warn};

use crate::error::{ListenerError, Result};
use crate::pipeline::{FrameOutcome, ListenerContext, Notification, PipelineConfig};
use crate::sink::EventSink;

/// Pause after a failed receive before reading the socket again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Per-port counters, reported when a listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub received: u64,
    pub delivered: u64,
    pub duplicates: u64,
    pub rejected: u64,
    pub decrypt_failures: u64,
    pub parse_failures: u64,
    pub recv_errors: u64,
}

impl ListenerStats {
    fn record(&mut self, outcome: &FrameOutcome) {
        self.received = self.received.saturating_add(1);
        let slot = match outcome {
            FrameOutcome::Delivered(_) => &mut self.delivered,
            FrameOutcome::Duplicate => &mut self.duplicates,
            FrameOutcome::Rejected(_) => &mut self.rejected,
            FrameOutcome::DecryptFailed(_) => &mut self.decrypt_failures,
            FrameOutcome::ParseFailed(_) => &mut self.parse_failures,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Receives datagrams on one port and runs each through its pipeline.
///
/// Datagrams are handled one at a time in receipt order.
pub struct PortListener<S> {
    source: S,
    context: ListenerContext,
    verbose_drops: bool,
    stats: ListenerStats,
}

impl PortListener<UdpListener> {
    /// Bind a UDP port and build its pipeline context.
    pub fn bind(
        addr: SocketAddr,
        key: SessionKey,
        identity: &str,
        config: PipelineConfig,
    ) -> Result<Self> {
        let source = UdpListener::bind(addr)?;
        let context = ListenerContext::new(source.port(), key, identity, config);
        Ok(Self::from_parts(source, context))
    }
}

impl<S: DatagramSource> PortListener<S> {
    /// Build from an existing datagram source.
    pub fn from_parts(source: S, context: ListenerContext) -> Self {
        Self {
            source,
            context,
            verbose_drops: false,
            stats: ListenerStats::default(),
        }
    }

    /// Log every dropped frame at info level instead of debug.
    pub fn with_verbose_drops(mut self, verbose: bool) -> Self {
        self.verbose_drops = verbose;
        self
    }

    /// Receive and process at most one datagram.
    ///
    /// Returns `Ok(None)` if the source timed out with nothing to read.
    /// Delivered events are handed to `sink` before returning.
    pub fn poll<E: EventSink + ?Sized>(&mut self, sink: &mut E) -> Result<Option<FrameOutcome>> {
        let Some(raw) = self.source.recv()? else {
            return Ok(None);
        };

        let outcome = self.context.process_frame(&raw);
        self.stats.record(&outcome);
        log_outcome(self.context.port(), &raw.source, &outcome, self.verbose_drops);

        if let FrameOutcome::Delivered(notification) = &outcome {
            sink.on_event(notification.clone())?;
        }
        Ok(Some(outcome))
    }

    /// Process datagrams until `running` is cleared or the sink closes.
    ///
    /// Receive errors are logged and counted; the port keeps listening.
    pub fn run<E: EventSink + ?Sized>(
        &mut self,
        sink: &mut E,
        running: &AtomicBool,
    ) -> Result<ListenerStats> {
        let port = self.context.port();
        while running.load(Ordering::SeqCst) {
            match self.poll(sink) {
                Ok(_) => {}
                Err(ListenerError::SinkClosed) => {
                    debug!(port, "event sink closed; stopping listener");
                    break;
                }
                Err(ListenerError::Transport(err)) => {
                    self.stats.recv_errors = self.stats.recv_errors.saturating_add(1);
                    warn!(port, error = %err, "receive failed");
                    std::thread::sleep(RECV_ERROR_BACKOFF);
                }
                Err(err) => return Err(err),
            }
        }
        info!(port, stats = ?self.stats, "listener stopped");
        Ok(self.stats)
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.source.local_addr()
    }

    pub fn context(&self) -> &ListenerContext {
        &self.context
    }
}

fn log_outcome(port: u16, source: &SocketAddr, outcome: &FrameOutcome, verbose: bool) {
    match outcome {
        FrameOutcome::Delivered(n) => {
            info!(
                port,
                %source,
                event = n.kind.name(),
                timestamp = n.kind.timestamp(),
                "notification received"
            );
        }
        // Other receivers' traffic; expected on a shared broadcast domain.
        FrameOutcome::DecryptFailed(DecryptFailure::AuthenticationFailed) if !verbose => {
            debug!(port, %source, "frame not sealed for this receiver");
        }
        dropped if verbose => {
            info!(port, %source, reason = dropped.label(), "frame dropped");
        }
        dropped => {
            debug!(port, %source, reason = dropped.label(), "frame dropped");
        }
    }
}

/// A listener running on its own thread.
pub struct ListenerHandle {
    port: u16,
    handle: JoinHandle<Result<ListenerStats>>,
}

impl ListenerHandle {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the listener thread to stop.
    pub fn join(self) -> Result<ListenerStats> {
        self.handle
            .join()
            .map_err(|_| ListenerError::ThreadPanicked(self.port))?
    }
}

/// Bind every port, then start one thread per port.
///
/// All binds happen before any thread starts, so a bad port fails the whole
/// call without leaving listeners running. If a thread cannot be spawned,
/// `running` is cleared and the threads already started are joined before
/// the error is returned. Each thread owns its own context and duplicate
/// cache.
#[allow(clippy::too_many_arguments)]
pub fn spawn_all(
    bind_ip: IpAddr,
    ports: &[u16],
    key: &SessionKey,
    identity: &str,
    config: &PipelineConfig,
    verbose_drops: bool,
    running: Arc<AtomicBool>,
    events: Sender<Notification>,
) -> Result<Vec<ListenerHandle>> {
    let mut bound = Vec::with_capacity(ports.len());
    for &port in ports {
        let listener = PortListener::bind(
            SocketAddr::new(bind_ip, port),
            key.clone(),
            identity,
            config.clone(),
        )?
        .with_verbose_drops(verbose_drops);
        bound.push(listener);
    }

    let mut handles = Vec::with_capacity(bound.len());
    for mut listener in bound {
        let port = listener.context().port();
        let flag = Arc::clone(&running);
        let mut sink = events.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("bhanotify-{port}"))
            .spawn(move || listener.run(&mut sink, &flag));
        match spawned {
            Ok(handle) => handles.push(ListenerHandle { port, handle }),
            Err(err) => {
                warn!(port, error = %err, "failed to spawn listener thread");
                shutdown(&running, handles);
                return Err(ListenerError::Transport(err.into()));
            }
        }
    }
    Ok(handles)
}

/// Stop and join listeners started by a failed [`spawn_all`].
fn shutdown(running: &AtomicBool, handles: Vec<ListenerHandle>) {
    running.store(false, Ordering::SeqCst);
    for handle in handles {
        let port = handle.port();
        if let Err(err) = handle.join() {
            warn!(port, error = %err, "listener exited with error during shutdown");
        }
    }
}
