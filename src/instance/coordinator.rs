//! Single-instance enforcement over a loopback TCP port
//!
//! The first instance binds the port and listens for commands. A later
//! instance fails to bind, forwards a focus command to the first one and
//! reports that it must exit.

use super::protocol::{read_line, write_command, InstanceCommand};
use std::io::BufReader;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long the listener waits for a peer to send its line
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect timeout for messages to the primary instance
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Self-connects tried by `stop()` before giving up on the listener
const WAKE_ATTEMPTS: u32 = 3;

/// Events handed from the listener thread to the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceEvent {
    /// Another launch was attempted; bring the window to the front
    FocusWindow,
}

struct ListenerTask {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Holds the single-instance port for the lifetime of the application
pub struct SingleInstanceCoordinator {
    port: u16,
    events: Sender<InstanceEvent>,
    listener: Option<ListenerTask>,
}

impl SingleInstanceCoordinator {
    /// `events` receives focus requests; its receiver belongs to the UI thread
    pub fn new(port: u16, events: Sender<InstanceEvent>) -> Self {
        Self {
            port,
            events,
            listener: None,
        }
    }

    /// Address the listener is bound to, while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|task| task.addr)
    }

    pub fn is_primary(&self) -> bool {
        self.listener.is_some()
    }

    /// Claim the port
    ///
    /// Returns true if this process is the primary instance. On false the
    /// caller should exit without initializing anything else: either a focus
    /// command has been sent to the primary, or the listener could not be
    /// started and the port was released.
    pub fn start(&mut self) -> bool {
        self.start_with(thread::Builder::new())
    }

    fn start_with(&mut self, builder: thread::Builder) -> bool {
        if self.listener.is_some() {
            return true;
        }

        let listener = match TcpListener::bind((Ipv4Addr::LOCALHOST, self.port)) {
            Ok(listener) => listener,
            Err(e) => {
                warn!(port = self.port, "port taken ({}); handing off to the running instance", e);
                match send_command(self.port, InstanceCommand::FocusWindow) {
                    Ok(()) => info!("focus command sent; exiting"),
                    Err(e) => error!("failed to send focus command: {}", e),
                }
                return false;
            }
        };

        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                error!("cannot read listener address: {}", e);
                SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
            }
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let events = self.events.clone();
        let flag = Arc::clone(&shutdown);

        let spawned = builder
            .name("vortex-instance-listener".to_string())
            .spawn(move || listen(listener, &flag, &events));

        match spawned {
            Ok(thread) => {
                info!(%addr, "single-instance listener started");
                self.listener = Some(ListenerTask {
                    addr,
                    shutdown,
                    thread,
                });
                true
            }
            // The socket went down with the closure, so the lock is not held
            Err(e) => {
                error!("failed to start single-instance listener: {}", e);
                false
            }
        }
    }

    /// Close the listening socket; safe to call more than once
    ///
    /// If the listener cannot be woken it keeps the port, and the
    /// coordinator stays primary so a later call can try again.
    pub fn stop(&mut self) {
        let Some(task) = self.listener.as_ref() else {
            return;
        };

        task.shutdown.store(true, Ordering::Release);

        // Wake the blocking accept
        let mut woken = false;
        for attempt in 1..=WAKE_ATTEMPTS {
            match TcpStream::connect_timeout(&task.addr, CONNECT_TIMEOUT) {
                Ok(_) => {
                    woken = true;
                    break;
                }
                Err(_) if task.thread.is_finished() => break,
                Err(e) => warn!(attempt, "could not wake single-instance listener: {}", e),
            }
        }

        if !woken && !task.thread.is_finished() {
            error!(addr = %task.addr, "single-instance listener still running; port stays held");
            return;
        }

        if let Some(task) = self.listener.take() {
            if task.thread.join().is_err() {
                error!("single-instance listener panicked");
            }
        }
    }
}

impl Drop for SingleInstanceCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Send one command to the instance holding `port`
pub fn send_command(port: u16, command: InstanceCommand) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    write_command(&mut stream, command)
}

/// Accept loop; returns once the shutdown flag is observed
///
/// Each peer is served on its own short-lived thread, so a slow or hostile
/// peer never holds up the loop or `stop()`.
fn listen(listener: TcpListener, shutdown: &AtomicBool, events: &Sender<InstanceEvent>) {
    for stream in listener.incoming() {
        if shutdown.load(Ordering::Acquire) {
            info!("single-instance listener closed");
            break;
        }

        match stream {
            Ok(stream) => {
                let events = events.clone();
                let spawned = thread::Builder::new()
                    .name("vortex-instance-peer".to_string())
                    .spawn(move || {
                        if let Err(e) = handle_connection(stream, &events) {
                            error!("instance connection error: {}", e);
                        }
                    });
                if let Err(e) = spawned {
                    error!("failed to serve instance connection: {}", e);
                }
            }
            Err(e) => error!("instance listener accept error: {}", e),
        }
    }
}

/// Read one line from a peer, then close the connection
fn handle_connection(stream: TcpStream, events: &Sender<InstanceEvent>) -> std::io::Result<()> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let mut reader = BufReader::new(stream);

    let Some(line) = read_line(&mut reader)? else {
        return Ok(());
    };
    info!(command = %line, "received command from another instance");

    match InstanceCommand::parse(&line) {
        Some(InstanceCommand::FocusWindow) => {
            if events.send(InstanceEvent::FocusWindow).is_err() {
                debug!("no window to focus; event dropped");
            }
        }
        None => warn!(command = %line, "unknown instance command"),
    }

    Ok(())
}
