// src/serve/reload.rs

//! Live reload over WebSocket.
//!
//! Two plain threads: one accepts browser connections, the other broadcasts
//! `reload` to every connected client whenever it is signalled. A debounced
//! watcher on the output directory sends that signal.

use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use tracing::{debug, error, info, warn};
use tungstenite::WebSocket;

/// Connections beyond this many are closed, oldest first.
const MAX_CLIENTS: usize = 10;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

fn lock(clients: &Clients) -> MutexGuard<'_, Vec<WebSocket<TcpStream>>> {
    clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Bind the preferred port, or an ephemeral one if it is taken.
pub fn reserve_port(host: &str, preferred: u16) -> std::io::Result<(TcpListener, u16)> {
    let listener = match TcpListener::bind((host, preferred)) {
        Ok(sock) => sock,
        Err(e) => {
            warn!(port = preferred, error = %e, "live-reload port unavailable; using an ephemeral port");
            TcpListener::bind((host, 0))?
        }
    };

    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// Running live-reload server.
pub struct LiveReload {
    port: u16,
    tx: Sender<()>,
    clients: Clients,
    _incoming: JoinHandle<()>,
    _broadcast: JoinHandle<()>,
}

impl std::fmt::Debug for LiveReload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveReload")
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl LiveReload {
    /// Start accepting clients on an already bound listener.
    pub fn start(listener: TcpListener) -> Result<Self> {
        let port = listener.local_addr()?.port();
        let clients: Clients = Arc::new(Mutex::new(Vec::new()));

        let incoming = spawn_incoming(listener, Arc::clone(&clients));
        let (tx, broadcast) = spawn_broadcast(Arc::clone(&clients));

        info!(port, "live reload listening");
        Ok(Self {
            port,
            tx,
            clients,
            _incoming: incoming,
            _broadcast: broadcast,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_count(&self) -> usize {
        lock(&self.clients).len()
    }

    /// Handle that asks all connected clients to reload.
    pub fn trigger(&self) -> Sender<()> {
        self.tx.clone()
    }

    pub fn reload(&self) {
        let _ = self.tx.send(());
    }
}

fn spawn_incoming(server: TcpListener, clients: Clients) -> JoinHandle<()> {
    thread::spawn(move || {
        for stream in server.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "live-reload accept failed");
                    continue;
                }
            };
            match tungstenite::accept(stream) {
                Ok(socket) => {
                    debug!("live-reload client connected");
                    lock(&clients).push(socket);
                }
                Err(e) => debug!(error = %e, "live-reload handshake failed"),
            }
        }
    })
}

fn spawn_broadcast(clients: Clients) -> (Sender<()>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<()>();

    let thread = thread::spawn(move || {
        while rx.recv().is_ok() {
            // Collapse signals that piled up while we were sending.
            while rx.try_recv().is_ok() {}

            let mut clients = lock(&clients);
            let mut broken = Vec::new();

            for (i, socket) in clients.iter_mut().enumerate() {
                match socket.send("reload".into()) {
                    Ok(()) => {}
                    Err(tungstenite::Error::Io(e))
                        if e.kind() == std::io::ErrorKind::BrokenPipe =>
                    {
                        broken.push(i);
                    }
                    Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                        broken.push(i);
                    }
                    Err(e) => error!(error = %e, "failed to send reload"),
                }
            }

            for i in broken.into_iter().rev() {
                clients.remove(i);
            }

            let len = clients.len();
            if len > MAX_CLIENTS {
                for mut socket in clients.drain(0..len - MAX_CLIENTS) {
                    socket.close(None).ok();
                }
            }
            info!(clients = clients.len(), "sent reload");
        }
    });

    (tx, thread)
}

/// Watch the output directory and signal a reload after each debounced
/// batch of changes. Keep the returned debouncer alive.
pub fn watch_output(
    dir: &Path,
    debounce: Duration,
    reload: Sender<()>,
) -> Result<Debouncer<RecommendedWatcher, RecommendedCache>> {
    let mut debouncer = new_debouncer(debounce, None, move |res: DebounceEventResult| match res {
        Ok(events) if !events.is_empty() => {
            let _ = reload.send(());
        }
        Ok(_) => {}
        Err(errors) => {
            for err in errors {
                eprintln!("sitepipe: output watch error: {err}");
            }
        }
    })?;

    debouncer
        .watch(dir, RecursiveMode::Recursive)
        .with_context(|| format!("watching output directory {}", dir.display()))?;
    Ok(debouncer)
}
