//! Settings upload server.
//!
//! While configuration mode is active a TCP listener runs on its own
//! thread (pinned to the PRO core on the device). Each connection sends
//! one JSON settings document and half-closes; the server validates it,
//! persists it through the [`ConfigPort`] and answers `OK` or
//! `ERR <reason>`.
//!
//! ```text
//!   client ──JSON──▶ listener thread ──▶ validate ──▶ ConfigPort::save
//!          ◀──OK / ERR <reason>──
//! ```

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{ConfigPort, SettingsUploadPort};
use crate::config::{SystemConfig, validate_config};
use crate::drivers::task_pin::{self, Core};
use crate::error::CommsError;

/// Largest accepted settings document.
pub const MAX_DOCUMENT_LEN: usize = 2048;

const ACCEPT_POLL: Duration = Duration::from_millis(50);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
const WORKER_PRIORITY: u8 = 5;
const WORKER_STACK_KB: usize = 8;

pub struct UploadServer<C: ConfigPort + Send + Sync + 'static> {
    bind_addr: SocketAddr,
    store: Arc<C>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl<C: ConfigPort + Send + Sync + 'static> UploadServer<C> {
    pub fn new(bind_addr: SocketAddr, store: Arc<C>) -> Self {
        Self {
            bind_addr,
            store,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            local_addr: None,
        }
    }

    /// Listen on every interface at `port`.
    pub fn on_port(port: u16, store: Arc<C>) -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], port)), store)
    }

    /// Address actually bound while running (port 0 resolves here).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl<C: ConfigPort + Send + Sync + 'static> SettingsUploadPort for UploadServer<C> {
    fn start(&mut self) -> Result<(), CommsError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let listener = TcpListener::bind(self.bind_addr).map_err(|e| {
            warn!("Upload server bind {} failed: {}", self.bind_addr, e);
            CommsError::UploadBindFailed
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| CommsError::UploadBindFailed)?;
        let local = listener
            .local_addr()
            .map_err(|_| CommsError::UploadBindFailed)?;

        self.stop.store(false, Ordering::Release);
        let stop = Arc::clone(&self.stop);
        let store = Arc::clone(&self.store);

        let handle = task_pin::spawn_on_core(
            Core::Pro,
            WORKER_PRIORITY,
            WORKER_STACK_KB,
            "upload\0",
            move || serve(&listener, &stop, store.as_ref()),
        )
        .map_err(|e| {
            warn!("Upload server spawn failed: {}", e);
            CommsError::UploadSpawnFailed
        })?;

        info!("Upload server listening on {}", local);
        self.local_addr = Some(local);
        self.worker = Some(handle);
        Ok(())
    }

    fn stop(&mut self, on_stopped: &mut dyn FnMut()) -> Result<(), CommsError> {
        let joined = match self.worker.take() {
            Some(handle) => {
                self.stop.store(true, Ordering::Release);
                handle.join().map_err(|_| CommsError::UploadWorkerPanicked)
            }
            None => Ok(()),
        };
        self.local_addr = None;
        on_stopped();
        if joined.is_ok() {
            info!("Upload server stopped");
        }
        joined
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

fn serve<C: ConfigPort + ?Sized>(listener: &TcpListener, stop: &AtomicBool, store: &C) {
    while !stop.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = handle_client(stream, store) {
                    warn!("Upload from {} aborted: {}", peer, e);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                warn!("Upload accept failed: {}", e);
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn handle_client<C: ConfigPort + ?Sized>(mut stream: TcpStream, store: &C) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;

    let reply = match read_document(&mut stream)? {
        Some(doc) => match apply_document(&doc, store) {
            Ok(()) => "OK\n".to_owned(),
            Err(reason) => format!("ERR {}\n", reason),
        },
        None => format!("ERR document exceeds {} bytes\n", MAX_DOCUMENT_LEN),
    };
    stream.write_all(reply.as_bytes())?;
    stream.flush()
}

/// Read until the client half-closes. `None` when the document overflows.
fn read_document(stream: &mut TcpStream) -> io::Result<Option<heapless::Vec<u8, MAX_DOCUMENT_LEN>>> {
    let mut doc = heapless::Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(Some(doc));
        }
        if doc.extend_from_slice(&chunk[..n]).is_err() {
            return Ok(None);
        }
    }
}

fn apply_document<C: ConfigPort + ?Sized>(doc: &[u8], store: &C) -> Result<(), String> {
    let cfg: SystemConfig =
        serde_json::from_slice(doc).map_err(|e| format!("malformed settings: {}", e))?;
    validate_config(&cfg).map_err(|e| e.to_string())?;
    store.save(&cfg).map_err(|e| e.to_string())?;
    info!(
        "Settings uploaded: lat={} lon={} close={} for {} min",
        cfg.latitude, cfg.longitude, cfg.close_start, cfg.close_duration
    );
    Ok(())
}
