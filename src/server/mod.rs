//! Command channels
//!
//! [`CommandServer`] runs the socket channel (HTTP on loopback) and the
//! polled command file on dedicated OS threads. Both channels route grants
//! through the shared [`BridgeContext`], whose session lock serializes them.
//! A single `running` flag stops everything.

pub mod command;
pub mod file_channel;
pub mod http;
mod listener;

pub use command::{parse_grant_body, parse_grant_command, validate_request, ParseError};
pub use file_channel::{process_command_file, FilePass};
pub use http::{handle_request, read_request, HttpError, HttpRequest, HttpResponse};

use crate::context::BridgeContext;
use crate::core::types::{BridgeError, BridgeResult};
use crate::memory::AttachedProcess;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

struct SocketChannel {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

/// Owner of the channel threads
pub struct CommandServer<P: AttachedProcess> {
    context: Arc<BridgeContext<P>>,
    running: Arc<AtomicBool>,
    socket: Option<SocketChannel>,
    file_channel: Option<JoinHandle<()>>,
}

impl<P: AttachedProcess> CommandServer<P> {
    pub fn new(context: Arc<BridgeContext<P>>) -> Self {
        CommandServer {
            context,
            running: Arc::new(AtomicBool::new(true)),
            socket: None,
            file_channel: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the socket channel is bound to
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().map(|s| s.addr)
    }

    /// Bind and start the socket channel
    ///
    /// Port 0 binds an ephemeral port; the bound address is returned.
    pub fn start_socket(
        &mut self,
        addr: SocketAddr,
        read_timeout: Duration,
    ) -> BridgeResult<SocketAddr> {
        if let Some(socket) = &self.socket {
            return Ok(socket.addr);
        }

        let tcp = TcpListener::bind(addr).map_err(|source| BridgeError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let bound = tcp.local_addr()?;

        let context = Arc::clone(&self.context);
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("bridge-accept".to_string())
            .spawn(move || listener::accept_loop(tcp, context, running, read_timeout))?;

        info!("Socket channel listening on http://{}", bound);
        self.socket = Some(SocketChannel {
            addr: bound,
            handle,
        });
        Ok(bound)
    }

    /// Start polling the command file
    pub fn start_file_channel(&mut self, path: PathBuf, interval: Duration) -> BridgeResult<()> {
        if self.file_channel.is_some() {
            return Ok(());
        }

        let context = Arc::clone(&self.context);
        let running = Arc::clone(&self.running);
        info!("Watching command file {}", path.display());
        let handle = thread::Builder::new()
            .name("bridge-file".to_string())
            .spawn(move || file_channel::poll_loop(&path, context, running, interval))?;

        self.file_channel = Some(handle);
        Ok(())
    }

    /// Stop both channels and wait for their threads
    ///
    /// In-flight connection handlers finish on their own.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(socket) = self.socket.take() {
            if !listener::wake(socket.addr) {
                warn!("Could not wake the accept thread, leaving it detached");
            } else if socket.handle.join().is_err() {
                debug!("Accept thread panicked");
            }
        }

        if let Some(handle) = self.file_channel.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                debug!("File channel thread panicked");
            }
        }
    }
}

impl<P: AttachedProcess> Drop for CommandServer<P> {
    fn drop(&mut self) {
        self.stop();
    }
}
