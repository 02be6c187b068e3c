//! Accept loop for the socket channel

use crate::context::BridgeContext;
use crate::memory::AttachedProcess;
use crate::server::http::{handle_request, read_request, HttpError, HttpResponse};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept connections until `running` is cleared, one thread per connection
pub(crate) fn accept_loop<P: AttachedProcess>(
    listener: TcpListener,
    context: Arc<BridgeContext<P>>,
    running: Arc<AtomicBool>,
    read_timeout: Duration,
) {
    for stream in listener.incoming() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        match stream {
            Ok(stream) => {
                let context = Arc::clone(&context);
                let spawned = thread::Builder::new()
                    .name("bridge-conn".to_string())
                    .spawn(move || {
                        let peer = stream.peer_addr().ok();
                        if let Err(e) = handle_connection(stream, &context, read_timeout) {
                            debug!("Connection {:?} ended with error: {}", peer, e);
                        }
                    });
                if let Err(e) = spawned {
                    warn!("Failed to spawn connection handler: {}", e);
                }
            }
            Err(e) => {
                warn!("Accept error: {}", e);
                // Back off so a persistent failure (e.g. EMFILE) does not spin
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
    debug!("Accept loop stopped");
}

fn handle_connection<P: AttachedProcess>(
    mut stream: TcpStream,
    context: &BridgeContext<P>,
    read_timeout: Duration,
) -> io::Result<()> {
    stream.set_read_timeout(Some(read_timeout))?;
    stream.set_write_timeout(Some(read_timeout))?;

    let response = match read_request(&mut stream) {
        Ok(request) => {
            debug!("{} {}", request.method, request.path);
            handle_request(context, &request)
        }
        Err(HttpError::Io(e)) => return Err(e),
        Err(e) => {
            warn!("Rejected request: {}", e);
            HttpResponse::message(400, false, &e.to_string())
        }
    };

    response.write_to(&mut stream)?;
    let _ = stream.shutdown(Shutdown::Both);
    Ok(())
}

/// Unblock a pending `accept` by connecting to the listener once
///
/// Returns false when the connection could not be made, in which case the
/// accept thread may still be blocked.
pub(crate) fn wake(addr: SocketAddr) -> bool {
    let target = if addr.ip().is_unspecified() {
        match addr {
            SocketAddr::V4(_) => SocketAddr::from(([127, 0, 0, 1], addr.port())),
            SocketAddr::V6(_) => SocketAddr::from((std::net::Ipv6Addr::LOCALHOST, addr.port())),
        }
    } else {
        addr
    };

    match TcpStream::connect_timeout(&target, Duration::from_secs(1)) {
        Ok(_) => true,
        Err(e) => {
            debug!("Wake connection to {} failed: {}", target, e);
            false
        }
    }
}
