//! Polled command file
//!
//! Each non-empty line of the file is one grant command. After a pass that
//! saw at least one line, the file is truncated. Lines appended between the
//! read and the truncate are lost.

use crate::context::BridgeContext;
use crate::memory::AttachedProcess;
use crate::server::command::parse_grant_command;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of one pass over the command file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilePass {
    /// Non-empty lines seen
    pub lines: usize,
    /// Lines that parsed and were granted successfully
    pub granted: usize,
}

/// Read, execute and truncate the command file once
///
/// A missing file is an empty pass.
pub fn process_command_file<P: AttachedProcess>(
    path: &Path,
    context: &BridgeContext<P>,
) -> io::Result<FilePass> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FilePass::default()),
        Err(e) => return Err(e),
    };
    let contents = String::from_utf8_lossy(&raw);

    let mut pass = FilePass::default();
    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        pass.lines += 1;
        match parse_grant_command(line) {
            Ok(request) => {
                if context.grant_item(request).is_ok() {
                    pass.granted += 1;
                }
            }
            Err(e) => warn!("Dropping command {:?}: {}", line, e),
        }
    }

    if pass.lines > 0 {
        OpenOptions::new().write(true).truncate(true).open(path)?;
        debug!("Processed {} command line(s) from {}", pass.lines, path.display());
    }

    Ok(pass)
}

/// Poll the command file until `running` is cleared
///
/// Sleeps with `park_timeout` so a stop request can unpark the thread.
pub(crate) fn poll_loop<P: AttachedProcess>(
    path: &Path,
    context: Arc<BridgeContext<P>>,
    running: Arc<AtomicBool>,
    interval: Duration,
) {
    while running.load(Ordering::SeqCst) {
        if let Err(e) = process_command_file(path, &context) {
            warn!("Command file {} unreadable: {}", path.display(), e);
        }
        thread::park_timeout(interval);
    }
    debug!("Command file poller stopped");
}
