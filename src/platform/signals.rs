//! SIGINT/SIGTERM as a cooperative stop flag
//!
//! The signals are blocked and read from a non-blocking signalfd once per
//! loop iteration, so no handler runs asynchronously and cleanup always
//! happens on the normal control-flow path.

use std::io;

use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::{SfdFlags, SignalFd};

pub struct ShutdownSignal {
    fd: SignalFd,
    mask: SigSet,
    received: bool,
}

impl ShutdownSignal {
    pub fn install() -> io::Result<Self> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGINT);
        mask.add(Signal::SIGTERM);
        mask.add(Signal::SIGHUP);
        mask.thread_block()?;
        let fd = SignalFd::with_flags(&mask, SfdFlags::SFD_NONBLOCK | SfdFlags::SFD_CLOEXEC)?;
        Ok(Self {
            fd,
            mask,
            received: false,
        })
    }

    /// True once a termination signal has arrived (latched)
    pub fn received(&mut self) -> bool {
        if !self.received {
            match self.fd.read_signal() {
                Ok(Some(info)) => {
                    log::info!("Received signal {}, shutting down", info.ssi_signo);
                    self.received = true;
                }
                Ok(None) => {}
                Err(e) => log::warn!("Reading signalfd failed: {}", e),
            }
        }
        self.received
    }
}

impl Drop for ShutdownSignal {
    fn drop(&mut self) {
        let _ = self.mask.thread_unblock();
    }
}
