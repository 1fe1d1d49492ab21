//! Backend readiness.
//!
//! The database runs in test mode (no auth token), so "ready" simply
//! means a shallow GET of the root answers `200`.  The supervisor calls
//! [`BackendPort::invalidate`] when the link drops, so readiness is always
//! re-proven after an outage.

use log::{info, warn};

use crate::app::ports::BackendPort;
use crate::error::BackendError;

use super::{HttpProbe, probe_url};

pub struct RtdbBackend<P> {
    probe: P,
    url: String,
    ready: bool,
}

impl<P: HttpProbe> RtdbBackend<P> {
    pub fn new(probe: P, database_url: &str) -> Self {
        Self {
            probe,
            url: probe_url(database_url),
            ready: false,
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }
}

impl<P: HttpProbe> BackendPort for RtdbBackend<P> {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn reconnect(&mut self) -> Result<(), BackendError> {
        let status = self.probe.get_status(&self.url)?;
        if status == 200 {
            if !self.ready {
                info!("rtdb: backend reachable");
            }
            self.ready = true;
            Ok(())
        } else {
            warn!("rtdb: probe returned HTTP {}", status);
            self.ready = false;
            Err(BackendError::Status(status))
        }
    }

    fn invalidate(&mut self) {
        self.ready = false;
    }
}
