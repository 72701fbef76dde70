//! Port liveness probing and unused-port allocation.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::{AddressRecord, PORT_RANGE};

/// Default probe timeout. Loopback connects settle well under this; the
/// bound only matters when a firewall eats the SYN.
const PROBE_TIMEOUT: Duration = Duration::from_millis(10);

/// Best-effort TCP liveness check against loopback.
#[derive(Debug, Clone)]
pub struct PortProbe {
    timeout: Duration,
}

impl Default for PortProbe {
    fn default() -> Self {
        Self { timeout: PROBE_TIMEOUT }
    }
}

impl PortProbe {
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// True only when a TCP connect to `127.0.0.1:port` succeeds within the
    /// timeout. Refusal, timeout, and socket errors all collapse to `false`;
    /// nothing propagates to the caller. A service bound to another
    /// interface will be misreported — this is a hint, not an authority.
    #[must_use]
    pub fn is_listening(&self, port: u16) -> bool {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        match TcpStream::connect_timeout(&addr, self.timeout) {
            Ok(stream) => {
                drop(stream);
                true
            }
            Err(e) => {
                debug!(port, error = %e, "port probe failed");
                false
            }
        }
    }

    /// Pick a port uniformly from [`PORT_RANGE`] that no existing record
    /// claims and nothing is currently listening on. Samples until one
    /// qualifies; with a 30001-port range and tens of claims the loop
    /// terminates almost immediately.
    #[must_use]
    pub fn allocate_port(&self, existing: &[AddressRecord]) -> u16 {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = rng.gen_range(PORT_RANGE);
            if existing.iter().any(|r| r.port == candidate) {
                continue;
            }
            if self.is_listening(candidate) {
                debug!(candidate, "allocation candidate is already listening");
                continue;
            }
            return candidate;
        }
    }
}
