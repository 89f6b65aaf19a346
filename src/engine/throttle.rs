use std::time::Duration;
use tokio::time::Instant;

/// Handle for one admitted dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTicket {
    /// Monotonically increasing per throttle, starting at 1
    pub seq: u64,
    pub issued_at: Instant,
}

/// Why a dispatch attempt was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttled {
    /// Last dispatch started less than `min_interval` ago
    TooSoon { remaining: Duration },
    /// A previous request has not resolved yet
    InFlight { seq: u64 },
}

/// Gate in front of the classifier.
///
/// Combines a minimum spacing between dispatch starts with an optional
/// single-request-in-flight guard. Rejected attempts are simply dropped by
/// the caller; nothing is queued.
pub struct InferenceThrottle {
    min_interval: Option<Duration>,
    guard_in_flight: bool,
    last_dispatch: Option<Instant>,
    in_flight: Vec<u64>,
    next_seq: u64,
}

impl InferenceThrottle {
    pub fn new(min_interval: Option<Duration>, guard_in_flight: bool) -> Self {
        Self {
            min_interval,
            guard_in_flight,
            last_dispatch: None,
            in_flight: Vec::new(),
            next_seq: 1,
        }
    }

    /// Admit a dispatch at `now` or say why not.
    pub fn try_acquire(&mut self, now: Instant) -> Result<DispatchTicket, Throttled> {
        if self.guard_in_flight {
            if let Some(&seq) = self.in_flight.first() {
                return Err(Throttled::InFlight { seq });
            }
        }

        if let (Some(min), Some(last)) = (self.min_interval, self.last_dispatch) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < min {
                return Err(Throttled::TooSoon {
                    remaining: min - elapsed,
                });
            }
        }

        let ticket = DispatchTicket {
            seq: self.next_seq,
            issued_at: now,
        };
        self.next_seq += 1;
        self.last_dispatch = Some(now);
        self.in_flight.push(ticket.seq);
        Ok(ticket)
    }

    /// Mark a dispatch as resolved, successfully or not.
    pub fn release(&mut self, seq: u64) {
        self.in_flight.retain(|&s| s != seq);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Forget outstanding requests and timing. Sequence numbers keep counting
    /// so responses from before the reset can never look newer.
    pub fn reset(&mut self) {
        self.in_flight.clear();
        self.last_dispatch = None;
    }
}
