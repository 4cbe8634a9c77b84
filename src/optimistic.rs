use std::time::{Duration, Instant};

/// Local override for one scrubbable control value (seek position, volume).
///
/// While the user holds the control, and for a grace window after the commit
/// is sent, the local value wins over whatever the status poll reports. The
/// grace window absorbs the round trip between the commit request and the
/// first poll that reflects it; without it a poll landing mid-window snaps
/// the control back to the pre-drag server value.
///
/// Owned by the control that created it; precedence is decided at read time
/// via [`OptimisticField::value`], never baked into a snapshot.
#[derive(Debug)]
pub struct OptimisticField<T> {
    local: Option<T>,
    held: bool,
    committed_at: Option<Instant>,
    grace: Duration,
}

impl<T: Copy> OptimisticField<T> {
    pub fn new(grace: Duration) -> Self {
        Self {
            local: None,
            held: false,
            committed_at: None,
            grace,
        }
    }

    /// Interaction start (press / drag-start). Snapshots the current
    /// authoritative value; intermediate moves go through [`update`] only.
    ///
    /// [`update`]: OptimisticField::update
    pub fn begin(&mut self, current: T) {
        self.local = Some(current);
        self.held = true;
        self.committed_at = None;
    }

    /// Purely local; callable at any frequency while the control is held.
    pub fn update(&mut self, value: T) {
        if self.held {
            self.local = Some(value);
        }
    }

    /// Interaction end. Returns the value the caller should send to the
    /// remote mutator; the field stays authoritative for the grace window.
    pub fn commit(&mut self) -> Option<T> {
        if !self.held {
            return None;
        }
        self.held = false;
        self.committed_at = Some(Instant::now());
        self.local
    }

    pub fn active(&self) -> bool {
        if self.held {
            return true;
        }
        match self.committed_at {
            Some(committed_at) => committed_at.elapsed() < self.grace,
            None => false,
        }
    }

    /// The merge rule: local value while active, polled value otherwise.
    pub fn value(&self, polled: T) -> T {
        if self.active() {
            self.local.unwrap_or(polled)
        } else {
            polled
        }
    }
}
