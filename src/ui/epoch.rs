/// Tag carried by an in-flight request.
///
/// `epoch` identifies the mount of the owning view, `seq` orders requests
/// issued by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Issues tickets and tells stale ones apart.
#[derive(Debug, Default, Clone)]
pub struct Sequencer {
    epoch: u64,
    last: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.last += 1;
        Ticket {
            epoch: self.epoch,
            seq: self.last,
        }
    }

    /// False once the owning view has been unmounted since `ticket` was issued.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Invalidates every outstanding ticket. Sequence numbers keep growing.
    pub fn advance_epoch(&mut self) {
        self.epoch += 1;
    }

    pub fn last_seq(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_monotonic() {
        let mut sequencer = Sequencer::new();
        let a = sequencer.issue();
        let b = sequencer.issue();
        assert!(b.seq() > a.seq());
        assert_eq!(sequencer.last_seq(), b.seq());
    }

    #[test]
    fn test_epoch_invalidates_outstanding() {
        let mut sequencer = Sequencer::new();
        let before = sequencer.issue();
        sequencer.advance_epoch();
        let after = sequencer.issue();
        assert!(!sequencer.is_current(&before));
        assert!(sequencer.is_current(&after));
        assert!(after.seq() > before.seq());
    }
}
