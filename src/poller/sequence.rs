/// Orders responses of one fetch group. Requests get increasing sequence
/// numbers; a completion is applied only if it is newer than the last
/// applied one.
#[derive(Debug, Default, Clone)]
pub struct SequenceGuard {
    issued: u64,
    applied: u64,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number for a request about to be sent.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Claim the display for `seq`. Returns false if a newer or equal
    /// sequence was already applied.
    pub fn admit(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}
