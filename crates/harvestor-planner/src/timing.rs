use harvestor_core::{OpKind, Target};

/// The cycle's three duration estimates, in milliseconds.
///
/// Captured once per planning cycle from the target snapshot; every command
/// planned in that cycle is aligned against the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    /// Estimated Extract duration.
    pub extract_ms: u64,
    /// Estimated Fortify duration.
    pub fortify_ms: u64,
    /// Estimated Amplify duration.
    pub amplify_ms: u64,
}

impl Durations {
    /// Reads the three estimates out of a target snapshot.
    pub fn of_target(target: &Target) -> Self {
        Self {
            extract_ms: target.extract_ms,
            fortify_ms: target.fortify_ms,
            amplify_ms: target.amplify_ms,
        }
    }

    /// Duration estimate for one operation kind.
    pub fn for_kind(&self, kind: OpKind) -> u64 {
        match kind {
            OpKind::Extract => self.extract_ms,
            OpKind::Fortify => self.fortify_ms,
            OpKind::Amplify => self.amplify_ms,
        }
    }

    /// The longest of the three estimates. Drives the cycle cadence.
    pub fn dominant_ms(&self) -> u64 {
        self.extract_ms.max(self.fortify_ms).max(self.amplify_ms)
    }

    /// Hold before start so an operation of `kind` completes at the same
    /// instant as the cycle's dominant operation: slower kinds start
    /// earlier, all finish together.
    pub fn start_delay_ms(&self, kind: OpKind) -> u64 {
        self.dominant_ms() - self.for_kind(kind)
    }
}
