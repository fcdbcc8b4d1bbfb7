/// Opaque handle to a node owned by a host tree.
///
/// Handles are allocated by the host adapter and never reused within one host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(pub u32);

impl HostHandle {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: HostHandle = HostHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Monotonic counter of commits applied by one root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitVersion(pub u64);

impl CommitVersion {
    pub const INITIAL: CommitVersion = CommitVersion(0);

    pub fn next(self) -> Self {
        CommitVersion(self.0.wrapping_add(1))
    }
}
