//! Registry handles with generational indices.

use std::fmt;

/// Handle to a tracked object's registry slot, with a generational index
/// for stale handle detection.
///
/// The generation counter increments when a slot is reused after its entry
/// is removed, so a handle kept past deregistration is detected and skipped
/// rather than dereferenced.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TrackedId {
    /// Index into the registry's slot array.
    pub index: u32,
    /// Generation counter for stale handle detection.
    pub generation: u32,
}

impl TrackedId {
    /// Creates a new handle with the given index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns a sentinel value representing "not registered".
    ///
    /// This uses `u32::MAX` as the index, which is never allocated.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    /// Returns true if this is the null sentinel value.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl fmt::Debug for TrackedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "TrackedId(null)")
        } else {
            write!(f, "TrackedId({}v{})", self.index, self.generation)
        }
    }
}
