//! Handle seed: source of new handles

use crate::types::Handle;

/// Monotonic handle generator.
///
/// The seed is the next handle to issue, which is what `$HANDSEED`
/// stores. It only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleSeed {
    next: u64,
}

impl HandleSeed {
    /// Seed starting at `start`; the null handle is never issued.
    pub fn new(start: Handle) -> Self {
        Self {
            next: start.value().max(1),
        }
    }

    /// The handle `next` would return.
    pub fn peek(&self) -> Handle {
        Handle::new(self.next)
    }

    /// Issue the current seed value and advance.
    pub fn next(&mut self) -> Handle {
        let handle = Handle::new(self.next);
        self.next += 1;
        handle
    }

    /// Make sure every handle issued from now on is above `used`.
    pub fn ensure_above(&mut self, used: Handle) {
        if used.value() >= self.next {
            self.next = used.value() + 1;
        }
    }
}

impl Default for HandleSeed {
    fn default() -> Self {
        Self::new(Handle::new(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_never_issues_null() {
        let mut seed = HandleSeed::new(Handle::NULL);
        assert_eq!(seed.next(), Handle::new(1));
        assert_eq!(seed.peek(), Handle::new(2));
    }

    #[test]
    fn test_ensure_above() {
        let mut seed = HandleSeed::new(Handle::new(0x10));
        seed.ensure_above(Handle::new(0x0F));
        assert_eq!(seed.peek(), Handle::new(0x10));
        seed.ensure_above(Handle::new(0x2A));
        assert_eq!(seed.next(), Handle::new(0x2B));
    }
}
