//! Handle type for drawing objects
//!
//! Handles identify every group of a document. On the wire they are
//! upper-case hexadecimal strings without prefix.

use std::fmt;

/// A unique identifier for a tag group
///
/// Handle 0 is reserved and means "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// The null/invalid handle (0)
    pub const NULL: Handle = Handle(0);

    /// Create a new handle from a u64 value
    #[inline]
    pub const fn new(value: u64) -> Self {
        Handle(value)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Check if this is a null/invalid handle
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Check if this is a valid handle
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Parse the hexadecimal wire form ("1F", "0", ...).
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        u64::from_str_radix(s, 16).ok().map(Handle)
    }

    /// Hexadecimal wire form.
    pub fn to_hex(&self) -> String {
        format!("{:X}", self.0)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NULL
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Handle(value)
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl fmt::LowerHex for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle() {
        let null = Handle::NULL;
        assert!(null.is_null());
        assert!(!null.is_valid());
        assert_eq!(Handle::default(), null);
    }

    #[test]
    fn test_handle_display() {
        let handle = Handle::new(0xABCD);
        assert_eq!(format!("{}", handle), "0xABCD");
        assert_eq!(format!("{:X}", handle), "ABCD");
        assert_eq!(handle.to_hex(), "ABCD");
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(Handle::from_hex("1F"), Some(Handle::new(0x1F)));
        assert_eq!(Handle::from_hex(" 1a "), Some(Handle::new(0x1A)));
        assert_eq!(Handle::from_hex("0"), Some(Handle::NULL));
        assert_eq!(Handle::from_hex(""), None);
        assert_eq!(Handle::from_hex("XYZ"), None);
    }

    #[test]
    fn test_handle_ordering() {
        assert!(Handle::new(100) < Handle::new(200));
    }
}
