//! Collision-free names for blocks, layers and output files

use crate::error::{DxfError, Result};

/// Highest numeric suffix tried before giving up
pub const MAX_SUFFIX: usize = 10_000;

/// `base` if free, else the first free `base_1`, `base_2`, ...
///
/// Fails with `InvalidOperation` after [`MAX_SUFFIX`] attempts.
pub fn unique_name<F>(base: &str, is_taken: F) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    if !is_taken(base) {
        return Ok(base.to_string());
    }
    (1..=MAX_SUFFIX)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !is_taken(candidate))
        .ok_or_else(|| {
            DxfError::InvalidOperation(format!("no free name left for '{}'", base))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_base_is_kept() {
        assert_eq!(unique_name("DOOR", |_| false).unwrap(), "DOOR");
    }

    #[test]
    fn test_suffixes_in_order() {
        let taken = ["DOOR", "DOOR_1", "DOOR_2"];
        assert_eq!(unique_name("DOOR", |n| taken.contains(&n)).unwrap(), "DOOR_3");
    }

    #[test]
    fn test_bounded() {
        assert!(matches!(
            unique_name("X", |_| true),
            Err(DxfError::InvalidOperation(_))
        ));
    }
}
