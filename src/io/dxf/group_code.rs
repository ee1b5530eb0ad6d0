//! Value types of DXF group codes

/// Storage type of a group code's value.
///
/// The type is a pure function of the code; see [`GroupCodeValueType::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupCodeValueType {
    /// Text, names, structure markers
    String,
    /// Floating point coordinates and scalars
    Double,
    /// 16/32/64 bit integers, bytes and booleans
    Integer,
    /// Hexadecimal object handle
    Handle,
    /// Hex encoded binary chunk
    Binary,
}

impl GroupCodeValueType {
    /// Value type for a group code.
    pub fn from_code(code: i32) -> Self {
        match code {
            5 | 105 => GroupCodeValueType::Handle,
            10..=59 | 110..=149 | 210..=239 | 460..=469 | 1010..=1059 => {
                GroupCodeValueType::Double
            }
            60..=99 | 160..=179 | 270..=299 | 370..=389 | 400..=409 | 420..=429
            | 440..=459 | 1060..=1071 => GroupCodeValueType::Integer,
            310..=319 | 1004 => GroupCodeValueType::Binary,
            320..=369 | 390..=399 | 480..=481 | 1005 => GroupCodeValueType::Handle,
            _ => GroupCodeValueType::String,
        }
    }
}

/// True for codes that carry a reference to another group of the same
/// document (owner, soft/hard pointers). Code 5/105 (the group's own
/// handle) and xdata handles (1005) are not references.
pub fn is_pointer_code(code: i32) -> bool {
    matches!(code, 320..=369 | 390..=399 | 480..=481)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(GroupCodeValueType::from_code(0), GroupCodeValueType::String);
        assert_eq!(GroupCodeValueType::from_code(5), GroupCodeValueType::Handle);
        assert_eq!(GroupCodeValueType::from_code(105), GroupCodeValueType::Handle);
        assert_eq!(GroupCodeValueType::from_code(10), GroupCodeValueType::Double);
        assert_eq!(GroupCodeValueType::from_code(62), GroupCodeValueType::Integer);
        assert_eq!(GroupCodeValueType::from_code(290), GroupCodeValueType::Integer);
        assert_eq!(GroupCodeValueType::from_code(310), GroupCodeValueType::Binary);
        assert_eq!(GroupCodeValueType::from_code(330), GroupCodeValueType::Handle);
        assert_eq!(GroupCodeValueType::from_code(410), GroupCodeValueType::String);
        assert_eq!(GroupCodeValueType::from_code(999), GroupCodeValueType::String);
        assert_eq!(GroupCodeValueType::from_code(1040), GroupCodeValueType::Double);
        assert_eq!(GroupCodeValueType::from_code(1071), GroupCodeValueType::Integer);
    }

    #[test]
    fn test_pointer_codes() {
        assert!(is_pointer_code(330));
        assert!(is_pointer_code(340));
        assert!(is_pointer_code(360));
        assert!(!is_pointer_code(5));
        assert!(!is_pointer_code(1005));
    }
}
