//! Core types used throughout dxfdoc

pub mod handle;
pub mod julian_date;
pub mod vector;

pub use handle::Handle;
pub use julian_date::{calendar_date, julian_date};
pub use vector::{Vector2, Vector3};

/// DXF revision enumeration.
///
/// Ordering is by release; use [`DxfVersion::at_least`] for feature gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DxfVersion {
    /// AutoCAD R10 (AC1006)
    AC1006,
    /// AutoCAD R11/R12 (AC1009)
    AC1009,
    /// AutoCAD R13 (AC1012)
    AC1012,
    /// AutoCAD R14 (AC1014)
    AC1014,
    /// AutoCAD 2000 (AC1015)
    AC1015,
    /// AutoCAD 2004 (AC1018)
    AC1018,
    /// AutoCAD 2007 (AC1021)
    AC1021,
    /// AutoCAD 2010 (AC1024)
    AC1024,
    /// AutoCAD 2013 (AC1027)
    AC1027,
    /// AutoCAD 2018 (AC1032)
    AC1032,
}

impl DxfVersion {
    /// Last revision of the legacy (pre-R13) schema.
    pub const LEGACY: DxfVersion = DxfVersion::AC1009;

    /// Revisions `Document::new` can create.
    pub const CREATABLE: [DxfVersion; 7] = [
        DxfVersion::AC1009,
        DxfVersion::AC1015,
        DxfVersion::AC1018,
        DxfVersion::AC1021,
        DxfVersion::AC1024,
        DxfVersion::AC1027,
        DxfVersion::AC1032,
    ];

    /// Get the version string (e.g., "AC1015")
    pub fn as_str(&self) -> &'static str {
        match self {
            DxfVersion::AC1006 => "AC1006",
            DxfVersion::AC1009 => "AC1009",
            DxfVersion::AC1012 => "AC1012",
            DxfVersion::AC1014 => "AC1014",
            DxfVersion::AC1015 => "AC1015",
            DxfVersion::AC1018 => "AC1018",
            DxfVersion::AC1021 => "AC1021",
            DxfVersion::AC1024 => "AC1024",
            DxfVersion::AC1027 => "AC1027",
            DxfVersion::AC1032 => "AC1032",
        }
    }

    /// AutoCAD release name (e.g., "R2000")
    pub fn release(&self) -> &'static str {
        match self {
            DxfVersion::AC1006 => "R10",
            DxfVersion::AC1009 => "R12",
            DxfVersion::AC1012 => "R13",
            DxfVersion::AC1014 => "R14",
            DxfVersion::AC1015 => "R2000",
            DxfVersion::AC1018 => "R2004",
            DxfVersion::AC1021 => "R2007",
            DxfVersion::AC1024 => "R2010",
            DxfVersion::AC1027 => "R2013",
            DxfVersion::AC1032 => "R2018",
        }
    }

    /// Parse a version tag ("AC1015") or a release name ("R2000").
    ///
    /// R11 files share the R12 revision tag.
    pub fn parse(s: &str) -> Option<Self> {
        let version = match s.trim().to_ascii_uppercase().as_str() {
            "AC1006" | "R10" => DxfVersion::AC1006,
            "AC1009" | "R11" | "R12" => DxfVersion::AC1009,
            "AC1012" | "R13" => DxfVersion::AC1012,
            "AC1014" | "R14" => DxfVersion::AC1014,
            "AC1015" | "R2000" => DxfVersion::AC1015,
            "AC1018" | "R2004" => DxfVersion::AC1018,
            "AC1021" | "R2007" => DxfVersion::AC1021,
            "AC1024" | "R2010" => DxfVersion::AC1024,
            "AC1027" | "R2013" => DxfVersion::AC1027,
            "AC1032" | "R2018" => DxfVersion::AC1032,
            _ => return None,
        };
        Some(version)
    }

    /// Get the numeric version code
    pub fn version_code(&self) -> u16 {
        match self {
            DxfVersion::AC1006 => 1006,
            DxfVersion::AC1009 => 1009,
            DxfVersion::AC1012 => 1012,
            DxfVersion::AC1014 => 1014,
            DxfVersion::AC1015 => 1015,
            DxfVersion::AC1018 => 1018,
            DxfVersion::AC1021 => 1021,
            DxfVersion::AC1024 => 1024,
            DxfVersion::AC1027 => 1027,
            DxfVersion::AC1032 => 1032,
        }
    }

    /// True if `self` is `other` or a later revision.
    #[inline]
    pub fn at_least(&self, other: DxfVersion) -> bool {
        self.version_code() >= other.version_code()
    }

    /// True for R12 and older: no subclass markers, owners, CLASSES or OBJECTS.
    #[inline]
    pub fn is_legacy(&self) -> bool {
        !self.at_least(DxfVersion::AC1012)
    }

    /// Text is always UTF-8 from R2007 on, regardless of `$DWGCODEPAGE`.
    #[inline]
    pub fn is_unicode(&self) -> bool {
        self.at_least(DxfVersion::AC1021)
    }

    /// True if `Document::new` can create this revision.
    pub fn is_creatable(&self) -> bool {
        Self::CREATABLE.contains(self)
    }
}

impl std::fmt::Display for DxfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DxfVersion {
    type Err = crate::error::DxfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DxfVersion::parse(s).ok_or_else(|| crate::error::DxfError::UnsupportedVersion(s.to_string()))
    }
}
