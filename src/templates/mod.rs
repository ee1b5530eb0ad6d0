//! Start documents for `Document::new`

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{DxfError, Result};
use crate::types::DxfVersion;

const LEGACY: &str = include_str!("legacy.dxf");
const EXTENDED: &str = include_str!("extended.dxf");

/// File name of the template used for `version`.
pub fn template_name(version: DxfVersion) -> &'static str {
    if version.is_legacy() {
        "legacy.dxf"
    } else {
        "extended.dxf"
    }
}

/// Template text for a new document of `version`.
///
/// A template of the same name in `template_dir` replaces the built-in one.
pub fn template_text(version: DxfVersion, template_dir: Option<&Path>) -> Result<String> {
    if let Some(dir) = template_dir {
        let path = dir.join(template_name(version));
        if path.exists() {
            debug!(path = %path.display(), "using template file");
            return fs::read_to_string(&path).map_err(DxfError::from);
        }
    }
    let text = if version.is_legacy() { LEGACY } else { EXTENDED };
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates() {
        let legacy = template_text(DxfVersion::AC1009, None).unwrap();
        assert!(legacy.contains("AC1009"));
        assert!(!legacy.contains("$HANDSEED"));
        let extended = template_text(DxfVersion::AC1027, None).unwrap();
        assert!(extended.contains("AC1015"));
    }

    #[test]
    fn test_template_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("legacy.dxf"), "  0\nEOF\n").unwrap();
        let text = template_text(DxfVersion::AC1009, Some(dir.path())).unwrap();
        assert_eq!(text, "  0\nEOF\n");
        // no extended.dxf in the directory: built-in fallback
        let text = template_text(DxfVersion::AC1015, Some(dir.path())).unwrap();
        assert!(text.contains("AcDbSymbolTable"));
    }
}
