use anyhow::{Result, anyhow};
use std::path::Path;

/// Extensions offered by the upload control
pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Longest file name accepted, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// Magic byte signatures for the spreadsheet containers we know about
const MAGIC_SIGNATURES: &[(&[u8], SpreadsheetContainer)] = &[
    (&[0xD0, 0xCF, 0x11, 0xE0], SpreadsheetContainer::Ole), // OLE/CFB (xls)
    (&[0x50, 0x4B, 0x03, 0x04], SpreadsheetContainer::Zip), // ZIP (xlsx, xlsb, ods)
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetContainer {
    Ole,
    Zip,
}

impl SpreadsheetContainer {
    /// Container a file with this extension is expected to use
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xls" => Some(Self::Ole),
            "xlsx" | "xlsm" | "xlsb" | "ods" => Some(Self::Zip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates an uploaded file name before it is joined onto the staging directory.
///
/// Accepted names are returned unchanged so the staged file mirrors the
/// original name. Anything that could escape the staging directory or name a
/// special entry is rejected rather than rewritten.
pub fn validate_filename(filename: &str) -> Result<String> {
    if filename.is_empty() || filename.trim().is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    if filename == "." || filename == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("'{}' is not a valid file name", filename),
        }));
    }

    // Separators only; a bare ".." is rejected above
    if filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
        return Err(anyhow!(ValidationError {
            code: "PATH_TRAVERSAL",
            message: "Filename must not contain path separators".to_string(),
        }));
    }

    // ':' covers drive prefixes and NTFS alternate data streams
    if filename.chars().any(|c| c.is_control() || c == ':') {
        return Err(anyhow!(ValidationError {
            code: "INVALID_CHARACTERS",
            message: "Filename contains control or reserved characters".to_string(),
        }));
    }

    if filename.len() > MAX_FILENAME_LEN {
        return Err(anyhow!(ValidationError {
            code: "FILENAME_TOO_LONG",
            message: format!(
                "Filename is {} bytes, maximum is {}",
                filename.len(),
                MAX_FILENAME_LEN
            ),
        }));
    }

    // The name must resolve to a single plain component
    let is_single_component = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == filename);
    if !is_single_component {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("'{}' is not a plain file name", filename),
        }));
    }

    Ok(filename.to_string())
}

/// Lowercased extension of a file name, if any
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Identifies the spreadsheet container from the first bytes of a file
pub fn detect_container(header: &[u8]) -> Option<SpreadsheetContainer> {
    MAGIC_SIGNATURES
        .iter()
        .find(|(signature, _)| header.starts_with(signature))
        .map(|(_, container)| *container)
}

/// True when the extension promises a different container than the bytes carry
pub fn is_container_mismatch(filename: &str, header: &[u8]) -> bool {
    let expected = extension_of(filename).and_then(|ext| SpreadsheetContainer::for_extension(&ext));
    match (expected, detect_container(header)) {
        (Some(expected), Some(actual)) => expected != actual,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert_eq!(validate_filename("data.xlsx").unwrap(), "data.xlsx");
        assert_eq!(validate_filename("my report.xls").unwrap(), "my report.xls");
        assert_eq!(validate_filename("測試.xlsx").unwrap(), "測試.xlsx");
        assert_eq!(validate_filename(".hidden.xlsx").unwrap(), ".hidden.xlsx");

        // Path traversal
        assert!(validate_filename("../../../etc/passwd").is_err());
        assert!(validate_filename("..\\..\\windows\\system32").is_err());
        assert!(validate_filename("nested/data.xlsx").is_err());
        assert!(validate_filename("/abs.xlsx").is_err());

        // Special entries
        assert!(validate_filename("").is_err());
        assert!(validate_filename("   ").is_err());
        assert!(validate_filename(".").is_err());
        assert!(validate_filename("..").is_err());

        // Reserved characters
        assert!(validate_filename("C:data.xlsx").is_err());
        assert!(validate_filename("bad\0name.xlsx").is_err());
        assert!(validate_filename("line\nbreak.xlsx").is_err());
    }

    #[test]
    fn test_validate_filename_inner_dots() {
        assert_eq!(
            validate_filename("report..v2.xlsx").unwrap(),
            "report..v2.xlsx"
        );
        assert_eq!(validate_filename("..draft.xls").unwrap(), "..draft.xls");

        let err = validate_filename("../x").unwrap_err();
        assert!(err.to_string().contains("PATH_TRAVERSAL"));
        assert!(validate_filename("..").is_err());
    }

    #[test]
    fn test_validate_filename_length() {
        let long = format!("{}.xlsx", "a".repeat(260));
        let err = validate_filename(&long).unwrap_err();
        assert!(err.to_string().contains("FILENAME_TOO_LONG"));
    }

    #[test]
    fn test_detect_container() {
        assert_eq!(
            detect_container(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1]),
            Some(SpreadsheetContainer::Ole)
        );
        assert_eq!(
            detect_container(b"PK\x03\x04rest"),
            Some(SpreadsheetContainer::Zip)
        );
        assert_eq!(detect_container(b"not a spreadsheet"), None);
        assert_eq!(detect_container(&[]), None);
    }

    #[test]
    fn test_container_mismatch() {
        assert!(is_container_mismatch("data.xls", b"PK\x03\x04"));
        assert!(is_container_mismatch("data.xlsx", &[0xD0, 0xCF, 0x11, 0xE0]));
        assert!(!is_container_mismatch("data.xlsx", b"PK\x03\x04"));
        assert!(!is_container_mismatch("data.xlsx", b"garbage"));
        assert!(!is_container_mismatch("data.csv", b"PK\x03\x04"));
    }
}
