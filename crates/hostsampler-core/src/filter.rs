//! Pattern-based exclusion of disk devices.

use regex::Regex;

use crate::config::ConfigError;

/// Excludes devices whose path or filesystem type matches a configured pattern.
///
/// Patterns are compiled once; an invalid pattern fails construction.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    fs_type: Option<Regex>,
    path: Option<Regex>,
}

impl DeviceFilter {
    /// Compiles the optional patterns. Empty strings count as "not configured".
    pub fn new(fs_type: Option<&str>, path: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            fs_type: compile("exclude_disk_fs_type", fs_type)?,
            path: compile("exclude_disk_path", path)?,
        })
    }

    /// True when a filesystem-type pattern is configured, so mount
    /// information is needed to evaluate the filter.
    pub fn needs_fs_type(&self) -> bool {
        self.fs_type.is_some()
    }

    /// Returns true if either pattern matches.
    pub fn is_excluded(&self, path: &str, fs_type: &str) -> bool {
        self.fs_type.as_ref().is_some_and(|re| re.is_match(fs_type))
            || self.path.as_ref().is_some_and(|re| re.is_match(path))
    }
}

fn compile(option: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    match pattern.filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(p) => Regex::new(p)
            .map(Some)
            .map_err(|e| ConfigError::InvalidPattern {
                option,
                pattern: p.to_string(),
                message: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_patterns_excludes_nothing() {
        let filter = DeviceFilter::new(None, None).unwrap();
        assert!(!filter.is_excluded("/dev/sda1", "ext4"));
        assert!(!filter.is_excluded("", ""));
    }

    #[test]
    fn test_empty_pattern_is_not_configured() {
        let filter = DeviceFilter::new(Some(""), Some("")).unwrap();
        assert!(!filter.is_excluded("/dev/sda1", "ext4"));
    }

    #[test]
    fn test_path_pattern() {
        let filter = DeviceFilter::new(None, Some("^/dev")).unwrap();
        assert!(filter.is_excluded("/dev/sda1", "ext4"));
        assert!(!filter.is_excluded("/data", "ext4"));
    }

    #[test]
    fn test_fs_type_pattern() {
        let filter = DeviceFilter::new(Some("^(tmpfs|overlay)$"), None).unwrap();
        assert!(filter.is_excluded("/dev/sdb", "overlay"));
        assert!(!filter.is_excluded("/dev/sdb", "xfs"));
        assert!(!filter.is_excluded("/dev/sdb", "overlayfs"));
    }

    #[test]
    fn test_either_pattern_matches() {
        let filter = DeviceFilter::new(Some("^tmpfs$"), Some("^/dev/loop")).unwrap();
        assert!(filter.is_excluded("/dev/loop0", "squashfs"));
        assert!(filter.is_excluded("/dev/sda", "tmpfs"));
        assert!(!filter.is_excluded("/dev/sda", "ext4"));
        assert!(filter.needs_fs_type());
        assert!(!DeviceFilter::new(None, Some("^/dev/loop")).unwrap().needs_fs_type());
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = DeviceFilter::new(None, Some("^/(dev")).unwrap_err();
        match err {
            ConfigError::InvalidPattern {
                option, pattern, ..
            } => {
                assert_eq!(option, "exclude_disk_path");
                assert_eq!(pattern, "^/(dev");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
