use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// What happens to staged uploads once they have been previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Staged files are never removed; the staging directory grows with every distinct name
    KeepAll,
    /// Staged files older than the given age are removed by the retention worker
    MaxAge(Duration),
}

/// Configuration for the upload/preview pipeline
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Directory uploads are written to before parsing (default: "temp")
    pub staging_dir: PathBuf,

    /// Request body ceiling in bytes (default: 256 MB)
    pub max_upload_size: usize,

    /// Cleanup policy for the staging directory (default: keep everything)
    pub retention: RetentionPolicy,

    /// How often the retention worker sweeps (default: 1 hour)
    pub sweep_interval: Duration,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("temp"),
            max_upload_size: 256 * 1024 * 1024, // 256 MB
            retention: RetentionPolicy::KeepAll,
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl PreviewConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            staging_dir: env::var("STAGING_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            retention: env::var("STAGING_RETENTION_HOURS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(retention_from_hours)
                .unwrap_or(default.retention),

            sweep_interval: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.sweep_interval),
        }
    }

    /// Config rooted at an explicit staging directory, everything else default
    pub fn with_staging_dir(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            ..Self::default()
        }
    }
}

/// Zero hours means "keep everything"
fn retention_from_hours(hours: u64) -> RetentionPolicy {
    if hours == 0 {
        RetentionPolicy::KeepAll
    } else {
        RetentionPolicy::MaxAge(Duration::from_secs(hours * 3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreviewConfig::default();
        assert_eq!(config.staging_dir, PathBuf::from("temp"));
        assert_eq!(config.max_upload_size, 256 * 1024 * 1024);
        assert_eq!(config.retention, RetentionPolicy::KeepAll);
    }

    #[test]
    fn test_retention_from_hours() {
        assert_eq!(retention_from_hours(0), RetentionPolicy::KeepAll);
        assert_eq!(
            retention_from_hours(2),
            RetentionPolicy::MaxAge(Duration::from_secs(7200))
        );
    }

    #[test]
    fn test_with_staging_dir() {
        let config = PreviewConfig::with_staging_dir("/tmp/uploads");
        assert_eq!(config.staging_dir, PathBuf::from("/tmp/uploads"));
        assert_eq!(config.retention, RetentionPolicy::KeepAll);
    }
}
