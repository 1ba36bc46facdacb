//! Layered configuration loading

use anyhow::{Context as _, Result};
use config::{Config as ConfigLoader, Environment, File};
use longctx_core::BenchConfig;
use std::path::Path;
use validator::Validate;

/// Load `BenchConfig` from `config/default`, `config/local`, an optional
/// explicit file and `LONGCTX_*` environment variables, in that order.
///
/// Nested keys use `__` in the environment, e.g. `LONGCTX_LIFECYCLE__POLL_INTERVAL_MS`.
pub fn load(explicit: Option<&Path>) -> Result<BenchConfig> {
    let mut builder = ConfigLoader::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config: BenchConfig = builder
        .add_source(
            Environment::with_prefix("LONGCTX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "db_path: /tmp/other.db\n\
             map_reduce:\n  max_concurrent_chunks: 4\n\
             lifecycle:\n  poll_interval_ms: 250"
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();

        assert_eq!(config.db_path, Path::new("/tmp/other.db"));
        assert_eq!(config.map_reduce.max_concurrent_chunks, 4);
        assert_eq!(config.lifecycle.poll_interval_ms, 250);
        assert_eq!(config.lifecycle.completion_timeout_secs, 60);
        assert_eq!(config.truncation, BenchConfig::default().truncation);
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "truncation:\n  max_context_chars: 0").unwrap();

        assert!(load(Some(file.path())).is_err());
    }
}
