use std::path::{Path, PathBuf};

use serde::Deserialize;
use sigscript_runtime::TransformOptions;

use crate::error::CliError;

#[derive(Debug, Default, Deserialize)]
pub struct SigscriptConfig {
    #[serde(default)]
    pub transform: TransformOptions,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub blocks: BlocksConfig,
}

#[derive(Debug, Deserialize)]
pub struct SignalsConfig {
    #[serde(default = "default_signal_dir")]
    pub dir: PathBuf,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            dir: default_signal_dir(),
        }
    }
}

fn default_signal_dir() -> PathBuf {
    PathBuf::from("signals")
}

/// Analysis block geometry, in samples.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BlocksConfig {
    #[serde(default = "default_block_size")]
    pub size: usize,
    #[serde(default = "default_step_size")]
    pub step: usize,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            size: default_block_size(),
            step: default_step_size(),
        }
    }
}

fn default_block_size() -> usize {
    1024
}
fn default_step_size() -> usize {
    512
}

impl SigscriptConfig {
    /// Default config location: ~/.sigscript/config.toml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sigscript")
            .join("config.toml")
    }

    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CliError::Config(format!("failed to parse config: {e}")))?;
        if config.blocks.step == 0 {
            return Err(CliError::Config("blocks.step must be at least 1".into()));
        }
        Ok(config)
    }

    /// Load an explicit config file, or the default one if present, or fall
    /// back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = Self::default_path();
        if path.exists() {
            tracing::debug!(path = %path.display(), "Using default config");
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigscript_runtime::Domain;

    #[test]
    fn empty_config_uses_defaults() {
        let config = SigscriptConfig::parse("").unwrap();
        assert_eq!(config.transform, TransformOptions::signal());
        assert_eq!(config.signals.dir, PathBuf::from("signals"));
        assert_eq!(config.blocks.size, 1024);
        assert_eq!(config.blocks.step, 512);
    }

    #[test]
    fn parses_transform_section() {
        let toml_str = r#"
[transform]
domain = "spectrum"
apply_window = true
"#;
        let config = SigscriptConfig::parse(toml_str).unwrap();
        assert_eq!(config.transform.domain, Domain::Spectrum);
        assert!(config.transform.apply_window);
    }

    #[test]
    fn window_defaults_to_off() {
        let toml_str = r#"
[transform]
domain = "spectrum"
"#;
        let config = SigscriptConfig::parse(toml_str).unwrap();
        assert_eq!(config.transform, TransformOptions::spectrum(false));
    }

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
[transform]
domain = "signal"

[signals]
dir = "/data/signals"

[blocks]
size = 256
step = 128
"#;
        let config = SigscriptConfig::parse(toml_str).unwrap();
        assert_eq!(config.signals.dir, PathBuf::from("/data/signals"));
        assert_eq!(config.blocks.size, 256);
        assert_eq!(config.blocks.step, 128);
    }

    #[test]
    fn rejects_unknown_domain() {
        let toml_str = r#"
[transform]
domain = "wavelet"
"#;
        assert!(matches!(
            SigscriptConfig::parse(toml_str),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn rejects_zero_step() {
        let toml_str = r#"
[blocks]
step = 0
"#;
        assert!(matches!(
            SigscriptConfig::parse(toml_str),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = SigscriptConfig::load(Some(Path::new("/nonexistent/sigscript.toml")));
        assert!(matches!(err, Err(CliError::Config(_))));
    }
}
