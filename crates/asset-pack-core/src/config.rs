use serde::{Deserialize, Serialize};

/// Packing configuration.
///   - `margin` pads every sprite on all four sides (so two neighbours are at least `2 * margin` apart)
///   - `max_dimension` bounds both canvas edges; the packer fails rather than growing past it
///   - `parallel` composes rows concurrently when the `parallel` feature is on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackerConfig {
    /// Pixels of padding per sprite on every side.
    #[serde(default = "default_margin")]
    pub margin: u32,
    /// Maximum canvas edge length in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Enable parallel composition when feature "parallel" is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            max_dimension: default_max_dimension(),
            parallel: default_parallel(),
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `max_dimension` is zero
    /// - the margin alone would use up the whole canvas edge
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AssetPackError;

        if self.max_dimension == 0 {
            return Err(AssetPackError::InvalidConfig(
                "max_dimension must be greater than zero".into(),
            ));
        }

        let total_margin = self.margin as u64 * 2;
        if total_margin >= self.max_dimension as u64 {
            return Err(AssetPackError::InvalidConfig(format!(
                "margin ({}) * 2 leaves no room inside max_dimension ({})",
                self.margin, self.max_dimension
            )));
        }

        Ok(())
    }
}

fn default_margin() -> u32 {
    4
}
fn default_max_dimension() -> u32 {
    4096
}
fn default_parallel() -> bool {
    false
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn max_dimension(mut self, v: u32) -> Self {
        self.cfg.max_dimension = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}

impl PackerConfig {
    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}
