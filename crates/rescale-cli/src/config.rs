//! Settings file and named scale presets.
//!
//! ```toml
//! default_factor = 1.0
//!
//! [output]
//! binary = true
//! precision = 6
//! solid_name = "model"
//!
//! [presets.wargame]
//! original_scale = "1:1"
//! desired_scale = "1:56"
//! notes = "28mm figures"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rescale_stl::{AsciiOptions, ScaleFactor, StlFormat};
use serde::Deserialize;
use tracing::debug;

/// File loaded from the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "rescale.toml";

/// Environment variable overriding `default_factor`.
pub const FACTOR_ENV: &str = "RESCALE_DEFAULT_FACTOR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Factor used by `scale` when none is given on the command line.
    pub default_factor: f64,
    pub output: OutputConfig,
    pub presets: BTreeMap<String, Preset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_factor: 1.0,
            output: OutputConfig::default(),
            presets: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Write binary STL unless `--ascii` is passed.
    pub binary: bool,
    /// Fractional digits for ASCII numbers.
    pub precision: usize,
    pub solid_name: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let ascii = AsciiOptions::default();
        Self {
            binary: true,
            precision: ascii.precision,
            solid_name: ascii.solid_name,
        }
    }
}

/// A named scale conversion, e.g. life size to 1:36.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    #[serde(default = "life_size")]
    pub original_scale: String,
    pub desired_scale: Option<String>,
    /// Explicit factor, taking precedence over the scale pair.
    pub factor: Option<f64>,
    pub notes: Option<String>,
}

fn life_size() -> String {
    "1:1".to_string()
}

impl Preset {
    /// The factor this preset applies.
    pub fn factor(&self) -> Result<ScaleFactor> {
        if let Some(factor) = self.factor {
            return Ok(ScaleFactor::new(factor)?);
        }
        let desired = self
            .desired_scale
            .as_deref()
            .ok_or_else(|| anyhow!("preset needs either `factor` or `desired_scale`"))?;
        Ok(ScaleFactor::convert(&self.original_scale, desired)?)
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load settings: the explicit file, else `./rescale.toml` if present,
    /// else defaults. Then apply the environment override.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None if Path::new(CONFIG_FILE).is_file() => Self::read(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_env(std::env::var(FACTOR_ENV).ok())?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        debug!(path = %path.display(), presets = config.presets.len(), "loaded config");
        Ok(config)
    }

    /// Override `default_factor` from an environment value.
    pub fn apply_env(&mut self, factor: Option<String>) -> Result<()> {
        if let Some(value) = factor {
            self.default_factor = value
                .trim()
                .parse()
                .with_context(|| format!("{FACTOR_ENV}={value:?} is not a number"))?;
        }
        Ok(())
    }

    /// The validated default factor.
    pub fn default_factor(&self) -> Result<ScaleFactor> {
        ScaleFactor::new(self.default_factor).context("invalid default_factor")
    }

    /// Look up a preset's factor by name.
    pub fn preset(&self, name: &str) -> Result<ScaleFactor> {
        let preset = self
            .presets
            .get(name)
            .ok_or_else(|| anyhow!("unknown preset {name:?}"))?;
        preset
            .factor()
            .with_context(|| format!("invalid preset {name:?}"))
    }

    /// Output format when the command line does not choose one.
    pub fn output_format(&self) -> StlFormat {
        if self.output.binary {
            StlFormat::Binary
        } else {
            StlFormat::Ascii
        }
    }

    /// ASCII writer options, with a fallback name for the solid.
    pub fn ascii_options(&self, fallback_name: Option<&str>) -> AsciiOptions {
        AsciiOptions {
            solid_name: self
                .output
                .solid_name
                .clone()
                .or_else(|| fallback_name.map(str::to_string)),
            precision: self.output.precision,
        }
    }
}
