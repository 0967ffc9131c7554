//! Compile and emit options, and the optional `rbg.toml` file that sets them.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sheet holding the state table unless configured otherwise.
pub const DEFAULT_SHEET: &str = "StateTable";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which initializer syntax the C output uses for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InitStyle {
    /// `{ a, b, c }` only.
    Positional,
    /// `{ .x=a, .y=b }` only.
    Designated,
    /// Both, selected at build time with `RBG_POSITIONAL_INIT`.
    #[default]
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub sheet: String,
    /// Turn any error diagnostic into a failed compile.
    pub strict: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub init_style: InitStyle,
    /// Add a comment block listing effect slots.
    pub report_effects: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            init_style: InitStyle::Both,
            report_effects: true,
        }
    }
}

/// Contents of `rbg.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheet: String,
    pub strict: bool,
    pub init_style: InitStyle,
    pub report_effects: bool,
}

impl Default for Config {
    fn default() -> Self {
        let compile = CompileOptions::default();
        let emit = EmitOptions::default();
        Self {
            sheet: compile.sheet,
            strict: compile.strict,
            init_style: emit.init_style,
            report_effects: emit.report_effects,
        }
    }
}

impl Config {
    /// Parse config text.
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on malformed TOML or unknown values.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file.
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read, or any parse error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text)?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            sheet: self.sheet.clone(),
            strict: self.strict,
        }
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            init_style: self.init_style,
            report_effects: self.report_effects,
        }
    }
}
