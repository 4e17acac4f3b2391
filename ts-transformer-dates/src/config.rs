use crate::error::{Result, TransformerError};
use crate::utils::{is_identifier, settle_path};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MARKER_FUNCTION: &str = "toDates";
pub const DEFAULT_RUNTIME_MODULE: &str = "ts-transformer-dates";
pub const DEFAULT_RUNTIME_FUNCTION: &str = "toDatesByArray";
pub const DEFAULT_BINDING_PREFIX: &str = "transformerDates";
pub const DEFAULT_TIMESTAMP_TYPE: &str = "Date";

/// Main configuration structure, usually read from `ts-transformer-dates.toml`.
///
/// ```toml
/// [marker]
/// implementation = "node_modules/ts-transformer-dates/index.js"
/// declaration = "node_modules/ts-transformer-dates/index.d.ts"
///
/// [runtime]
/// binding_prefix = "transformerDates"
///
/// [types]
/// timestamp = "Date"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub marker: MarkerIdentity,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub types: TypesConfig,
}

/// Identity of the marker module and function, compared by path, never by
/// the local name a file imports it under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerIdentity {
    /// Runtime artifact an import must resolve to (`index.js`).
    pub implementation: PathBuf,
    /// Declaration artifact the marker function is declared in (`index.d.ts`).
    pub declaration: PathBuf,
    #[serde(default = "default_marker_function")]
    pub function: String,
}

/// Runtime support module the rewritten calls load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_runtime_module")]
    pub module: String,

    #[serde(default = "default_runtime_function")]
    pub function: String,

    /// Prefix of the generated per-unit binding (`<prefix>_<n>`).
    #[serde(default = "default_binding_prefix")]
    pub binding_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypesConfig {
    /// Stringified type name that marks a timestamp field.
    #[serde(default = "default_timestamp_type")]
    pub timestamp: String,
}

fn default_marker_function() -> String {
    DEFAULT_MARKER_FUNCTION.to_string()
}

fn default_runtime_module() -> String {
    DEFAULT_RUNTIME_MODULE.to_string()
}

fn default_runtime_function() -> String {
    DEFAULT_RUNTIME_FUNCTION.to_string()
}

fn default_binding_prefix() -> String {
    DEFAULT_BINDING_PREFIX.to_string()
}

fn default_timestamp_type() -> String {
    DEFAULT_TIMESTAMP_TYPE.to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            module: default_runtime_module(),
            function: default_runtime_function(),
            binding_prefix: default_binding_prefix(),
        }
    }
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            timestamp: default_timestamp_type(),
        }
    }
}

impl MarkerIdentity {
    /// Paths that exist are stored canonicalized, so a package reached
    /// through a symlink has the same identity as its real location.
    pub fn new(implementation: impl Into<PathBuf>, declaration: impl Into<PathBuf>) -> Self {
        Self {
            implementation: settle_path(&implementation.into()),
            declaration: settle_path(&declaration.into()),
            function: default_marker_function(),
        }
    }

    /// Marker shipped as `index.js` + `index.d.ts` inside `dir`.
    pub fn from_package_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("index.js"), dir.join("index.d.ts"))
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    fn anchor(&mut self, base_dir: &Path) {
        self.implementation = anchor_path(base_dir, &self.implementation);
        self.declaration = anchor_path(base_dir, &self.declaration);
    }
}

fn anchor_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        settle_path(path)
    } else {
        settle_path(&base_dir.join(path))
    }
}

impl TransformConfig {
    pub fn new(marker: MarkerIdentity) -> Self {
        Self {
            marker,
            runtime: RuntimeConfig::default(),
            types: TypesConfig::default(),
        }
    }

    pub fn for_package_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(MarkerIdentity::from_package_dir(dir))
    }

    /// Load configuration from a TOML file. Relative marker paths are
    /// resolved against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| TransformerError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&contents, base_dir)
    }

    /// Try to load config, returning None if the file doesn't exist
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn from_toml_str(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut config: TransformConfig = toml::from_str(contents)?;
        config.marker.anchor(base_dir);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("marker.function", &self.marker.function),
            ("runtime.module", &self.runtime.module),
            ("runtime.function", &self.runtime.function),
            ("types.timestamp", &self.types.timestamp),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(TransformerError::InvalidConfig(format!(
                    "{} cannot be empty",
                    key
                )));
            }
        }

        if !is_identifier(&self.runtime.binding_prefix) {
            return Err(TransformerError::InvalidConfig(format!(
                "runtime.binding_prefix '{}' is not a valid identifier",
                self.runtime.binding_prefix
            )));
        }
        if !is_identifier(&self.runtime.function) {
            return Err(TransformerError::InvalidConfig(format!(
                "runtime.function '{}' is not a valid identifier",
                self.runtime.function
            )));
        }

        Ok(())
    }
}
