//! Error types for reference assets, configuration and data integrity.

use std::path::PathBuf;
use thiserror::Error;

/// Common trait for coded errors.
///
/// Every error surfaced by the BallNet crates carries a stable code (e.g.
/// "ASSET_003"), a human-readable message and a category. The CLI uses these
/// to produce machine-readable diagnostics.
///
/// # Example
///
/// ```ignore
/// use ballnet_core::error::CodedError;
///
/// fn report<E: CodedError>(err: E) {
///     eprintln!("[{}] {}", err.code(), err.message());
/// }
/// ```
pub trait CodedError: std::error::Error {
    /// Get the stable error code for reporting.
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the error category ("asset", "config", "integrity", ...).
    fn category(&self) -> &'static str;
}

/// Result type for asset loading.
pub type AssetResult<T> = Result<T, AssetError>;

/// Errors raised while reading the reference geometry of a body variant.
///
/// These are configuration faults: they disable the affected variant.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Asset file could not be opened or read.
    #[error("Failed to read asset file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be parsed.
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// A record had the wrong number of columns.
    #[error("{path}:{line}: expected {expected} column(s), found {found}")]
    ColumnCount {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// An index was smaller than the file's index base.
    #[error("{path}:{line}: index {value} is below the index base {base}")]
    BelowIndexBase {
        path: PathBuf,
        line: u64,
        value: i64,
        base: u32,
    },

    /// The file contained no records.
    #[error("Asset file {path} contains no records")]
    Empty { path: PathBuf },

    /// The loaded asset is internally inconsistent.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl AssetError {
    /// Creates a new parse error.
    pub fn parse(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

impl CodedError for AssetError {
    fn code(&self) -> &'static str {
        match self {
            AssetError::Read { .. } => "ASSET_001",
            AssetError::Parse { .. } => "ASSET_002",
            AssetError::ColumnCount { .. } => "ASSET_003",
            AssetError::BelowIndexBase { .. } => "ASSET_004",
            AssetError::Empty { .. } => "ASSET_005",
            AssetError::Integrity(e) => e.code(),
        }
    }

    fn category(&self) -> &'static str {
        "asset"
    }
}

/// Which index sequence of a topology an integrity error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// A triangle vertex index.
    Face,
    /// A deformable-node index.
    DeformNode,
}

impl IndexKind {
    /// Returns the string identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Face => "face",
            IndexKind::DeformNode => "deformable-node",
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type for integrity checks.
pub type IntegrityResult<T> = Result<T, IntegrityError>;

/// Data-integrity faults.
///
/// These indicate a corrupt or mismatched asset pairing, never a transient
/// condition, and are never clamped or skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// An index points outside the vertex array.
    #[error("{kind} index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        kind: IndexKind,
        position: usize,
        index: usize,
        vertex_count: usize,
    },

    /// The reference geometry has no vertices.
    #[error("reference topology has no vertices")]
    NoVertices,

    /// Parallel arrays disagree in length.
    #[error("{what}: expected {expected} entries, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Too many vertices to address with 32-bit indices.
    #[error("{count} vertices exceed the 32-bit index range")]
    TooManyVertices { count: usize },
}

impl CodedError for IntegrityError {
    fn code(&self) -> &'static str {
        match self {
            IntegrityError::IndexOutOfRange { .. } => "INTEGRITY_001",
            IntegrityError::NoVertices => "INTEGRITY_002",
            IntegrityError::LengthMismatch { .. } => "INTEGRITY_003",
            IntegrityError::TooManyVertices { .. } => "INTEGRITY_004",
        }
    }

    fn category(&self) -> &'static str {
        "integrity"
    }
}

/// Result type for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration faults detected at initialization.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Color range bounds are equal, inverted or not finite.
    #[error("invalid color range [{min}, {max}]: {reason}")]
    InvalidColorRange { min: f32, max: f32, reason: String },

    /// Frame correction matrix is unusable.
    #[error("invalid frame correction matrix: {0}")]
    InvalidFrameCorrection(String),

    /// Colormap definition is unusable.
    #[error("invalid colormap: {0}")]
    InvalidColormap(String),

    /// Motion limits are unusable.
    #[error("invalid motion limits: {0}")]
    InvalidMotionLimits(String),

    /// Failed to read the manifest file.
    #[error("Failed to read manifest {path}: {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse manifest JSON.
    #[error("Failed to parse manifest {path}: {source}")]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest declares no variants.
    #[error("manifest declares no variants")]
    NoVariants,

    /// Two variants share a name.
    #[error("duplicate variant name '{0}'")]
    DuplicateVariant(String),
}

impl ConfigError {
    /// Creates a new invalid color range error.
    pub fn color_range(min: f32, max: f32, reason: impl Into<String>) -> Self {
        Self::InvalidColorRange {
            min,
            max,
            reason: reason.into(),
        }
    }
}

impl CodedError for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            ConfigError::InvalidColorRange { .. } => "CONFIG_001",
            ConfigError::InvalidFrameCorrection(_) => "CONFIG_002",
            ConfigError::InvalidColormap(_) => "CONFIG_003",
            ConfigError::InvalidMotionLimits(_) => "CONFIG_004",
            ConfigError::ReadManifest { .. } => "CONFIG_005",
            ConfigError::ParseManifest { .. } => "CONFIG_006",
            ConfigError::NoVariants => "CONFIG_007",
            ConfigError::DuplicateVariant(_) => "CONFIG_008",
        }
    }

    fn category(&self) -> &'static str {
        "config"
    }
}

/// Result type for motion parsing.
pub type MotionResult<T> = Result<T, MotionError>;

/// Input contract violations for motion commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    /// Motion vector did not have exactly six components.
    #[error("motion must have exactly 6 components (dx, dy, dz, rx, ry, rz), got {0}")]
    WrongArity(usize),

    /// A component was NaN or infinite.
    #[error("motion component '{name}' is not finite: {value}")]
    NonFinite { name: &'static str, value: f64 },

    /// A component could not be parsed from text.
    #[error("motion component {position} is not a number: '{text}'")]
    NotANumber { position: usize, text: String },
}

impl CodedError for MotionError {
    fn code(&self) -> &'static str {
        match self {
            MotionError::WrongArity(_) => "MOTION_001",
            MotionError::NonFinite { .. } => "MOTION_002",
            MotionError::NotANumber { .. } => "MOTION_003",
        }
    }

    fn category(&self) -> &'static str {
        "motion"
    }
}
