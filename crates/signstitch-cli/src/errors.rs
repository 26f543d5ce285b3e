use signstitch_core::concat::ConcatError;
use signstitch_core::features::FeatureError;
use signstitch_core::pose::codec::CodecError;
use signstitch_core::pose::layout::LayoutError;
use thiserror::Error;

/// Errors that can occur while rendering a signed sentence
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("word '{0}' not found in the lexicon or on disk")]
    WordNotFound(String),

    #[error("invalid pose filename '{0}'")]
    InvalidFilename(String),

    #[error("output name '{0}' escapes the output directory")]
    InvalidOutputTarget(String),

    #[error("lexicon format error at line {line}: {message}")]
    LexiconFormat { line: usize, message: String },

    #[error("pose layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("pose decode error: {0}")]
    Codec(#[from] CodecError),

    #[error("feature extraction error: {0}")]
    Feature(#[from] FeatureError),

    #[error("concatenation error: {0}")]
    Concat(#[from] ConcatError),

    #[error("video encode error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
