use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextError {
    #[error("Reserved characters need {cost} characters of escaping, chunk limit is {limit}")]
    ExcessiveEscapeOverhead { cost: usize, limit: usize },

    #[error("Final chunk needs {cost} characters of escaping, elastic allowance is {elastic}")]
    ExcessiveFinalOverhead { cost: usize, elastic: usize },

    #[error("SSML string {0}")]
    MalformedMarkup(#[source] roxmltree::Error),

    #[error("Read SSML string failed: {0}")]
    MarkupReadFailure(String),

    #[error("<{tag}> is missing required attribute '{name}'")]
    MissingAttribute { tag: String, name: String },

    #[error("<{tag}> attribute '{name}' has invalid value '{value}'")]
    InvalidAttribute {
        tag: String,
        name: String,
        value: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Position {position} is out of range ({len} paragraphs)")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Unsupported file extension '{0}'")]
    UnsupportedFileExtension(String),

    #[error("Unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("Invalid chunk budget: {0}")]
    InvalidBudget(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, TextError>;
