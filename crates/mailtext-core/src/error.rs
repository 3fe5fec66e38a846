use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Parse unavailable: {0}")]
    ParseUnavailable(String),
    #[error("Unknown charset: {0}")]
    UnknownCharset(String),
    #[error("Decode failure under {charset}")]
    DecodeFailure { charset: &'static str },
    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        ConvertError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ConvertError {
    fn from(err: toml::de::Error) -> Self {
        ConvertError::Config(err.to_string())
    }
}
