use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostdropError {
    #[error("Configuration incomplete: {0}")]
    Config(String),

    #[error("Failed to encode front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, PostdropError>;
