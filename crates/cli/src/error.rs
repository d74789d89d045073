use engine_config::error::ConfigError;
use engine_runtime::error::JobError;
use store::error::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse the options file as a flat JSON string map: {0}")]
    ConfigDeserialize(#[from] serde_json::Error),

    #[error("Invalid row on line {line}: {source}")]
    RowParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to run the ingest job: {0}")]
    Job(#[from] JobError),

    #[error("Staging inspection failed: {0}")]
    Inspect(#[from] StoreError),
}
