use thiserror::Error;

/// Failure pulling coin data from the exchange.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("exchange rejected request: {0}")]
    Rejected(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Failure writing to or reading from the snapshot sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Metric is undefined for the given inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EconomicsError {
    #[error("release is zero")]
    ZeroRelease,

    #[error("utilization rate is zero")]
    ZeroRate,

    #[error("invalid projection range")]
    InvalidRange,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
