use thiserror::Error;

/// Failures that abort a routing call before any search runs.
///
/// A net that simply has no path is not an error; it is reported in
/// `RouteResult::errors` and the batch carries on.
#[derive(Debug, Error, PartialEq)]
pub enum RoutingError {
    #[error("invalid routing configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("net {net}: unknown cell '{cell}'")]
    UnknownCell { net: String, cell: String },
    #[error("net {net}: cell '{cell}' has no pin '{pin}'")]
    UnknownPin {
        net: String,
        cell: String,
        pin: String,
    },
    #[error("net {net}: layer '{layer}' is not a routing layer")]
    UnknownLayer { net: String, layer: String },
    #[error("routing cancelled")]
    Cancelled,
}
