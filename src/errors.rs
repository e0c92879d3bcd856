use thiserror::Error;

/// Classified failures for one fetch-then-render cycle.
///
/// Every kind is terminal for the cycle that raised it: the pipeline catches
/// it at the top of the initiating action, writes the view's error area and
/// logs the request context. Nothing here triggers a retry.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A required parameter is absent or blank. Blocks the cycle before any
    /// fetch is attempted.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// A fetch came back non-2xx, or a static input file does not exist.
    /// Expected for dates with no collected data.
    #[error("resource not found: {location} (status {status})")]
    ResourceNotFound { location: String, status: u16 },

    /// The body was not valid JSON, or valid JSON of the wrong shape.
    /// Deliberately distinct from `ResourceNotFound`.
    #[error("malformed response from {location}: {detail}")]
    MalformedResponse { location: String, detail: String },

    /// Zero bars survived date filtering. Data collection may simply not
    /// have run for this date; distinct from a fetch failure.
    #[error("no trading data for {0}")]
    EmptySeries(String),

    /// Bars were present but every one was skipped or carried zero volume.
    #[error("total volume is zero across {bars} bars")]
    ZeroVolume { bars: usize },

    /// The API answered 2xx but embedded an error envelope in the body.
    #[error("upstream API error {code}: {message}")]
    UpstreamApi { code: String, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
