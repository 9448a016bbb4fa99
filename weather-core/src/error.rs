use thiserror::Error;

/// Every way a pipeline run can end without a snapshot.
///
/// Transport errors are flattened into `NetworkFailure` before they reach a
/// caller, so consumers only ever match on these three cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("no location matches '{0}'")]
    LocationNotFound(String),
    #[error("weather provider request failed: {0}")]
    NetworkFailure(String),
}

impl PipelineError {
    /// Wrap a provider error, keeping the whole context chain.
    pub fn network(err: &anyhow::Error) -> Self {
        PipelineError::NetworkFailure(format!("{err:#}"))
    }

    /// Text meant for the person who typed the query.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::EmptyQuery => "Please enter a city name.",
            PipelineError::LocationNotFound(_) => "City not found.",
            PipelineError::NetworkFailure(_) => "Fetch failed. Please try again.",
        }
    }

    pub fn is_user_actionable(&self) -> bool {
        !matches!(self, PipelineError::NetworkFailure(_))
    }
}
