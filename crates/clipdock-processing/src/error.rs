/// Errors from the external probe and remux tools
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Malformed probe output: {0}")]
    MalformedOutput(String),

    #[error("No stream with pixel dimensions found")]
    NoVideoStream,

    #[error("Remux produced an empty output file")]
    EmptyOutput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
