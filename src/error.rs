/// All errors that can occur while assembling an application.
///
/// Faults raised by handlers or teardown hooks while serving a request are
/// [`anyhow::Error`]s instead; the pipeline translates those into `500`
/// responses and they never cross the transport boundary as errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A route pattern binds the same parameter name more than once.
    #[error("route pattern {pattern:?} binds parameter {name:?} more than once")]
    DuplicateParam {
        /// The offending pattern.
        pattern: String,
        /// The parameter name that appears twice.
        name: String,
    },

    /// A route pattern contains a malformed segment, e.g. an unclosed or
    /// empty placeholder.
    #[error("route pattern {pattern:?} is malformed: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An HTTP method string could not be parsed.
    #[error("unknown HTTP method {0:?}")]
    UnknownMethod(String),

    /// Reading a configuration file failed.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Parsing a configuration file failed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
