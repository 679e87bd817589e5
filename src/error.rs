//! Error type shared by the facade, the renderer collaborators and the configuration layer.

use std::fmt;
use std::io;

/// Errors surfaced by [`RenderFacade`](crate::facade::RenderFacade) and its collaborators.
///
/// Rendering and writing are one-shot operations; nothing in the crate retries on failure and a
/// failed output gives no guarantees about partially written files.
#[derive(Debug)]
pub enum FacadeError {
    /// A value of the wrong concrete type was assigned to a typed slot such as `renderer`.
    ConfigurationType {
        /// Configuration key that rejected the value.
        key: String,
        /// Type the slot accepts.
        expected: &'static str,
        /// Description of the value that was supplied.
        found: String,
    },
    /// A pass-through call named an operation the renderer does not expose.
    UnknownOperation(String),
    /// A configuration value could not be coerced to the option's type.
    InvalidValue {
        /// Configuration key being set.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// Reading markup/CSS or writing the output file failed.
    Io(io::Error),
    /// The genpdf layout engine reported an error.
    Render(genpdf::error::Error),
    /// The rendered PDF could not be post-processed.
    Pdf(lopdf::Error),
    /// A markup template failed to render.
    Template(minijinja::Error),
    /// A configuration file could not be parsed.
    Config(toml::de::Error),
    /// No usable font family could be located.
    Font(String),
}

impl FacadeError {
    pub(crate) fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FacadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationType {
                key,
                expected,
                found,
            } => write!(
                f,
                "Configuration key '{}' expects a value of type {}, found {}",
                key, expected, found
            ),
            Self::UnknownOperation(name) => {
                write!(f, "Renderer does not expose an operation named '{name}'")
            }
            Self::InvalidValue { key, reason } => {
                write!(f, "Invalid value for configuration key '{key}': {reason}")
            }
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Render(err) => write!(f, "Failed to render PDF: {err}"),
            Self::Pdf(err) => write!(f, "Failed to post-process PDF: {err}"),
            Self::Template(err) => write!(f, "Failed to render template: {err}"),
            Self::Config(err) => write!(f, "Failed to parse configuration: {err}"),
            Self::Font(message) => write!(f, "Font error: {message}"),
        }
    }
}

impl std::error::Error for FacadeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Pdf(err) => Some(err),
            Self::Template(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::ConfigurationType { .. }
            | Self::UnknownOperation(_)
            | Self::InvalidValue { .. }
            | Self::Font(_) => None,
        }
    }
}

impl From<io::Error> for FacadeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<genpdf::error::Error> for FacadeError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }
}

impl From<lopdf::Error> for FacadeError {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf(err)
    }
}

impl From<minijinja::Error> for FacadeError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err)
    }
}

impl From<toml::de::Error> for FacadeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = FacadeError> = std::result::Result<T, E>;
