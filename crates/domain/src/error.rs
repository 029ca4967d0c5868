use apiconnector_core::AppError;
use thiserror::Error;

/// Rejections raised while binding or interpreting a call descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The `source` discriminator names no known request phase.
    #[error("Source of type '{0}' is not supported.")]
    UnsupportedSource(String),

    /// The `auth.type` discriminator names no known strategy.
    #[error("Authentication type of '{0}' is not supported.")]
    UnsupportedAuthType(String),

    /// The request method is outside the supported verb set.
    #[error("HTTP Method '{0}' is not supported.")]
    UnsupportedMethod(String),

    /// A required property is absent or empty.
    #[error("Missing property: '{0}'")]
    MissingProperty(String),

    /// A resolved secret payload is not a JSON object.
    #[error("Secret payload must be a JSON object")]
    MalformedSecret,

    /// A positional argument tuple is shorter than the call signature.
    #[error(
        "Unable to parse warehouse call arguments. Are there missing parameters? \
         expected {expected} arguments, got {actual}"
    )]
    MissingArguments {
        /// Arguments in the call signature.
        expected: usize,
        /// Arguments received.
        actual: usize,
    },

    /// A positional argument tuple is not a JSON array.
    #[error("Unable to parse warehouse call arguments. Expected an array, got {0}")]
    MalformedArguments(String),
}

impl DescriptorError {
    /// Builds a missing-property rejection.
    #[must_use]
    pub fn missing(property: impl Into<String>) -> Self {
        Self::MissingProperty(property.into())
    }
}

impl From<DescriptorError> for AppError {
    fn from(value: DescriptorError) -> Self {
        AppError::Validation(value.to_string())
    }
}
