use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};

use carecrew_model::ModelProviderError;

/// The kind of error that stopped a crew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A task template names an input that was not supplied.
    MissingInput,
    /// The crew definition is inconsistent.
    InvalidCrew,
    /// The model provider failed.
    Model,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingInput => write!(f, "Missing input"),
            ErrorKind::InvalidCrew => write!(f, "Invalid crew"),
            ErrorKind::Model => write!(f, "Model error"),
        }
    }
}

/// Error returned by crew construction and kickoff.
pub struct Error {
    kind: ErrorKind,
    message: String,
    model_error: Option<Box<dyn ModelProviderError>>,
}

impl Error {
    pub(crate) fn missing_input(name: &str) -> Self {
        Self {
            kind: ErrorKind::MissingInput,
            message: format!("no input named `{name}` was provided"),
            model_error: None,
        }
    }

    pub(crate) fn invalid_crew(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidCrew,
            message: message.into(),
            model_error: None,
        }
    }

    pub(crate) fn model(
        task: &str,
        model_error: Box<dyn ModelProviderError>,
    ) -> Self {
        Self {
            kind: ErrorKind::Model,
            message: format!("model request failed while {task}: {model_error}"),
            model_error: Some(model_error),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The provider's own error kind, for [`ErrorKind::Model`] errors.
    #[inline]
    pub fn model_error_kind(&self) -> Option<carecrew_model::ErrorKind> {
        self.model_error.as_ref().map(|err| err.kind())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.model_error
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}
