use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Content is malformed for the format. Raised only by the parse step.
    #[error("{message}")]
    Parse {
        format: &'static str,
        message: String,
        content: String,
    },

    #[error("invalid {format} query {query:?}: {reason}")]
    InvalidQuery {
        format: &'static str,
        query: String,
        reason: String,
    },

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("{0} is a method and takes arguments")]
    NotAProperty(String),

    #[error("{0} is not a method")]
    NotAMethod(String),

    #[error("member {name} failed: {message}")]
    Member { name: String, message: String },
}

impl Error {
    pub(crate) fn parse(format: &'static str, message: impl Into<String>, content: &str) -> Self {
        Self::Parse {
            format,
            message: message.into(),
            content: content.to_string(),
        }
    }

    pub(crate) fn invalid_query(
        format: &'static str,
        query: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidQuery {
            format,
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Build a member failure from any displayable error.
    pub fn member(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Member {
            name: name.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
