use thiserror::Error;

use crate::{
    config::MessageStyle,
    wire::{format_error_response, Response},
};

/// Broad classes of failure, each with a fixed HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something we can't act on.
    MalformedRequest,
    /// We couldn't get a handle to the counters table.
    StorageUnavailable,
    /// The increment call itself failed.
    StorageEngineFailure,
    /// The storage engine answered, but not with what we asked for.
    StorageContractViolation,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::MalformedRequest => 400,
            ErrorKind::StorageUnavailable
            | ErrorKind::StorageEngineFailure
            | ErrorKind::StorageContractViolation => 500,
        }
    }
}

/// Every way an increment can fail. The display text is the message sent
/// back to the caller.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Failed to parse body as JSON")]
    BodyNotJson,
    #[error("Unable to extract incrementBy value from body")]
    MissingIncrementBy,
    #[error("incrementBy must be an integer")]
    IncrementByNotInteger,
    #[error("Missing counterId in input path")]
    MissingCounterId,
    #[error("Failed getting the {table} table")]
    TableUnavailable {
        table: String,
        #[source]
        source: StoreError,
    },
    #[error("Failed to increment the counter")]
    IncrementFailed(#[source] StoreError),
    #[error("Unexpected storage response format")]
    UnexpectedResponseShape,
    #[error("Unexpected response status code {0} from storage")]
    UnexpectedStatus(u16),
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandlerError::BodyNotJson
            | HandlerError::MissingIncrementBy
            | HandlerError::IncrementByNotInteger
            | HandlerError::MissingCounterId => ErrorKind::MalformedRequest,
            HandlerError::TableUnavailable { .. } => ErrorKind::StorageUnavailable,
            HandlerError::IncrementFailed(_) => ErrorKind::StorageEngineFailure,
            HandlerError::UnexpectedResponseShape | HandlerError::UnexpectedStatus(_) => {
                ErrorKind::StorageContractViolation
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// The message shown to the caller. [MessageStyle::Legacy] reproduces
    /// the texts older clients match on, including the inverted
    /// `incrementBy` hint.
    pub fn message(&self, style: MessageStyle) -> String {
        match (style, self) {
            (MessageStyle::Legacy, HandlerError::IncrementByNotInteger) => {
                "incrementBy must be a string".into()
            }
            (MessageStyle::Legacy, HandlerError::TableUnavailable { .. }) => {
                "Failed getting the dynamoDB table".into()
            }
            (MessageStyle::Legacy, HandlerError::UnexpectedResponseShape) => {
                "Response from DynamoDB was in an unexpected format".into()
            }
            (MessageStyle::Legacy, HandlerError::UnexpectedStatus(code)) => {
                format!("Unexpected response status code {code} from Dynamo")
            }
            _ => self.to_string(),
        }
    }

    pub fn into_response(self, style: MessageStyle) -> Response {
        format_error_response(self.status_code(), &self.message(style))
    }
}

/// Failures reported by a storage engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("table {0} does not exist")]
    TableNotFound(String),
    #[error("storage engine unreachable: {0}")]
    Unreachable(String),
    #[error("update rejected: {0}")]
    Rejected(String),
}
