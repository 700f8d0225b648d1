use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, span, warn, Instrument, Level};

use crate::{
    config::HandlerConfig,
    error::HandlerError,
    store::{Key, StorageEngine},
    wire::{Request, Response},
};

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Anything that turns a trigger [Request] into a [Response]. Hosts (the
/// local HTTP service, tests) only see this trait.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one request. Failures are reported in the response, never
    /// returned.
    async fn handle(&self, request: &Request) -> Response;
}

/// A validated increment, ready to send to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementCommand {
    pub counter_id: String,
    pub increment_by: i64,
}

impl IncrementCommand {
    /// Validate a request. Checks run in order and the first failure wins:
    /// body, `incrementBy`, then `counterId`.
    pub fn from_request(request: &Request) -> HandlerResult<Self> {
        let body: Value = request
            .body
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .ok_or(HandlerError::BodyNotJson)?;

        let raw_increment = body
            .as_object()
            .and_then(|fields| fields.get("incrementBy"))
            .ok_or(HandlerError::MissingIncrementBy)?;

        let increment_by =
            coerce_integer(raw_increment).ok_or(HandlerError::IncrementByNotInteger)?;

        let counter_id = request
            .path_parameter("counterId")
            .filter(|id| !id.is_empty())
            .ok_or(HandlerError::MissingCounterId)?;

        Ok(Self {
            counter_id: counter_id.into(),
            increment_by,
        })
    }
}

/// Interpret a JSON value as an integer. Integral numbers and strings
/// holding a base-10 integer are accepted; everything else is not.
///
/// Fractional numbers are rejected rather than truncated (`2.5` is not 2),
/// and booleans are rejected rather than read as 0 or 1, so a caller can
/// never apply an increment it didn't spell out.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            // the upper bound is exclusive: i64::MAX rounds up to 2^63 as f64
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            (f.fract() == 0.0 && in_range).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Increments a counter in the configured table and reports its new value.
pub struct IncrementHandler {
    engine: Arc<dyn StorageEngine>,
    config: HandlerConfig,
}

impl IncrementHandler {
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self::with_config(engine, HandlerConfig::default())
    }

    pub fn with_config(engine: Arc<dyn StorageEngine>, config: HandlerConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Validate, increment and shape the response.
    pub async fn handle(&self, request: &Request) -> Response {
        let command = match IncrementCommand::from_request(request) {
            Ok(command) => command,
            Err(e) => return self.fail(e),
        };

        let span = span!(
            Level::DEBUG,
            "increment",
            counter_id = %command.counter_id,
            increment_by = command.increment_by
        );
        match self.increment(&command).instrument(span).await {
            Ok(count) => Response::created(count),
            Err(e) => self.fail(e),
        }
    }

    /// Run a validated command against storage and return the updated count.
    pub async fn increment(&self, command: &IncrementCommand) -> HandlerResult<i64> {
        debug!("Opening table {}", self.config.table);
        let table = self
            .engine
            .table(&self.config.table)
            .await
            .map_err(|source| HandlerError::TableUnavailable {
                table: self.config.table.clone(),
                source,
            })?;

        let key = Key::new(&self.config.key_attribute, &command.counter_id);
        debug!("Sending increment to storage");
        let output = table
            .atomic_increment(&key, &self.config.count_attribute, command.increment_by)
            .await
            .map_err(HandlerError::IncrementFailed)?;

        let (status, count) = match (
            output.status_code(),
            output.updated_value(&self.config.count_attribute),
        ) {
            (Some(status), Some(count)) => (status, count),
            _ => return Err(HandlerError::UnexpectedResponseShape),
        };

        if status != self.config.success_status {
            return Err(HandlerError::UnexpectedStatus(status));
        }

        debug!("Counter is now {count}");
        Ok(count)
    }

    fn fail(&self, e: HandlerError) -> Response {
        if e.status_code() >= 500 {
            match std::error::Error::source(&e) {
                Some(cause) => error!("Increment failed: {e} ({cause})"),
                None => error!("Increment failed: {e}"),
            }
        } else {
            warn!("Rejected increment request: {e}");
        }
        e.into_response(self.config.messages)
    }
}

#[async_trait]
impl Handler for IncrementHandler {
    async fn handle(&self, request: &Request) -> Response {
        IncrementHandler::handle(self, request).await
    }
}
