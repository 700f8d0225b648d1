use std::env;

/// Which wording to use for error messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageStyle {
    #[default]
    Corrected,
    /// Byte-for-byte texts from the first deployment of this endpoint.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Name of the table holding the counters.
    pub table: String,
    /// Primary key attribute of a counter record.
    pub key_attribute: String,
    /// Numeric attribute that gets incremented.
    pub count_attribute: String,
    /// Status code the storage engine reports for a successful update.
    pub success_status: u16,
    pub messages: MessageStyle,
}

pub const DEFAULT_TABLE: &str = "counters";
pub const DEFAULT_KEY_ATTRIBUTE: &str = "counterId";
pub const DEFAULT_COUNT_ATTRIBUTE: &str = "theCount";

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.into(),
            key_attribute: DEFAULT_KEY_ATTRIBUTE.into(),
            count_attribute: DEFAULT_COUNT_ATTRIBUTE.into(),
            success_status: 200,
            messages: MessageStyle::Corrected,
        }
    }
}

impl HandlerConfig {
    /// Read overrides from `COUNTER_*` environment variables, falling back
    /// to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            table: env_string("COUNTER_TABLE_NAME", defaults.table),
            key_attribute: env_string("COUNTER_KEY_ATTRIBUTE", defaults.key_attribute),
            count_attribute: env_string("COUNTER_COUNT_ATTRIBUTE", defaults.count_attribute),
            success_status: defaults.success_status,
            messages: if env_bool("COUNTER_LEGACY_MESSAGES", false) {
                MessageStyle::Legacy
            } else {
                MessageStyle::Corrected
            },
        }
    }

    pub fn with_messages(mut self, messages: MessageStyle) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.into();
        self
    }
}

pub fn env_string(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

pub fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

pub fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}
