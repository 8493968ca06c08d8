use serde::{Deserialize, Serialize};

/// Configuration for the events_info module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsInfoConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_max_user_name_length")]
    pub max_user_name_length: usize,
    /// chrono format used for calendar dates in rendered history.
    #[serde(default = "default_history_date_format")]
    pub history_date_format: String,
    /// chrono format used for the `updatedAt` stamp of rendered history.
    #[serde(default = "default_history_timestamp_format")]
    pub history_timestamp_format: String,
}

impl Default for EventsInfoConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_user_name_length: default_max_user_name_length(),
            history_date_format: default_history_date_format(),
            history_timestamp_format: default_history_timestamp_format(),
        }
    }
}

fn default_page_size() -> u64 {
    50
}

fn default_max_page_size() -> u64 {
    1000
}

fn default_max_user_name_length() -> usize {
    100
}

fn default_history_date_format() -> String {
    "%-m/%-d/%Y".to_string()
}

fn default_history_timestamp_format() -> String {
    "%-m/%-d/%Y, %-I:%M:%S %p".to_string()
}
