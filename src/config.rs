use std::num::ParseIntError;
use std::time::Duration;

#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// Seconds to wait before retrying a resource that is in a transitional lifecycle state
    #[arg(
        long = "lifecycle-requeue",
        env = "EC2_LIFECYCLE_REQUEUE_SECONDS",
        value_name = "SECONDS",
        value_parser = parse_seconds,
        default_value = "5"
    )]
    pub lifecycle_requeue: Duration,

    /// Seconds to wait before retrying after a transient EC2 error
    #[arg(
        long = "error-requeue",
        env = "EC2_ERROR_REQUEUE_SECONDS",
        value_name = "SECONDS",
        value_parser = parse_seconds,
        default_value = "30"
    )]
    pub error_requeue: Duration,

    /// Deadline applied to each individual EC2 call
    #[arg(
        long = "api-call-timeout",
        env = "EC2_API_CALL_TIMEOUT_SECONDS",
        value_name = "SECONDS",
        value_parser = parse_seconds
    )]
    pub api_call_timeout: Option<Duration>,

    /// Maximum number of permissions sent in one authorize or revoke call
    #[arg(
        long = "rule-batch-size",
        env = "EC2_RULE_BATCH_SIZE",
        default_value_t = 1000
    )]
    pub rule_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lifecycle_requeue: Duration::from_secs(5),
            error_requeue: Duration::from_secs(30),
            api_call_timeout: None,
            rule_batch_size: 1000,
        }
    }
}

impl Config {
    pub(crate) fn requeue(&self, message: impl Into<String>) -> crate::Error {
        crate::Error::Requeue {
            message: message.into(),
            requeue_after: self.lifecycle_requeue,
        }
    }
}

fn parse_seconds(s: &str) -> Result<Duration, ParseIntError> {
    s.parse().map(Duration::from_secs)
}
