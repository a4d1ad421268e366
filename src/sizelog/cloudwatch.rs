//! CloudWatch Logs backed `LogSource`.
use async_trait::async_trait;
use rusoto_logs::{CloudWatchLogs, CloudWatchLogsClient, FilterLogEventsRequest};

use std::collections::VecDeque;

use super::resolver::{LogSource, LookupFailure};

/// Most `FilterLogEvents` pages read for a single lookup.
pub const MAX_PAGES: usize = 5;

/// Searches a log group for size records by object name.
pub struct CloudWatchSource {
    client: CloudWatchLogsClient,
    log_group: String,
}

impl CloudWatchSource {
    /// Constructs a new `CloudWatchSource` over the named log group.
    pub fn new(client: CloudWatchLogsClient, log_group: String) -> Self {
        Self { client, log_group }
    }
}

#[async_trait]
impl LogSource for CloudWatchSource {
    async fn recent(&self, object_name: &str, limit: usize) -> Result<Vec<String>, LookupFailure> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut trailing = VecDeque::with_capacity(limit);
        let mut token = None;

        // matches come back oldest first, so keep the tail of what is read
        for _ in 0..MAX_PAGES {
            let request = FilterLogEventsRequest {
                log_group_name: self.log_group.clone(),
                filter_pattern: Some(filter_pattern(object_name)),
                next_token: token.take(),
                ..FilterLogEventsRequest::default()
            };

            let response = self
                .client
                .filter_log_events(request)
                .await
                .map_err(|err| LookupFailure::Backend(err.to_string()))?;

            for event in response.events.unwrap_or_default() {
                if let Some(message) = event.message {
                    if trailing.len() == limit {
                        trailing.pop_front();
                    }
                    trailing.push_back(message);
                }
            }

            match response.next_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => return Ok(trailing.into_iter().collect()),
            }
        }

        debug!(
            "Stopped searching {} for {} after {} pages",
            self.log_group, object_name, MAX_PAGES
        );
        Ok(trailing.into_iter().collect())
    }
}

/// Builds a JSON filter pattern matching records for an object name.
fn filter_pattern(object_name: &str) -> String {
    let escaped = object_name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{{ $.object_name = \"{}\" }}", escaped)
}
