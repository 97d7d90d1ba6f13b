use crate::error::RestError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

pub const MAX_ATTEMPTS: usize = 60;
pub const RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// A finished HTTP exchange.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Outcome of a single request attempt.
#[derive(Debug)]
pub enum Attempt {
    /// The request never produced a complete response.
    Failed(String),
    Replied(Reply),
}

#[derive(Debug, Clone, Copy)]
pub struct Poller {
    pub max_attempts: usize,
    pub interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            interval: RETRY_INTERVAL,
        }
    }
}

impl Poller {
    /// Drive `send` until it yields a 200 reply, a terminal status, or the
    /// attempt ceiling is reached.
    pub async fn run<F, Fut>(&self, target: &str, mut send: F) -> Result<Reply, RestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt>,
    {
        for attempt in 1..=self.max_attempts {
            match send().await {
                Attempt::Replied(reply) if reply.status == 200 => return Ok(reply),
                Attempt::Replied(reply) if reply.status == 202 => {
                    debug!("{target} returned 202 (attempt {attempt}), waiting to retry");
                }
                Attempt::Replied(reply) => {
                    return Err(RestError::UnexpectedStatus {
                        status: reply.status,
                        target: target.to_string(),
                        body: reply.body,
                    });
                }
                Attempt::Failed(reason) => {
                    warn!("Request to {target} failed (attempt {attempt}): {reason}");
                }
            }

            if attempt < self.max_attempts {
                sleep(self.interval).await;
            }
        }

        Err(RestError::TooManyPending {
            target: target.to_string(),
            attempts: self.max_attempts,
        })
    }
}
