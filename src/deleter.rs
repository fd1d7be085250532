use async_trait::async_trait;
use lapin::options::QueueDeleteOptions;
use lapin::{Channel, Connection, ConnectionProperties};
use std::fmt::Display;
use std::io::Write;
use tokio_executor_trait::Tokio as TokioExecutor;
use tokio_reactor_trait::Tokio as TokioReactor;
use tracing::{debug, info, warn};

use crate::error::Error;

/// Preconditions the broker checks before deleting a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteGuards {
    /// Refuse if the queue has consumers.
    pub if_unused: bool,
    /// Refuse if the queue has messages.
    pub if_empty: bool,
}

#[async_trait]
pub trait QueueDeleter {
    type Error: Display;

    async fn delete_queue(&mut self, name: &str, guards: DeleteGuards) -> Result<(), Self::Error>;
}

/// One AMQP connection with one channel, reopened when the broker closes it.
pub struct AmqpDeleter {
    connection: Connection,
    channel: Channel,
}

impl AmqpDeleter {
    /// Runs lapin's I/O on the caller's tokio runtime.
    pub async fn connect(uri: &str) -> Result<AmqpDeleter, lapin::Error> {
        let properties = ConnectionProperties::default()
            .with_executor(TokioExecutor::current())
            .with_reactor(TokioReactor);
        let connection = Connection::connect(uri, properties).await?;
        let channel = connection.create_channel().await?;
        debug!(channel = channel.id(), "opened channel");
        Ok(AmqpDeleter {
            connection,
            channel,
        })
    }

    pub async fn close(self) {
        if let Err(error) = self.connection.close(200, "OK").await {
            warn!(%error, "failed to close AMQP connection");
        }
    }
}

#[async_trait]
impl QueueDeleter for AmqpDeleter {
    type Error = lapin::Error;

    async fn delete_queue(&mut self, name: &str, guards: DeleteGuards) -> Result<(), lapin::Error> {
        // A failed guard or a missing queue is a channel exception: the
        // broker closes the channel and the next delete needs a new one.
        if !self.channel.status().connected() {
            self.channel = self.connection.create_channel().await?;
            debug!(channel = self.channel.id(), "reopened channel");
        }

        let messages = self
            .channel
            .queue_delete(
                name,
                QueueDeleteOptions {
                    if_unused: guards.if_unused,
                    if_empty: guards.if_empty,
                    nowait: false,
                },
            )
            .await?;
        debug!(queue = name, messages, "queue deleted");
        Ok(())
    }
}

/// Case-insensitive comparison of the leading characters of `name`.
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    let mut chars = name.chars();
    prefix.chars().all(|expected| {
        chars
            .next()
            .is_some_and(|actual| actual.to_lowercase().eq(expected.to_lowercase()))
    })
}

pub fn select_matching<'a>(names: &'a [String], prefix: &str) -> Vec<&'a str> {
    names
        .iter()
        .map(String::as_str)
        .filter(|name| matches_prefix(name, prefix))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deleted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub queue: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSummary {
    pub matched: usize,
    pub deleted: usize,
    pub outcomes: Vec<DeletionOutcome>,
}

impl DeletionSummary {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed(_)))
            .count()
    }
}

/// Deletes `queues` one at a time, in order. A failure is reported and the
/// loop moves on; nothing here aborts the run except a broken `out`.
pub async fn delete_queues<D, W>(
    deleter: &mut D,
    queues: &[&str],
    guards: DeleteGuards,
    out: &mut W,
) -> Result<DeletionSummary, Error>
where
    D: QueueDeleter + Send,
    W: Write,
{
    let mut summary = DeletionSummary {
        matched: queues.len(),
        ..DeletionSummary::default()
    };

    for &queue in queues {
        write!(out, "Deleting queue '{}'… ", queue)?;
        out.flush()?;

        let outcome = match deleter.delete_queue(queue, guards).await {
            Ok(()) => {
                summary.deleted += 1;
                writeln!(out, "OK ({} deleted)", summary.deleted)?;
                Outcome::Deleted
            }
            Err(error) => {
                let message = error.to_string();
                writeln!(out, "FAILED: {}", message)?;
                Outcome::Failed(message)
            }
        };

        summary.outcomes.push(DeletionOutcome {
            queue: queue.to_string(),
            outcome,
        });
    }

    info!(
        matched = summary.matched,
        deleted = summary.deleted,
        failed = summary.failed(),
        "deletion finished"
    );
    Ok(summary)
}
