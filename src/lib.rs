mod args;
mod deleter;
mod error;
mod lister;
pub mod logging;
mod retry;
mod settings;

pub use crate::args::Args;
pub use crate::deleter::{
    delete_queues, matches_prefix, select_matching, AmqpDeleter, DeleteGuards, DeletionOutcome,
    DeletionSummary, Outcome, QueueDeleter,
};
pub use crate::error::{Error, FetchError};
pub use crate::lister::{parse_queue_names, queues_url, QueueLister};
pub use crate::retry::{retry, Exhausted, RetryPolicy, Transient};
pub use crate::settings::{AmqpEndpoint, Credentials, ManagementEndpoint, Settings};

use std::io;
use tracing::info;

const DRY_RUN_PREFIX: &str = "[DRY RUN] ";

/// Fetches the queue list, then deletes every queue whose name starts with
/// the prefix. Per-queue failures are reported and do not fail the run.
pub async fn run(args: Args) -> Result<DeletionSummary, Box<dyn std::error::Error>> {
    let settings = Settings::from_args(args)?;

    let lister = QueueLister::new(
        &settings.management,
        settings.vhost.as_deref(),
        settings.http_timeout,
    )?;
    println!("Listing queues at '{}'", lister.url());
    let names = lister.list_queue_names(&settings.retry).await?;

    let matching = select_matching(&names, &settings.prefix);
    info!(
        listed = names.len(),
        matching = matching.len(),
        prefix = %settings.prefix,
        "collected queues"
    );

    if settings.dry_run {
        for queue in &matching {
            println!("{}Deleting queue '{}'", DRY_RUN_PREFIX, queue);
        }
        return Ok(DeletionSummary {
            matched: matching.len(),
            ..DeletionSummary::default()
        });
    }

    if matching.is_empty() {
        println!("No queues start with '{}'", settings.prefix);
        return Ok(DeletionSummary::default());
    }

    info!(
        host = %settings.amqp.host,
        port = settings.amqp.port,
        tls = settings.amqp.tls,
        vhost = %settings.amqp.vhost,
        "connecting to broker"
    );
    let mut deleter = AmqpDeleter::connect(&settings.amqp.uri()?)
        .await
        .map_err(Error::Amqp)?;

    let summary = delete_queues(&mut deleter, &matching, settings.guards, &mut io::stdout()).await?;
    deleter.close().await;

    println!(
        "Deleted {} of {} matching queues, {} failed",
        summary.deleted,
        summary.matched,
        summary.failed()
    );

    Ok(summary)
}
