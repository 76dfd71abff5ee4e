//! Command implementations.
//!
//! Each command drives the orchestrator and writes every backend response as
//! one JSON line. Commands that address an existing queue adopt it first,
//! since every invocation starts with an empty registry.

use crate::{CliError, Commands};
use chrono::Utc;
use redrive_runtime::attributes::MAX_VISIBILITY_TIMEOUT_SECONDS;
use redrive_runtime::{
    handler_fn, BatchEntry, HandlerError, Message, QueueAttributes, QueueName, QueueOrchestrator,
    QueueRecord, ReceiptHandle, ReceivedMessage, Timestamp,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

pub const DEMO_QUEUE: &str = "example_queue";
pub const DEMO_FIFO_QUEUE: &str = "example_fifo_queue.fifo";
pub const DEMO_DEAD_LETTER_QUEUE: &str = "example_dead_queue";
pub const DEMO_MAIN_QUEUE: &str = "main_queue";
pub const DEMO_MAX_RECEIVE_COUNT: u32 = 3;
const DEMO_BATCH_SIZE: usize = 4;

/// Write one JSON line
pub(crate) fn emit<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Execute a queue command
pub async fn execute<W: Write>(
    command: Commands,
    orchestrator: &QueueOrchestrator,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Commands::Demo { purge, keep_queues } => {
            run_demo(orchestrator, DemoOptions { purge, keep_queues }, out).await
        }
        Commands::Create {
            name,
            fifo,
            content_based_deduplication,
            visibility_timeout,
            dead_letter,
            max_receive_count,
        } => {
            let mut attributes = if fifo {
                QueueAttributes::fifo()
            } else {
                QueueAttributes::default()
            }
            .with_content_based_deduplication(content_based_deduplication);
            if let Some(seconds) = visibility_timeout {
                attributes = attributes.with_visibility_timeout(seconds);
            }

            let record = match dead_letter {
                Some(dead_letter) => {
                    orchestrator.adopt_queue(&dead_letter).await?;
                    orchestrator
                        .create_queue_with_dead_letter(
                            name,
                            attributes,
                            &dead_letter,
                            max_receive_count,
                        )
                        .await?
                }
                None => orchestrator.create_queue(name, attributes).await?,
            };
            emit(out, &json!({ "operation": "create_queue", "queue": record }))
        }
        Commands::Send {
            queue,
            body,
            attributes,
            delay,
            group_id,
            deduplication_id,
        } => {
            orchestrator.adopt_queue(&queue).await?;

            let mut message = attributes
                .into_iter()
                .fold(Message::new(body), |message, (key, value)| {
                    message.with_string_attribute(key, value)
                });
            if let Some(delay) = delay {
                message = message.with_delay_seconds(delay);
            }
            if let Some(group_id) = group_id {
                message = message.with_group_id(group_id);
            }
            if let Some(id) = deduplication_id {
                message = message.with_deduplication_id(id);
            }

            let message_id = orchestrator.send_single(&queue, &message).await?;
            emit(
                out,
                &json!({ "operation": "send_message", "queue": queue, "message_id": message_id }),
            )
        }
        Commands::Drain { queue, max } => {
            orchestrator.adopt_queue(&queue).await?;
            drain_and_print(orchestrator, &queue, max, out).await
        }
        Commands::Extend {
            queue,
            receipt,
            seconds,
        } => {
            orchestrator.adopt_queue(&queue).await?;

            // The deadline of a receipt given on the command line is unknown;
            // the backend decides whether it is still valid.
            let receipt = ReceiptHandle::new(
                receipt,
                Timestamp::now().plus_seconds(MAX_VISIBILITY_TIMEOUT_SECONDS),
            );
            let extended = orchestrator
                .extend_visibility(&queue, &receipt, seconds)
                .await?;
            emit(
                out,
                &json!({
                    "operation": "change_visibility",
                    "queue": queue,
                    "visibility_timeout_seconds": seconds,
                    "expires_at": extended.expires_at(),
                }),
            )
        }
        Commands::Purge { queue } => {
            orchestrator.adopt_queue(&queue).await?;
            orchestrator.purge(&queue).await?;
            emit(out, &json!({ "operation": "purge_queue", "queue": queue }))
        }
        Commands::Delete { queues } => {
            let mut adopted = Vec::with_capacity(queues.len());
            let mut results = BTreeMap::new();
            for queue in queues {
                match orchestrator.adopt_queue(&queue).await {
                    Ok(_) => adopted.push(queue),
                    Err(e) => {
                        results.insert(queue, Err(e));
                    }
                }
            }
            results.extend(orchestrator.delete_queues(&adopted).await);
            emit_deletions(&results, out)
        }
        Commands::Arn { queue } => {
            let record = orchestrator.adopt_queue(&queue).await?;
            emit(
                out,
                &json!({ "queue": record.name, "arn": record.arn, "handle": record.handle }),
            )
        }
        Commands::Config { .. } | Commands::Completions { .. } => Err(CliError::InvalidArgument {
            arg: "command".to_string(),
            message: "does not operate on queues".to_string(),
        }),
    }
}

/// Drain once, acknowledging every message, and print messages then the report
async fn drain_and_print<W: Write>(
    orchestrator: &QueueOrchestrator,
    queue: &QueueName,
    max: u32,
    out: &mut W,
) -> Result<(), CliError> {
    let processed: Mutex<Vec<ReceivedMessage>> = Mutex::new(Vec::new());
    let handler = handler_fn(|message: ReceivedMessage| {
        tracing::info!(
            message_id = %message.message_id,
            body = %message.body,
            "Processing message"
        );
        processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        async { Ok::<(), HandlerError>(()) }
    });

    let report = orchestrator.drain_once(queue, max, &handler).await?;

    let processed = processed.into_inner().unwrap_or_else(PoisonError::into_inner);
    for message in &processed {
        emit(out, &json!({ "operation": "receive_message", "message": message }))?;
    }
    emit(out, &json!({ "operation": "drain", "report": report }))
}

fn emit_deletions<W: Write>(
    results: &BTreeMap<QueueName, Result<(), redrive_runtime::QueueError>>,
    out: &mut W,
) -> Result<(), CliError> {
    let rendered: BTreeMap<&str, String> = results
        .iter()
        .map(|(name, result)| {
            let status = match result {
                Ok(()) => "deleted".to_string(),
                Err(e) => e.to_string(),
            };
            (name.as_str(), status)
        })
        .collect();
    emit(out, &json!({ "operation": "delete_queues", "results": rendered }))?;

    let failed = results.values().filter(|r| r.is_err()).count();
    if failed > 0 {
        return Err(CliError::CommandFailed {
            message: format!("{} of {} queues could not be deleted", failed, results.len()),
        });
    }
    Ok(())
}

// ============================================================================
// Demo
// ============================================================================

/// Options of the demo walk-through
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoOptions {
    pub purge: bool,
    pub keep_queues: bool,
}

/// The message sent by the demo, singly and as every batch entry
pub fn demo_message() -> Message {
    Message::new("This is my first SQS message!!! :D :D")
        .with_string_attribute("Title", "My example message")
        .with_string_attribute("Author", "Example Author")
        .with_string_attribute("Date", Utc::now().to_rfc3339())
}

/// Walk through the whole lifecycle
///
/// Creates a standard, a FIFO, a dead-letter and a main queue redriven to the
/// dead-letter queue, sends one message and a batch to the standard queue,
/// drains it once, optionally purges it, then deletes every queue it created.
/// Queues are deleted even when a step fails, unless `keep_queues` is set.
pub async fn run_demo<W: Write>(
    orchestrator: &QueueOrchestrator,
    options: DemoOptions,
    out: &mut W,
) -> Result<(), CliError> {
    let mut created = Vec::new();
    let result = demo_steps(orchestrator, options, &mut created, out).await;

    if options.keep_queues || created.is_empty() {
        return result;
    }

    let deletions = orchestrator.delete_queues(&created).await;
    let cleanup = emit_deletions(&deletions, out);
    result.and(cleanup)
}

async fn demo_steps<W: Write>(
    orchestrator: &QueueOrchestrator,
    options: DemoOptions,
    created: &mut Vec<QueueName>,
    out: &mut W,
) -> Result<(), CliError> {
    let standard = demo_name(DEMO_QUEUE)?;
    let fifo = demo_name(DEMO_FIFO_QUEUE)?;
    let dead_letter = demo_name(DEMO_DEAD_LETTER_QUEUE)?;
    let main = demo_name(DEMO_MAIN_QUEUE)?;

    let record = orchestrator
        .create_queue(standard.clone(), QueueAttributes::default())
        .await?;
    emit_created(created, record, out)?;

    let record = orchestrator
        .create_queue(fifo, QueueAttributes::fifo())
        .await?;
    emit_created(created, record, out)?;

    let record = orchestrator
        .create_queue(dead_letter.clone(), QueueAttributes::default())
        .await?;
    emit_created(created, record, out)?;

    let main_attributes = QueueAttributes::default()
        .with_delay_seconds(0)
        .with_max_message_size(262_144)
        .with_visibility_timeout(30)
        .with_message_retention(345_680)
        .with_receive_wait(0);
    let record = orchestrator
        .create_queue_with_dead_letter(
            main,
            main_attributes,
            &dead_letter,
            DEMO_MAX_RECEIVE_COUNT,
        )
        .await?;
    emit_created(created, record, out)?;

    let message = demo_message();
    let message_id = orchestrator.send_single(&standard, &message).await?;
    emit(
        out,
        &json!({ "operation": "send_message", "queue": standard, "message_id": message_id }),
    )?;

    let entries: Vec<BatchEntry> = (0..DEMO_BATCH_SIZE)
        .map(|_| BatchEntry::generated(message.clone()))
        .collect();
    let outcome = orchestrator.send_batch(&standard, &entries).await?;
    emit(
        out,
        &json!({ "operation": "send_message_batch", "queue": standard, "outcome": outcome }),
    )?;

    drain_and_print(orchestrator, &standard, 10, out).await?;

    if options.purge {
        orchestrator.purge(&standard).await?;
        emit(out, &json!({ "operation": "purge_queue", "queue": standard }))?;
    }

    Ok(())
}

fn emit_created<W: Write>(
    created: &mut Vec<QueueName>,
    record: QueueRecord,
    out: &mut W,
) -> Result<(), CliError> {
    created.push(record.name.clone());
    emit(out, &json!({ "operation": "create_queue", "queue": record }))
}

fn demo_name(raw: &str) -> Result<QueueName, CliError> {
    raw.parse().map_err(|e: redrive_runtime::ValidationError| CliError::InvalidArgument {
        arg: "queue_name".to_string(),
        message: e.to_string(),
    })
}
