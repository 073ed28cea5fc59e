// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Admin broadcasts to subscribed Telegram chats.
//!
//! Messages go out in fixed-size batches with a pause between batches to stay
//! under the Bot API rate limit.

pub mod telegram;

use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

pub use telegram::TelegramNotifier;

/// Chats per batch.
pub const BROADCAST_BATCH_SIZE: usize = 25;

/// Pause between batches.
pub const BROADCAST_BATCH_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Telegram rejected the message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Delivers one message to one chat.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), NotifyError>;
}

/// Delivery counts of a broadcast.
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Send `text` to every chat in `chat_ids`.
///
/// Failures are counted and logged; they never stop the broadcast.
pub async fn broadcast(
    notifier: &dyn Notifier,
    chat_ids: &[i64],
    text: &str,
    batch_size: usize,
    delay: Duration,
) -> BroadcastSummary {
    let mut summary = BroadcastSummary {
        total: chat_ids.len(),
        ..Default::default()
    };

    for (index, batch) in chat_ids.chunks(batch_size.max(1)).enumerate() {
        if index > 0 {
            tokio::time::sleep(delay).await;
        }
        for &chat_id in batch {
            match notifier.send(chat_id, text).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    tracing::warn!(chat_id, error = %e, "Broadcast delivery failed");
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}
