use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::{mpsc, Notify},
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    chat::{ChatError, ChatInterface, ChatMessage, ChatResult},
    config::BotConfig,
};

/// Queries the chat service at a fixed rate and forwards new messages.
///
/// Transient failures are logged and retried on the next tick. A fatal
/// failure ends the loop with that error.
pub struct MessagePoller {
    chat: Arc<dyn ChatInterface>,
    initial_delay: Duration,
    query_interval: Duration,
    running: AtomicBool,
    shutdown: Notify,
}

impl MessagePoller {
    pub fn new(chat: Arc<dyn ChatInterface>, config: &BotConfig) -> Self {
        Self {
            chat,
            initial_delay: config.initial_delay,
            query_interval: config.query_interval,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs until stopped, until `sender` has no receiver, or until a fatal
    /// error. The sender is dropped on return, which closes the channel.
    pub async fn run(&self, sender: mpsc::Sender<ChatMessage>) -> ChatResult<()> {
        self.running.store(true, Ordering::SeqCst);
        let result = self.query_loop(&sender).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    pub fn stop(&self) {
        debug!("querying loop stopping");
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    async fn query_loop(&self, sender: &mpsc::Sender<ChatMessage>) -> ChatResult<()> {
        let mut timer =
            tokio::time::interval_at(Instant::now() + self.initial_delay, self.query_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("querying loop started");

        while self.is_running() {
            tokio::select! {
                _ = timer.tick() => {}
                _ = self.shutdown.notified() => break,
            }

            match self.chat.query_messages().await {
                Ok(messages) => {
                    for message in messages {
                        if sender.send(message).await.is_err() {
                            debug!("message receiver dropped");
                            return Ok(());
                        }
                    }
                }
                Err(ChatError::Closed) => {
                    info!("chat closed, querying loop ends");
                    return Ok(());
                }
                Err(e) if e.is_transient() => {
                    warn!("Exception occurred in querying loop: {}", e);
                }
                Err(e) => {
                    error!("Unrecoverable error in querying loop: {}", e);
                    return Err(e);
                }
            }
        }

        info!("querying loop stopped");
        Ok(())
    }
}
