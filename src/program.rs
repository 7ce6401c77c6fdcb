//! # Program
//!
//! Glues the components together. [`Program::startup`] runs the setup steps
//! in order:
//!
//! 1. Bind the core commands (commands subscribed earlier take precedence)
//! 2. Log in; a rejected login aborts startup
//! 3. Join every configured room
//! 4. Start the querying loop
//! 5. Start the bot
//!
//! Messages flow from the [`MessagePoller`] to the [`Bot`] over a bounded
//! channel. When the poller ends it drops its sender, and the bot finishes
//! once the remaining messages are handled. [`Program::shutdown`] leaves the
//! joined rooms once both have stopped.

use std::sync::Arc;

use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
};
use tracing::{error, info, warn};

use crate::{
    bot::Bot,
    chat::{ChatInterface, ChatResult, RoomDescriptor},
    command::{core_commands, CommandHandle, CommandRegistry},
    config::BotConfig,
    poller::MessagePoller,
    trigger::Trigger,
    Error, InternalResult,
};

struct Running {
    poller: Arc<MessagePoller>,
    poller_task: JoinHandle<ChatResult<()>>,
    bot_task: JoinHandle<ChatResult<()>>,
}

pub struct Program {
    config: BotConfig,
    chat: Arc<dyn ChatInterface>,
    registry: CommandRegistry,
    running: Option<Running>,
}

impl Program {
    pub fn new(chat: Arc<dyn ChatInterface>, config: BotConfig) -> InternalResult<Self> {
        config.validate()?;
        let trigger = Trigger::new(config.trigger.clone())?;
        info!("Basic component setup complete");
        Ok(Self {
            config,
            chat,
            registry: CommandRegistry::new(trigger),
            running: None,
        })
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Adds a command. Takes effect on the next [`startup`](Self::startup).
    pub fn subscribe(&mut self, handle: CommandHandle) -> Option<CommandHandle> {
        self.registry.subscribe(handle)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub async fn startup(&mut self) -> InternalResult<()> {
        if self.running.is_some() {
            return Err(Error::internal("program already started"));
        }
        info!("Beginning startup process");

        self.bind_core_commands();
        self.login().await?;
        for room_id in &self.config.rooms {
            let room = RoomDescriptor::new(self.config.site, *room_id);
            self.chat.join_chat(&room).await?;
        }

        let (sender, receiver) = mpsc::channel(self.config.channel_capacity);

        let poller = Arc::new(MessagePoller::new(self.chat.clone(), &self.config));
        let poller_task = tokio::spawn({
            let poller = poller.clone();
            async move { poller.run(sender).await }
        });
        info!("querying thread started");

        let bot = Bot::new(
            self.chat.clone(),
            Arc::new(self.registry.clone()),
            &self.config,
        );
        let bot_task = tokio::spawn(async move { bot.run(receiver).await });

        self.running = Some(Running {
            poller,
            poller_task,
            bot_task,
        });
        info!("Startup completed.");
        Ok(())
    }

    /// Waits for the querying loop and the bot to finish on their own.
    ///
    /// Whichever ends first also ends the other: a finished poller closes the
    /// channel, and a failed bot stops the poller.
    pub async fn wait(&mut self) -> InternalResult<()> {
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };

        let (polled, handled) = tokio::select! {
            polled = &mut running.poller_task => (polled, (&mut running.bot_task).await),
            handled = &mut running.bot_task => {
                // the poller only sees the dropped receiver on its next send
                error!("bot stopped, stopping the querying loop");
                running.poller.stop();
                ((&mut running.poller_task).await, handled)
            }
        };

        // both handles are finished and must not be polled again
        self.running = None;
        Self::finish(polled, handled)
    }

    /// Stops both tasks, then leaves the configured rooms.
    pub async fn shutdown(&mut self) -> InternalResult<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        info!("Shutting down");
        running.poller.stop();
        let polled = running.poller_task.await;
        let handled = running.bot_task.await;

        for room_id in &self.config.rooms {
            if let Err(e) = self.chat.leave_chat(*room_id).await {
                warn!("Failed to leave room {}: {}", room_id, e);
            }
        }
        Self::finish(polled, handled)
    }

    fn bind_core_commands(&mut self) {
        for handle in core_commands() {
            if !self.registry.contains(handle.name()) {
                self.registry.subscribe(handle);
            }
        }
    }

    async fn login(&self) -> InternalResult<()> {
        let site = self.config.site;
        match self.chat.login(site, &self.config).await {
            Ok(true) => {
                info!("Logged in to {}", site);
                Ok(())
            }
            Ok(false) => {
                error!("Login failed!");
                Err(Error::LoginFailed {
                    site,
                    reason: "credentials rejected".to_string(),
                })
            }
            Err(e) => {
                error!("Login failed! {}", e);
                Err(Error::LoginFailed {
                    site,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn finish(
        polled: Result<ChatResult<()>, JoinError>,
        handled: Result<ChatResult<()>, JoinError>,
    ) -> InternalResult<()> {
        polled.map_err(|e| Error::internal(format!("querying task failed: {}", e)))??;
        handled.map_err(|e| Error::internal(format!("bot task failed: {}", e)))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::{predicate::eq, Sequence};
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use crate::chat::{ChatError, ChatMessage, ChatSite, MockChatInterface};

    fn config() -> BotConfig {
        BotConfig {
            rooms: vec![139, 1],
            initial_delay: Duration::ZERO,
            query_interval: Duration::from_millis(5),
            ..BotConfig::default()
        }
    }

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            site: ChatSite::StackOverflow,
            message_id: 5,
            room_id: 139,
            room_name: "Java".to_string(),
            user_id: 3,
            username: "someone".to_string(),
            message: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_startup_order() {
        let mut chat = MockChatInterface::new();
        let mut sequence = Sequence::new();
        chat.expect_login()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(true));
        chat.expect_join_chat()
            .withf(|room| room.room_id == 139)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        chat.expect_join_chat()
            .withf(|room| room.room_id == 1)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        chat.expect_query_messages().returning(|| Ok(Vec::new()));
        chat.expect_leave_chat()
            .with(eq(139))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        chat.expect_leave_chat()
            .with(eq(1))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let mut program = Program::new(Arc::new(chat), config()).unwrap();
        program.startup().await.unwrap();
        assert!(program.is_running());
        assert!(program.registry().contains("echo"));
        assert!(program.startup().await.is_err());

        program.shutdown().await.unwrap();
        assert!(!program.is_running());
    }

    #[tokio::test]
    async fn test_login_failure_aborts_startup() {
        let mut chat = MockChatInterface::new();
        chat.expect_login().returning(|_, _| Ok(false));
        chat.expect_join_chat().never();
        chat.expect_query_messages().never();

        let mut program = Program::new(Arc::new(chat), config()).unwrap();
        let result = program.startup().await;

        assert!(matches!(
            result,
            Err(Error::LoginFailed {
                site: ChatSite::StackOverflow,
                ..
            })
        ));
        assert!(!program.is_running());
    }

    #[tokio::test]
    async fn test_login_error_aborts_startup() {
        let mut chat = MockChatInterface::new();
        chat.expect_login()
            .returning(|_, _| Err(ChatError::transient("connection reset")));
        chat.expect_join_chat().never();

        let mut program = Program::new(Arc::new(chat), config()).unwrap();
        assert!(matches!(
            program.startup().await,
            Err(Error::LoginFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_reply() {
        let (sent_tx, mut sent_rx) = unbounded_channel();
        let mut chat = MockChatInterface::new();
        chat.expect_login().returning(|_, _| Ok(true));
        chat.expect_join_chat().returning(|_| Ok(()));

        let mut delivered = false;
        chat.expect_query_messages().returning(move || {
            if delivered {
                Ok(Vec::new())
            } else {
                delivered = true;
                Ok(vec![message("!!shout *loud* words")])
            }
        });
        chat.expect_leave_chat().returning(|_| Ok(()));
        chat.expect_send_message()
            .with(eq(139), eq(":5 *LOUD* WORDS"))
            .returning(move |room, text| {
                let _ = sent_tx.send((room, text.to_string()));
                Ok(())
            });

        let mut program = Program::new(Arc::new(chat), config()).unwrap();
        program.subscribe(
            CommandHandle::builder("shout", |invocation| {
                Some(invocation.argument_text().to_uppercase())
            })
            .build(),
        );
        program.startup().await.unwrap();

        let sent = tokio::time::timeout(Duration::from_millis(500), sent_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent, (139, ":5 *LOUD* WORDS".to_string()));

        program.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_fatal_error() {
        let mut chat = MockChatInterface::new();
        chat.expect_login().returning(|_, _| Ok(true));
        chat.expect_join_chat().returning(|_| Ok(()));
        chat.expect_query_messages()
            .returning(|| Err(ChatError::fatal("session expired")));

        let mut program = Program::new(Arc::new(chat), config()).unwrap();
        program.startup().await.unwrap();

        let result = tokio::time::timeout(Duration::from_millis(500), program.wait())
            .await
            .unwrap();
        assert!(matches!(result, Err(Error::Chat(ChatError::Fatal { .. }))));
        assert!(!program.is_running());
    }

    #[tokio::test]
    async fn test_wait_ends_when_bot_fails() {
        let mut chat = MockChatInterface::new();
        chat.expect_login().returning(|_, _| Ok(true));
        chat.expect_join_chat().returning(|_| Ok(()));

        let mut delivered = false;
        chat.expect_query_messages().returning(move || {
            if delivered {
                Ok(Vec::new())
            } else {
                delivered = true;
                Ok(vec![message("!!echo hi")])
            }
        });
        chat.expect_send_message()
            .returning(|_, _| Err(ChatError::fatal("kicked")));
        chat.expect_leave_chat().never();

        let mut program = Program::new(Arc::new(chat), config()).unwrap();
        program.startup().await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), program.wait())
            .await
            .unwrap();
        assert!(matches!(result, Err(Error::Chat(ChatError::Fatal { .. }))));
        assert!(!program.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_survives_leave_failure() {
        let mut chat = MockChatInterface::new();
        chat.expect_login().returning(|_, _| Ok(true));
        chat.expect_join_chat().returning(|_| Ok(()));
        chat.expect_query_messages().returning(|| Ok(Vec::new()));
        chat.expect_leave_chat()
            .times(2)
            .returning(|_| Err(ChatError::transient("timeout")));

        let mut program = Program::new(Arc::new(chat), config()).unwrap();
        program.startup().await.unwrap();
        program.shutdown().await.unwrap();
        assert!(!program.is_running());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let chat = MockChatInterface::new();
        let config = BotConfig {
            channel_capacity: 0,
            ..BotConfig::default()
        };
        assert!(matches!(
            Program::new(Arc::new(chat), config),
            Err(Error::Config(_))
        ));
    }
}
