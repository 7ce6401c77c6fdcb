use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    chat::{ChatInterface, ChatMessage, ChatResult},
    command::CommandRegistry,
    config::BotConfig,
    render,
};

/// Answers polled messages through the command registry.
pub struct Bot {
    chat: Arc<dyn ChatInterface>,
    registry: Arc<CommandRegistry>,
    bot_user_id: Option<u64>,
    max_message_length: usize,
}

impl Bot {
    pub fn new(
        chat: Arc<dyn ChatInterface>,
        registry: Arc<CommandRegistry>,
        config: &BotConfig,
    ) -> Self {
        Self {
            chat,
            registry,
            bot_user_id: config.bot_user_id,
            max_message_length: config.max_message_length,
        }
    }

    /// Handles messages until the channel closes or sending a reply fails fatally.
    pub async fn run(&self, mut receiver: mpsc::Receiver<ChatMessage>) -> ChatResult<()> {
        info!("bot started");
        while let Some(message) = receiver.recv().await {
            match self.handle(&message).await {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    warn!("Failed to answer message {}: {}", message.message_id, e);
                }
                Err(e) => {
                    error!("Failed to answer message {}: {}", message.message_id, e);
                    return Err(e);
                }
            }
        }
        info!("bot stopped");
        Ok(())
    }

    pub async fn handle(&self, message: &ChatMessage) -> ChatResult<()> {
        if Some(message.user_id) == self.bot_user_id {
            return Ok(());
        }
        let Some(text) = self.registry.dispatch(message) else {
            return Ok(());
        };

        let reply = render::reply(message, &text);
        for part in render::chunk(&reply, self.max_message_length) {
            debug!("sending to room {}: {}", message.room_id, part);
            self.chat.send_message(message.room_id, &part).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::predicate::eq;

    use super::*;
    use crate::{
        chat::{ChatError, ChatSite, MockChatInterface},
        command::{core_commands, CommandHandle},
        trigger::Trigger,
    };

    fn message(user_id: u64, text: &str) -> ChatMessage {
        ChatMessage {
            site: ChatSite::StackOverflow,
            message_id: 99,
            room_id: 139,
            room_name: "Java".to_string(),
            user_id,
            username: "someone".to_string(),
            message: text.to_string(),
        }
    }

    fn registry() -> Arc<CommandRegistry> {
        let mut registry = CommandRegistry::new(Trigger::new("!!").unwrap());
        for handle in core_commands() {
            registry.subscribe(handle);
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_replies_to_command() {
        let mut chat = MockChatInterface::new();
        chat.expect_send_message()
            .with(eq(139), eq(":99 hello"))
            .times(1)
            .returning(|_, _| Ok(()));

        let bot = Bot::new(Arc::new(chat), registry(), &BotConfig::default());
        bot.handle(&message(3, "!!echo hello")).await.unwrap();
    }

    #[tokio::test]
    async fn test_ignores_own_and_plain_messages() {
        let mut chat = MockChatInterface::new();
        chat.expect_send_message().never();

        let config = BotConfig {
            bot_user_id: Some(3),
            ..BotConfig::default()
        };
        let bot = Bot::new(Arc::new(chat), registry(), &config);
        bot.handle(&message(3, "!!echo hello")).await.unwrap();
        bot.handle(&message(4, "just chatting")).await.unwrap();
    }

    #[tokio::test]
    async fn test_long_reply_is_chunked() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut chat = MockChatInterface::new();
        {
            let sent = sent.clone();
            chat.expect_send_message().returning(move |_, text| {
                sent.lock().unwrap().push(text.to_string());
                Ok(())
            });
        }

        let config = BotConfig {
            max_message_length: 16,
            ..BotConfig::default()
        };
        let bot = Bot::new(Arc::new(chat), registry(), &config);
        bot.handle(&message(4, "!!echo one two `three four five`"))
            .await
            .unwrap();

        assert_eq!(
            *sent.lock().unwrap(),
            vec![":99 one two", "`three four five`"]
        );
    }

    #[tokio::test]
    async fn test_run_until_channel_closes() {
        let mut chat = MockChatInterface::new();
        chat.expect_send_message()
            .times(2)
            .returning(|_, _| Err(ChatError::transient("rate limited")));

        let bot = Bot::new(Arc::new(chat), registry(), &BotConfig::default());
        let (sender, receiver) = mpsc::channel(4);
        sender.send(message(4, "!!echo a")).await.unwrap();
        sender.send(message(4, "!!echo b")).await.unwrap();
        drop(sender);

        assert_eq!(bot.run(receiver).await, Ok(()));
    }

    #[tokio::test]
    async fn test_run_stops_on_fatal_send_error() {
        let mut chat = MockChatInterface::new();
        chat.expect_send_message()
            .times(1)
            .returning(|_, _| Err(ChatError::fatal("kicked")));

        let mut registry = CommandRegistry::new(Trigger::new("!!").unwrap());
        registry.subscribe(CommandHandle::builder("ping", |_| Some("pong".to_string())).build());
        let bot = Bot::new(Arc::new(chat), Arc::new(registry), &BotConfig::default());

        let (sender, receiver) = mpsc::channel(4);
        sender.send(message(4, "!!ping")).await.unwrap();
        sender.send(message(4, "!!ping")).await.unwrap();

        assert_eq!(bot.run(receiver).await, Err(ChatError::fatal("kicked")));
    }
}
