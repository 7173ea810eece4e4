//! Telegram delivery using teloxide.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use teloxide::error_handlers::ErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};
use teloxide::RequestError;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::compliments::router::{Keyboard, Outbound};

/// Delay after a network-level failure.
pub const NETWORK_BACKOFF: Duration = Duration::from_secs(2);

/// Delay after any other failure.
pub const FAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Anything that can put a text message with a keyboard into a chat.
pub trait ReplySink: Send + Sync {
    fn send(
        &self,
        chat_id: i64,
        text: &str,
        markup: ReplyMarkup,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl ReplySink for Bot {
    fn send(
        &self,
        chat_id: i64,
        text: &str,
        markup: ReplyMarkup,
    ) -> impl Future<Output = Result<(), RequestError>> + Send {
        let request = self
            .send_message(ChatId(chat_id), text.to_string())
            .reply_markup(markup);
        async move { request.await.map(|_| ()) }
    }
}

/// Sends router replies to Telegram.
///
/// Replies of different updates go out in the order their turns were taken,
/// so a caller that takes a turn while still holding the router lock gets
/// delivery order equal to mutation order.
pub struct TelegramGateway<S = Bot> {
    sink: S,
    order: Mutex<()>,
}

/// Exclusive right to deliver the next batch of replies.
pub struct DeliveryTurn<'a, S> {
    gateway: &'a TelegramGateway<S>,
    _guard: MutexGuard<'a, ()>,
}

impl<S: ReplySink> TelegramGateway<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            order: Mutex::new(()),
        }
    }

    /// Wait for the next delivery slot. Slots are handed out first come, first served.
    pub async fn turn(&self) -> DeliveryTurn<'_, S> {
        DeliveryTurn {
            gateway: self,
            _guard: self.order.lock().await,
        }
    }

    pub async fn deliver(&self, reply: &Outbound) -> Result<(), RequestError> {
        self.sink
            .send(reply.chat_id, &reply.text, markup(&reply.keyboard))
            .await
            .map_err(|e| {
                warn!("Failed to send to {}: {e}", reply.chat_id);
                e
            })
    }

    /// Deliver every reply in order; a failed one does not stop the rest.
    pub async fn deliver_all(&self, replies: &[Outbound]) -> usize {
        let mut failed = 0;
        for reply in replies {
            if self.deliver(reply).await.is_err() {
                failed += 1;
            }
        }
        failed
    }
}

impl<S: ReplySink> DeliveryTurn<'_, S> {
    /// Deliver `replies`, then give the slot to the next waiter.
    pub async fn deliver_all(self, replies: &[Outbound]) -> usize {
        self.gateway.deliver_all(replies).await
    }
}

pub fn markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Trigger(caption) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(vec![vec![KeyboardButton::new(caption.clone())]]).resize_keyboard(),
        ),
        Keyboard::Hide => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

/// How long to pause polling after a transport error.
pub fn backoff_for(error: &RequestError) -> Duration {
    match error {
        RequestError::Network(_) | RequestError::Io(_) => NETWORK_BACKOFF,
        RequestError::RetryAfter(seconds) => seconds.duration(),
        _ => FAULT_BACKOFF,
    }
}

/// Update-listener error handler that logs and backs off before polling resumes.
#[derive(Debug, Default)]
pub struct TransportBackoff;

impl ErrorHandler<RequestError> for TransportBackoff {
    fn handle_error(self: Arc<Self>, error: RequestError) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let delay = backoff_for(&error);
        Box::pin(async move {
            warn!("Telegram polling error: {error}");
            info!("Retrying in {}s", delay.as_secs());
            tokio::time::sleep(delay).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use teloxide::types::Seconds;
    use teloxide::ApiError;

    /// Records every send; chats listed in `failing` get an API error instead.
    #[derive(Default)]
    struct RecordingSink {
        sent: StdMutex<Vec<(i64, String)>>,
        failing: Vec<i64>,
    }

    impl RecordingSink {
        fn failing_for(chat_id: i64) -> Self {
            Self {
                failing: vec![chat_id],
                ..Self::default()
            }
        }
    }

    impl ReplySink for RecordingSink {
        fn send(
            &self,
            chat_id: i64,
            text: &str,
            _markup: ReplyMarkup,
        ) -> impl Future<Output = Result<(), RequestError>> + Send {
            let result = if self.failing.contains(&chat_id) {
                Err(RequestError::Api(ApiError::BotBlocked))
            } else {
                self.sent.lock().unwrap().push((chat_id, text.to_string()));
                Ok(())
            };
            async move { result }
        }
    }

    impl TelegramGateway<RecordingSink> {
        fn sent(&self) -> Vec<(i64, String)> {
            self.sink.sent.lock().unwrap().clone()
        }
    }

    fn reply(chat_id: i64, text: &str) -> Outbound {
        Outbound {
            chat_id,
            text: text.to_string(),
            keyboard: Keyboard::Hide,
        }
    }

    #[test]
    fn test_trigger_keyboard_has_single_button() {
        match markup(&Keyboard::Trigger("Жми".to_string())) {
            ReplyMarkup::Keyboard(kb) => {
                assert_eq!(kb.keyboard.len(), 1);
                assert_eq!(kb.keyboard[0].len(), 1);
                assert_eq!(kb.keyboard[0][0].text, "Жми");
            }
            other => panic!("unexpected markup {other:?}"),
        }
    }

    #[test]
    fn test_hide_removes_keyboard() {
        assert!(matches!(markup(&Keyboard::Hide), ReplyMarkup::KeyboardRemove(_)));
    }

    #[test]
    fn test_backoff_policy() {
        let io = RequestError::Io(Arc::new(std::io::Error::other("reset")));
        assert_eq!(backoff_for(&io), NETWORK_BACKOFF);

        let api = RequestError::Api(ApiError::BotBlocked);
        assert_eq!(backoff_for(&api), FAULT_BACKOFF);

        let retry = RequestError::RetryAfter(Seconds::from_seconds(7));
        assert_eq!(backoff_for(&retry), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_failed_reply_does_not_stop_the_rest() {
        let gateway = TelegramGateway::new(RecordingSink::failing_for(1));

        let failed = gateway
            .deliver_all(&[reply(1, "blocked"), reply(2, "Ты прекрасна")])
            .await;

        assert_eq!(failed, 1);
        assert_eq!(gateway.sent(), vec![(2, "Ты прекрасна".to_string())]);
    }

    #[tokio::test]
    async fn test_deliver_reports_sink_error() {
        let gateway = TelegramGateway::new(RecordingSink::failing_for(7));
        assert!(gateway.deliver(&reply(7, "x")).await.is_err());
        assert!(gateway.deliver(&reply(8, "y")).await.is_ok());
        assert_eq!(gateway.sent(), vec![(8, "y".to_string())]);
    }

    #[tokio::test]
    async fn test_turns_deliver_in_the_order_taken() {
        let gateway = Arc::new(TelegramGateway::new(RecordingSink::default()));

        let first = gateway.turn().await;
        let later = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .turn()
                    .await
                    .deliver_all(&[reply(1, "Осталось 0")])
                    .await
            })
        };
        // Let the spawned task queue up behind the held turn.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(gateway.sent().is_empty());

        assert_eq!(first.deliver_all(&[reply(1, "Осталось комплиментов: 1!")]).await, 0);
        assert_eq!(later.await.unwrap(), 0);

        assert_eq!(
            gateway.sent(),
            vec![
                (1, "Осталось комплиментов: 1!".to_string()),
                (1, "Осталось 0".to_string()),
            ]
        );
    }
}
