//! Per-event request context.
//!
//! A [`Context`] is created fresh for every dispatched event and handed to
//! each handler invoked for it. It exposes read-only access to the event's
//! fields and outbound operations that delegate to the shared
//! [`MessagingApi`](crate::api::MessagingApi), supplying the event's reply
//! token automatically.
//!
//! Contexts are never shared across events and hold no mutable state, so
//! they need no synchronization of their own.

use std::sync::Arc;

use crate::api::BoxedApi;
use crate::error::OutboundError;
use crate::event::{Event, EventKind, ReplyToken, Source};
use crate::message::OutgoingMessage;

/// Maximum number of messages one reply or push call may carry.
pub const MAX_MESSAGES_PER_CALL: usize = 5;

/// The request-scoped handle passed to handlers.
///
/// Replies go through the event's reply token. The token is single-use on
/// the platform side: the first successful reply consumes it and later
/// replies surface [`ApiError::InvalidReplyToken`]; the context does not
/// track or swallow this. Events whose kind carries no token fail locally
/// with [`OutboundError::NoReplyToken`] before any call is made.
///
/// [`ApiError::InvalidReplyToken`]: crate::api::ApiError::InvalidReplyToken
pub struct Context {
    event: Arc<Event>,
    api: BoxedApi,
}

impl Context {
    /// Creates a context for one event.
    pub fn new(event: Arc<Event>, api: BoxedApi) -> Self {
        Self { event, api }
    }

    /// The event being handled.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The event's kind classification.
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Where the event came from, when the platform includes it.
    pub fn source(&self) -> Option<&Source> {
        self.event.source()
    }

    /// The acting user's id, if known.
    pub fn user_id(&self) -> Option<&str> {
        self.event.user_id()
    }

    /// The group id, for events from a group.
    pub fn group_id(&self) -> Option<&str> {
        self.event.group_id()
    }

    /// The room id, for events from a room.
    pub fn room_id(&self) -> Option<&str> {
        self.event.room_id()
    }

    /// The text content, for text-message events only.
    pub fn text(&self) -> Option<&str> {
        self.event.text()
    }

    /// The reply token, absent for kinds that cannot be replied to.
    pub fn reply_token(&self) -> Option<&ReplyToken> {
        self.event.reply_token()
    }

    /// Event time in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.event.timestamp()
    }

    /// The underlying messaging API handle, for calls this context does not
    /// wrap.
    pub fn api(&self) -> &BoxedApi {
        &self.api
    }

    /// Replies with a single text message.
    pub async fn reply_text(&self, text: impl Into<String>) -> Result<(), OutboundError> {
        self.reply_messages(vec![OutgoingMessage::text(text)]).await
    }

    /// Replies with up to [`MAX_MESSAGES_PER_CALL`] messages.
    pub async fn reply_messages(
        &self,
        messages: Vec<OutgoingMessage>,
    ) -> Result<(), OutboundError> {
        if messages.len() > MAX_MESSAGES_PER_CALL {
            return Err(OutboundError::TooManyMessages {
                count: messages.len(),
            });
        }
        let token = self.reply_token().ok_or(OutboundError::NoReplyToken)?;
        self.api.reply_message(token, messages).await?;
        Ok(())
    }

    /// Pushes a single text message to a user, group, or room.
    pub async fn push_text(
        &self,
        to: impl AsRef<str>,
        text: impl Into<String>,
    ) -> Result<(), OutboundError> {
        self.push_messages(to, vec![OutgoingMessage::text(text)])
            .await
    }

    /// Pushes up to [`MAX_MESSAGES_PER_CALL`] messages to a user, group, or
    /// room.
    pub async fn push_messages(
        &self,
        to: impl AsRef<str>,
        messages: Vec<OutgoingMessage>,
    ) -> Result<(), OutboundError> {
        if messages.len() > MAX_MESSAGES_PER_CALL {
            return Err(OutboundError::TooManyMessages {
                count: messages.len(),
            });
        }
        self.api.push_message(to.as_ref(), messages).await?;
        Ok(())
    }

    /// Shows a loading animation to the acting user for `seconds` (5–60).
    ///
    /// Useful before slow work so the chat does not look stalled.
    pub async fn defer(&self, seconds: u8) -> Result<(), OutboundError> {
        if !(5..=60).contains(&seconds) {
            return Err(OutboundError::InvalidLoadingDuration(seconds));
        }
        let user_id = self.user_id().ok_or(OutboundError::NoUserId)?;
        self.api.show_loading_animation(user_id, seconds).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("kind", &self.kind())
            .field("user_id", &self.user_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiResult, MessagingApi};
    use crate::event::{EventPayload, MessageContent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records outbound calls and enforces single-use reply tokens, like the
    /// platform does.
    #[derive(Default)]
    struct RecordingApi {
        replies: Mutex<Vec<(String, Vec<OutgoingMessage>)>>,
        pushes: Mutex<Vec<(String, Vec<OutgoingMessage>)>>,
        used_tokens: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingApi for RecordingApi {
        async fn reply_message(
            &self,
            reply_token: &ReplyToken,
            messages: Vec<OutgoingMessage>,
        ) -> ApiResult<()> {
            let mut used = self.used_tokens.lock().unwrap();
            if used.iter().any(|t| t == reply_token.as_str()) {
                return Err(ApiError::InvalidReplyToken);
            }
            used.push(reply_token.as_str().to_owned());
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.as_str().to_owned(), messages));
            Ok(())
        }

        async fn push_message(&self, to: &str, messages: Vec<OutgoingMessage>) -> ApiResult<()> {
            self.pushes.lock().unwrap().push((to.to_owned(), messages));
            Ok(())
        }

        async fn show_loading_animation(&self, _chat_id: &str, _seconds: u8) -> ApiResult<()> {
            Ok(())
        }
    }

    fn text_event() -> Event {
        Event::new(EventPayload::Message(MessageContent::Text {
            id: "1".into(),
            text: "hi".into(),
        }))
        .with_source(Source::User {
            user_id: "U1".into(),
        })
        .with_reply_token(ReplyToken::new("token-1"))
    }

    fn context(event: Event, api: Arc<RecordingApi>) -> Context {
        Context::new(Arc::new(event), api)
    }

    #[tokio::test]
    async fn reply_supplies_the_event_token() {
        let api = Arc::new(RecordingApi::default());
        let ctx = context(text_event(), Arc::clone(&api));

        ctx.reply_text("hello").await.unwrap();

        let replies = api.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "token-1");
        assert_eq!(replies[0].1, vec![OutgoingMessage::text("hello")]);
    }

    #[tokio::test]
    async fn second_reply_surfaces_invalid_token() {
        let api = Arc::new(RecordingApi::default());
        let ctx = context(text_event(), api);

        ctx.reply_text("first").await.unwrap();
        match ctx.reply_text("second").await {
            Err(OutboundError::Api(ApiError::InvalidReplyToken)) => {}
            other => panic!("expected invalid reply token, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_without_token_fails_locally() {
        let api = Arc::new(RecordingApi::default());
        let event = Event::new(EventPayload::Unfollow).with_source(Source::User {
            user_id: "U1".into(),
        });
        let ctx = context(event, Arc::clone(&api));

        assert!(matches!(
            ctx.reply_text("hello").await,
            Err(OutboundError::NoReplyToken)
        ));
        assert!(api.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_before_the_call() {
        let api = Arc::new(RecordingApi::default());
        let ctx = context(text_event(), Arc::clone(&api));

        let messages: Vec<OutgoingMessage> =
            (0..6).map(|i| OutgoingMessage::text(i.to_string())).collect();
        assert!(matches!(
            ctx.reply_messages(messages).await,
            Err(OutboundError::TooManyMessages { count: 6 })
        ));
        assert!(api.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn push_targets_the_given_id() {
        let api = Arc::new(RecordingApi::default());
        let ctx = context(text_event(), Arc::clone(&api));

        ctx.push_text("U2", "psst").await.unwrap();

        let pushes = api.pushes.lock().unwrap();
        assert_eq!(pushes[0].0, "U2");
    }

    #[tokio::test]
    async fn defer_validates_duration_bounds() {
        let api = Arc::new(RecordingApi::default());
        let ctx = context(text_event(), api);

        assert!(matches!(
            ctx.defer(4).await,
            Err(OutboundError::InvalidLoadingDuration(4))
        ));
        assert!(matches!(
            ctx.defer(61).await,
            Err(OutboundError::InvalidLoadingDuration(61))
        ));
        ctx.defer(5).await.unwrap();
    }
}
