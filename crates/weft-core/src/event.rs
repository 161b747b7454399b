//! Webhook event model.
//!
//! One webhook delivery carries a [`WebhookPayload`]: a batch of [`Event`]s
//! that share a single delivery but are otherwise independent. Each event is
//! a common envelope (source identity, reply token, timestamp) plus an
//! [`EventPayload`] tagged union over the documented event kinds.
//!
//! # Parsing
//!
//! [`parse_payload`] inspects the `type` discriminator of every embedded
//! event and constructs the matching payload variant. Event kinds this crate
//! does not know about become [`EventPayload::Unrecognized`], preserving the
//! raw JSON, so a platform rollout of a new kind never breaks dispatch. A
//! *known* kind with a missing or malformed payload field is a
//! [`ParseError`]: the whole delivery is rejected and nothing runs.
//!
//! Parsing is pure: no I/O, no side effects.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;

// ============================================================================
// Event Kind Classification
// ============================================================================

/// Classification of event kinds.
///
/// This is the key listeners register under, and the value dispatchers match
/// on. It mirrors the variants of [`EventPayload`] without their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A user sent a message (text, image, sticker, ...).
    Message,
    /// A user added the bot as a friend, or unblocked it.
    Follow,
    /// A user blocked the bot. Carries no reply token.
    Unfollow,
    /// The bot joined a group or room.
    Join,
    /// The bot left (or was removed from) a group or room. No reply token.
    Leave,
    /// A user joined a group or room the bot is in.
    MemberJoined,
    /// A user left a group or room the bot is in. No reply token.
    MemberLeft,
    /// A user triggered a postback action from a template or rich menu.
    Postback,
    /// A user entered or left the range of a beacon.
    Beacon,
    /// An event kind this crate does not recognize.
    Unrecognized,
}

impl EventKind {
    /// The wire name of this kind (`"message"`, `"memberJoined"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::Follow => "follow",
            EventKind::Unfollow => "unfollow",
            EventKind::Join => "join",
            EventKind::Leave => "leave",
            EventKind::MemberJoined => "memberJoined",
            EventKind::MemberLeft => "memberLeft",
            EventKind::Postback => "postback",
            EventKind::Beacon => "beacon",
            EventKind::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Reply Token
// ============================================================================

/// Opaque, single-use credential tied to one inbound event.
///
/// Required for the low-latency "reply" outbound call. The platform enforces
/// single use: replying twice with the same token is rejected by the
/// messaging API ([`ApiError::InvalidReplyToken`]), not tracked locally.
///
/// [`ApiError::InvalidReplyToken`]: crate::api::ApiError::InvalidReplyToken
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ReplyToken(String);

impl ReplyToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value, as sent to the messaging API.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Event Source
// ============================================================================

/// Identity of where an event came from: a one-on-one chat, a group, or a
/// room.
///
/// For group and room sources the acting user's id is only present when the
/// user has consented to id exposure, so it is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    /// A one-on-one chat with a user.
    #[serde(rename_all = "camelCase")]
    User {
        /// The user's id.
        user_id: String,
    },
    /// A group chat.
    #[serde(rename_all = "camelCase")]
    Group {
        /// The group's id.
        group_id: String,
        /// The acting user's id, when exposed.
        #[serde(default)]
        user_id: Option<String>,
    },
    /// A multi-person room.
    #[serde(rename_all = "camelCase")]
    Room {
        /// The room's id.
        room_id: String,
        /// The acting user's id, when exposed.
        #[serde(default)]
        user_id: Option<String>,
    },
}

impl Source {
    /// The acting user's id, if known.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Source::User { user_id } => Some(user_id),
            Source::Group { user_id, .. } | Source::Room { user_id, .. } => user_id.as_deref(),
        }
    }

    /// The group id, for group sources.
    pub fn group_id(&self) -> Option<&str> {
        match self {
            Source::Group { group_id, .. } => Some(group_id),
            _ => None,
        }
    }

    /// The room id, for room sources.
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Source::Room { room_id, .. } => Some(room_id),
            _ => None,
        }
    }

    /// The id of the chat this source belongs to: the user id for one-on-one
    /// chats, otherwise the group or room id. Suitable as a push target.
    pub fn chat_id(&self) -> &str {
        match self {
            Source::User { user_id } => user_id,
            Source::Group { group_id, .. } => group_id,
            Source::Room { room_id, .. } => room_id,
        }
    }
}

// ============================================================================
// Kind-specific payloads
// ============================================================================

/// Content of a message event.
///
/// Message content types this crate does not model become
/// [`MessageContent::Other`] with the raw JSON preserved; an unknown content
/// type is not a parse failure.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// A plain text message.
    Text {
        /// Message id.
        id: String,
        /// The message text.
        text: String,
    },
    /// An image. The binary content is fetched separately through the blob
    /// API, which is outside this crate.
    Image {
        /// Message id.
        id: String,
    },
    /// A sticker.
    Sticker {
        /// Message id.
        id: String,
        /// Sticker package id.
        package_id: String,
        /// Sticker id within the package.
        sticker_id: String,
    },
    /// A shared location.
    Location {
        /// Message id.
        id: String,
        /// Optional place title.
        title: Option<String>,
        /// Optional street address.
        address: Option<String>,
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
    /// A content type this crate does not model (video, audio, file, ...).
    Other {
        /// The wire content type.
        kind: String,
        /// The raw content object.
        raw: Value,
    },
}

impl MessageContent {
    /// The text of a text message, `None` for every other content type.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingField {
                field: "message.type",
            })?
            .to_owned();

        Ok(match kind.as_str() {
            "text" => {
                let raw: RawTextContent = serde_json::from_value(value)?;
                MessageContent::Text {
                    id: raw.id,
                    text: raw.text,
                }
            }
            "image" => {
                let raw: RawIdContent = serde_json::from_value(value)?;
                MessageContent::Image { id: raw.id }
            }
            "sticker" => {
                let raw: RawStickerContent = serde_json::from_value(value)?;
                MessageContent::Sticker {
                    id: raw.id,
                    package_id: raw.package_id,
                    sticker_id: raw.sticker_id,
                }
            }
            "location" => {
                let raw: RawLocationContent = serde_json::from_value(value)?;
                MessageContent::Location {
                    id: raw.id,
                    title: raw.title,
                    address: raw.address,
                    latitude: raw.latitude,
                    longitude: raw.longitude,
                }
            }
            _ => MessageContent::Other { kind, raw: value },
        })
    }
}

/// Payload of a postback event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Postback {
    /// The postback data string set when the action was built.
    pub data: String,
    /// Additional parameters (e.g. a datetime picker result).
    #[serde(default)]
    pub params: Option<Value>,
}

/// Payload of a beacon event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Beacon {
    /// Hardware id of the beacon.
    pub hwid: String,
    /// Beacon event type (`enter`, `leave`, `banner`, ...). Kept as a raw
    /// string so new beacon types do not fail the parse.
    #[serde(rename = "type")]
    pub beacon_type: String,
    /// Device message, as a hex string, when the beacon broadcasts one.
    #[serde(default)]
    pub dm: Option<String>,
}

// ============================================================================
// Event
// ============================================================================

/// Kind-specific payload of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A message was sent.
    Message(MessageContent),
    /// The bot was added or unblocked.
    Follow,
    /// The bot was blocked.
    Unfollow,
    /// The bot joined a group or room.
    Join,
    /// The bot left a group or room.
    Leave,
    /// Users joined a group or room the bot is in.
    MemberJoined {
        /// The users that joined.
        members: Vec<Source>,
    },
    /// Users left a group or room the bot is in.
    MemberLeft {
        /// The users that left.
        members: Vec<Source>,
    },
    /// A postback action was triggered.
    Postback(Postback),
    /// A beacon was entered or left.
    Beacon(Beacon),
    /// An event kind this crate does not recognize. The raw event object is
    /// preserved so listeners can still inspect it.
    Unrecognized {
        /// The wire event type.
        kind: String,
        /// The raw event object.
        raw: Value,
    },
}

impl EventPayload {
    /// The kind classification of this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Message(_) => EventKind::Message,
            EventPayload::Follow => EventKind::Follow,
            EventPayload::Unfollow => EventKind::Unfollow,
            EventPayload::Join => EventKind::Join,
            EventPayload::Leave => EventKind::Leave,
            EventPayload::MemberJoined { .. } => EventKind::MemberJoined,
            EventPayload::MemberLeft { .. } => EventKind::MemberLeft,
            EventPayload::Postback(_) => EventKind::Postback,
            EventPayload::Beacon(_) => EventKind::Beacon,
            EventPayload::Unrecognized { .. } => EventKind::Unrecognized,
        }
    }
}

/// One notification delivered by the messaging platform.
///
/// Common envelope fields plus the kind-specific [`EventPayload`]. Events
/// are usually produced by [`parse_payload`]; the builder-style constructors
/// exist for composing synthetic events, e.g. in tests.
#[derive(Debug, Clone)]
pub struct Event {
    source: Option<Source>,
    reply_token: Option<ReplyToken>,
    timestamp: i64,
    webhook_event_id: Option<String>,
    payload: EventPayload,
}

impl Event {
    /// Creates an event with the given payload and an empty envelope.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            source: None,
            reply_token: None,
            timestamp: 0,
            webhook_event_id: None,
            payload,
        }
    }

    /// Sets the event source.
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the reply token.
    pub fn with_reply_token(mut self, token: ReplyToken) -> Self {
        self.reply_token = Some(token);
        self
    }

    /// Sets the event timestamp (epoch milliseconds).
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The kind classification of this event.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The kind-specific payload.
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Where the event came from, when the platform includes it.
    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    /// The reply token, absent for kinds that cannot be replied to.
    pub fn reply_token(&self) -> Option<&ReplyToken> {
        self.reply_token.as_ref()
    }

    /// Event time in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The delivery's webhook event id, when present.
    pub fn webhook_event_id(&self) -> Option<&str> {
        self.webhook_event_id.as_deref()
    }

    /// The acting user's id, if known.
    pub fn user_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(Source::user_id)
    }

    /// The group id, for events from a group.
    pub fn group_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(Source::group_id)
    }

    /// The room id, for events from a room.
    pub fn room_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(Source::room_id)
    }

    /// The text content, for text-message events only.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Message(content) => content.text(),
            _ => None,
        }
    }

    /// Parses one raw event object.
    ///
    /// Unknown `type` strings yield [`EventPayload::Unrecognized`]; a missing
    /// `type`, or a known kind with a broken payload, is a [`ParseError`].
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingField { field: "type" })?
            .to_owned();

        let raw: RawEvent = match kind.as_str() {
            "message" | "follow" | "unfollow" | "join" | "leave" | "memberJoined"
            | "memberLeft" | "postback" | "beacon" => serde_json::from_value(value.clone())?,
            // Tolerant envelope parse for unrecognized kinds; their shape is
            // unknown by definition.
            _ => serde_json::from_value(value.clone()).unwrap_or_default(),
        };

        let payload = match kind.as_str() {
            "message" => {
                let message = raw.message.ok_or(ParseError::MissingField { field: "message" })?;
                EventPayload::Message(MessageContent::from_value(message)?)
            }
            "follow" => EventPayload::Follow,
            "unfollow" => EventPayload::Unfollow,
            "join" => EventPayload::Join,
            "leave" => EventPayload::Leave,
            "memberJoined" => EventPayload::MemberJoined {
                members: raw
                    .joined
                    .ok_or(ParseError::MissingField { field: "joined" })?
                    .members,
            },
            "memberLeft" => EventPayload::MemberLeft {
                members: raw
                    .left
                    .ok_or(ParseError::MissingField { field: "left" })?
                    .members,
            },
            "postback" => EventPayload::Postback(
                raw.postback
                    .ok_or(ParseError::MissingField { field: "postback" })?,
            ),
            "beacon" => EventPayload::Beacon(
                raw.beacon.ok_or(ParseError::MissingField { field: "beacon" })?,
            ),
            _ => EventPayload::Unrecognized { kind, raw: value },
        };

        Ok(Event {
            source: raw.source,
            reply_token: raw.reply_token,
            timestamp: raw.timestamp,
            webhook_event_id: raw.webhook_event_id,
            payload,
        })
    }
}

/// Envelope fields shared by all event kinds, as they appear on the wire.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(default)]
    source: Option<Source>,
    #[serde(default)]
    reply_token: Option<ReplyToken>,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    webhook_event_id: Option<String>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    postback: Option<Postback>,
    #[serde(default)]
    beacon: Option<Beacon>,
    #[serde(default)]
    joined: Option<RawMembers>,
    #[serde(default)]
    left: Option<RawMembers>,
}

#[derive(Deserialize)]
struct RawMembers {
    members: Vec<Source>,
}

#[derive(Deserialize)]
struct RawTextContent {
    id: String,
    text: String,
}

#[derive(Deserialize)]
struct RawIdContent {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStickerContent {
    id: String,
    package_id: String,
    sticker_id: String,
}

#[derive(Deserialize)]
struct RawLocationContent {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    address: Option<String>,
    latitude: f64,
    longitude: f64,
}

// ============================================================================
// Webhook payload
// ============================================================================

/// One webhook delivery: a batch of events sharing a destination.
#[derive(Debug, Clone)]
pub struct WebhookPayload {
    /// The bot user id the delivery was sent to.
    pub destination: Option<String>,
    /// The embedded events, in delivery order.
    pub events: Vec<Event>,
}

/// Parses a raw, already-authenticated webhook body.
///
/// Total over its input: every body yields either a [`WebhookPayload`]
/// (possibly containing [`EventPayload::Unrecognized`] events) or a
/// [`ParseError`]. Never panics, never performs I/O.
pub fn parse_payload(raw: &str) -> Result<WebhookPayload, ParseError> {
    let value: Value = serde_json::from_str(raw)?;

    let destination = value
        .get("destination")
        .and_then(Value::as_str)
        .map(str::to_owned);

    let items = match value.get("events") {
        Some(Value::Array(items)) => items.clone(),
        Some(_) => return Err(ParseError::InvalidField { field: "events" }),
        None => return Err(ParseError::MissingField { field: "events" }),
    };

    let mut events = Vec::with_capacity(items.len());
    for item in items {
        events.push(Event::from_value(item)?);
    }

    Ok(WebhookPayload {
        destination,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_one(event: Value) -> Event {
        let payload = parse_payload(
            &json!({ "destination": "Ubot", "events": [event] }).to_string(),
        )
        .expect("payload should parse");
        payload.events.into_iter().next().unwrap()
    }

    #[test]
    fn parses_text_message_event() {
        let event = parse_one(json!({
            "type": "message",
            "timestamp": 1_462_629_479_859_i64,
            "source": { "type": "user", "userId": "U4af4980629" },
            "replyToken": "0f3779fba3b349968c5d07db31eab56f",
            "webhookEventId": "01FZ74A0TDDPYRVKNK77XKC3ZR",
            "message": { "id": "325708", "type": "text", "text": "Hello, world!" }
        }));

        assert_eq!(event.kind(), EventKind::Message);
        assert_eq!(event.text(), Some("Hello, world!"));
        assert_eq!(event.user_id(), Some("U4af4980629"));
        assert_eq!(event.timestamp(), 1_462_629_479_859);
        assert_eq!(
            event.reply_token().map(ReplyToken::as_str),
            Some("0f3779fba3b349968c5d07db31eab56f")
        );
        assert_eq!(event.webhook_event_id(), Some("01FZ74A0TDDPYRVKNK77XKC3ZR"));
    }

    #[test]
    fn parses_group_source_with_optional_user() {
        let event = parse_one(json!({
            "type": "message",
            "timestamp": 0,
            "source": { "type": "group", "groupId": "Cgroup1" },
            "replyToken": "r",
            "message": { "id": "1", "type": "text", "text": "hi" }
        }));

        assert_eq!(event.group_id(), Some("Cgroup1"));
        assert_eq!(event.user_id(), None);
        assert_eq!(event.source().unwrap().chat_id(), "Cgroup1");
    }

    #[test]
    fn parses_sticker_content() {
        let event = parse_one(json!({
            "type": "message",
            "timestamp": 0,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "r",
            "message": { "id": "2", "type": "sticker", "packageId": "1", "stickerId": "13" }
        }));

        match event.payload() {
            EventPayload::Message(MessageContent::Sticker {
                package_id,
                sticker_id,
                ..
            }) => {
                assert_eq!(package_id, "1");
                assert_eq!(sticker_id, "13");
            }
            other => panic!("expected sticker content, got {other:?}"),
        }
        assert_eq!(event.text(), None);
    }

    #[test]
    fn unknown_message_content_becomes_other() {
        let event = parse_one(json!({
            "type": "message",
            "timestamp": 0,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "r",
            "message": { "id": "3", "type": "video", "duration": 60000 }
        }));

        match event.payload() {
            EventPayload::Message(MessageContent::Other { kind, .. }) => {
                assert_eq!(kind, "video");
            }
            other => panic!("expected other content, got {other:?}"),
        }
    }

    #[test]
    fn parses_postback_event() {
        let event = parse_one(json!({
            "type": "postback",
            "timestamp": 0,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "r",
            "postback": { "data": "action=buy&itemid=123" }
        }));

        match event.payload() {
            EventPayload::Postback(postback) => {
                assert_eq!(postback.data, "action=buy&itemid=123");
                assert!(postback.params.is_none());
            }
            other => panic!("expected postback payload, got {other:?}"),
        }
    }

    #[test]
    fn parses_follow_and_unfollow() {
        let follow = parse_one(json!({
            "type": "follow",
            "timestamp": 0,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "r"
        }));
        assert_eq!(follow.kind(), EventKind::Follow);
        assert!(follow.reply_token().is_some());

        let unfollow = parse_one(json!({
            "type": "unfollow",
            "timestamp": 0,
            "source": { "type": "user", "userId": "U1" }
        }));
        assert_eq!(unfollow.kind(), EventKind::Unfollow);
        assert!(unfollow.reply_token().is_none());
    }

    #[test]
    fn parses_member_joined_members() {
        let event = parse_one(json!({
            "type": "memberJoined",
            "timestamp": 0,
            "source": { "type": "group", "groupId": "Cg" },
            "replyToken": "r",
            "joined": { "members": [
                { "type": "user", "userId": "U1" },
                { "type": "user", "userId": "U2" }
            ]}
        }));

        match event.payload() {
            EventPayload::MemberJoined { members } => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[1].user_id(), Some("U2"));
            }
            other => panic!("expected memberJoined payload, got {other:?}"),
        }
    }

    #[test]
    fn parses_beacon_event() {
        let event = parse_one(json!({
            "type": "beacon",
            "timestamp": 0,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "r",
            "beacon": { "hwid": "d41d8cd98f", "type": "enter" }
        }));

        match event.payload() {
            EventPayload::Beacon(beacon) => {
                assert_eq!(beacon.hwid, "d41d8cd98f");
                assert_eq!(beacon.beacon_type, "enter");
            }
            other => panic!("expected beacon payload, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_becomes_unrecognized() {
        let event = parse_one(json!({
            "type": "videoPlayComplete",
            "timestamp": 7,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "r",
            "videoPlayComplete": { "trackingId": "track-id" }
        }));

        assert_eq!(event.kind(), EventKind::Unrecognized);
        match event.payload() {
            EventPayload::Unrecognized { kind, raw } => {
                assert_eq!(kind, "videoPlayComplete");
                assert_eq!(raw["videoPlayComplete"]["trackingId"], "track-id");
            }
            other => panic!("expected unrecognized payload, got {other:?}"),
        }
        // The envelope still parsed.
        assert_eq!(event.timestamp(), 7);
        assert!(event.reply_token().is_some());
    }

    #[test]
    fn known_kind_with_missing_payload_is_rejected() {
        let body = json!({ "events": [{
            "type": "message",
            "timestamp": 0,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "r"
        }]})
        .to_string();

        match parse_payload(&body) {
            Err(ParseError::MissingField { field }) => assert_eq!(field, "message"),
            other => panic!("expected missing-field error, got {other:?}"),
        }
    }

    #[test]
    fn event_without_type_is_rejected() {
        let body = json!({ "events": [{ "timestamp": 0 }] }).to_string();
        assert!(matches!(
            parse_payload(&body),
            Err(ParseError::MissingField { field: "type" })
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_payload("{ not json"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn payload_without_events_is_rejected() {
        assert!(matches!(
            parse_payload(r#"{"destination":"U1"}"#),
            Err(ParseError::MissingField { field: "events" })
        ));
        assert!(matches!(
            parse_payload(r#"{"events":42}"#),
            Err(ParseError::InvalidField { field: "events" })
        ));
    }

    #[test]
    fn batch_preserves_delivery_order() {
        let body = json!({ "destination": "Ubot", "events": [
            { "type": "follow", "timestamp": 1,
              "source": { "type": "user", "userId": "U1" }, "replyToken": "a" },
            { "type": "unfollow", "timestamp": 2,
              "source": { "type": "user", "userId": "U1" } }
        ]})
        .to_string();

        let payload = parse_payload(&body).unwrap();
        assert_eq!(payload.destination.as_deref(), Some("Ubot"));
        let kinds: Vec<EventKind> = payload.events.iter().map(Event::kind).collect();
        assert_eq!(kinds, vec![EventKind::Follow, EventKind::Unfollow]);
    }
}
