//! Outbound message model.
//!
//! [`OutgoingMessage`] serializes into the messaging API's camelCase wire
//! shape, ready to be embedded in a reply or push request body by the
//! [`MessagingApi`](crate::api::MessagingApi) implementation.

use serde::Serialize;

/// A message to send through a reply or push call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingMessage {
    /// A plain text message. At most 5000 characters on the wire.
    Text {
        /// The message text.
        text: String,
    },
    /// A sticker from a sticker package.
    #[serde(rename_all = "camelCase")]
    Sticker {
        /// Sticker package id.
        package_id: String,
        /// Sticker id within the package.
        sticker_id: String,
    },
    /// An image, referenced by HTTPS URL. URLs are capped at 2000 characters
    /// on the wire.
    #[serde(rename_all = "camelCase")]
    Image {
        /// URL of the full image.
        original_content_url: String,
        /// URL of the preview shown in the chat list.
        preview_image_url: String,
    },
    /// A location pin.
    Location {
        /// Place title.
        title: String,
        /// Street address.
        address: String,
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
}

impl OutgoingMessage {
    /// A text message.
    pub fn text(text: impl Into<String>) -> Self {
        OutgoingMessage::Text { text: text.into() }
    }

    /// A sticker message.
    pub fn sticker(package_id: impl Into<String>, sticker_id: impl Into<String>) -> Self {
        OutgoingMessage::Sticker {
            package_id: package_id.into(),
            sticker_id: sticker_id.into(),
        }
    }

    /// An image message. When `preview_url` is `None` the full image URL is
    /// reused as the preview.
    pub fn image(original_url: impl Into<String>, preview_url: Option<String>) -> Self {
        let original_content_url = original_url.into();
        let preview_image_url = preview_url.unwrap_or_else(|| original_content_url.clone());
        OutgoingMessage::Image {
            original_content_url,
            preview_image_url,
        }
    }
}
