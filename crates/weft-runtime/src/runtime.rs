//! Runtime orchestration.
//!
//! [`Runtime`] ties the pieces together for a typical process: load
//! configuration, initialize logging, build the [`Bot`], hand webhook bodies
//! to it, and drain gracefully on the shutdown signal. The HTTP server that
//! receives webhooks stays outside; it calls
//! [`bot().handle_webhook`](weft_framework::Bot::handle_webhook) with each
//! validated body.
//!
//! ```rust,ignore
//! use weft_runtime::Runtime;
//!
//! #[tokio::main]
//! async fn main() -> weft_runtime::RuntimeResult<()> {
//!     let runtime = Runtime::from_default_config(api)?;
//!     runtime.init_logging();
//!     runtime.bot().add_module(my_module()).await?;
//!
//!     // ... wire runtime.bot() into the webhook server ...
//!
//!     runtime.run_until_shutdown().await
//! }
//! ```

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use weft_core::BoxedApi;
use weft_framework::Bot;

use crate::config::{ConfigLoader, WeftConfig};
use crate::error::RuntimeResult;
use crate::logging::LoggingBuilder;

/// Owns the bot and the process lifecycle around it.
pub struct Runtime {
    config: WeftConfig,
    bot: Arc<Bot>,
}

impl Runtime {
    /// Builds a runtime from an explicit configuration.
    pub fn new(config: WeftConfig, api: BoxedApi) -> Self {
        let bot = Bot::builder(api)
            .dispatch_config(config.dispatch_config())
            .build();
        Self {
            config,
            bot: Arc::new(bot),
        }
    }

    /// Builds a runtime from the default config search path
    /// (`weft.toml`, `WEFT_*` environment).
    pub fn from_default_config(api: BoxedApi) -> RuntimeResult<Self> {
        let config = ConfigLoader::new().load()?;
        Ok(Self::new(config, api))
    }

    /// Initializes logging as the configuration describes.
    pub fn init_logging(&self) {
        LoggingBuilder::from_config(&self.config.logging).init();
    }

    /// The loaded configuration.
    pub fn config(&self) -> &WeftConfig {
        &self.config
    }

    /// The bot, for module registration and webhook handling.
    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// Waits for ctrl-c, then shuts the bot down.
    ///
    /// In-flight events drain to completion; payloads arriving after the
    /// signal are rejected.
    pub async fn run_until_shutdown(&self) -> RuntimeResult<()> {
        info!("runtime started; waiting for shutdown signal");
        signal::ctrl_c().await?;
        info!("shutdown signal received, draining in-flight events");
        self.bot.shutdown().await;
        Ok(())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("prefix", &self.config.command.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use weft_core::{ApiResult, MessagingApi, OutgoingMessage, ReplyToken};

    struct NullApi;

    #[async_trait]
    impl MessagingApi for NullApi {
        async fn reply_message(
            &self,
            _reply_token: &ReplyToken,
            _messages: Vec<OutgoingMessage>,
        ) -> ApiResult<()> {
            Ok(())
        }

        async fn push_message(&self, _to: &str, _messages: Vec<OutgoingMessage>) -> ApiResult<()> {
            Ok(())
        }

        async fn show_loading_animation(&self, _chat_id: &str, _seconds: u8) -> ApiResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn runtime_builds_bot_from_config() {
        let mut config = WeftConfig::default();
        config.command.prefix = "/".to_string();
        let runtime = Runtime::new(config, Arc::new(NullApi));

        let body = serde_json::json!({ "events": [{
            "type": "message",
            "timestamp": 1,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "tok",
            "message": { "id": "1", "type": "text", "text": "/ping" }
        }]})
        .to_string();

        // No handler bound; the configured prefix still drives parsing, so
        // this falls through as a plain message with zero handlers.
        let reports = runtime.bot().handle_webhook(&body).await.unwrap();
        assert_eq!(reports[0].invoked, 0);
        assert_eq!(reports[0].command, None);
    }
}
