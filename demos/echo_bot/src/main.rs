//! Echo Bot Demo
//!
//! A self-contained demonstration of the Weft framework. Instead of a real
//! HTTP messaging client, outbound calls go to [`ConsoleApi`], which prints
//! them, so the demo runs without credentials. Webhook deliveries are
//! simulated by feeding JSON bodies straight into the bot.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use weft::prelude::*;
use weft::{ApiResult, ReplyToken, RuntimeResult};

// ============================================================================
// Console-backed messaging API
// ============================================================================

/// Prints outbound calls instead of sending them.
struct ConsoleApi;

#[async_trait]
impl MessagingApi for ConsoleApi {
    async fn reply_message(
        &self,
        reply_token: &ReplyToken,
        messages: Vec<OutgoingMessage>,
    ) -> ApiResult<()> {
        for message in &messages {
            info!(token = reply_token.as_str(), ?message, "reply");
        }
        Ok(())
    }

    async fn push_message(&self, to: &str, messages: Vec<OutgoingMessage>) -> ApiResult<()> {
        for message in &messages {
            info!(to, ?message, "push");
        }
        Ok(())
    }

    async fn show_loading_animation(&self, chat_id: &str, seconds: u8) -> ApiResult<()> {
        info!(chat_id, seconds, "loading animation");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// `!hello`: the classic.
async fn hello(ctx: Arc<Context>, _inv: CommandInvocation) -> Result<(), BoxError> {
    ctx.reply_text("Hello, world!").await?;
    Ok(())
}

/// `!plus <a> <b>`: adds two integers, with typed argument errors reported
/// back to the chat.
async fn plus(ctx: Arc<Context>, inv: CommandInvocation) -> Result<(), BoxError> {
    match (inv.arg::<i64>(0), inv.arg::<i64>(1)) {
        (Ok(a), Ok(b)) => ctx.reply_text(format!("{a} + {b} = {}", a + b)).await?,
        (Err(err), _) | (_, Err(err)) => ctx.reply_text(err.to_string()).await?,
    }
    Ok(())
}

/// `!echo <text...>`: echoes the arguments back.
async fn echo(ctx: Arc<Context>, inv: CommandInvocation) -> Result<(), BoxError> {
    if inv.args.is_empty() {
        ctx.reply_text("Nothing to echo.").await?;
    } else {
        ctx.reply_text(inv.args.join(" ")).await?;
    }
    Ok(())
}

/// Greets every new follower.
async fn on_follow(ctx: Arc<Context>) -> Result<(), BoxError> {
    ctx.reply_text("Thanks for adding me! Try !hello").await?;
    Ok(())
}

/// Logs every message, command or not.
async fn log_message(ctx: Arc<Context>) -> Result<(), BoxError> {
    info!(
        user = ctx.user_id().unwrap_or("unknown"),
        text = ctx.text().unwrap_or(""),
        "message received"
    );
    Ok(())
}

fn example_module() -> Module {
    Module::new("example")
        .command("hello", hello)
        .command("plus", plus)
        .command("echo", echo)
        .listener(EventKind::Follow, on_follow)
        .listener(EventKind::Message, log_message)
        .on_setup(|host| async move {
            info!(module = host.module_name(), "module ready");
            Ok(())
        })
}

// ============================================================================
// Simulated webhook deliveries
// ============================================================================

fn message_delivery(token: &str, text: &str) -> String {
    json!({ "destination": "Udemo", "events": [{
        "type": "message",
        "timestamp": 1_700_000_000_000_i64,
        "source": { "type": "user", "userId": "Udemo-user" },
        "replyToken": token,
        "message": { "id": "1", "type": "text", "text": text }
    }]})
    .to_string()
}

fn follow_delivery(token: &str) -> String {
    json!({ "destination": "Udemo", "events": [{
        "type": "follow",
        "timestamp": 1_700_000_000_000_i64,
        "source": { "type": "user", "userId": "Udemo-user" },
        "replyToken": token
    }]})
    .to_string()
}

#[tokio::main]
async fn main() -> RuntimeResult<()> {
    let runtime = Runtime::new(WeftConfig::default(), Arc::new(ConsoleApi));
    runtime.init_logging();

    let bot = runtime.bot();
    bot.add_module(example_module())
        .await
        .expect("example module registers cleanly");

    for body in [
        follow_delivery("tok-0"),
        message_delivery("tok-1", "!hello"),
        message_delivery("tok-2", "!plus 2 40"),
        message_delivery("tok-3", "!plus 2 forty"),
        message_delivery("tok-4", "!echo it works"),
        message_delivery("tok-5", "just chatting"),
        message_delivery("tok-6", "!nosuch"),
    ] {
        let reports = bot.handle_webhook(&body).await.expect("delivery parses");
        for report in reports {
            info!(
                kind = %report.kind,
                command = report.command.as_deref(),
                invoked = report.invoked,
                failed = report.failed,
                "event handled"
            );
        }
    }

    bot.shutdown().await;
    Ok(())
}
