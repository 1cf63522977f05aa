// Device gestures sent through the transport.
// Every method returns a status line; transport failures become "Error: ..." text.
use std::sync::Arc;
use std::time::Duration;

use crate::device::transport::DeviceTransport;
use crate::executor::text_input::{escape_text_for_input, has_untypable_chars};

pub struct AndroidInput {
    transport: Arc<dyn DeviceTransport>,
    /// Wait after each gesture so the next screen capture sees its effect.
    settle_delay: Duration,
    /// Wait between the focusing tap and typing.
    focus_delay: Duration,
}

impl AndroidInput {
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        settle_delay: Duration,
        focus_delay: Duration,
    ) -> Self {
        Self {
            transport,
            settle_delay,
            focus_delay,
        }
    }

    pub async fn tap(&self, x: i64, y: i64) -> String {
        tracing::info!(x, y, "tap");
        let (xs, ys) = (x.to_string(), y.to_string());
        self.gesture(&["shell", "input", "tap", xs.as_str(), ys.as_str()], format!("Tapped at ({x}, {y})"))
            .await
    }

    pub async fn type_text(&self, text: &str, focus: Option<(i64, i64)>) -> String {
        if let Some((x, y)) = focus {
            tracing::info!(x, y, "focusing text field");
            let (xs, ys) = (x.to_string(), y.to_string());
            if let Err(e) = self.transport.run(&["shell", "input", "tap", xs.as_str(), ys.as_str()]).await {
                return format!("Error: {e}");
            }
            tokio::time::sleep(self.focus_delay).await;
        }

        if has_untypable_chars(text) {
            tracing::warn!(text = %text, "text contains characters adb input may drop");
        }
        tracing::info!(text = %text, "typing");
        let escaped = escape_text_for_input(text);
        let done = match focus {
            Some((x, y)) => format!("Typed \"{text}\" into field at ({x}, {y})"),
            None => format!("Typed \"{text}\""),
        };
        self.gesture(&["shell", "input", "text", escaped.as_str()], done).await
    }

    pub async fn home(&self) -> String {
        tracing::info!("home");
        self.gesture(&["shell", "input", "keyevent", "KEYCODE_HOME"], "Pressed HOME".into())
            .await
    }

    pub async fn back(&self) -> String {
        tracing::info!("back");
        self.gesture(&["shell", "input", "keyevent", "KEYCODE_BACK"], "Pressed BACK".into())
            .await
    }

    pub async fn swipe(&self, x1: i64, y1: i64, x2: i64, y2: i64, duration_ms: i64) -> String {
        if duration_ms < 0 {
            return format!("Error: duration_ms must be non-negative, got {duration_ms}");
        }
        tracing::info!(x1, y1, x2, y2, duration_ms, "swipe");
        let args = [x1, y1, x2, y2, duration_ms].map(|v| v.to_string());
        self.gesture(
            &["shell", "input", "swipe", args[0].as_str(), args[1].as_str(), args[2].as_str(), args[3].as_str(), args[4].as_str()],
            format!("Swiped from ({x1}, {y1}) to ({x2}, {y2}) over {duration_ms}ms"),
        )
        .await
    }

    pub async fn wait(&self, seconds: f64) -> String {
        if !seconds.is_finite() || seconds < 0.0 {
            return format!("Error: seconds must be a non-negative number, got {seconds}");
        }
        let Ok(duration) = Duration::try_from_secs_f64(seconds) else {
            return format!("Error: seconds out of range, got {seconds:e}");
        };
        tracing::info!(seconds, "waiting");
        tokio::time::sleep(duration).await;
        format!("Waited {seconds} seconds")
    }

    async fn gesture(&self, args: &[&str], done: String) -> String {
        match self.transport.run(args).await {
            Ok(_) => {
                tokio::time::sleep(self.settle_delay).await;
                done
            }
            Err(e) => {
                tracing::warn!(error = %e, "device action failed");
                format!("Error: {e}")
            }
        }
    }
}
