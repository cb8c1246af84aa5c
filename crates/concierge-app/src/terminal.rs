//! A [`Surface`] that prints the conversation to a terminal.

use std::io::Write;
use std::sync::{LazyLock, Mutex};

use concierge_core::{QuickReply, RenderEvent};
use concierge_dialogue::Surface;
use regex::Regex;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid line break regex"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid markup regex"));

/// Message bodies carry light HTML (`<br>`, `<strong>`). Render it as text.
pub fn plain_text(html: &str) -> String {
    let text = LINE_BREAK.replace_all(html, "\n");
    let text = TAG.replace_all(&text, "");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    /// One JSON object per event.
    Json,
}

pub struct TerminalSurface {
    out: Mutex<Box<dyn Write + Send>>,
    format: OutputFormat,
}

impl TerminalSurface {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::with_writer(std::io::stdout(), format)
    }

    pub fn with_writer(writer: impl Write + Send + 'static, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
            format,
        }
    }

    fn write(&self, chunk: &str) {
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = out.write_all(chunk.as_bytes()).and_then(|_| out.flush()) {
            tracing::debug!(error = %e, "Terminal write failed");
        }
    }
}

fn reply_command(reply: QuickReply) -> &'static str {
    match reply {
        QuickReply::Yes => "yes",
        QuickReply::No => "no",
    }
}

fn render_text(event: &RenderEvent) -> Option<String> {
    let chunk = match event {
        RenderEvent::BotTurn {
            text, links, reveal, ..
        } => {
            if *reveal {
                // Body follows token by token
                "bot> ".to_string()
            } else {
                let mut chunk = format!("bot> {}\n", plain_text(text));
                for link in links {
                    chunk.push_str(&format!("     -> {}: {}\n", link.label, link.url));
                }
                chunk
            }
        }
        RenderEvent::RevealToken { token, .. } => format!("{} ", plain_text(token)),
        RenderEvent::RevealComplete { .. } => "\n".to_string(),
        RenderEvent::UserTurn { text, .. } => format!("you> {}\n", text),
        RenderEvent::Options {
            prompt, options, ..
        } => {
            let mut chunk = format!("bot> {}\n", plain_text(prompt));
            for (i, option) in options.iter().enumerate() {
                chunk.push_str(&format!("  {:>2}. {}\n", i + 1, option.label));
            }
            chunk
        }
        RenderEvent::QuickReplies {
            prompt, replies, ..
        } => {
            let choices: Vec<String> = replies
                .iter()
                .map(|r| format!("/{} = {}", reply_command(r.reply), r.label))
                .collect();
            format!("bot> {}  [{}]\n", plain_text(prompt), choices.join(", "))
        }
        RenderEvent::PendingShown => "bot> ...\n".to_string(),
        RenderEvent::Cleared => format!("\n{}\n\n", "-".repeat(40)),
        _ => return None,
    };
    Some(chunk)
}

impl Surface for TerminalSurface {
    fn emit(&self, event: RenderEvent) {
        match self.format {
            OutputFormat::Text => {
                if let Some(chunk) = render_text(&event) {
                    self.write(&chunk);
                }
            }
            OutputFormat::Json => match serde_json::to_string(&event) {
                Ok(line) => self.write(&format!("{}\n", line)),
                Err(e) => tracing::warn!(error = %e, "Could not encode render event"),
            },
        }
    }
}
