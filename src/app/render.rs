use chrono::Local;

use crate::models::{ Message, Sender };

pub const THINKING: &str = "AI is thinking...";

pub fn header(title: &str) -> String {
    let rule = "=".repeat(title.chars().count().max(24));
    format!("{}\n{}\n{}", rule, title, rule)
}

pub fn error_line(message: &str) -> String {
    format!("! {}", message)
}

pub fn notice_line(message: &str) -> String {
    format!("* {}", message)
}

/// One log entry; continuation lines are indented under the first.
pub fn message(msg: &Message) -> String {
    let who = match msg.sender {
        Sender::User => "you",
        Sender::Ai => "ai",
    };
    let time = msg.sent_at.with_timezone(&Local).format("%H:%M");
    let prefix = format!("[{}] {:>3}: ", time, who);
    let indent = " ".repeat(prefix.len());

    let mut lines = msg.text.lines();
    let mut out = format!("{}{}", prefix, lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        out.push_str(&indent);
        out.push_str(line);
    }
    out
}
