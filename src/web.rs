use serde::Serialize;
use tera::{Context, Tera};

use crate::conversation_log::ConversationRecord;

/// How many conversations the index page lists.
pub const RECENT_ON_PAGE: usize = 10;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

#[derive(Debug, Serialize)]
struct ConversationView<'a> {
    id: u32,
    prompt: &'a str,
    response: &'a str,
    model: &'a str,
    response_length: usize,
    time: String,
}

impl<'a> From<&'a ConversationRecord> for ConversationView<'a> {
    fn from(record: &'a ConversationRecord) -> Self {
        Self {
            id: record.id,
            prompt: &record.prompt,
            response: &record.response,
            model: &record.model,
            response_length: record.response_length,
            time: display_timestamp(&record.timestamp),
        }
    }
}

/// `2024-05-01T12:30:45.123456` -> `2024-05-01 12:30:45`
fn display_timestamp(timestamp: &str) -> String {
    timestamp.chars().take(19).collect::<String>().replace('T', " ")
}

/// Renders the index page with autoescaping on. `recent` is expected
/// newest first.
pub fn render_index(
    model: &str,
    total: usize,
    recent: &[ConversationRecord],
    default_prompt: &str,
) -> tera::Result<String> {
    let conversations: Vec<ConversationView> = recent
        .iter()
        .take(RECENT_ON_PAGE)
        .map(ConversationView::from)
        .collect();

    let mut ctx = Context::new();
    ctx.insert("model_name", model);
    ctx.insert("total_conversations", &total);
    ctx.insert("default_prompt", default_prompt);
    ctx.insert("conversations", &conversations);

    Tera::one_off(INDEX_TEMPLATE, &ctx, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, prompt: &str) -> ConversationRecord {
        ConversationRecord {
            id,
            timestamp: "2024-05-01T12:30:45.123456".to_string(),
            prompt: prompt.to_string(),
            response: "ok".to_string(),
            model: "m".to_string(),
            response_length: 2,
        }
    }

    #[test]
    fn empty_history_shows_placeholder() {
        let html = render_index("llama3.2:3b", 0, &[], "Hello, how are you?").unwrap();
        assert!(html.contains("No conversations yet"));
        assert!(html.contains("<strong>Total Conversations:</strong> 0"));
        assert!(html.contains(r#"value="Hello, how are you?""#));
    }

    #[test]
    fn lists_conversations_in_given_order_and_escaped() {
        let recent = vec![record(2, "<script>x</script> & \"q\""), record(1, "first")];
        let html = render_index("m", 2, &recent, "hi").unwrap();

        assert!(!html.contains("No conversations yet"));
        assert!(!html.contains("<script>x"));
        assert!(html.contains("&lt;script&gt;x"));
        assert!(html.contains("&amp; &quot;q&quot;"));
        assert!(html.contains("Time: 2024-05-01 12:30:45"));
        let second = html.find("ID: #2").unwrap();
        let first = html.find("ID: #1").unwrap();
        assert!(second < first);
    }

    #[test]
    fn escapes_model_and_default_prompt() {
        let html = render_index("<m>", 0, &[], "\"><b>").unwrap();
        assert!(html.contains("<strong>Model:</strong> &lt;m&gt;"));
        assert!(html.contains(r#"value="&quot;&gt;&lt;b&gt;""#));
    }

    #[test]
    fn caps_listing_at_ten() {
        let recent: Vec<_> = (1..=15).rev().map(|i| record(i, "p")).collect();
        let html = render_index("m", 15, &recent, "hi").unwrap();
        assert_eq!(html.matches(r#"class="conversation""#).count(), RECENT_ON_PAGE);
        assert!(html.contains("ID: #15"));
        assert!(!html.contains("ID: #5 "));
    }
}
