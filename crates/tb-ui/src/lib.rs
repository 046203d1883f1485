//! # tb-ui
//!
//! Askama view of the ticket list. Handlers hand over the same
//! [`IndexProps`] they would serialize as JSON; everything the template needs
//! is precomputed here so the template stays logic-free.

use askama::Template;
use chrono::DateTime;
use tb_core::models::{IndexProps, Ticket};
use tb_core::search::ParsedSearch;

pub const PAGE_TITLE: &str = "Security Issues";

/// Content is clamped to this many lines until expanded.
pub const CLAMP_LINES: usize = 3;
/// Rough character count of [`CLAMP_LINES`] lines at the page's max width.
const CLAMP_CHARS: usize = 240;

/// Whether `content` likely overflows the clamped preview, so the row needs a
/// "See more" toggle.
pub fn is_truncated(content: &str) -> bool {
    content.lines().count() > CLAMP_LINES || content.chars().count() > CLAMP_CHARS
}

/// Badge colour for a label, keyed by its lowercased, whitespace-free form.
pub fn label_class(label: &str) -> &'static str {
    let normalized: String = label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    match normalized.as_str() {
        "low" => "label-low",
        "medium" => "label-medium",
        "highpriority" => "label-high",
        "critical" => "label-critical",
        _ => "label-default",
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub struct LabelBadge {
    pub text: String,
    pub class: &'static str,
}

pub struct TicketItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_email: String,
    pub filed_at: String,
    pub labels: Vec<LabelBadge>,
    pub truncated: bool,
}

impl From<&Ticket> for TicketItem {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            title: ticket.title.clone(),
            content: ticket.content.clone(),
            user_email: ticket.user_email.clone(),
            filed_at: format_timestamp(ticket.creation_time),
            truncated: is_truncated(&ticket.content),
            labels: ticket
                .labels
                .iter()
                .map(|label| LabelBadge {
                    text: label.clone(),
                    class: label_class(label),
                })
                .collect(),
        }
    }
}

/// The structured search currently applied, as echoed back in the props.
pub fn applied_search(props: &IndexProps) -> ParsedSearch {
    let field = |value: &str| (!value.is_empty()).then(|| value.to_string());
    ParsedSearch {
        text: props.search.clone(),
        after: field(&props.after),
        before: field(&props.before),
        reporter: field(&props.reporter),
        labels: field(&props.labels),
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: &'static str,
    /// Search box contents
    pub query: String,
    pub has_search: bool,
    pub error_message: String,
    pub total: i64,
    pub page_size: u32,
    pub items: Vec<TicketItem>,
    pub next_page_href: Option<String>,
}

impl IndexTemplate {
    pub fn from_props(props: &IndexProps) -> Self {
        let search = applied_search(props);
        let meta = &props.tickets.meta;

        let next_page_href = meta.has_more_pages().then(|| {
            let mut pairs: Vec<(&str, String)> = search.to_query_pairs();
            pairs.push(("page", (meta.current_page + 1).to_string()));
            pairs.push(("pageSize", meta.per_page.to_string()));
            format!("/?{}", serde_urlencoded::to_string(pairs).unwrap_or_default())
        });

        Self {
            title: PAGE_TITLE,
            query: search.to_string(),
            has_search: !search.is_empty(),
            error_message: props.errors.values().cloned().collect::<Vec<_>>().join(" "),
            total: meta.total,
            page_size: props.page_size,
            items: props.tickets.data.iter().map(TicketItem::from).collect(),
            next_page_href,
        }
    }
}
