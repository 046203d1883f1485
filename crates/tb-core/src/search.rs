//! # Search Box Parser
//!
//! Splits the single free-text search box into the structured request
//! parameters. Tokens are whitespace separated, double-quoted spans stay in one
//! token, and `after:`, `before:`, `reporter:`, `labels:` prefixes (any case)
//! select a field. A repeated prefix overwrites the earlier value.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::filter::FilterParams;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:[^\s"]+|"[^"]*")+"#).expect("static token pattern"));

const AFTER: &str = "after:";
const BEFORE: &str = "before:";
const REPORTER: &str = "reporter:";
const LABELS: &str = "labels:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSearch {
    pub text: String,
    pub after: Option<String>,
    pub before: Option<String>,
    pub reporter: Option<String>,
    pub labels: Option<String>,
}

fn strip_prefix_ignore_case<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    let head = token.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &token[prefix.len()..])
}

fn field_value(rest: &str) -> Option<String> {
    let value = rest.replace('"', "");
    (!value.is_empty()).then_some(value)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl ParsedSearch {
    pub fn parse(input: &str) -> Self {
        let mut parsed = ParsedSearch::default();
        let mut words = Vec::new();

        for token in TOKEN_RE.find_iter(input).map(|m| m.as_str()) {
            if let Some(rest) = strip_prefix_ignore_case(token, AFTER) {
                parsed.after = field_value(rest);
            } else if let Some(rest) = strip_prefix_ignore_case(token, BEFORE) {
                parsed.before = field_value(rest);
            } else if let Some(rest) = strip_prefix_ignore_case(token, REPORTER) {
                parsed.reporter = field_value(rest);
            } else if let Some(rest) = strip_prefix_ignore_case(token, LABELS) {
                parsed.labels = field_value(rest);
            } else {
                words.push(token);
            }
        }

        parsed.text = words.join(" ").trim().to_string();
        parsed
    }

    pub fn is_empty(&self) -> bool {
        *self == ParsedSearch::default()
    }

    /// Request parameters for this search, empty fields omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let fields = [
            ("search", non_empty(&self.text)),
            ("after", self.after.clone()),
            ("before", self.before.clone()),
            ("reporter", self.reporter.clone()),
            ("labels", self.labels.clone()),
        ];
        fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect()
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self.to_query_pairs()).unwrap_or_default()
    }

    /// Reads the structured fields back from request parameters. Unknown keys
    /// (`page`, `pageSize`, ...) are ignored.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = ParsedSearch::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "search" => parsed.text = value.to_string(),
                "after" => parsed.after = non_empty(value),
                "before" => parsed.before = non_empty(value),
                "reporter" => parsed.reporter = non_empty(value),
                "labels" => parsed.labels = non_empty(value),
                _ => {}
            }
        }
        parsed
    }

    pub fn from_query_string(query: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        Self::from_query_pairs(pairs)
    }

    pub fn to_filter_params(&self) -> FilterParams {
        FilterParams {
            search: non_empty(&self.text),
            after: self.after.clone(),
            before: self.before.clone(),
            reporter: self.reporter.clone(),
            labels: self.labels.clone(),
        }
    }
}

/// Renders back into search box form: `text after:.. before:.. reporter:.. labels:..`.
impl fmt::Display for ParsedSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if !self.text.is_empty() {
            parts.push(self.text.clone());
        }
        let prefixed = [
            (AFTER, &self.after),
            (BEFORE, &self.before),
            (REPORTER, &self.reporter),
            (LABELS, &self.labels),
        ];
        for (prefix, value) in prefixed {
            if let Some(value) = value {
                if value.chars().any(char::is_whitespace) {
                    parts.push(format!("{prefix}\"{value}\""));
                } else {
                    parts.push(format!("{prefix}{value}"));
                }
            }
        }
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TicketFilter;

    #[test]
    fn test_date_prefix_and_text() {
        let parsed = ParsedSearch::parse("after:27/09/2019 xss");
        assert_eq!(
            parsed,
            ParsedSearch {
                text: "xss".into(),
                after: Some("27/09/2019".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_round_trip_through_query_string() {
        let parsed = ParsedSearch::parse("after:27/09/2019 xss");
        let query = parsed.to_query_string();
        assert_eq!(query, "search=xss&after=27%2F09%2F2019");

        let url = format!("page=2&pageSize=20&{query}");
        let reparsed = ParsedSearch::from_query_string(&url);
        assert_eq!(reparsed, parsed);
        assert_eq!(
            TicketFilter::build(&reparsed.to_filter_params()),
            TicketFilter::build(&parsed.to_filter_params())
        );
    }

    #[test]
    fn test_quoted_spans_and_case_insensitive_prefixes() {
        let parsed = ParsedSearch::parse(r#"  "sql injection"   REPORTER:"bob@corp.io" Before:2024-01-01 login "#);
        assert_eq!(parsed.text, r#""sql injection" login"#);
        assert_eq!(parsed.reporter.as_deref(), Some("bob@corp.io"));
        assert_eq!(parsed.before.as_deref(), Some("2024-01-01"));
        assert_eq!(parsed.after, None);
    }

    #[test]
    fn test_repeated_prefix_last_wins() {
        let parsed = ParsedSearch::parse("after:2020-01-01 after:2021-01-01 labels:bug labels:critical,xss");
        assert_eq!(parsed.after.as_deref(), Some("2021-01-01"));
        assert_eq!(parsed.labels.as_deref(), Some("critical,xss"));
        assert!(parsed.text.is_empty());
    }

    #[test]
    fn test_display_is_reparseable() {
        let parsed = ParsedSearch {
            text: "csrf".into(),
            after: Some("01/01/2020".into()),
            reporter: Some("a@b.io".into()),
            labels: Some("low, medium".into()),
            ..Default::default()
        };
        let rendered = parsed.to_string();
        assert_eq!(rendered, r#"csrf after:01/01/2020 reporter:a@b.io labels:"low, medium""#);
        assert_eq!(ParsedSearch::parse(&rendered), parsed);
    }

    #[test]
    fn test_empty_input() {
        assert!(ParsedSearch::parse("   ").is_empty());
        assert!(ParsedSearch::parse("").to_query_pairs().is_empty());
    }
}
