//! # tb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use tb_core::filter::{FilterParams, TicketFilter};
use tb_core::models::IndexProps;
use tb_core::pagination::{PageRequest, PagingDefaults};
use tb_core::search::ParsedSearch;
use tb_core::traits::TicketRepo;
use tb_ui::IndexTemplate;

use crate::error::ApiError;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Arc<dyn TicketRepo>,
    pub paging: PagingDefaults,
}

/// Query string of `GET /`. Everything is taken as text so that bad values
/// degrade to defaults or field errors instead of a 400.
#[derive(Debug, Default)]
pub struct IndexQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub reporter: Option<String>,
    pub labels: Option<String>,
    /// Raw search box. Its tokens fill any field not given explicitly.
    pub q: Option<String>,
}

fn prefer(explicit: &Option<String>, parsed: Option<String>) -> Option<String> {
    explicit.clone().filter(|value| !value.is_empty()).or(parsed)
}

impl IndexQuery {
    /// Reads raw query pairs. A repeated key keeps its last value and
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = IndexQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "pageSize" => &mut query.page_size,
                "search" => &mut query.search,
                "after" => &mut query.after,
                "before" => &mut query.before,
                "reporter" => &mut query.reporter,
                "labels" => &mut query.labels,
                "q" => &mut query.q,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }

    pub fn filter_params(&self) -> FilterParams {
        let parsed = self
            .q
            .as_deref()
            .map(|q| ParsedSearch::parse(q).to_filter_params())
            .unwrap_or_default();

        FilterParams {
            search: prefer(&self.search, parsed.search),
            after: prefer(&self.after, parsed.after),
            before: prefer(&self.before, parsed.before),
            reporter: prefer(&self.reporter, parsed.reporter),
            labels: prefer(&self.labels, parsed.labels),
        }
    }
}

/// Validates the filters, runs the count + page query and assembles the props.
/// Invalid filters are reported in `errors` and left out of the query.
pub async fn list_tickets(state: &AppState, query: &IndexQuery) -> Result<IndexProps, ApiError> {
    let params = query.filter_params();
    let filter = TicketFilter::build(&params);
    let page = PageRequest::from_raw(query.page.as_deref(), query.page_size.as_deref(), &state.paging);

    if !filter.errors().is_empty() {
        let fields: Vec<_> = filter.errors().keys().map(|field| field.as_str()).collect();
        log::debug!("skipping invalid filter(s): {}", fields.join(", "));
    }

    let tickets = state
        .repo
        .search(&filter, &page)
        .await
        .map_err(tb_core::AppError::from)?;

    Ok(IndexProps {
        tickets,
        search: params.search.unwrap_or_default(),
        after: params.after.unwrap_or_default(),
        before: params.before.unwrap_or_default(),
        reporter: params.reporter.unwrap_or_default(),
        labels: params.labels.unwrap_or_default(),
        page: page.page,
        page_size: page.page_size,
        errors: filter.into_errors(),
    })
}

/// JSON for incremental clients, HTML for everyone else.
fn wants_json(req: &HttpRequest) -> bool {
    let headers = req.headers();
    headers.contains_key("x-inertia")
        || headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|accept| accept.contains("application/json"))
}

/// Renders the ticket list (`GET /`)
pub async fn index(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse, ApiError> {
    let query = IndexQuery::from_pairs(query.into_inner());
    let props = list_tickets(&data, &query).await?;

    if wants_json(&req) {
        return Ok(HttpResponse::Ok().json(props));
    }

    let html = IndexTemplate::from_props(&props).render()?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

/// Liveness probe.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use chrono::{Duration, Utc};
    use tb_core::models::{NewTicket, TicketPage};
    use tb_db_sqlite::SqliteTicketRepo;

    fn ticket(id: &str, title: &str, email: &str, creation_time: i64, labels: &[&str]) -> NewTicket {
        NewTicket {
            id: id.into(),
            title: title.into(),
            content: "details".into(),
            user_email: email.into(),
            creation_time,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    async fn state(tickets: Vec<NewTicket>) -> web::Data<AppState> {
        let repo = SqliteTicketRepo::in_memory().await.unwrap();
        repo.insert_many(tickets).await.unwrap();
        web::Data::new(AppState {
            repo: Arc::new(repo),
            paging: PagingDefaults::default(),
        })
    }

    async fn get_json(data: web::Data<AppState>, uri: &str) -> serde_json::Value {
        let app = test::init_service(App::new().app_data(data).configure(crate::configure_routes)).await;
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header((header::ACCEPT, "application/json"))
            .to_request();
        test::call_and_read_body_json(&app, req).await
    }

    #[actix_web::test]
    async fn test_invalid_filters_surface_all_errors() {
        let data = state(vec![]).await;
        let body = get_json(
            data,
            "/?page=1&pageSize=20&search=&after=invalid-date&before=wrong-format&reporter=not-an-email&labels=%20,%20,",
        )
        .await;

        assert_eq!(
            body["errors"],
            serde_json::json!({
                "after": "Invalid \"after\" date format. Use DD/MM/YYYY or YYYY-MM-DD.",
                "before": "Invalid \"before\" date format. Use DD/MM/YYYY or YYYY-MM-DD.",
                "reporter": "Invalid \"reporter\" format. Use reporter:email@domain.com.",
                "labels": "Invalid \"labels\" format. Use labels:tag1,tag2",
            })
        );
        assert_eq!(body["tickets"]["meta"]["total"], 0);
        assert_eq!(body["tickets"]["meta"]["lastPage"], 1);
    }

    #[actix_web::test]
    async fn test_repeated_key_keeps_last_value() {
        let data = state(vec![ticket("t-1", "Login issue", "user@example.com", 0, &[])]).await;
        let app = test::init_service(App::new().app_data(data).configure(crate::configure_routes)).await;
        let req = test::TestRequest::get()
            .uri("/?after=2024-01-01&after=oops&pageSize=5&pageSize=10")
            .insert_header((header::ACCEPT, "application/json"))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["after"], "oops");
        assert_eq!(
            body["errors"],
            serde_json::json!({ "after": "Invalid \"after\" date format. Use DD/MM/YYYY or YYYY-MM-DD." })
        );
        assert_eq!(body["pageSize"], 10);
        assert_eq!(body["tickets"]["meta"]["total"], 1);
    }

    #[::core::prelude::v1::test]
    fn test_query_pairs_ignore_unknown_keys() {
        let query = IndexQuery::from_pairs(vec![
            ("q".to_string(), "after:2024-01-01 xss".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
            ("search".to_string(), "csrf".to_string()),
        ]);
        let params = query.filter_params();
        assert_eq!(params.search.as_deref(), Some("csrf"));
        assert_eq!(params.after.as_deref(), Some("2024-01-01"));
    }

    #[actix_web::test]
    async fn test_filtered_ticket_with_all_fields() {
        let now = Utc::now().timestamp_millis();
        let data = state(vec![
            ticket("t-1", "Login issue", "user@example.com", now, &["bug", "urgent"]),
            ticket("t-2", "Login timeout", "other@example.com", now, &["bug"]),
        ])
        .await;

        let body = get_json(data, "/?search=login&reporter=user@example.com&labels=bug").await;

        assert_eq!(body["errors"], serde_json::json!({}));
        let tickets = body["tickets"]["data"].as_array().unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0]["id"], "t-1");
        assert_eq!(tickets[0]["creationTime"], now);
        assert_eq!(tickets[0]["userEmail"], "user@example.com");
        assert_eq!(tickets[0]["labels"], serde_json::json!(["bug", "urgent"]));
        assert!(tickets[0]["createdAt"].is_string());
        assert!(tickets[0]["updatedAt"].is_string());
        assert_eq!(body["search"], "login");
        assert_eq!(body["pageSize"], 20);
    }

    #[actix_web::test]
    async fn test_search_box_tokens_fill_filters() {
        let now = Utc::now();
        let data = state(vec![
            ticket("old", "XSS in comments", "a@corp.io", (now - Duration::days(3)).timestamp_millis(), &[]),
            ticket("new", "XSS in search", "a@corp.io", (now + Duration::days(1)).timestamp_millis(), &[]),
            ticket("csrf", "CSRF on logout", "a@corp.io", (now + Duration::days(1)).timestamp_millis(), &[]),
        ])
        .await;

        let today = now.format("%d/%m/%Y").to_string();
        let body = get_json(data, &format!("/?q=after:{today}%20xss")).await;

        let titles: Vec<_> = body["tickets"]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["XSS in search"]);
        assert_eq!(body["after"], today);
        assert_eq!(body["search"], "xss");
    }

    #[actix_web::test]
    async fn test_cumulative_pages() {
        let tickets = (0..25)
            .map(|i| ticket(&format!("t{i:02}"), &format!("Ticket {i}"), "a@b.io", i, &[]))
            .collect();
        let data = state(tickets).await;

        let body = get_json(data, "/?page=2").await;
        let page: TicketPage = serde_json::from_value(body["tickets"].clone()).unwrap();

        assert_eq!(page.data.len(), 25);
        assert_eq!(page.meta.current_page, 2);
        assert_eq!(page.meta.last_page, 2);
        assert_eq!(page.data[0].id, "t24");
    }

    #[actix_web::test]
    async fn test_html_is_default_representation() {
        let data = state(vec![ticket("t-1", "Open redirect", "a@b.io", 0, &["medium"])]).await;
        let app = test::init_service(App::new().app_data(data).configure(crate::configure_routes)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());
        let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/html"));

        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("Open redirect"));
        assert!(html.contains("label-medium"));
    }

    #[actix_web::test]
    async fn test_health() {
        let data = state(vec![]).await;
        let app = test::init_service(App::new().app_data(data).configure(crate::configure_routes)).await;
        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(body, "ok");
    }
}
