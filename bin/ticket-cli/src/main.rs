//! # Ticket CLI
//!
//! Terminal browser for a running ticket board. The prompt plays the part of
//! the scroll position: an empty line means the end of the list came into
//! view.
//!
//! ```text
//! search after:27/09/2019 xss   new search (the whole line is the search box)
//! <enter>                       scrolled to the bottom, load the next page
//! hide <id>                     hide a ticket for this session
//! unhide                        show hidden tickets again
//! quit
//! ```

use tb_client::{HttpTicketSource, ListState, TicketFeed, TicketSource};
use tb_config::Settings;
use tb_ui::format_timestamp;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Prints visible tickets from `from` onwards and returns how many rows the
/// list now holds.
fn render<S: TicketSource>(feed: &TicketFeed<S>, from: usize) -> usize {
    let state = feed.state();
    for ticket in state.tickets().iter().skip(from) {
        if state.is_hidden(&ticket.id) {
            continue;
        }
        println!("[{}] {}", ticket.id, ticket.title);
        println!(
            "    By {} | {}  {}",
            ticket.user_email,
            format_timestamp(ticket.creation_time),
            ticket.labels.join(", ")
        );
    }
    state.tickets().len()
}

fn summary<S: TicketSource>(feed: &TicketFeed<S>) {
    let state = feed.state();
    if !state.errors().is_empty() {
        let messages: Vec<_> = state.errors().values().cloned().collect();
        println!("! {}", messages.join(" "));
    }
    if state.tickets().is_empty() {
        if state.search().trim().is_empty() {
            println!("No security issues found.");
        } else {
            println!("No issues found matching your search.");
        }
    }
    println!(
        "-- showing {} of {} issues ({} hidden){}",
        state.visible().count(),
        state.meta().total,
        state.hidden_count(),
        if state.has_more_pages() { ", <enter> for more" } else { "" }
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tb_config::load_dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let settings = Settings::load()?;
    let source = HttpTicketSource::new(&settings.server_url)?;
    let mut feed = TicketFeed::new(source, ListState::new(settings.default_page_size));

    let initial = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    feed.handle_search(&initial).await;
    let mut shown = render(&feed, 0);
    summary(&feed);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {
                if feed.reach_end().await {
                    shown = render(&feed, shown);
                }
            }
            "search" => {
                feed.handle_search(rest).await;
                shown = render(&feed, 0);
            }
            "hide" => {
                if !feed.hide(rest.trim()) {
                    println!("{} is already hidden", rest.trim());
                }
            }
            "unhide" => {
                feed.unhide_all();
                shown = render(&feed, 0);
            }
            "quit" | "exit" => break,
            other => {
                println!("unknown command: {other}");
                continue;
            }
        }
        summary(&feed);
    }

    Ok(())
}
