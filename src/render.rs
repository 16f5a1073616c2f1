//! HTML rendering for the public listing and the editor form.
//!
//! Fragments are assembled by hand rather than through a template engine:
//! the markup surface is three small blocks and every interpolated value
//! goes through `escape_html`.

use crate::event_store::Event;
use serde_json::json;

/// Minimal HTML entity escaping, applied at every interpolation point.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats an event date as day.month.year, or an empty string when the
/// event has no date. The upcoming queries never return undated events, so
/// the empty branch is unreachable through the public listing; it is kept so
/// the fragment renderer is total over `Event`.
pub fn format_event_date(event: &Event) -> String {
    match event.date {
        Some(date) => date.format("%d.%m.%Y").to_string(),
        None => String::new(),
    }
}

pub fn render_event_item(event: &Event) -> String {
    format!(
        "<div class=\"event-item\">\
         <h3 class=\"event-title\">{}</h3>\
         <div class=\"event-date\">{}</div>\
         <div class=\"event-place\">{}</div>\
         </div>",
        escape_html(&event.title),
        format_event_date(event),
        escape_html(&event.place),
    )
}

pub fn render_events_list(events: &[Event]) -> String {
    events.iter().map(render_event_item).collect()
}

/// The full public page: the first page of events, the load-more button
/// (only when there is more than one page), and the client configuration
/// object the script reads the endpoint URL and anti-forgery token from.
pub fn render_events_page(
    events: &[Event],
    max_pages: u32,
    endpoint: &str,
    token: &str,
) -> String {
    let button = if max_pages > 1 {
        format!(
            "<button class=\"load-more-events\" data-page=\"1\" data-max-pages=\"{}\">\
             Show more</button>",
            max_pages
        )
    } else {
        String::new()
    };

    let pager_config = json!({ "endpoint": endpoint, "token": token });

    format!(
        "<!doctype html>\n<html>\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Upcoming events</title>\n\
         <link rel=\"stylesheet\" href=\"/assets/events.css\">\n\
         </head>\n<body>\n\
         <div class=\"events-list-wrapper\">\n\
         <div class=\"events-list\">{}</div>\n\
         {}\n\
         <p class=\"events-error\" hidden></p>\n\
         </div>\n\
         <script>window.eventsPager = {};</script>\n\
         <script src=\"/assets/events.js\" defer></script>\n\
         </body>\n</html>\n",
        render_events_list(events),
        button,
        pager_config,
    )
}

/// The editor form for an event's date and place, pre-filled from storage.
pub fn render_edit_form(event: &Event, token: &str) -> String {
    let date_value = event
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    format!(
        "<!doctype html>\n<html>\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Edit event</title>\n\
         </head>\n<body>\n\
         <h2>{}</h2>\n\
         <form class=\"event-edit\" method=\"post\" action=\"/v1/admin/event/{}/edit\">\n\
         <input type=\"hidden\" name=\"csrf_token\" value=\"{}\">\n\
         <div>\n\
         <label for=\"event_date\">Event date</label>\n\
         <input type=\"date\" id=\"event_date\" name=\"date\" value=\"{}\">\n\
         </div>\n\
         <div>\n\
         <label for=\"event_place\">Venue</label>\n\
         <input type=\"text\" id=\"event_place\" name=\"place\" value=\"{}\">\n\
         </div>\n\
         <button type=\"submit\">Save</button>\n\
         </form>\n\
         </body>\n</html>\n",
        escape_html(&event.title),
        escape_html(&event.id),
        escape_html(token),
        date_value,
        escape_html(&event.place),
    )
}
