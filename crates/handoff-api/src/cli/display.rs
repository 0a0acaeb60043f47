//! Shared table rendering for participants, requests, and connections.

use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use handoff_types::connection::{Connection, ConnectionRequest};
use handoff_types::participant::Participant;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::White))
            .collect::<Vec<_>>(),
    );
    table
}

fn account_cell(participant: &Participant) -> Cell {
    match participant.account() {
        Some(account) if participant.is_bot() => Cell::new(&account.id).fg(Color::Magenta),
        Some(account) => Cell::new(&account.id).fg(Color::Cyan),
        None => Cell::new("-").fg(Color::DarkGrey),
    }
}

/// Human-friendly age like "3m ago".
pub fn format_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        0..60 => format!("{secs}s ago"),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    }
}

pub fn print_empty(what: &str) {
    println!("  {}", style(format!("No {what}.")).dim());
}

pub fn participant_table(participants: &[Participant]) -> Table {
    let mut table = new_table(&["Account", "Name", "Channel", "Conversation", "Service URL"]);
    for p in participants {
        table.add_row(vec![
            account_cell(p),
            Cell::new(p.account_name().unwrap_or("-")),
            Cell::new(&p.channel_id),
            Cell::new(&p.conversation_id),
            Cell::new(&p.service_url).fg(Color::DarkGrey),
        ]);
    }
    table
}

pub fn request_table(requests: &[ConnectionRequest], now: DateTime<Utc>) -> Table {
    let mut table = new_table(&["Requestor", "Channel", "Conversation", "Waiting"]);
    for r in requests {
        table.add_row(vec![
            account_cell(&r.requestor),
            Cell::new(&r.requestor.channel_id),
            Cell::new(&r.requestor.conversation_id),
            Cell::new(format_ago(r.requested_at, now)).fg(Color::Yellow),
        ]);
    }
    table
}

pub fn connection_table(connections: &[Connection], now: DateTime<Utc>) -> Table {
    let mut table = new_table(&["Party A", "Party B", "Channel", "Last Activity"]);
    for c in connections {
        table.add_row(vec![
            account_cell(&c.party_a),
            account_cell(&c.party_b),
            Cell::new(&c.party_a.channel_id),
            Cell::new(format_ago(c.last_activity_at, now)),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn test_format_ago() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_ago(now, now), "0s ago");
        assert_eq!(format_ago(now - TimeDelta::seconds(90), now), "1m ago");
        assert_eq!(format_ago(now - TimeDelta::hours(5), now), "5h ago");
        assert_eq!(format_ago(now - TimeDelta::days(2), now), "2d ago");
        assert_eq!(format_ago(now + TimeDelta::seconds(30), now), "0s ago");
    }

    #[test]
    fn test_participant_table_rows() {
        let table = participant_table(&[
            Participant::user("web", "c1", "https://svc", "u1").named("Alice"),
            Participant::endpoint("web", "ops", "https://svc"),
        ]);
        let rendered = table.to_string();
        assert!(rendered.contains("Alice"));
        assert!(rendered.contains("ops"));
        assert_eq!(table.row_iter().count(), 2);
    }
}
