use std::fmt::Write;

use super::state::{AdminPanel, NoticeLevel, State};
use crate::models::CatalogItem;

const DESCRIPTION_WIDTH: usize = 60;

fn truncate(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= width {
        return line.to_string();
    }
    let cut: String = line.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", cut)
}

fn header(out: &mut String, state: &State) {
    let account = match &state.session {
        Some(session) => format!("[admin: {}]", session.email),
        None => "[login]".to_string(),
    };
    let search = if state.search.is_empty() {
        "Search videos...".to_string()
    } else {
        format!("search: {}", state.search)
    };
    let _ = writeln!(out, "== FilmsHub == {} {}", search, account);
}

fn admin_panel(out: &mut String, state: &State) {
    match state.admin_panel() {
        AdminPanel::Hidden => {}
        AdminPanel::LoginVisible => {
            let _ = writeln!(out, "-- Admin Login --");
            let _ = writeln!(out, "  email:    {}", state.login.email);
            let masked = "*".repeat(state.login.password.chars().count());
            let _ = writeln!(out, "  password: {}", masked);
        }
        AdminPanel::DashboardVisible => {
            let draft = &state.draft;
            let _ = writeln!(out, "-- Add New Video --");
            let _ = writeln!(out, "  title:       {}", draft.title);
            let _ = writeln!(out, "  thumbnail:   {}", draft.thumbnail);
            let _ = writeln!(out, "  description: {}", truncate(&draft.description, DESCRIPTION_WIDTH));
            let pending = &draft.pending_link;
            let _ = writeln!(
                out,
                "  next link:   {} | {} | {}",
                pending.quality, pending.size, pending.url
            );
            let chips: Vec<String> = draft
                .links
                .iter()
                .map(|l| format!("[{} - {}]", l.quality, l.size))
                .collect();
            let _ = writeln!(out, "  links stack: {}", chips.join(" "));
        }
    }
}

fn grid(out: &mut String, state: &State) {
    if state.loading {
        let _ = writeln!(out, "Loading library...");
        return;
    }

    let items = state.filtered();
    if items.is_empty() {
        let _ = writeln!(out, "No videos.");
        return;
    }
    for (idx, item) in items.iter().enumerate() {
        let delete = if state.is_signed_in() { "  [x]" } else { "" };
        let _ = writeln!(
            out,
            "{:>3}. {}  ({} Qualities){}",
            idx + 1,
            item.title,
            item.links.len(),
            delete
        );
        if !item.description.is_empty() {
            let _ = writeln!(out, "     {}", truncate(&item.description, DESCRIPTION_WIDTH));
        }
    }
}

/// The download overlay for one item.
pub fn detail(item: &CatalogItem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "+-- {} --", item.title);
    let _ = writeln!(out, "| thumbnail: {}", item.thumbnail);
    if !item.description.is_empty() {
        let _ = writeln!(out, "| {}", item.description);
    }
    let _ = writeln!(out, "| AVAILABLE DOWNLOADS");
    if item.links.is_empty() {
        let _ = writeln!(out, "|   No download links available.");
    }
    for (idx, link) in item.links.iter().enumerate() {
        let screen = if link.quality.is_high_definition() { "TV" } else { "mobile" };
        let _ = writeln!(
            out,
            "| {:>2}. {:<6} {:<7} MP4 format  {:>8}  {}",
            idx + 1,
            link.quality,
            screen,
            link.size,
            link.url
        );
    }
    let _ = writeln!(out, "+--");
    out
}

pub fn render(state: &State) -> String {
    let mut out = String::new();
    header(&mut out, state);
    admin_panel(&mut out, state);

    if let Some(notice) = &state.notice {
        let tag = match notice.level {
            NoticeLevel::Info => "i",
            NoticeLevel::Error => "!",
        };
        let _ = writeln!(out, "({}) {}", tag, notice.text);
    }

    grid(&mut out, state);

    if let Some(item) = state.selected_item() {
        out.push_str(&detail(item));
    }

    if let Some(item) = state.pending_delete.as_ref().and_then(|id| state.item(id)) {
        let _ = writeln!(out, "Delete \"{}\"? [y/n]", item.title);
    }

    out
}
