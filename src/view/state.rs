use crate::auth::Session;
use crate::error::CatalogError;
use crate::models::{CatalogItem, DownloadLink, ItemId, NewCatalogItem, Quality};

/// Which face of the admin panel is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPanel {
    Hidden,
    LoginVisible,
    DashboardVisible,
}

/// The part of a session the screen needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub email: String,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            email: session.email.clone(),
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The link being composed before it is appended to the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDraft {
    pub quality: Quality,
    pub size: String,
    pub url: String,
}

/// Unsaved item being prepared in the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftUpload {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub links: Vec<DownloadLink>,
    pub pending_link: LinkDraft,
}

impl DraftUpload {
    /// Append the pending link when both its size and url are filled in.
    /// Links are only ever appended, never edited or reordered.
    pub fn push_pending_link(&mut self) -> bool {
        let pending = &self.pending_link;
        if pending.size.trim().is_empty() || pending.url.trim().is_empty() {
            return false;
        }
        self.links.push(DownloadLink {
            quality: pending.quality,
            size: pending.size.trim().to_string(),
            url: pending.url.trim().to_string(),
        });
        self.pending_link = LinkDraft::default();
        true
    }

    /// The payload to publish, or `ValidationFailed` if title or thumbnail
    /// is blank.
    pub fn to_new_item(&self) -> Result<NewCatalogItem, CatalogError> {
        if self.title.trim().is_empty() || self.thumbnail.trim().is_empty() {
            return Err(CatalogError::ValidationFailed(
                "Title and Thumbnail required".to_string(),
            ));
        }
        Ok(NewCatalogItem {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            thumbnail: self.thumbnail.trim().to_string(),
            links: self.links.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user, shown until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Everything the catalog screen shows. Only `update` produces new values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub items: Vec<CatalogItem>,
    pub loading: bool,
    pub search: String,
    pub selected: Option<ItemId>,
    pub admin_open: bool,
    pub session: Option<SessionInfo>,
    pub login: LoginForm,
    pub draft: DraftUpload,
    pub notice: Option<Notice>,
    pub pending_delete: Option<ItemId>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            // The first fetch is issued at start-up.
            loading: true,
            search: String::new(),
            selected: None,
            admin_open: false,
            session: None,
            login: LoginForm::default(),
            draft: DraftUpload::default(),
            notice: None,
            pending_delete: None,
        }
    }
}

impl State {
    pub fn admin_panel(&self) -> AdminPanel {
        match (self.admin_open, self.session.is_some()) {
            (false, _) => AdminPanel::Hidden,
            (true, false) => AdminPanel::LoginVisible,
            (true, true) => AdminPanel::DashboardVisible,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Items whose title or description contain the search term, in
    /// catalog order.
    pub fn filtered(&self) -> Vec<&CatalogItem> {
        filter(&self.items, &self.search)
    }

    pub fn selected_item(&self) -> Option<&CatalogItem> {
        let id = self.selected.as_ref()?;
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| &item.id == id)
    }
}

pub fn filter<'a>(items: &'a [CatalogItem], term: &str) -> Vec<&'a CatalogItem> {
    items.iter().filter(|item| item.matches(term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, title: &str, description: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            thumbnail: format!("http://x/{}.jpg", id),
            created_at: None,
            links: Vec::new(),
        }
    }

    fn catalog() -> Vec<CatalogItem> {
        vec![
            item("1", "Inception", "Dreams within dreams"),
            item("2", "Interstellar", "Space and time"),
            item("3", "Arrival", "Language of the heptapods"),
        ]
    }

    #[test]
    fn empty_term_keeps_everything() {
        let items = catalog();
        let all: Vec<_> = filter(&items, "").into_iter().cloned().collect();
        assert_eq!(all, items);
    }

    #[test]
    fn term_matches_title_or_description() {
        let items = catalog();
        for term in ["in", "DREAM", "time", "hepta", "zzz", "E"] {
            let kept: Vec<&str> = filter(&items, term).into_iter().map(|i| i.id.as_str()).collect();
            let expected: Vec<&str> = items
                .iter()
                .filter(|i| {
                    let t = term.to_lowercase();
                    i.title.to_lowercase().contains(&t) || i.description.to_lowercase().contains(&t)
                })
                .map(|i| i.id.as_str())
                .collect();
            assert_eq!(kept, expected, "term {:?}", term);
        }
        assert_eq!(filter(&items, "zzz").len(), 0);
    }

    #[test]
    fn panel_follows_toggle_and_session() {
        let mut state = State::default();
        assert_eq!(state.admin_panel(), AdminPanel::Hidden);
        state.admin_open = true;
        assert_eq!(state.admin_panel(), AdminPanel::LoginVisible);
        state.session = Some(SessionInfo {
            email: "admin@example.com".to_string(),
        });
        assert_eq!(state.admin_panel(), AdminPanel::DashboardVisible);
        state.admin_open = false;
        assert_eq!(state.admin_panel(), AdminPanel::Hidden);
    }

    #[test]
    fn pending_link_needs_size_and_url() {
        let mut draft = DraftUpload::default();
        draft.pending_link.size = "1GB".to_string();
        assert!(!draft.push_pending_link());
        assert!(draft.links.is_empty());

        draft.pending_link.url = "http://x/a.mp4".to_string();
        draft.pending_link.quality = Quality::UltraHd;
        assert!(draft.push_pending_link());
        assert_eq!(draft.links[0].quality, Quality::UltraHd);
        assert_eq!(draft.pending_link, LinkDraft::default());
    }

    #[test]
    fn draft_requires_title_and_thumbnail() {
        let draft = DraftUpload {
            title: "  ".to_string(),
            thumbnail: "http://x/a.jpg".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            draft.to_new_item(),
            Err(CatalogError::ValidationFailed(_))
        ));
    }
}
