use tracing::Level;

use super::message::{DraftField, Effect, Message};
use super::state::{AdminPanel, DraftUpload, Notice, State};
use crate::error::CatalogError;

fn log(level: Level, message: impl Into<String>) -> Effect {
    Effect::Log {
        level,
        message: message.into(),
    }
}

/// Apply one message. Never touches the network; adapter work is returned as
/// effects, and every write is followed by a full `FetchCatalog`.
pub fn update(state: State, message: Message) -> (State, Vec<Effect>) {
    let mut state = state;
    let effects = match message {
        Message::Refresh => {
            state.loading = true;
            vec![Effect::FetchCatalog]
        }
        Message::CatalogLoaded(Ok(items)) => {
            state.loading = false;
            state.items = items;
            vec![]
        }
        Message::CatalogLoaded(Err(e)) => {
            state.loading = false;
            state.items.clear();
            vec![log(Level::ERROR, format!("Error fetching catalog: {}", e))]
        }
        Message::SearchChanged(term) => {
            state.search = term;
            vec![]
        }
        Message::Select(id) => {
            if state.item(&id).is_some() {
                state.selected = Some(id);
            }
            vec![]
        }
        Message::CloseDetail => {
            state.selected = None;
            vec![]
        }

        Message::ToggleAdmin => {
            state.admin_open = !state.admin_open;
            if !state.admin_open {
                state.draft = DraftUpload::default();
            }
            vec![]
        }
        Message::SessionChanged(session) => {
            if session.is_none() {
                state.pending_delete = None;
            }
            state.session = session;
            vec![]
        }
        Message::EmailChanged(email) => {
            state.login.email = email;
            vec![]
        }
        Message::PasswordChanged(password) => {
            state.login.password = password;
            vec![]
        }
        Message::SubmitLogin => {
            if state.admin_panel() != AdminPanel::LoginVisible {
                return (state, vec![]);
            }
            vec![Effect::SignIn {
                email: state.login.email.trim().to_string(),
                password: state.login.password.clone(),
            }]
        }
        Message::LoginFinished(Ok(info)) => {
            state.login.password.clear();
            state.notice = Some(Notice::info(format!(
                "Welcome {}! Add the latest films to update the list",
                info.email
            )));
            vec![]
        }
        Message::LoginFinished(Err(e)) => {
            let reason = match &e {
                CatalogError::AuthFailed(reason) => reason.clone(),
                other => other.to_string(),
            };
            state.notice = Some(Notice::error(format!("Login Failed: {}", reason)));
            vec![log(Level::WARN, format!("Login failed: {}", e))]
        }
        Message::SignOut => {
            if !state.is_signed_in() {
                return (state, vec![]);
            }
            vec![Effect::SignOut]
        }

        Message::DraftChanged(field, value) => {
            if state.admin_panel() != AdminPanel::DashboardVisible {
                return (state, vec![]);
            }
            let draft = &mut state.draft;
            match field {
                DraftField::Title => draft.title = value,
                DraftField::Description => draft.description = value,
                DraftField::Thumbnail => draft.thumbnail = value,
                DraftField::LinkSize => draft.pending_link.size = value,
                DraftField::LinkUrl => draft.pending_link.url = value,
            }
            vec![]
        }
        Message::LinkQualityChanged(quality) => {
            if state.admin_panel() == AdminPanel::DashboardVisible {
                state.draft.pending_link.quality = quality;
            }
            vec![]
        }
        Message::AddLink => {
            if state.admin_panel() == AdminPanel::DashboardVisible {
                state.draft.push_pending_link();
            }
            vec![]
        }
        Message::Publish => {
            if state.admin_panel() != AdminPanel::DashboardVisible {
                return (state, vec![]);
            }
            match state.draft.to_new_item() {
                Ok(item) => vec![Effect::Insert(item)],
                Err(e) => {
                    let text = match e {
                        CatalogError::ValidationFailed(reason) => reason,
                        other => other.to_string(),
                    };
                    state.notice = Some(Notice::error(text));
                    vec![]
                }
            }
        }
        Message::Published(Ok(id)) => {
            state.draft = DraftUpload::default();
            state.notice = Some(Notice::info("Video Added!"));
            state.loading = true;
            vec![
                log(Level::INFO, format!("Published catalog item {}", id)),
                Effect::FetchCatalog,
            ]
        }
        Message::Published(Err(e)) => {
            state.notice = Some(Notice::error("Error adding video"));
            vec![log(Level::WARN, format!("Publish failed: {}", e))]
        }

        Message::RequestDelete(id) => {
            if state.is_signed_in() && state.item(&id).is_some() {
                state.pending_delete = Some(id);
            }
            vec![]
        }
        Message::ConfirmDelete(confirmed) => match state.pending_delete.take() {
            Some(id) if confirmed && state.is_signed_in() => vec![Effect::Remove(id)],
            _ => vec![],
        },
        Message::Deleted(id, result) => {
            let entry = match result {
                Ok(()) => log(Level::INFO, format!("Deleted catalog item {}", id)),
                Err(CatalogError::NotFound(_)) => {
                    log(Level::INFO, format!("Catalog item {} was already gone", id))
                }
                Err(e) => {
                    state.notice = Some(Notice::error(format!("Delete failed: {}", e)));
                    log(Level::WARN, format!("Delete of catalog item {} failed: {}", id, e))
                }
            };
            state.loading = true;
            vec![entry, Effect::FetchCatalog]
        }

        Message::DismissNotice => {
            state.notice = None;
            vec![]
        }
    };

    (state, effects)
}
