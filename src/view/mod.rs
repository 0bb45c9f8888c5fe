//! Catalog screen as plain data: a `State`, the `Message`s that change it,
//! and the `Effect`s it asks the runtime to perform.

mod message;
mod render;
mod state;
mod update;

pub use message::{DraftField, Effect, Message};
pub use render::{detail, render};
pub use state::{
    AdminPanel, DraftUpload, LinkDraft, LoginForm, Notice, NoticeLevel, SessionInfo, State, filter,
};
pub use update::update;
