use std::sync::Arc;

use assert_matches::assert_matches;
use filmshub::App;
use filmshub::CatalogError;
use filmshub::auth::{MemoryAuth, SessionProvider};
use filmshub::models::{ItemId, NewCatalogItem, Quality};
use filmshub::store::{CatalogStore, MemoryStore};
use filmshub::view::{AdminPanel, DraftField, Message, Notice};

const EMAIL: &str = "admin@example.com";
const PASSWORD: &str = "secret";

fn backends() -> (Arc<MemoryStore>, Arc<MemoryAuth>) {
    (
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAuth::new().with_account(EMAIL, PASSWORD)),
    )
}

fn film(title: &str) -> NewCatalogItem {
    NewCatalogItem {
        title: title.to_string(),
        description: format!("{} description", title),
        thumbnail: format!("http://x/{}.jpg", title),
        links: Vec::new(),
    }
}

async fn run(app: &mut App, messages: Vec<Message>) {
    for message in messages {
        app.dispatch(message).await;
    }
}

async fn signed_in_app() -> (App, Arc<MemoryStore>, Arc<MemoryAuth>) {
    let (store, auth) = backends();
    auth.sign_in(EMAIL, PASSWORD).await.unwrap();
    let mut app = App::new(store.clone(), auth.clone());
    app.start().await;
    app.dispatch(Message::ToggleAdmin).await;
    assert_eq!(app.state().admin_panel(), AdminPanel::DashboardVisible);
    (app, store, auth)
}

#[tokio::test]
async fn insert_then_list_puts_new_item_first() {
    let (store, _) = backends();
    store.insert(film("older")).await.unwrap();
    let id = store.insert(film("newer")).await.unwrap();

    let items = store.list_all().await.unwrap();
    assert_eq!(items.first().map(|i| &i.id), Some(&id));
}

#[tokio::test]
async fn removed_item_is_gone_and_second_remove_is_benign() {
    let (mut app, store, _) = signed_in_app().await;
    let id = store.insert(film("doomed")).await.unwrap();
    app.dispatch(Message::Refresh).await;

    run(
        &mut app,
        vec![Message::RequestDelete(id.clone()), Message::ConfirmDelete(true)],
    )
    .await;
    assert!(app.state().items.iter().all(|i| i.id != id));
    assert!(app.state().notice.is_none());

    assert_matches!(store.remove_by_id(&id).await, Err(CatalogError::NotFound(_)));
}

#[tokio::test]
async fn empty_title_never_reaches_the_store() {
    let (mut app, store, _) = signed_in_app().await;
    run(
        &mut app,
        vec![
            Message::DraftChanged(DraftField::Thumbnail, "http://x/a.jpg".to_string()),
            Message::Publish,
        ],
    )
    .await;

    assert!(store.is_empty());
    assert_eq!(
        app.state().notice,
        Some(Notice::error("Title and Thumbnail required"))
    );
}

#[tokio::test]
async fn signed_out_user_cannot_publish() {
    let (store, auth) = backends();
    let mut app = App::new(store.clone(), auth);
    app.start().await;

    run(
        &mut app,
        vec![
            Message::ToggleAdmin,
            Message::DraftChanged(DraftField::Title, "Movie A".to_string()),
            Message::DraftChanged(DraftField::Thumbnail, "http://x/a.jpg".to_string()),
            Message::LinkQualityChanged(Quality::FullHd),
            Message::DraftChanged(DraftField::LinkSize, "1.2GB".to_string()),
            Message::DraftChanged(DraftField::LinkUrl, "http://x/a.mp4".to_string()),
            Message::AddLink,
            Message::Publish,
        ],
    )
    .await;

    assert_eq!(app.state().admin_panel(), AdminPanel::LoginVisible);
    assert!(store.is_empty());
}

#[tokio::test]
async fn links_are_published_in_the_order_added() {
    let (mut app, store, _) = signed_in_app().await;
    run(
        &mut app,
        vec![
            Message::DraftChanged(DraftField::Title, "Movie A".to_string()),
            Message::DraftChanged(DraftField::Thumbnail, "http://x/a.jpg".to_string()),
            Message::LinkQualityChanged(Quality::Hd),
            Message::DraftChanged(DraftField::LinkSize, "700MB".to_string()),
            Message::DraftChanged(DraftField::LinkUrl, "http://x/a720.mp4".to_string()),
            Message::AddLink,
            Message::LinkQualityChanged(Quality::FullHd),
            Message::DraftChanged(DraftField::LinkSize, "1.2GB".to_string()),
            Message::DraftChanged(DraftField::LinkUrl, "http://x/a.mp4".to_string()),
            Message::AddLink,
        ],
    )
    .await;

    let draft: Vec<Quality> = app.state().draft.links.iter().map(|l| l.quality).collect();
    assert_eq!(draft, vec![Quality::Hd, Quality::FullHd]);

    app.dispatch(Message::Publish).await;
    let stored = store.list_all().await.unwrap();
    let published: Vec<Quality> = stored[0].links.iter().map(|l| l.quality).collect();
    assert_eq!(published, vec![Quality::Hd, Quality::FullHd]);
}

#[tokio::test]
async fn failed_publish_keeps_the_draft_for_retry() {
    let (mut app, store, _) = signed_in_app().await;
    run(
        &mut app,
        vec![
            Message::DraftChanged(DraftField::Title, "Movie A".to_string()),
            Message::DraftChanged(DraftField::Thumbnail, "http://x/a.jpg".to_string()),
        ],
    )
    .await;

    store.set_unavailable(true);
    app.dispatch(Message::Publish).await;
    assert_eq!(app.state().draft.title, "Movie A");
    assert_eq!(app.state().notice, Some(Notice::error("Error adding video")));

    store.set_unavailable(false);
    app.dispatch(Message::Publish).await;
    assert_eq!(store.len(), 1);
    assert!(app.state().draft.title.is_empty());
    assert_eq!(app.state().items[0].title, "Movie A");
}

#[tokio::test]
async fn delete_failure_still_refreshes() {
    let (mut app, store, _) = signed_in_app().await;
    let id = store.insert(film("kept")).await.unwrap();
    app.dispatch(Message::Refresh).await;
    app.dispatch(Message::RequestDelete(id.clone())).await;

    store.set_unavailable(true);
    app.dispatch(Message::ConfirmDelete(true)).await;

    // The refresh ran against the same outage, so the screen is empty.
    assert!(app.state().items.is_empty());
    assert!(!app.state().loading);
    assert!(app.state().notice.is_some());

    store.set_unavailable(false);
    app.dispatch(Message::Refresh).await;
    assert_eq!(app.state().items[0].id, id);
}

#[tokio::test]
async fn search_filters_the_visible_list() {
    let (store, auth) = backends();
    store.insert(film("Arrival")).await.unwrap();
    store.insert(film("Blade Runner")).await.unwrap();
    let mut app = App::new(store, auth);
    app.start().await;

    app.dispatch(Message::SearchChanged("RUNNER".to_string())).await;
    let titles: Vec<&str> = app.state().filtered().into_iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Blade Runner"]);

    app.dispatch(Message::SearchChanged(String::new())).await;
    assert_eq!(app.state().filtered().len(), 2);
}

#[tokio::test]
async fn sign_out_hides_the_dashboard() {
    let (mut app, _, _) = signed_in_app().await;
    app.dispatch(Message::SignOut).await;
    assert_eq!(app.state().admin_panel(), AdminPanel::LoginVisible);
    assert!(app.state().session.is_none());

    app.dispatch(Message::RequestDelete(ItemId::new("any"))).await;
    assert!(app.state().pending_delete.is_none());
}
