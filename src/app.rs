use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{Level, debug, error, info, trace, warn};

use crate::auth::{Session, SessionProvider, Subscription};
use crate::store::CatalogStore;
use crate::view::{Effect, Message, SessionInfo, State, update};

/// Owns the screen state and runs the reducer's effects against the store
/// and the session provider, one request at a time.
pub struct App {
    state: State,
    store: Arc<dyn CatalogStore>,
    auth: Arc<dyn SessionProvider>,
    events: UnboundedReceiver<Message>,
    _session: Subscription,
}

impl App {
    pub fn new(store: Arc<dyn CatalogStore>, auth: Arc<dyn SessionProvider>) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let session = auth.observe(Box::new(move |session: Option<&Session>| {
            let _ = tx.send(Message::SessionChanged(session.map(SessionInfo::from)));
        }));

        Self {
            state: State::default(),
            store,
            auth,
            events,
            _session: session,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Pick up the current session and load the catalog.
    pub async fn start(&mut self) {
        self.dispatch(Message::Refresh).await;
    }

    /// Wait for the next session change. Used by the interactive loop so a
    /// sign-out elsewhere is reflected without user input.
    pub async fn next_event(&mut self) -> Option<Message> {
        self.events.recv().await
    }

    fn pending_events(&mut self) -> Vec<Message> {
        let mut pending = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            pending.push(event);
        }
        pending
    }

    /// Apply session changes that arrived since the last dispatch.
    pub async fn pump(&mut self) {
        let queue = self.pending_events().into();
        self.drain(queue).await;
    }

    /// Run `message` through the reducer, then every effect it produces and
    /// every message those effects produce, until the queue is empty.
    pub async fn dispatch(&mut self, message: Message) {
        let mut queue: VecDeque<Message> = self.pending_events().into();
        queue.push_back(message);
        self.drain(queue).await;
    }

    async fn drain(&mut self, mut queue: VecDeque<Message>) {
        while let Some(message) = queue.pop_front() {
            let (next, effects) = update(std::mem::take(&mut self.state), message);
            self.state = next;

            for effect in effects {
                if let Some(reply) = self.run(effect).await {
                    queue.push_back(reply);
                }
            }
            queue.extend(self.pending_events());
        }
    }

    async fn run(&self, effect: Effect) -> Option<Message> {
        match effect {
            Effect::FetchCatalog => {
                debug!("Fetching catalog");
                Some(Message::CatalogLoaded(self.store.list_all().await))
            }
            Effect::SignIn { email, password } => {
                let result = self.auth.sign_in(&email, &password).await;
                Some(Message::LoginFinished(
                    result.map(|session| SessionInfo::from(&session)),
                ))
            }
            Effect::SignOut => {
                self.auth.sign_out().await;
                None
            }
            Effect::Insert(item) => Some(Message::Published(self.store.insert(item).await)),
            Effect::Remove(id) => {
                let result = self.store.remove_by_id(&id).await;
                Some(Message::Deleted(id, result))
            }
            Effect::Log { level, message } => {
                if level == Level::ERROR {
                    error!("{}", message);
                } else if level == Level::WARN {
                    warn!("{}", message);
                } else if level == Level::INFO {
                    info!("{}", message);
                } else if level == Level::DEBUG {
                    debug!("{}", message);
                } else {
                    trace!("{}", message);
                }
                None
            }
        }
    }
}
