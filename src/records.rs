//! Realtime record store contract
//!
//! The backend is an external collaborator. Pages list and subscribe to
//! collections through [`RecordStore`]; notifications are folded into a
//! local [`RecordCache`] by id, so replays and duplicates are harmless.
//! The game engines never call into this module.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mode::GameMode;

/// Failures at the collaborator boundary. Surfaced to the user; never
/// retried automatically.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("not signed in")]
    Unauthorized,
    #[error("collection '{0}' not found")]
    UnknownCollection(String),
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Anything stored in a collection
pub trait Record: Clone {
    fn record_id(&self) -> &str;
}

impl Record for GameMode {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Who the client authenticates as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendRole {
    #[default]
    Client,
    Admin,
}

/// Explicit backend configuration handed to the collaborator on construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default)]
    pub role: BackendRole,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new("memory://local", BackendRole::Client)
    }
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, role: BackendRole) -> Self {
        Self {
            url: url.into(),
            role,
        }
    }

    /// Only admins may write records; clients read and subscribe
    pub fn can_write(&self) -> bool {
        self.role == BackendRole::Admin
    }
}

/// Sort and filter for a list call, in the backend's own syntax
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub filter: Option<String>,
}

/// Subscription target: one record or the whole collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    Record(String),
    All,
}

impl Topic {
    /// `"*"` subscribes to every record
    pub fn parse(topic: &str) -> Self {
        if topic == "*" {
            Topic::All
        } else {
            Topic::Record(topic.to_string())
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        match self {
            Topic::All => true,
            Topic::Record(target) => target == id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    Insert,
    Update,
    Delete,
}

/// A realtime notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEvent<T> {
    pub action: RecordAction,
    pub record: T,
}

impl<T: DeserializeOwned> RecordEvent<T> {
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

pub type Handler<T> = Box<dyn FnMut(&RecordEvent<T>)>;

/// The collaborator's realtime record API
pub trait RecordStore<T: Record> {
    fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<T>, RecordError>;

    fn subscribe(
        &mut self,
        collection: &str,
        topic: Topic,
        handler: Handler<T>,
    ) -> Result<SubscriptionId, RecordError>;

    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Local copy of a collection, kept in sync from notifications
#[derive(Debug, Clone, Default)]
pub struct RecordCache<T> {
    records: Vec<T>,
}

impl<T: Record> RecordCache<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.record_id() == id)
    }

    /// Fold one notification in. Inserting a known id updates it, updating
    /// an unknown id inserts it, and deleting an unknown id does nothing.
    pub fn apply(&mut self, event: &RecordEvent<T>) {
        let id = event.record.record_id();
        let position = self.records.iter().position(|r| r.record_id() == id);
        match (event.action, position) {
            (RecordAction::Delete, Some(i)) => {
                self.records.remove(i);
            }
            (RecordAction::Delete, None) => {}
            (RecordAction::Insert | RecordAction::Update, Some(i)) => {
                self.records[i] = event.record.clone();
            }
            (RecordAction::Insert | RecordAction::Update, None) => {
                self.records.push(event.record.clone());
            }
        }
    }
}

struct Subscription<T> {
    id: SubscriptionId,
    collection: String,
    topic: Topic,
    handler: Handler<T>,
}

/// In-process store for tests and the native demo
pub struct MemoryStore<T> {
    config: BackendConfig,
    collections: BTreeMap<String, Vec<T>>,
    subscriptions: Vec<Subscription<T>>,
    next_subscription: u64,
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::connect(BackendConfig::default())
    }
}

impl<T: Record> MemoryStore<T> {
    /// Open a store with an explicit backend configuration
    pub fn connect(config: BackendConfig) -> Self {
        log::info!("Record store at {} as {:?}", config.url, config.role);
        Self {
            config,
            collections: BTreeMap::new(),
            subscriptions: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// A change made by this client. Needs a role that may write.
    pub fn write(&mut self, collection: &str, event: RecordEvent<T>) -> Result<(), RecordError> {
        if !self.config.can_write() {
            return Err(RecordError::Unauthorized);
        }
        self.publish(collection, event);
        Ok(())
    }

    /// Apply a change pushed by the backend and notify matching subscribers
    pub fn publish(&mut self, collection: &str, event: RecordEvent<T>) {
        let records = self.collections.entry(collection.to_string()).or_default();
        let id = event.record.record_id().to_string();
        let position = records.iter().position(|r| r.record_id() == id);
        match (event.action, position) {
            (RecordAction::Delete, Some(i)) => {
                records.remove(i);
            }
            (RecordAction::Delete, None) => {}
            (_, Some(i)) => records[i] = event.record.clone(),
            (_, None) => records.push(event.record.clone()),
        }

        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|s| s.collection == collection && s.topic.matches(&id))
        {
            (sub.handler)(&event);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl<T: Record> RecordStore<T> for MemoryStore<T> {
    fn list(&self, collection: &str, _query: &ListQuery) -> Result<Vec<T>, RecordError> {
        self.collections
            .get(collection)
            .cloned()
            .ok_or_else(|| RecordError::UnknownCollection(collection.to_string()))
    }

    fn subscribe(
        &mut self,
        collection: &str,
        topic: Topic,
        handler: Handler<T>,
    ) -> Result<SubscriptionId, RecordError> {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            collection: collection.to_string(),
            topic,
            handler,
        });
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|s| s.id != id);
    }
}

/// Sort modes by target speed, slowest (easiest) first
pub fn sort_modes(modes: &mut [GameMode]) {
    modes.sort_by(|a, b| a.effective_speed().total_cmp(&b.effective_speed()).reverse());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mode(id: &str, speed: f64) -> GameMode {
        GameMode::new(id, id, speed, 3.0)
    }

    fn event(action: RecordAction, record: GameMode) -> RecordEvent<GameMode> {
        RecordEvent { action, record }
    }

    #[test]
    fn test_cache_apply_is_idempotent() {
        let mut cache = RecordCache::new(vec![mode("a", 500.0)]);
        let insert = event(RecordAction::Insert, mode("b", 300.0));
        cache.apply(&insert);
        cache.apply(&insert);
        assert_eq!(cache.records().len(), 2);

        let update = event(RecordAction::Update, mode("a", 450.0));
        cache.apply(&update);
        cache.apply(&update);
        assert_eq!(cache.get("a").map(|m| m.speed), Some(450.0));

        let delete = event(RecordAction::Delete, mode("b", 300.0));
        cache.apply(&delete);
        cache.apply(&delete);
        assert_eq!(cache.records().len(), 1);
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_update_for_unknown_id_inserts() {
        let mut cache = RecordCache::default();
        cache.apply(&event(RecordAction::Update, mode("z", 200.0)));
        assert!(cache.get("z").is_some());
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut store = MemoryStore::new();
        store.publish("modes", event(RecordAction::Insert, mode("a", 500.0)));

        let cache = Rc::new(RefCell::new(RecordCache::new(
            store.list("modes", &ListQuery::default()).unwrap(),
        )));
        let sink = cache.clone();
        let sub = store
            .subscribe(
                "modes",
                Topic::parse("*"),
                Box::new(move |e: &RecordEvent<GameMode>| sink.borrow_mut().apply(e)),
            )
            .unwrap();

        let only_b = Rc::new(RefCell::new(0));
        let counter = only_b.clone();
        store
            .subscribe(
                "modes",
                Topic::parse("b"),
                Box::new(move |_: &RecordEvent<GameMode>| *counter.borrow_mut() += 1),
            )
            .unwrap();

        store.publish("modes", event(RecordAction::Insert, mode("b", 250.0)));
        store.publish("modes", event(RecordAction::Update, mode("a", 400.0)));
        assert_eq!(cache.borrow().records().len(), 2);
        assert_eq!(cache.borrow().get("a").map(|m| m.speed), Some(400.0));
        assert_eq!(*only_b.borrow(), 1);

        store.unsubscribe(sub);
        assert_eq!(store.subscription_count(), 1);
        store.publish("modes", event(RecordAction::Delete, mode("a", 400.0)));
        assert!(cache.borrow().get("a").is_some());
        assert_eq!(store.list("modes", &ListQuery::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_write_needs_admin_role() {
        let mut client: MemoryStore<GameMode> = MemoryStore::new();
        assert_eq!(client.config().role, BackendRole::Client);
        assert!(matches!(
            client.write("modes", event(RecordAction::Insert, mode("a", 500.0))),
            Err(RecordError::Unauthorized)
        ));
        assert!(client.list("modes", &ListQuery::default()).is_err());

        let mut admin = MemoryStore::connect(BackendConfig::new("memory://test", BackendRole::Admin));
        admin
            .write("levels", event(RecordAction::Insert, mode("l-1", 5.0)))
            .unwrap();
        assert_eq!(admin.list("levels", &ListQuery::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_backend_config_from_json() {
        let config: BackendConfig = serde_json::from_str(r#"{"url":"https://db.example"}"#).unwrap();
        assert_eq!(config.role, BackendRole::Client);
        assert!(!config.can_write());
    }

    #[test]
    fn test_unknown_collection() {
        let store: MemoryStore<GameMode> = MemoryStore::new();
        assert!(matches!(
            store.list("levels", &ListQuery::default()),
            Err(RecordError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_event_from_json() {
        let e: RecordEvent<GameMode> = RecordEvent::from_json(
            r#"{"action":"update","record":{"id":"m1","level":"easy","speed":800,"timer":4}}"#,
        )
        .unwrap();
        assert_eq!(e.action, RecordAction::Update);
        assert_eq!(e.record.speed, 800.0);
    }

    #[test]
    fn test_sort_modes_easiest_first() {
        let mut modes = vec![mode("hard", 250.0), mode("easy", 900.0), mode("mid", 500.0)];
        sort_modes(&mut modes);
        let ids: Vec<&str> = modes.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["easy", "mid", "hard"]);
    }
}
