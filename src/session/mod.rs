//! Story sessions
//!
//! A session holds one analysed story: its text, concept graph, cultural
//! context, extraction metadata and the question/answer history. Sessions
//! are stored as JSON under `session:{id}` in any [`KeyValueStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::{KeyValueStore, StoreExt, StoreResult};
use crate::ontology::{ConceptCategories, ConceptGraph, CulturalContext};
use crate::physics::PhysicsReport;

const SESSION_PREFIX: &str = "session:";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,

    /// Served from the answer cache
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_concepts: Vec<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            cached: false,
            referenced_concepts: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            ..Self::user(content)
        }
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    pub fn with_concepts(mut self, concepts: Vec<String>) -> Self {
        self.referenced_concepts = concepts;
        self
    }
}

/// Extraction results kept alongside the graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub categories: ConceptCategories,

    #[serde(default)]
    pub proper_nouns: BTreeSet<String>,

    /// Absent when the physics check is disabled
    #[serde(default)]
    pub physics: Option<PhysicsReport>,

    /// Questions are refused until this is set
    #[serde(default)]
    pub analyzed: bool,
}

/// A story session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub story_text: String,

    #[serde(default)]
    pub graph: ConceptGraph,

    #[serde(default)]
    pub cultural_context: CulturalContext,

    #[serde(default)]
    pub concepts: Vec<String>,

    #[serde(default)]
    pub metadata: SessionMetadata,

    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Fresh, unanalysed session with a random id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            story_text: String::new(),
            graph: ConceptGraph::default(),
            cultural_context: CulturalContext::default(),
            concepts: Vec::new(),
            metadata: SessionMetadata::default(),
            messages: Vec::new(),
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.metadata.analyzed
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// Short listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub analyzed: bool,
    pub message_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            created_at: session.created_at,
            analyzed: session.is_analyzed(),
            message_count: session.messages.len(),
        }
    }
}

/// Session persistence over a key-value store
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(id: &str) -> String {
        format!("{SESSION_PREFIX}{id}")
    }

    /// Create and persist a session named `Story N`
    pub async fn create(&self) -> StoreResult<Session> {
        let count = self.store.keys(SESSION_PREFIX).await?.len();
        let session = Session::new(format!("Story {}", count + 1));
        self.save(&session).await?;
        tracing::info!(session_id = %session.id, name = %session.name, "Session created");
        Ok(session)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Session>> {
        self.store.get_json(&Self::key(id)).await
    }

    pub async fn save(&self, session: &Session) -> StoreResult<()> {
        self.store.put_json(&Self::key(&session.id), session).await
    }

    /// All sessions, oldest first
    pub async fn list(&self) -> StoreResult<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for key in self.store.keys(SESSION_PREFIX).await? {
            if let Some(session) = self.store.get_json::<Session>(&key).await? {
                summaries.push(SessionSummary::from(&session));
            }
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    /// Rename a session; returns `None` if it does not exist
    ///
    /// The caller is responsible for rejecting an empty name.
    pub async fn rename(&self, id: &str, name: &str) -> StoreResult<Option<Session>> {
        let Some(mut session) = self.get(id).await? else {
            return Ok(None);
        };
        session.name = name.to_string();
        self.save(&session).await?;
        tracing::info!(session_id = id, name, "Session renamed");
        Ok(Some(session))
    }

    /// Delete a session; returns whether it existed
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let removed = self.store.delete(&Self::key(id)).await?;
        if removed {
            tracing::info!(session_id = id, "Session deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_names_sequentially() {
        let sessions = store();
        let first = sessions.create().await.unwrap();
        let second = sessions.create().await.unwrap();

        assert_eq!(first.name, "Story 1");
        assert_eq!(second.name, "Story 2");
        assert_ne!(first.id, second.id);
        assert!(!first.is_analyzed());
    }

    #[tokio::test]
    async fn test_get_round_trip() {
        let sessions = store();
        let mut session = sessions.create().await.unwrap();
        session.story_text = "A dragon attacked a castle.".to_string();
        session.push_message(Message::user("Who attacked?"));
        session.push_message(
            Message::assistant("The dragon.")
                .with_cached(true)
                .with_concepts(vec!["dragon".to_string()]),
        );
        sessions.save(&session).await.unwrap();

        let loaded = sessions.get(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.messages[1].role, Role::Assistant);
        assert!(loaded.messages[1].cached);
    }

    #[tokio::test]
    async fn test_missing_session() {
        let sessions = store();
        assert!(sessions.get("nope").await.unwrap().is_none());
        assert!(sessions.rename("nope", "x").await.unwrap().is_none());
        assert!(!sessions.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let sessions = store();
        let session = sessions.create().await.unwrap();

        let renamed = sessions.rename(&session.id, "Dragon tale").await.unwrap().unwrap();
        assert_eq!(renamed.name, "Dragon tale");
        assert_eq!(sessions.list().await.unwrap()[0].name, "Dragon tale");

        assert!(sessions.delete(&session.id).await.unwrap());
        assert!(sessions.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_message_serialization_skips_defaults() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("cached").is_none());
        assert!(json.get("referenced_concepts").is_none());
    }
}
