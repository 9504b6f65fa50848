//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use storyground::cache::MemoryStore;
use storyground::config::{Config, StorageBackend};
use storyground::llm::{Generator, LlmError};
use storyground::relations::{FetchError, FetchedRelation, RelationFetcher};
use storyground::StoryPipeline;

pub const DRAGON_STORY: &str =
    "A dragon attacked a castle. A knight fought the dragon with a sword.";

pub fn relation(start: &str, relation: &str, end: &str) -> FetchedRelation {
    FetchedRelation {
        start: start.to_string(),
        end: end.to_string(),
        relation: relation.to_string(),
        weight: 1.0,
    }
}

/// Fetcher answering from a fixed table; unknown concepts get no edges
#[derive(Default)]
pub struct StaticFetcher {
    table: HashMap<String, Vec<FetchedRelation>>,
    failing: bool,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lookup fails with a server error
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, concept: &str, relations: Vec<FetchedRelation>) -> Self {
        self.table.insert(concept.to_string(), relations);
        self
    }

    /// Knight and dragon meet at the castle
    pub fn dragon_story() -> Self {
        Self::new()
            .with("dragon", vec![relation("dragon", "AtLocation", "castle")])
            .with("knight", vec![relation("knight", "RelatedTo", "castle")])
            .with("sword", vec![relation("sword", "IsA", "weapon")])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationFetcher for StaticFetcher {
    async fn try_fetch(
        &self,
        concept: &str,
        limit: usize,
    ) -> Result<Vec<FetchedRelation>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(FetchError::ServerError(503));
        }
        Ok(self
            .table
            .get(concept)
            .map(|r| r.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Generator returning a canned reply and recording every prompt
pub struct MockGenerator {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        prompt: &str,
        _max_new_tokens: u32,
        _temperature: f32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(LlmError::Unavailable(message.clone())),
        }
    }
}

/// Defaults with in-memory storage
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Memory;
    config
}

pub fn pipeline_with(
    fetcher: Arc<StaticFetcher>,
    generator: Option<Arc<MockGenerator>>,
) -> StoryPipeline {
    StoryPipeline::new(
        &test_config(),
        Arc::new(MemoryStore::new()),
        fetcher,
        generator.map(|g| g as Arc<dyn Generator>),
    )
    .expect("pipeline")
}

/// Pipeline over the dragon story relations
pub fn pipeline(generator: Option<Arc<MockGenerator>>) -> StoryPipeline {
    pipeline_with(Arc::new(StaticFetcher::dragon_story()), generator)
}
