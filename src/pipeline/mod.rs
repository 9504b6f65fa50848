//! Story analysis and question answering
//!
//! [`StoryPipeline`] wires the pieces together. Analysis runs once per
//! story: extract concepts, fetch their relations with a bounded fan-out,
//! derive the cultural context, build the graph, run the physics check and
//! save everything on the session. Each question then goes through the
//! answer cache, an optional path lookup, prompt building, generation,
//! validation and rendering.
//!
//! Collaborator failures never surface here. A failed relationship lookup
//! contributes no edges and a failed or unusable generation is replaced by
//! a templated fallback answer. Only input errors and storage failures are
//! returned as [`Error`].

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{AnswerCache, CachedAnswer, JsonFileStore, KeyValueStore, MemoryStore, RedisStore};
use crate::config::{Config, StorageBackend, StorageConfig};
use crate::error::{Error, Result};
use crate::llm::{Generator, LlmClient, LlmConfig};
use crate::metrics;
use crate::ontology::{
    build_concept_graph, detect_cultural_context, mentioned_concepts, neighbors, relationships_for,
    shortest_path, summarize_concept, ConceptCategories, ConceptExtractor, ConceptPath,
    CulturalContext, GraphStats, Neighbor, Relationship,
};
use crate::physics::{analyze_physics, PhysicsReport};
use crate::prompt::{build_prompt, Prompt, PromptRequest};
use crate::relations::{fetch_all, CachedFetcher, ConceptNetClient, RelationFetcher};
use crate::report::{AnalysisSummary, ReportRenderer};
use crate::session::{Message, Session, SessionStore};
use crate::validation::{
    fallback_answer, AnswerContext, AnswerValidator, FallbackReason, ValidationOutcome,
};

/// Result of analysing a story
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub session_id: String,
    pub concepts: Vec<String>,
    pub categories: ConceptCategories,
    pub cultural: CulturalContext,
    pub stats: GraphStats,
    pub physics: Option<PhysicsReport>,
    /// Rendered summary document
    pub summary: String,
}

/// Result of answering a question
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// Validated answer text
    pub text: String,
    /// Rendered answer envelope
    pub document: String,
    pub outcome: ValidationOutcome,
    /// Served from the answer cache without generation
    pub cached: bool,
    pub referenced_concepts: Vec<String>,
    /// Paths handed to the prompt
    pub paths: Vec<ConceptPath>,
    /// Set when the generator output was replaced
    pub fallback: Option<FallbackReason>,
}

/// Open the configured session store
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::File => Arc::new(JsonFileStore::open(config.path.clone()).await?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Redis => {
            Arc::new(RedisStore::connect(&config.redis_url, config.key_prefix.clone()).await?)
        }
    };
    tracing::info!(backend = store.name(), "Opened session store");
    Ok(store)
}

/// Grounded story question answering
pub struct StoryPipeline {
    extractor: ConceptExtractor,
    fetcher: Arc<dyn RelationFetcher>,
    generator: Option<Arc<dyn Generator>>,
    sessions: SessionStore,
    answers: AnswerCache,
    validator: AnswerValidator,
    renderer: ReportRenderer<'static>,
    llm: LlmConfig,
    relation_limit: usize,
    concurrency: usize,
    physics_check: bool,
}

impl StoryPipeline {
    /// Assemble a pipeline from explicit collaborators
    ///
    /// Without a generator every question gets the fallback answer.
    pub fn new(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn RelationFetcher>,
        generator: Option<Arc<dyn Generator>>,
    ) -> Result<Self> {
        Ok(Self {
            extractor: ConceptExtractor::new(config.extraction.concept_limit)?,
            fetcher,
            generator,
            sessions: SessionStore::new(store.clone()),
            answers: AnswerCache::new(store),
            validator: AnswerValidator::new(config.validation.clone()),
            renderer: ReportRenderer::new(config.analysis.report_format)?,
            llm: config.llm.clone(),
            relation_limit: config.relations.limit,
            concurrency: config.relations.concurrency,
            physics_check: config.analysis.physics_check,
        })
    }

    /// Build the production pipeline: configured store, cached ConceptNet
    /// lookups and the Ollama generator
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(&config.storage).await?;

        let relation_cache: Arc<dyn KeyValueStore> =
            Arc::new(JsonFileStore::open(config.relations.cache_path.clone()).await?);
        let client = ConceptNetClient::with_endpoint(&config.relations.endpoint, config.fetch_timeout())?;
        let fetcher: Arc<dyn RelationFetcher> = Arc::new(CachedFetcher::new(client, relation_cache));

        let generator: Arc<dyn Generator> = Arc::new(LlmClient::with_config(config.llm.clone())?);

        Self::new(config, store, fetcher, Some(generator))
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn renderer(&self) -> &ReportRenderer<'static> {
        &self.renderer
    }

    /// Load a session or fail with [`Error::SessionNotFound`]
    pub async fn session(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Rename a session; the name must not be blank
    pub async fn rename_session(&self, session_id: &str, name: &str) -> Result<Session> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::MissingInput("name"));
        }
        self.sessions
            .rename(session_id, name)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Delete a session
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        if !self.sessions.delete(session_id).await? {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        Ok(())
    }

    async fn analyzed_session(&self, session_id: &str) -> Result<Session> {
        let session = self.session(session_id).await?;
        if !session.is_analyzed() {
            return Err(Error::StoryNotAnalyzed(session_id.to_string()));
        }
        Ok(session)
    }

    /// Run the analysis phase for a story and store it on the session
    pub async fn analyze_story(&self, session_id: &str, story: &str) -> Result<AnalysisOutcome> {
        let story = story.trim();
        if story.is_empty() {
            return Err(Error::MissingInput("story"));
        }
        let mut session = self.session(session_id).await?;
        let start = Instant::now();

        tracing::info!(session_id, chars = story.len(), "Analyzing story");

        let physics = self.physics_check.then(|| analyze_physics(story));

        session.story_text = story.to_string();
        session.push_message(Message::user(story));

        let extracted = self.extractor.extract(story);
        tracing::debug!(session_id, concepts = ?extracted.concepts, "Extracted concepts");

        let relations = fetch_all(
            &*self.fetcher,
            &extracted.concepts,
            self.relation_limit,
            self.concurrency,
        )
        .await;

        let cultural = detect_cultural_context(&extracted.concepts);
        let graph = build_concept_graph(&extracted, &relations);
        let categories = extracted.categorize();
        let stats = graph.stats().clone();

        let summary = self.renderer.render_analysis(&AnalysisSummary {
            categories: &categories,
            cultural: &cultural,
            stats: &stats,
            physics: physics.as_ref(),
        })?;

        session.graph = graph;
        session.cultural_context = cultural.clone();
        session.concepts = extracted.concepts.clone();
        session.metadata.categories = categories.clone();
        session.metadata.proper_nouns = extracted.proper_nouns;
        session.metadata.physics = physics.clone();
        session.metadata.analyzed = true;
        session.push_message(Message::assistant(summary.clone()).with_concepts(extracted.concepts.clone()));

        self.sessions.save(&session).await?;
        metrics::record_story_analyzed();

        tracing::info!(
            session_id,
            nodes = stats.total_nodes,
            edges = stats.total_edges,
            culture = %cultural.dominant_culture,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Story analysis finished"
        );

        Ok(AnalysisOutcome {
            session_id: session.id,
            concepts: extracted.concepts,
            categories,
            cultural,
            stats,
            physics,
            summary,
        })
    }

    /// Answer a question about an analysed story
    pub async fn answer_question(&self, session_id: &str, question: &str) -> Result<AnswerOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::MissingInput("question"));
        }
        let mut session = self.analyzed_session(session_id).await?;
        let start = Instant::now();

        tracing::info!(session_id, question, "Answering question");

        let hit = match self.answers.get(session_id, question).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Answer cache read failed");
                None
            }
        };

        if let Some(cached) = hit {
            metrics::record_cache_hit();
            let document = self
                .renderer
                .render_answer(&cached.text, &cached.referenced_concepts)?;

            session.push_message(Message::user(question));
            session.push_message(
                Message::assistant(document.clone())
                    .with_cached(true)
                    .with_concepts(cached.referenced_concepts.clone()),
            );
            self.sessions.save(&session).await?;

            return Ok(AnswerOutcome {
                text: cached.text,
                document,
                outcome: cached.outcome,
                cached: true,
                referenced_concepts: cached.referenced_concepts,
                paths: Vec::new(),
                fallback: None,
            });
        }

        let mentioned = mentioned_concepts(question, &session.concepts);
        let mut paths = Vec::new();
        if let [first, second, ..] = mentioned.as_slice() {
            match shortest_path(&session.graph, first, second) {
                Some(path) => {
                    tracing::debug!(session_id, path = %path, "Found path between mentioned concepts");
                    paths.push(path);
                }
                None => tracing::debug!(session_id, from = %first, to = %second, "No path between mentioned concepts"),
            }
        }

        let prompt = build_prompt(&PromptRequest {
            story: &session.story_text,
            graph: &session.graph,
            question,
            cultural: Some(&session.cultural_context),
            paths: &paths,
        });

        let (raw, fallback) = self.generate(&prompt, question, &session).await;

        let validated = self.validator.validate(
            &raw,
            &AnswerContext {
                concepts: &session.concepts,
                story: &session.story_text,
                question,
            },
        );
        metrics::record_question(validated.outcome.as_str());

        let document = self.renderer.render_answer(&validated.text, &mentioned)?;

        let entry = CachedAnswer {
            text: validated.text.clone(),
            outcome: validated.outcome,
            referenced_concepts: mentioned.clone(),
            cached_at: Utc::now(),
        };
        if let Err(e) = self.answers.put(session_id, question, &entry).await {
            tracing::warn!(session_id, error = %e, "Failed to cache answer");
        }

        session.push_message(Message::user(question));
        session.push_message(Message::assistant(document.clone()).with_concepts(mentioned.clone()));
        self.sessions.save(&session).await?;

        tracing::info!(
            session_id,
            outcome = validated.outcome.as_str(),
            intent = prompt.intent.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Question answered"
        );

        Ok(AnswerOutcome {
            text: validated.text,
            document,
            outcome: validated.outcome,
            cached: false,
            referenced_concepts: mentioned,
            paths,
            fallback,
        })
    }

    /// Call the generator, substituting the fallback answer when it is
    /// missing, fails or returns too little text
    async fn generate(
        &self,
        prompt: &Prompt,
        question: &str,
        session: &Session,
    ) -> (String, Option<FallbackReason>) {
        let fallback = |reason: FallbackReason| {
            metrics::record_fallback(reason.as_str());
            let text = fallback_answer(
                question,
                &session.concepts,
                &session.cultural_context,
                session.graph.stats(),
            );
            (text, Some(reason))
        };

        let Some(generator) = &self.generator else {
            return fallback(FallbackReason::GeneratorUnavailable);
        };

        let max_tokens = prompt.intent.max_tokens(&self.llm);
        let _timer = metrics::start_generation_timer(prompt.intent.as_str());

        match generator
            .generate(&prompt.text, max_tokens, self.llm.temperature)
            .await
        {
            Ok(text) if text.chars().count() >= self.validator.config().min_generated_chars => {
                tracing::debug!(generator = generator.name(), chars = text.len(), "Generated answer");
                (text, None)
            }
            Ok(text) => {
                tracing::warn!(chars = text.len(), "Generated answer too short, using fallback");
                fallback(FallbackReason::OutputTooShort)
            }
            Err(e) => {
                tracing::warn!(generator = generator.name(), error = %e, "Generation failed, using fallback");
                fallback(FallbackReason::GeneratorError)
            }
        }
    }

    /// Shortest path between two concepts of a session's graph
    pub async fn find_path(&self, session_id: &str, from: &str, to: &str) -> Result<Option<ConceptPath>> {
        let session = self.analyzed_session(session_id).await?;
        Ok(shortest_path(&session.graph, from, to))
    }

    /// Concepts within `hops` of a concept
    pub async fn neighbors(&self, session_id: &str, concept: &str, hops: usize) -> Result<Vec<Neighbor>> {
        let session = self.analyzed_session(session_id).await?;
        Ok(neighbors(&session.graph, concept, hops))
    }

    /// Every edge touching a concept
    pub async fn relationships(&self, session_id: &str, concept: &str) -> Result<Vec<Relationship>> {
        let session = self.analyzed_session(session_id).await?;
        Ok(relationships_for(&session.graph, concept))
    }

    /// Readable listing of a concept's relationships
    pub async fn summarize(&self, session_id: &str, concept: &str) -> Result<String> {
        let session = self.analyzed_session(session_id).await?;
        Ok(summarize_concept(&session.graph, concept))
    }
}
