//! Tier 1 working memory: the conversation log with capacity-bounded
//! FIFO eviction and the close-time capture policy.

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use engram_core::config::WorkingConfig;
use engram_core::models::{
    Conversation, ConversationStatus, Message, MessageRole, Namespace, WorkingStats,
};
use engram_core::traits::IPatternSink;
use engram_core::{EngramError, EngramResult};
use engram_store::Store;

use crate::queries::{conversation_ops, message_ops};
use crate::{capture, distill, migrations};

/// Sentinel conversation id that starts a fresh conversation on append.
pub const NEW_CONVERSATION: &str = "new";

/// Counters from one eviction sweep.
#[derive(Debug, Clone, Default)]
pub struct EvictionReport {
    /// Conversations deleted.
    pub evicted: usize,
    /// Drafts the knowledge sink accepted before deletion.
    pub distilled: usize,
    /// Deletions that failed twice and were left in place.
    pub failures: usize,
}

/// Tier 1: the conversation log.
///
/// Owns its store handle. At most one conversation is active at any
/// time; complete conversations beyond `capacity` are evicted oldest
/// first, each offered to the knowledge sink for distillation on the
/// way out.
pub struct WorkingMemory {
    store: Store,
    config: WorkingConfig,
    namespace: Namespace,
    sink: Option<Arc<dyn IPatternSink>>,
}

impl WorkingMemory {
    /// Open file-backed working memory for one workspace namespace.
    pub fn open(path: &Path, config: WorkingConfig, namespace: Namespace) -> EngramResult<Self> {
        let store = Store::open(path, &migrations::migrations())?;
        Ok(Self {
            store,
            config,
            namespace,
            sink: None,
        })
    }

    pub fn open_in_memory(config: WorkingConfig, namespace: Namespace) -> EngramResult<Self> {
        let store = Store::open_in_memory(&migrations::migrations())?;
        Ok(Self {
            store,
            config,
            namespace,
            sink: None,
        })
    }

    /// Install the Tier 2 handoff consulted before each eviction.
    pub fn with_sink(mut self, sink: Arc<dyn IPatternSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &WorkingConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Append one message, returning the id of the conversation it
    /// landed in.
    ///
    /// Passing [`NEW_CONVERSATION`] starts a fresh conversation, closing
    /// any currently active one first. Passing the id of an active
    /// conversation appends there, unless the conversation has sat idle
    /// past `idle_gap_minutes`; an idle conversation is closed and the
    /// message starts a fresh one, whose id is returned instead.
    pub fn append_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        text: &str,
    ) -> EngramResult<String> {
        if text.trim().is_empty() {
            return Err(EngramError::validation("message text is empty"));
        }

        if conversation_id == NEW_CONVERSATION {
            if let Some(active) = self.active()? {
                self.close_conversation(&active.id)?;
            }
            let id = self.start_conversation()?;
            self.insert_message(&id, role, text)?;
            return Ok(id);
        }

        let conversation = self
            .find(conversation_id)?
            .ok_or_else(|| EngramError::ConversationNotFound {
                id: conversation_id.to_string(),
            })?;

        if conversation.status == ConversationStatus::Complete {
            return Err(EngramError::validation(format!(
                "conversation {conversation_id} is already complete"
            )));
        }

        let last_activity = conversation
            .messages
            .last()
            .map(|m| m.created_at)
            .unwrap_or(conversation.started_at);
        let idle = Utc::now() - last_activity;
        if idle > Duration::minutes(self.config.idle_gap_minutes) {
            tracing::info!(
                conversation_id = %conversation.id,
                idle_minutes = idle.num_minutes(),
                "conversation idle past gap, rolling over"
            );
            self.close_conversation(&conversation.id)?;
            let id = self.start_conversation()?;
            self.insert_message(&id, role, text)?;
            return Ok(id);
        }

        self.insert_message(&conversation.id, role, text)?;
        Ok(conversation.id.clone())
    }

    /// Close a conversation: run the capture policy, extract entities
    /// and touched files, mark it complete, then bring the complete set
    /// back under capacity.
    ///
    /// The returned snapshot reflects the conversation at close time;
    /// with a very small capacity the eviction sweep may delete it
    /// immediately afterwards.
    pub fn close_conversation(&self, id: &str) -> EngramResult<Conversation> {
        let conversation = self
            .find(id)?
            .ok_or_else(|| EngramError::ConversationNotFound { id: id.to_string() })?;

        if conversation.status == ConversationStatus::Complete {
            return Err(EngramError::validation(format!(
                "conversation {id} is already complete"
            )));
        }

        let signals = capture::evaluate(&conversation.messages, &self.config);
        let strategic = signals.is_strategic();
        let entities = capture::extract_entities(&conversation.messages);
        let touched_files = capture::extract_touched_files(&conversation.messages);
        let ended_at = Utc::now();

        self.store.with_writer(|conn| {
            conversation_ops::mark_complete(conn, id, ended_at, strategic, &entities, &touched_files)
        })?;

        tracing::info!(
            conversation_id = %id,
            strategic,
            criteria = signals.satisfied(),
            messages = conversation.messages.len(),
            "conversation closed"
        );

        let closed = self
            .find(id)?
            .ok_or_else(|| EngramError::ConversationNotFound { id: id.to_string() })?;

        let report = self.evict_to_capacity()?;
        if report.evicted > 0 || report.failures > 0 {
            tracing::info!(
                evicted = report.evicted,
                distilled = report.distilled,
                failures = report.failures,
                "capacity eviction sweep"
            );
        }

        Ok(closed)
    }

    /// The active conversation, if any.
    pub fn active(&self) -> EngramResult<Option<Conversation>> {
        self.store.with_reader(conversation_ops::active_conversation)
    }

    /// Fetch by id; unknown id is an error.
    pub fn get(&self, id: &str) -> EngramResult<Conversation> {
        self.find(id)?
            .ok_or_else(|| EngramError::ConversationNotFound { id: id.to_string() })
    }

    pub fn find(&self, id: &str) -> EngramResult<Option<Conversation>> {
        self.store
            .with_reader(|conn| conversation_ops::get_conversation(conn, id))
    }

    /// Newest conversations first, messages included.
    pub fn get_recent(&self, limit: usize) -> EngramResult<Vec<Conversation>> {
        self.store
            .with_reader(|conn| conversation_ops::recent_conversations(conn, limit))
    }

    /// Substring search over message text and extracted entities.
    pub fn search(&self, query: &str, limit: usize) -> EngramResult<Vec<Conversation>> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        self.store
            .with_reader(|conn| conversation_ops::search_conversations(conn, query, limit))
    }

    pub fn stats(&self) -> EngramResult<WorkingStats> {
        self.store.with_reader(conversation_ops::working_stats)
    }

    /// Delete complete conversations oldest-first until at most
    /// `capacity` remain, offering each to the knowledge sink first.
    ///
    /// Distillation is best-effort: a sink failure is retried once,
    /// logged, and never blocks the deletion. Deletions themselves also
    /// retry once; a conversation that refuses to delete is counted as
    /// a failure and left for the next sweep.
    pub fn evict_to_capacity(&self) -> EngramResult<EvictionReport> {
        let complete = self.store.with_reader(conversation_ops::count_complete)?;
        let overflow = (complete as usize).saturating_sub(self.config.capacity);
        if overflow == 0 {
            return Ok(EvictionReport::default());
        }

        let oldest = self
            .store
            .with_reader(conversation_ops::complete_oldest_first)?;

        let mut report = EvictionReport::default();
        for id in oldest.into_iter().take(overflow) {
            let conversation = match self
                .store
                .with_reader(|conn| conversation_ops::get_conversation(conn, &id))?
            {
                Some(conversation) => conversation,
                None => continue,
            };

            report.distilled += self.distill_into_sink(&conversation);

            match self.delete_with_retry(&id) {
                Ok(()) => report.evicted += 1,
                Err(e) => {
                    tracing::warn!(conversation_id = %id, error = %e, "eviction failed twice");
                    report.failures += 1;
                }
            }
        }
        Ok(report)
    }

    fn distill_into_sink(&self, conversation: &Conversation) -> usize {
        let Some(sink) = &self.sink else {
            return 0;
        };

        let mut accepted = 0;
        for draft in distill::drafts_for(conversation, &self.namespace) {
            let offered = sink
                .offer(draft.clone())
                .or_else(|first| {
                    tracing::debug!(
                        conversation_id = %conversation.id,
                        error = %first,
                        "draft handoff failed, retrying"
                    );
                    sink.offer(draft)
                });
            match offered {
                Ok(Some(_)) => accepted += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation.id,
                        error = %e,
                        "draft handoff failed twice, dropping draft"
                    );
                }
            }
        }
        accepted
    }

    fn delete_with_retry(&self, id: &str) -> EngramResult<()> {
        let first = self
            .store
            .with_writer(|conn| conversation_ops::delete_conversation(conn, id));
        match first {
            Ok(_) => Ok(()),
            Err(first_err) => {
                tracing::debug!(conversation_id = %id, error = %first_err, "delete failed, retrying");
                self.store
                    .with_writer(|conn| conversation_ops::delete_conversation(conn, id))
                    .map(|_| ())
            }
        }
    }

    fn start_conversation(&self) -> EngramResult<String> {
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            status: ConversationStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
            strategic: false,
            entities: Vec::new(),
            touched_files: Vec::new(),
            messages: Vec::new(),
        };
        self.store
            .with_writer(|conn| conversation_ops::insert_conversation(conn, &conversation))?;
        tracing::debug!(conversation_id = %conversation.id, "conversation started");
        Ok(conversation.id)
    }

    fn insert_message(&self, conversation_id: &str, role: MessageRole, text: &str) -> EngramResult<()> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role,
            content: text.to_string(),
            created_at: Utc::now(),
        };
        self.store
            .with_writer(|conn| message_ops::insert_message(conn, &message))
    }
}
