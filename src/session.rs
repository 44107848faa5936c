//! Single-slot decision cache for an interactive session.
//!
//! Only the most recent selection is remembered. Selecting the same entity
//! again reuses its decision; selecting anything else recomputes it, even
//! for entities seen earlier.

use crate::client::PredictionBackend;
use crate::dataset::FeatureProvider;
use crate::decision::{Decision, DecisionEngine};
use crate::error::ClientError;
use tracing::{debug, info};

/// The decision currently on display
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSession {
    pub entity_id: String,
    /// Raw model label (1 = default risk)
    pub prediction: u8,
    pub decision: Decision,
}

impl CachedSession {
    pub fn score(&self) -> f64 {
        self.decision.score
    }
}

pub struct SessionCache<B> {
    backend: B,
    engine: DecisionEngine,
    current: Option<CachedSession>,
}

impl<B: PredictionBackend> SessionCache<B> {
    pub fn new(backend: B, engine: DecisionEngine) -> Self {
        Self {
            backend,
            engine,
            current: None,
        }
    }

    /// Decision for `entity_id`, calling the backend only if the selection
    /// changed since the last call.
    ///
    /// On failure the slot is cleared, so the next call retries.
    pub fn get_decision<P>(
        &mut self,
        entity_id: &str,
        provider: &P,
    ) -> Result<Decision, ClientError>
    where
        P: FeatureProvider + ?Sized,
    {
        self.select(entity_id, provider).map(|session| session.decision)
    }

    /// Like [`get_decision`](Self::get_decision), returning the whole slot.
    pub fn select<P>(
        &mut self,
        entity_id: &str,
        provider: &P,
    ) -> Result<&CachedSession, ClientError>
    where
        P: FeatureProvider + ?Sized,
    {
        if self.is_current(entity_id) {
            debug!(entity_id, "Reusing cached decision");
        } else {
            self.current = None;
            let session = self.compute(entity_id, provider)?;
            self.current = Some(session);
        }

        self.current
            .as_ref()
            .ok_or_else(|| ClientError::UnknownEntity(entity_id.to_string()))
    }

    /// The slot as it stands, without any recomputation
    pub fn current(&self) -> Option<&CachedSession> {
        self.current.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn is_current(&self, entity_id: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| session.entity_id == entity_id)
    }

    fn compute<P>(&self, entity_id: &str, provider: &P) -> Result<CachedSession, ClientError>
    where
        P: FeatureProvider + ?Sized,
    {
        let features = provider
            .features(entity_id)
            .ok_or_else(|| ClientError::UnknownEntity(entity_id.to_string()))?;

        let result = self.backend.predict(&features)?;
        let decision = self.engine.decide(&result);

        info!(
            entity_id,
            prediction = result.label,
            score = decision.score,
            accepted = decision.accepted,
            "Decision computed"
        );

        Ok(CachedSession {
            entity_id: entity_id.to_string(),
            prediction: result.label,
            decision,
        })
    }
}
