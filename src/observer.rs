//! Observability sink injected into the analysis core.
//!
//! The core reports what it does through an [`AnalysisObserver`] it is handed,
//! never through process-wide state. [`TracingObserver`] forwards events to
//! `tracing`; [`NullObserver`] discards them.

use crate::core::types::{ResistanceStatus, StrategyKind};

/// Receives progress events from the analysis core. All methods default to no-ops.
pub trait AnalysisObserver: Send + Sync {
    fn strategy_selected(&self, _strategy: StrategyKind, _reason: &str) {}

    /// A strategy errored; the engine may still fall back
    fn strategy_failed(&self, _strategy: StrategyKind, _error: &str) {}

    fn alignment_complete(&self, _query_id: &str, _hit_count: usize, _strategy: StrategyKind) {}

    /// `blastn` reported hits under a query name that matches no input record
    fn hits_dropped(&self, _query_id: &str, _count: usize) {}

    fn reference_listing_failed(&self, _source: &str, _error: &str) {}

    fn gene_identified(&self, _symbol: &str, _percent_identity: f64) {}

    fn threshold_ignored(&self, _threshold: f64) {}

    fn narrative_unavailable(&self, _reason: &str) {}

    fn analysis_complete(&self, _sample_id: &str, _status: ResistanceStatus, _confidence: f64) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl AnalysisObserver for NullObserver {}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn strategy_selected(&self, strategy: StrategyKind, reason: &str) {
        tracing::info!("Aligning with {strategy}: {reason}");
    }

    fn strategy_failed(&self, strategy: StrategyKind, error: &str) {
        tracing::warn!("{strategy} failed: {error}");
    }

    fn alignment_complete(&self, query_id: &str, hit_count: usize, strategy: StrategyKind) {
        tracing::debug!("{query_id}: {hit_count} hits from {strategy}");
    }

    fn hits_dropped(&self, query_id: &str, count: usize) {
        tracing::warn!("Dropping {count} hits for unknown query {query_id}");
    }

    fn reference_listing_failed(&self, source: &str, error: &str) {
        tracing::warn!("Cannot list references from {source}: {error}");
    }

    fn gene_identified(&self, symbol: &str, percent_identity: f64) {
        tracing::debug!("Identified {symbol} at {percent_identity:.2}% identity");
    }

    fn threshold_ignored(&self, threshold: f64) {
        tracing::debug!(
            "Generic threshold {threshold} accepted; classification uses per-gene thresholds"
        );
    }

    fn narrative_unavailable(&self, reason: &str) {
        tracing::warn!("Treatment narrative unavailable: {reason}");
    }

    fn analysis_complete(&self, sample_id: &str, status: ResistanceStatus, confidence: f64) {
        tracing::info!("{sample_id}: {status} ({confidence:.1}% confidence)");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records events as strings for assertions
    #[derive(Debug, Default)]
    pub struct RecordingObserver {
        pub events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl AnalysisObserver for RecordingObserver {
        fn strategy_selected(&self, strategy: StrategyKind, _reason: &str) {
            self.push(format!("selected:{strategy:?}"));
        }

        fn strategy_failed(&self, strategy: StrategyKind, _error: &str) {
            self.push(format!("failed:{strategy:?}"));
        }

        fn hits_dropped(&self, query_id: &str, count: usize) {
            self.push(format!("dropped:{query_id}:{count}"));
        }

        fn reference_listing_failed(&self, source: &str, _error: &str) {
            self.push(format!("listing_failed:{source}"));
        }

        fn gene_identified(&self, symbol: &str, _percent_identity: f64) {
            self.push(format!("gene:{symbol}"));
        }

        fn narrative_unavailable(&self, _reason: &str) {
            self.push("narrative_unavailable".to_string());
        }
    }
}
