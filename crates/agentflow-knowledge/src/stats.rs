//! Plain counters for knowledge-graph observability (spec §6.5): node
//! counts and, when queried, find_solutions' hottest-path latency.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct KnowledgeGraphStats {
    pub queries_served: AtomicU64,
    pub total_query_micros: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeGraphSnapshot {
    pub problems: usize,
    pub solutions: usize,
    pub patterns: usize,
    pub queries_served: u64,
    pub avg_query_micros: f64,
}

impl KnowledgeGraphStats {
    pub fn record_query(&self, elapsed_micros: u64) {
        self.queries_served.fetch_add(1, Ordering::Relaxed);
        self.total_query_micros.fetch_add(elapsed_micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self, problems: usize, solutions: usize, patterns: usize) -> KnowledgeGraphSnapshot {
        let queries_served = self.queries_served.load(Ordering::Relaxed);
        let total_micros = self.total_query_micros.load(Ordering::Relaxed);
        let avg_query_micros = if queries_served == 0 { 0.0 } else { total_micros as f64 / queries_served as f64 };
        KnowledgeGraphSnapshot { problems, solutions, patterns, queries_served, avg_query_micros }
    }
}
