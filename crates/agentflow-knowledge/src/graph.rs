//! Knowledge Graph (C6): the semantic store that closes the learning
//! loop problem -> solution -> outcome -> pattern (spec §4.6).

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use agentflow_core::hashing::{hash_str, to_canonical_json};
use agentflow_types::{
    Insight, KnowledgeEdge, MatchingRule, Pattern, PatternKind, Problem, ProblemSeverity,
    Relationship, Solution, SolutionAction, Tool,
};
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::{PatternThresholds, RankingWeights};
use crate::embedding::EmbeddingProvider;
use crate::error::KnowledgeError;
use crate::similarity::{FlatSimilarityIndex, SimilarityIndex};
use crate::stats::{KnowledgeGraphSnapshot, KnowledgeGraphStats};

pub struct KnowledgeGraph {
    embedder: Arc<dyn EmbeddingProvider>,
    problems: DashMap<Uuid, Problem>,
    problem_fingerprints: DashMap<String, Uuid>,
    problem_index: FlatSimilarityIndex,
    solutions: DashMap<Uuid, Solution>,
    solution_index: FlatSimilarityIndex,
    patterns: DashMap<Uuid, Pattern>,
    pattern_for_solution: DashMap<Uuid, Uuid>,
    insights: DashMap<Uuid, Insight>,
    tools: DashMap<Uuid, Tool>,
    edges: DashMap<Uuid, Vec<KnowledgeEdge>>,
    weights: RankingWeights,
    stats: KnowledgeGraphStats,
}

impl KnowledgeGraph {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            problems: DashMap::new(),
            problem_fingerprints: DashMap::new(),
            problem_index: FlatSimilarityIndex::new(),
            solutions: DashMap::new(),
            solution_index: FlatSimilarityIndex::new(),
            patterns: DashMap::new(),
            pattern_for_solution: DashMap::new(),
            insights: DashMap::new(),
            tools: DashMap::new(),
            edges: DashMap::new(),
            weights: RankingWeights::default(),
            stats: KnowledgeGraphStats::default(),
        }
    }

    pub fn stats_snapshot(&self) -> KnowledgeGraphSnapshot {
        self.stats.snapshot(self.problems.len(), self.solutions.len(), self.patterns.len())
    }

    /// A stable hash of `category` + normalized `error_patterns` (spec
    /// §3.6). `description` is deliberately excluded -- two reports of the
    /// same underlying problem worded differently must still merge -- and
    /// `error_patterns` is sorted and deduplicated first so pattern order
    /// never affects the fingerprint.
    fn problem_fingerprint(category: &str, error_patterns: &[String]) -> String {
        let mut normalized: Vec<String> = error_patterns.iter().map(|p| p.trim().to_lowercase()).collect();
        normalized.sort();
        normalized.dedup();
        let canonical = to_canonical_json(&json!({
            "category": category,
            "error_patterns": normalized,
        }));
        hash_str(&canonical)
    }

    /// Inserts a Problem, or (spec §4.6) merges into the existing node
    /// sharing its fingerprint: bumps `occurrence_count`, refreshes
    /// `last_seen`, and merges `context`.
    pub fn add_problem(
        &self,
        category: impl Into<String>,
        description: impl Into<String>,
        error_patterns: Vec<String>,
        context: Value,
        severity: ProblemSeverity,
    ) -> Uuid {
        let category = category.into();
        let description = description.into();
        let fingerprint = Self::problem_fingerprint(&category, &error_patterns);

        if let Some(existing_id) = self.problem_fingerprints.get(&fingerprint).map(|e| *e) {
            if let Some(mut problem) = self.problems.get_mut(&existing_id) {
                problem.occurrence_count += 1;
                problem.last_seen = Utc::now();
                merge_json(&mut problem.context, &context);
            }
            return existing_id;
        }

        let embed_text = format!("{} {}", description, error_patterns.join(" "));
        let embedding = self.embedder.embed(&embed_text);
        let id = Uuid::new_v4();
        let now = Utc::now();
        let problem = Problem {
            id,
            fingerprint: fingerprint.clone(),
            category,
            description,
            error_patterns,
            context,
            severity,
            occurrence_count: 1,
            first_seen: now,
            last_seen: now,
            embedding: Some(embedding.clone()),
        };
        self.problems.insert(id, problem);
        self.problem_fingerprints.insert(fingerprint, id);
        self.problem_index.upsert(id, embedding);
        id
    }

    pub fn add_solution(
        &self,
        description: impl Into<String>,
        actions: Vec<SolutionAction>,
        prerequisites: Vec<String>,
        side_effects: Vec<String>,
    ) -> Uuid {
        let description = description.into();
        let embedding = self.embedder.embed(&description);
        let id = Uuid::new_v4();
        let now = Utc::now();
        let solution = Solution {
            id,
            description,
            actions,
            prerequisites,
            side_effects,
            attempt_count: 0,
            success_count: 0,
            avg_resolution_time_ms: 0.0,
            embedding: Some(embedding.clone()),
            created_at: now,
            updated_at: now,
        };
        self.solutions.insert(id, solution);
        self.solution_index.upsert(id, embedding);
        id
    }

    pub fn insight(&self, summary: impl Into<String>, data: Value) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.insights.insert(id, Insight { id, summary: summary.into(), data, created_at: now, updated_at: now });
        id
    }

    pub fn tool(&self, name: impl Into<String>, data: Value) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.tools.insert(id, Tool { id, name: name.into(), data, created_at: now, updated_at: now });
        id
    }

    pub fn problem(&self, id: Uuid) -> Option<Problem> {
        self.problems.get(&id).map(|e| e.clone())
    }

    pub fn solution(&self, id: Uuid) -> Option<Solution> {
        self.solutions.get(&id).map(|e| e.clone())
    }

    /// Adds a typed edge between two existing nodes, rejecting it
    /// (spec §4.6 / §3.7) when it would close a cycle in a relationship
    /// marked `must_be_acyclic` (`Solves`, `Requires`).
    pub fn link(&self, from: Uuid, to: Uuid, relationship: Relationship, weight: f64) -> Result<(), KnowledgeError> {
        if relationship.must_be_acyclic() && self.would_create_cycle(from, to, relationship) {
            return Err(KnowledgeError::CycleDetected { from, to, relationship });
        }
        self.edges.entry(from).or_default().push(KnowledgeEdge::new(from, to, relationship, weight));
        Ok(())
    }

    fn would_create_cycle(&self, from: Uuid, to: Uuid, relationship: Relationship) -> bool {
        if from == to {
            return true;
        }
        // A new from->to edge closes a cycle iff `to` can already reach
        // `from` via edges of the same relationship.
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(to);
        while let Some(node) = queue.pop_front() {
            if node == from {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            if let Some(outgoing) = self.edges.get(&node) {
                for edge in outgoing.iter().filter(|e| e.relationship == relationship) {
                    queue.push_back(edge.to);
                }
            }
        }
        false
    }

    pub fn edges_from(&self, id: Uuid) -> Vec<KnowledgeEdge> {
        self.edges.get(&id).map(|e| e.clone()).unwrap_or_default()
    }

    /// Finds ranked solutions for a described problem (spec §4.6):
    /// embeds the query, retrieves similar Problem nodes, traverses
    /// their `Solves` edges, and scores candidate Solutions by
    /// `w1*similarity + w2*success_rate + w3*recency_decay`.
    ///
    /// Failure of embedding generation degrades to an empty ranked
    /// list rather than blocking the caller (spec §4.6 failure
    /// semantics apply at the ingestion side; here an empty query
    /// embedding simply yields no matches).
    pub fn find_solutions(&self, query: &str, top_k: usize, similarity_threshold: f64) -> Vec<(Solution, f64)> {
        let started = std::time::Instant::now();
        let query_embedding = self.embedder.embed(query);
        let matched_problems = self.problem_index.search(&query_embedding, top_k.max(1) * 4, similarity_threshold);

        let mut best_per_solution: std::collections::HashMap<Uuid, f64> = std::collections::HashMap::new();
        for (problem_id, problem_score) in &matched_problems {
            for edge in self.edges_from(*problem_id) {
                if edge.relationship != Relationship::Solves {
                    continue;
                }
                let entry = best_per_solution.entry(edge.to).or_insert(0.0);
                if *problem_score > *entry {
                    *entry = *problem_score;
                }
            }
        }

        let now = Utc::now();
        let mut ranked: Vec<(Solution, f64)> = best_per_solution
            .into_iter()
            .filter_map(|(solution_id, similarity)| {
                let solution = self.solutions.get(&solution_id)?.clone();
                let age_days = (now - solution.updated_at).num_seconds().max(0) as f64 / 86_400.0;
                let recency_decay = (-age_days / 30.0).exp();
                let score = self.weights.similarity * similarity
                    + self.weights.success_rate * solution.success_rate()
                    + self.weights.recency * recency_decay;
                Some((solution, score))
            })
            .collect();

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        self.stats.record_query(started.elapsed().as_micros() as u64);
        ranked
    }

    /// Records an attempt outcome against a Solution (spec P? / §4.6
    /// learning loop): compare-and-swap style update under the
    /// DashMap's per-shard lock so concurrent outcome reports never
    /// race each other into a torn average.
    pub fn record_outcome(&self, solution_id: Uuid, success: bool, resolution_time_ms: f64) -> Result<(), KnowledgeError> {
        let mut entry = self.solutions.get_mut(&solution_id).ok_or(KnowledgeError::NotFound(solution_id))?;
        let prior_total = entry.avg_resolution_time_ms * entry.attempt_count as f64;
        entry.attempt_count += 1;
        if success {
            entry.success_count += 1;
        }
        entry.avg_resolution_time_ms = (prior_total + resolution_time_ms) / entry.attempt_count as f64;
        entry.updated_at = Utc::now();
        Ok(())
    }

    fn base_matching_rules(solution_id: Uuid) -> Vec<MatchingRule> {
        vec![MatchingRule { field: "solution_id".into(), operator: "eq".into(), value: json!(solution_id.to_string()) }]
    }

    /// Tightens a degraded Pattern's rule-set for its successor (spec
    /// §4.6 pattern evolution): on top of the original rules, require
    /// the resolving attempt to be no slower than the solution's current
    /// average -- the successor only fires on the conditions still
    /// proven to work, rather than the broader set that drifted.
    fn refine_matching_rules(existing: &[MatchingRule], solution: &Solution) -> Vec<MatchingRule> {
        let mut refined = existing.to_vec();
        refined.push(MatchingRule {
            field: "resolution_time_ms".into(),
            operator: "lte".into(),
            value: json!(solution.avg_resolution_time_ms),
        });
        refined
    }

    fn build_pattern(matching_rules: Vec<MatchingRule>, solution: &Solution, confidence: f64) -> Pattern {
        Pattern {
            id: Uuid::new_v4(),
            kind: PatternKind::Behavioral,
            matching_rules,
            actions: solution.actions.clone(),
            confidence,
            occurrences: solution.attempt_count,
            last_updated: Utc::now(),
        }
    }

    /// Scans Solutions for ones meeting the occurrence/confidence bar
    /// and synthesizes a Pattern, or evolves the existing one for that
    /// Solution (spec §4.6). Evolution takes one of two forms:
    /// - confidence unchanged: nothing to do.
    /// - confidence drops below `retraining_floor`: the predecessor is
    ///   kept untouched and a new Pattern with refined rules is forked
    ///   off it, linked back via `EvolvesInto`.
    /// - confidence otherwise drifts: the existing Pattern's stats are
    ///   refreshed in place; no new node is warranted.
    pub fn extract_patterns(&self, thresholds: PatternThresholds) -> Vec<Uuid> {
        let mut created = Vec::new();
        for entry in self.solutions.iter() {
            let solution = entry.value();
            let confidence = solution.success_rate();
            let predecessor = self.pattern_for_solution.get(&solution.id).map(|e| *e);

            match predecessor {
                None => {
                    if solution.attempt_count < thresholds.min_occurrences || confidence < thresholds.confidence_floor {
                        continue;
                    }
                    let pattern = Self::build_pattern(Self::base_matching_rules(solution.id), &solution, confidence);
                    let new_id = pattern.id;
                    self.patterns.insert(new_id, pattern);
                    self.pattern_for_solution.insert(solution.id, new_id);
                    created.push(new_id);
                }
                Some(pred_id) => {
                    let Some(pred) = self.patterns.get(&pred_id).map(|e| e.clone()) else { continue };
                    if (pred.confidence - confidence).abs() < f64::EPSILON {
                        continue;
                    }
                    if confidence < thresholds.retraining_floor {
                        let refined = Self::refine_matching_rules(&pred.matching_rules, &solution);
                        let pattern = Self::build_pattern(refined, &solution, confidence);
                        let new_id = pattern.id;
                        self.patterns.insert(new_id, pattern);
                        let _ = self.link(new_id, pred_id, Relationship::EvolvesInto, 1.0);
                        self.pattern_for_solution.insert(solution.id, new_id);
                        created.push(new_id);
                    } else if let Some(mut live) = self.patterns.get_mut(&pred_id) {
                        live.confidence = confidence;
                        live.occurrences = solution.attempt_count;
                        live.last_updated = Utc::now();
                    }
                }
            }
        }
        created
    }

    pub fn pattern(&self, id: Uuid) -> Option<Pattern> {
        self.patterns.get(&id).map(|e| e.clone())
    }

    /// Evaluates every stored Pattern's rule-set against `payload` (spec
    /// §4.6 pattern application) and returns matching pattern ids,
    /// highest confidence first.
    pub fn apply_pattern(&self, payload: &Value) -> Vec<Uuid> {
        let mut matched: Vec<(Uuid, f64)> = self
            .patterns
            .iter()
            .filter(|entry| crate::rules::pattern_matches(&entry.value().matching_rules, payload))
            .map(|entry| (*entry.key(), entry.value().confidence))
            .collect();
        matched.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        matched.into_iter().map(|(id, _)| id).collect()
    }
}

fn merge_json(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (k, v) in incoming_map {
                base_map.insert(k.clone(), v.clone());
            }
        }
        (base, incoming) if incoming != &Value::Null => {
            *base = incoming.clone();
        }
        _ => {}
    }
}
