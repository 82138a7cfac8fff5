use std::sync::Arc;

use agentflow_knowledge::{HashEmbedder, KnowledgeError, KnowledgeGraph, PatternThresholds};
use agentflow_types::{ProblemSeverity, Relationship, SolutionAction};
use serde_json::json;

fn graph() -> KnowledgeGraph {
    KnowledgeGraph::new(Arc::new(HashEmbedder))
}

#[test]
fn duplicate_problem_merges_instead_of_inserting() {
    let g = graph();
    let id1 = g.add_problem("network", "connection reset", vec!["ECONNRESET".into()], json!({"host": "a"}), ProblemSeverity::Medium);
    let id2 = g.add_problem("network", "connection reset", vec!["ECONNRESET".into()], json!({"attempt": 2}), ProblemSeverity::Medium);

    assert_eq!(id1, id2);
    let problem = g.problem(id1).unwrap();
    assert_eq!(problem.occurrence_count, 2);
    assert_eq!(problem.context["host"], json!("a"));
    assert_eq!(problem.context["attempt"], json!(2));
}

#[test]
fn find_solutions_ranks_linked_solution_above_unlinked() {
    let g = graph();
    let problem = g.add_problem(
        "network",
        "connection reset while fetching bookmark page",
        vec!["ECONNRESET".into()],
        json!({}),
        ProblemSeverity::Medium,
    );
    let good = g.add_solution("retry fetch with backoff", vec![SolutionAction { kind: "retry".into(), target: "fetch".into(), parameters: json!({}), order: 0 }], vec![], vec![]);
    let unrelated = g.add_solution("rotate log files", vec![], vec![], vec![]);

    g.link(problem, good, Relationship::Solves, 1.0).unwrap();
    for _ in 0..5 {
        g.record_outcome(good, true, 50.0).unwrap();
    }
    g.record_outcome(unrelated, true, 10.0).unwrap();

    let ranked = g.find_solutions("connection reset while fetching bookmark page", 5, 0.1);
    assert!(!ranked.is_empty());
    assert_eq!(ranked[0].0.id, good);
}

#[test]
fn solves_edge_creating_a_cycle_is_rejected() {
    let g = graph();
    let p1 = g.add_problem("a", "first", vec![], json!({}), ProblemSeverity::Low);
    let s1 = g.add_solution("sol", vec![], vec![], vec![]);

    g.link(p1, s1, Relationship::Solves, 1.0).unwrap();
    let err = g.link(s1, p1, Relationship::Solves, 1.0).unwrap_err();
    assert!(matches!(err, KnowledgeError::CycleDetected { .. }));
}

#[test]
fn pattern_extraction_requires_both_occurrence_and_confidence_bar() {
    let g = graph();
    let flaky = g.add_solution("flaky fix", vec![], vec![], vec![]);
    let reliable = g.add_solution("reliable fix", vec![], vec![], vec![]);

    // Below the occurrence floor: no pattern yet.
    g.record_outcome(flaky, true, 1.0).unwrap();
    g.record_outcome(flaky, false, 1.0).unwrap();

    // At the bar with enough successes.
    for _ in 0..4 {
        g.record_outcome(reliable, true, 1.0).unwrap();
    }

    let created = g.extract_patterns(PatternThresholds { min_occurrences: 3, confidence_floor: 0.6, retraining_floor: 0.4 });
    assert_eq!(created.len(), 1);
    let pattern = g.pattern(created[0]).unwrap();
    assert!(pattern.confidence >= 0.6);
}

#[test]
fn pattern_degrading_below_retraining_floor_forks_a_refined_successor() {
    let g = graph();
    let thresholds = PatternThresholds { min_occurrences: 3, confidence_floor: 0.6, retraining_floor: 0.4 };
    let solution = g.add_solution("restart worker", vec![], vec![], vec![]);

    for _ in 0..4 {
        g.record_outcome(solution, true, 10.0).unwrap();
    }
    let first_pass = g.extract_patterns(thresholds);
    assert_eq!(first_pass.len(), 1);
    let original_id = first_pass[0];

    // Tip the success rate below the retraining floor.
    for _ in 0..8 {
        g.record_outcome(solution, false, 10.0).unwrap();
    }
    let second_pass = g.extract_patterns(thresholds);
    assert_eq!(second_pass.len(), 1);
    let evolved_id = second_pass[0];
    assert_ne!(evolved_id, original_id);

    // The predecessor is untouched, not deleted, and linked from the successor.
    assert!(g.pattern(original_id).is_some());
    let edges = g.edges_from(evolved_id);
    assert!(edges.iter().any(|e| e.to == original_id && e.relationship == Relationship::EvolvesInto));
}

#[test]
fn apply_pattern_matches_against_a_live_payload() {
    let g = graph();
    let thresholds = PatternThresholds { min_occurrences: 3, confidence_floor: 0.6, retraining_floor: 0.4 };
    let solution = g.add_solution("retry with backoff", vec![], vec![], vec![]);
    for _ in 0..4 {
        g.record_outcome(solution, true, 10.0).unwrap();
    }
    let created = g.extract_patterns(thresholds);
    let pattern_id = created[0];

    let matching_payload = json!({"solution_id": solution.to_string()});
    assert_eq!(g.apply_pattern(&matching_payload), vec![pattern_id]);

    let non_matching_payload = json!({"solution_id": "unrelated"});
    assert!(g.apply_pattern(&non_matching_payload).is_empty());
}

#[test]
fn duplicate_problem_with_differently_worded_description_still_merges() {
    let g = graph();
    let id1 = g.add_problem("network", "connection was reset by the peer", vec!["ECONNRESET".into()], json!({}), ProblemSeverity::Medium);
    let id2 = g.add_problem("network", "peer reset the connection", vec!["ECONNRESET".into()], json!({}), ProblemSeverity::Medium);
    assert_eq!(id1, id2);
    assert_eq!(g.problem(id1).unwrap().occurrence_count, 2);
}
