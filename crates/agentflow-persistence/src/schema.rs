//! Diesel schema, hand-declared (no live database to run `diesel
//! print-schema` against in this environment).
//!
//! Tables:
//! - `events`: append-only per-stream event log, `seq` as a global
//!   monotonic PK (mirrors the in-memory `EventStore`).
//! - `tasks` / `artifacts` / `messages`: the Task Store's durable read
//!   model, kept alongside the event log for fast lookups.
//! - `agent_capabilities`: the registry's durable capability cards.
//! - `knowledge_nodes` / `knowledge_edges`: the knowledge graph.

diesel::table! {
    events (seq) {
        seq -> BigInt,
        stream_id -> Uuid,
        ts -> Timestamptz,
        event_type -> Text,
        payload -> Jsonb,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        workflow -> Jsonb,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        context -> Jsonb,
        priority -> Integer,
    }
}

diesel::table! {
    artifacts (id) {
        id -> Uuid,
        task_id -> Uuid,
        agent_type -> Text,
        step_index -> Integer,
        fingerprint -> Text,
        data -> Jsonb,
        produced_at -> Timestamptz,
    }
}

diesel::table! {
    messages (id) {
        id -> BigInt,
        task_id -> Uuid,
        step_index -> Nullable<Integer>,
        kind -> Text,
        body -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    agent_capabilities (agent_type) {
        agent_type -> Text,
        version -> Text,
        status -> Text,
        input_schema -> Jsonb,
        output_schema -> Jsonb,
        concurrency_limit -> Integer,
        registered_at -> Timestamptz,
        last_health_check -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::Vector;

    knowledge_nodes (id) {
        id -> Uuid,
        node_type -> Text,
        fingerprint -> Nullable<Text>,
        data -> Jsonb,
        embedding -> Nullable<Vector>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    knowledge_edges (id) {
        id -> BigInt,
        from_id -> Uuid,
        to_id -> Uuid,
        relationship -> Text,
        weight -> Double,
        metadata -> Jsonb,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    events,
    tasks,
    artifacts,
    messages,
    agent_capabilities,
    knowledge_nodes,
    knowledge_edges,
);
