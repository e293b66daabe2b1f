//! Unit tests for storage record types.

use super::*;
use serde_json::json;

#[test]
fn test_question_new_generates_unique_ids() {
    let a = Question::new("Welcome", "Hi there");
    let b = Question::new("Welcome", "Hi there");

    assert_ne!(a.id, b.id);
    assert_eq!(a.kind, "text");
}

#[test]
fn test_question_builders() {
    let q = Question::new("Pick a plan", "Which plan suits you?")
        .with_id("q-plan")
        .with_kind("choice");

    assert_eq!(q.id, "q-plan");
    assert_eq!(q.kind, "choice");
    assert_eq!(q.title, "Pick a plan");
}

#[test]
fn test_route_new_and_terminal() {
    let route = Route::new("q1", "yes", "q2");
    assert_eq!(route.next_question_id.as_deref(), Some("q2"));

    let end = Route::terminal("q1", "no");
    assert!(end.next_question_id.is_none());
    assert_eq!(end.condition, "no");
}

#[test]
fn test_question_deserialize_defaults() {
    let q: Question = serde_json::from_value(json!({
        "id": "q1",
        "title": "Name?"
    }))
    .unwrap();

    assert_eq!(q.body, "");
    assert_eq!(q.kind, "text");
}

#[test]
fn test_flow_document_deserialize() {
    let doc: FlowDocument = serde_json::from_value(json!({
        "questions": [
            { "id": "q1", "title": "Start", "kind": "choice" },
            { "id": "q2", "title": "Follow-up" }
        ],
        "routes": [
            { "question_id": "q1", "condition": "yes", "next_question_id": "q2" },
            { "question_id": "q1", "condition": "no" }
        ]
    }))
    .unwrap();

    assert_eq!(doc.questions.len(), 2);
    assert_eq!(doc.routes.len(), 2);
    assert!(!doc.routes[0].id.is_empty());
    assert_ne!(doc.routes[0].id, doc.routes[1].id);
    assert!(doc.routes[1].next_question_id.is_none());
}

#[test]
fn test_flow_document_empty() {
    let doc: FlowDocument = serde_json::from_str("{}").unwrap();
    assert!(doc.questions.is_empty());
    assert!(doc.routes.is_empty());
}
