mod common;

use agentdeck::api::types::WsMessage;
use agentdeck::directory::{AgentDirectory, MESSAGE_LOG};
use agentdeck::domain::{AgentInput, AgentType};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{app_for, send, send_json, state_with, test_app, FakeVectorStore};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn agent_body(agent_id: &str) -> Value {
    json!({
        "agentId": agent_id,
        "name": format!("{} agent", agent_id),
        "type": "backend",
        "port": 3200,
        "capabilities": ["rust", " ", "sql"]
    })
}

// ==================== Projects ====================

#[tokio::test]
async fn created_project_is_listed_first() {
    let (app, _, _) = test_app();

    let (status, first) =
        send_json(&app, Method::POST, "/api/projects", Some(json!({ "name": "Alpha" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "planning");
    assert_eq!(first["priority"], "medium");
    assert_eq!(first["createdBy"], "system");

    let (status, second) = send_json(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "Beta", "status": "on-hold", "tags": ["x", ""] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["tags"], json!(["x"]));

    let (status, list) = send_json(&app, Method::GET, "/api/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], second["id"]);
    assert_eq!(list[1]["id"], first["id"]);
}

#[tokio::test]
async fn updating_unknown_project_is_not_found() {
    let (app, _, _) = test_app();
    let body = Some(json!({ "name": "Ghost" }));

    let uri = format!("/api/projects/{}", Uuid::new_v4());
    let (status, err) = send_json(&app, Method::PUT, &uri, body.clone()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["success"], false);
    assert_eq!(err["error"], "Project not found");

    let (status, _) = send_json(&app, Method::PUT, "/api/projects/not-a-uuid", body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn project_replace_keeps_identity_and_resets_omitted_fields() {
    let (app, state, _) = test_app();
    let mut rx = state.subscribe();

    let (_, created) = send_json(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "Site", "priority": "high", "progress": 40 })),
    )
    .await;
    let uri = format!("/api/projects/{}", created["id"].as_str().unwrap());

    let (status, updated) =
        send_json(&app, Method::PUT, &uri, Some(json!({ "name": "Site v2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["name"], "Site v2");
    assert_eq!(updated["priority"], "medium");
    assert_eq!(updated["progress"], 0);

    let (status, fetched) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, updated);

    assert!(matches!(rx.recv().await.unwrap().message, WsMessage::ProjectCreated(_)));
    assert!(matches!(rx.recv().await.unwrap().message, WsMessage::ProjectUpdated(_)));
}

#[tokio::test]
async fn deleted_project_is_gone_and_broadcast() {
    let (app, state, _) = test_app();
    let (_, created) =
        send_json(&app, Method::POST, "/api/projects", Some(json!({ "name": "Tmp" }))).await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/projects/{}", id);

    let mut rx = state.subscribe();
    let (status, body) = send_json(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], id);

    match rx.recv().await.unwrap().message {
        WsMessage::ProjectDeleted(deleted) => assert_eq!(deleted.id.to_string(), id),
        other => panic!("unexpected event {:?}", other),
    }

    let (status, _) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_project_payloads_are_bad_requests() {
    let (app, _, _) = test_app();

    let (status, err) =
        send_json(&app, Method::POST, "/api/projects", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["success"], false);
    assert!(err["error"].as_str().unwrap().contains("name"));

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "P", "progress": 101 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "P", "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/projects")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, err) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["success"], false);
}

// ==================== Agents ====================

#[tokio::test]
async fn registered_agent_is_written_to_the_directory() {
    let (app, _, vectors) = test_app();

    let (status, agent) =
        send_json(&app, Method::POST, "/api/agents", Some(agent_body("api-rust"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(agent["status"], "offline");
    assert_eq!(agent["capabilities"], json!(["rust", "sql"]));

    let directory = vectors.records("agent_directory");
    assert_eq!(directory.len(), 1);
    assert_eq!(directory[0].id, "api-rust");

    let (status, err) =
        send_json(&app, Method::POST, "/api/agents", Some(agent_body("api-rust"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["success"], false);
}

#[tokio::test]
async fn agent_registration_requires_a_type() {
    let (app, _, _) = test_app();
    let (status, err) = send_json(
        &app,
        Method::POST,
        "/api/agents",
        Some(json!({ "agentId": "x", "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "type is required");
}

#[tokio::test]
async fn agent_list_merges_directory_status() {
    let (app, state, _) = test_app();

    send_json(&app, Method::POST, "/api/agents", Some(agent_body("zeta"))).await;
    // Written behind the directory's back
    let draft = AgentInput {
        agent_id: "alpha".into(),
        name: "Alpha".into(),
        agent_type: Some(AgentType::Qa),
        ..Default::default()
    }
    .validate()
    .unwrap();
    state.store.insert_agent(draft).await.unwrap();

    let (status, list) = send_json(&app, Method::GET, "/api/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["agentId"], "alpha");
    assert_eq!(list[0]["directoryStatus"], "inactive");
    assert_eq!(list[1]["agentId"], "zeta");
    assert_eq!(list[1]["directoryStatus"], "active");
    assert_eq!(list[1]["type"], "backend");
}

#[tokio::test]
async fn failing_directory_never_fails_agent_endpoints() {
    let state = state_with(AgentDirectory::new(Arc::new(FakeVectorStore::failing())), false);
    let app = app_for(state);

    let (status, _) = send_json(&app, Method::POST, "/api/agents", Some(agent_body("solo"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = send_json(&app, Method::GET, "/api/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["directoryStatus"], "inactive");
}

#[tokio::test]
async fn agent_update_is_partial_and_refreshes_last_seen() {
    let (app, _, _) = test_app();
    let (_, agent) = send_json(&app, Method::POST, "/api/agents", Some(agent_body("ops"))).await;
    let uri = format!("/api/agents/{}", agent["id"].as_str().unwrap());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, updated) =
        send_json(&app, Method::PUT, &uri, Some(json!({ "status": "busy" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "busy");
    assert_eq!(updated["name"], agent["name"]);
    assert_eq!(updated["port"], 3200);
    assert_ne!(updated["lastSeen"], agent["lastSeen"]);

    let (status, _) = send_json(&app, Method::PUT, &uri, Some(json!({ "port": 70000 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/api/agents/{}", Uuid::new_v4());
    let (status, _) = send_json(&app, Method::PUT, &missing, Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_agent_disappears_from_list() {
    let (app, state, _) = test_app();
    let (_, agent) = send_json(&app, Method::POST, "/api/agents", Some(agent_body("gone"))).await;
    send_json(&app, Method::POST, "/api/agents", Some(agent_body("kept"))).await;

    let mut rx = state.subscribe();
    let uri = format!("/api/agents/{}", agent["id"].as_str().unwrap());
    let (status, _) = send_json(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    match rx.recv().await.unwrap().message {
        WsMessage::AgentDeleted(deleted) => assert_eq!(deleted.agent_id, "gone"),
        other => panic!("unexpected event {:?}", other),
    }

    let (_, list) = send_json(&app, Method::GET, "/api/agents", None).await;
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["agentId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["kept"]);
}

#[tokio::test]
async fn re_registered_agent_overwrites_its_directory_entry() {
    let (app, _, vectors) = test_app();
    let (_, agent) = send_json(&app, Method::POST, "/api/agents", Some(agent_body("reborn"))).await;
    let uri = format!("/api/agents/{}", agent["id"].as_str().unwrap());
    let (status, _) = send_json(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let mut body = agent_body("reborn");
    body["name"] = json!("Second life");
    body["type"] = json!("qa");
    let (status, _) = send_json(&app, Method::POST, "/api/agents", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let directory = vectors.records("agent_directory");
    assert_eq!(directory.len(), 1);
    assert_eq!(directory[0].metadata["name"], "Second life");
    assert_eq!(directory[0].metadata["type"], "qa");
}

// ==================== Messaging ====================

#[tokio::test]
async fn messaging_without_vector_store_is_unavailable() {
    let app = app_for(state_with(AgentDirectory::unavailable(), false));

    let (status, err) = send_json(
        &app,
        Method::POST,
        "/api/agents/message",
        Some(json!({ "fromAgent": "a", "toAgent": "b", "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["success"], false);

    let (status, _) = send_json(&app, Method::GET, "/api/agents/messages", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The process keeps serving everything else
    let (status, _) = send_json(&app, Method::GET, "/api/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, health) = send_json(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn sent_message_is_logged_broadcast_and_queryable() {
    let (app, state, vectors) = test_app();
    let mut rx = state.subscribe();

    let (status, sent) = send_json(
        &app,
        Method::POST,
        "/api/agents/message",
        Some(json!({ "fromAgent": "orchestrator", "toAgent": "qa-automation", "message": "run e2e" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["success"], true);
    let message_id = sent["messageId"].as_str().unwrap().to_string();
    assert!(message_id.starts_with("msg_"));
    assert_eq!(sent["data"]["messageType"], "info");
    assert_eq!(sent["data"]["priority"], "normal");
    assert_eq!(sent["data"]["status"], "delivered");

    assert_eq!(vectors.records(MESSAGE_LOG).len(), 1);
    match rx.recv().await.unwrap().message {
        WsMessage::NewMessage(message) => assert_eq!(message.id, message_id),
        other => panic!("unexpected event {:?}", other),
    }

    send_json(
        &app,
        Method::POST,
        "/api/agents/message",
        Some(json!({ "fromAgent": "devops", "toAgent": "frontend-react", "message": "deploy" })),
    )
    .await;

    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/agents/messages?agentId=qa-automation&limit=5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], message_id);
    assert_eq!(messages[0]["message"], "run e2e");

    let (_, body) = send_json(&app, Method::GET, "/api/agents/messages?limit=0", None).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_message_is_a_bad_request() {
    let (app, _, vectors) = test_app();
    let (status, err) = send_json(
        &app,
        Method::POST,
        "/api/agents/message",
        Some(json!({ "fromAgent": "a", "toAgent": "", "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("toAgent"));
    assert!(vectors.records(MESSAGE_LOG).is_empty());

    let (status, _) =
        send_json(&app, Method::GET, "/api/agents/messages?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn log_failures_hide_details_outside_development() {
    let failing = || AgentDirectory::new(Arc::new(FakeVectorStore::failing()));
    let body = json!({ "fromAgent": "a", "toAgent": "b", "message": "hi" });

    let app = app_for(state_with(failing(), false));
    let (status, err) =
        send_json(&app, Method::POST, "/api/agents/message", Some(body.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err["error"], "Internal server error");

    let app = app_for(state_with(failing(), true));
    let (status, err) = send_json(&app, Method::POST, "/api/agents/message", Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err["error"].as_str().unwrap().contains("fake outage"));
}

// ==================== System ====================

#[tokio::test]
async fn health_reports_both_dependencies() {
    let (app, _, _) = test_app();
    let (status, health) = send_json(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["database"], true);
    assert_eq!(health["vectorStore"], true);
    assert!(health["uptimeSeconds"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn stats_count_documents_by_status() {
    let (app, _, _) = test_app();
    send_json(&app, Method::POST, "/api/projects", Some(json!({ "name": "A" }))).await;
    send_json(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "B", "status": "active" })),
    )
    .await;
    send_json(&app, Method::POST, "/api/agents", Some(agent_body("one"))).await;

    let (status, stats) = send_json(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["database"], true);
    assert_eq!(stats["vectorStore"], true);
    assert_eq!(stats["projects"]["total"], 2);
    assert_eq!(stats["projects"]["byStatus"]["planning"], 1);
    assert_eq!(stats["projects"]["byStatus"]["active"], 1);
    assert_eq!(stats["agents"]["total"], 1);
    assert_eq!(stats["agents"]["byStatus"]["offline"], 1);
    assert_eq!(stats["connectedClients"], 0);
}
