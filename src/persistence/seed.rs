//! Built-in agent roster written on first boot

use tracing::info;

use super::DocumentStore;
use crate::domain::{AgentDraft, AgentStatus, AgentType, Performance};
use crate::error::Result;

/// (agentId, name, type, port, capabilities)
const ROSTER: [(&str, &str, AgentType, i32, &[&str]); 17] = [
    (
        "orchestrator",
        "Master Orchestrator",
        AgentType::Orchestration,
        3100,
        &["task-routing", "planning", "coordination"],
    ),
    (
        "frontend-react",
        "React Frontend Agent",
        AgentType::Frontend,
        3101,
        &["react", "typescript", "css"],
    ),
    (
        "frontend-vue",
        "Vue Frontend Agent",
        AgentType::Frontend,
        3102,
        &["vue", "javascript", "css"],
    ),
    (
        "frontend-mobile",
        "Mobile UI Agent",
        AgentType::Frontend,
        3103,
        &["react-native", "flutter"],
    ),
    (
        "backend-node",
        "Node.js Backend Agent",
        AgentType::Backend,
        3104,
        &["node", "express", "rest"],
    ),
    (
        "backend-python",
        "Python Backend Agent",
        AgentType::Backend,
        3105,
        &["python", "fastapi", "django"],
    ),
    (
        "backend-rust",
        "Rust Backend Agent",
        AgentType::Backend,
        3106,
        &["rust", "axum", "tokio"],
    ),
    (
        "database-admin",
        "Database Agent",
        AgentType::Backend,
        3107,
        &["postgresql", "mongodb", "migrations"],
    ),
    (
        "api-integration",
        "API Integration Agent",
        AgentType::Backend,
        3108,
        &["graphql", "webhooks", "oauth"],
    ),
    (
        "fullstack-web",
        "Fullstack Web Agent",
        AgentType::Fullstack,
        3109,
        &["nextjs", "prisma", "tailwind"],
    ),
    (
        "fullstack-prototype",
        "Prototyping Agent",
        AgentType::Fullstack,
        3110,
        &["scaffolding", "mvp"],
    ),
    (
        "devops-ci",
        "CI/CD Agent",
        AgentType::Devops,
        3111,
        &["github-actions", "pipelines"],
    ),
    (
        "devops-infra",
        "Infrastructure Agent",
        AgentType::Devops,
        3112,
        &["docker", "kubernetes", "terraform"],
    ),
    (
        "devops-monitoring",
        "Monitoring Agent",
        AgentType::Devops,
        3113,
        &["prometheus", "grafana", "alerting"],
    ),
    (
        "qa-automation",
        "Test Automation Agent",
        AgentType::Qa,
        3114,
        &["unit-tests", "e2e", "playwright"],
    ),
    (
        "qa-security",
        "Security Review Agent",
        AgentType::Qa,
        3115,
        &["audit", "dependency-scan", "owasp"],
    ),
    (
        "design-ui",
        "UI/UX Design Agent",
        AgentType::Design,
        3116,
        &["figma", "wireframes", "accessibility"],
    ),
];

/// The fixed agent roster
pub fn default_agents() -> Vec<AgentDraft> {
    ROSTER
        .iter()
        .map(|(agent_id, name, agent_type, port, capabilities)| AgentDraft {
            agent_id: agent_id.to_string(),
            name: name.to_string(),
            agent_type: *agent_type,
            status: AgentStatus::Offline,
            port: Some(*port),
            endpoint: Some(format!("http://localhost:{}", port)),
            current_project: None,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            performance: Performance::default(),
        })
        .collect()
}

/// Write the default roster when the agent collection is empty
///
/// Returns the number of agents inserted (0 when agents already exist).
/// Not guarded against concurrent cold starts; run it before serving.
pub async fn seed_default_agents(store: &dyn DocumentStore) -> Result<usize> {
    let existing = store.count_agents().await?;
    if existing > 0 {
        info!("Agent collection has {} records, skipping seed", existing);
        return Ok(0);
    }

    let inserted = store.insert_agents(default_agents()).await?;
    info!("Seeded {} default agents", inserted);
    Ok(inserted)
}
