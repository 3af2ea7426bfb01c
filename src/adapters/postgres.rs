use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{
    Agent, AgentDraft, AgentPatch, AgentStatus, AgentStatusPing, AgentType, AssignedAgent,
    Performance, Priority, Project, ProjectDraft, ProjectFile, ProjectStatus, ProjectTask,
};
use crate::error::{DeckError, Result};
use crate::persistence::{DocumentStore, StatusCounts};

const PROJECT_COLUMNS: &str = "id, name, description, status, priority, progress, \
     assigned_agents, tasks, created_by, tags, files, created_at, updated_at";

const AGENT_COLUMNS: &str = "id, agent_id, name, agent_type, status, port, endpoint, \
     current_project, capabilities, last_seen, performance, created_at, updated_at";

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }
}

fn decode_error(column: &str, reason: String) -> DeckError {
    DeckError::Internal(format!("invalid {} in database: {}", column, reason))
}

fn project_from_row(row: &PgRow) -> Result<Project> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    let assigned_agents: Json<Vec<AssignedAgent>> = row.try_get("assigned_agents")?;
    let tasks: Json<Vec<ProjectTask>> = row.try_get("tasks")?;
    let files: Json<Vec<ProjectFile>> = row.try_get("files")?;

    Ok(Project {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: ProjectStatus::try_from(status.as_str()).map_err(|e| decode_error("status", e))?,
        priority: Priority::try_from(priority.as_str()).map_err(|e| decode_error("priority", e))?,
        progress: row.try_get("progress")?,
        assigned_agents: assigned_agents.0,
        tasks: tasks.0,
        created_by: row.try_get("created_by")?,
        tags: row.try_get("tags")?,
        files: files.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn agent_from_row(row: &PgRow) -> Result<Agent> {
    let agent_type: String = row.try_get("agent_type")?;
    let status: String = row.try_get("status")?;
    let performance: Json<Performance> = row.try_get("performance")?;

    Ok(Agent {
        id: row.try_get("id")?,
        agent_id: row.try_get("agent_id")?,
        name: row.try_get("name")?,
        agent_type: AgentType::try_from(agent_type.as_str())
            .map_err(|e| decode_error("agent_type", e))?,
        status: AgentStatus::try_from(status.as_str()).map_err(|e| decode_error("status", e))?,
        port: row.try_get("port")?,
        endpoint: row.try_get("endpoint")?,
        current_project: row.try_get("current_project")?,
        capabilities: row.try_get("capabilities")?,
        last_seen: row.try_get("last_seen")?,
        performance: performance.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Turn a unique-key violation on agents.agent_id into a Conflict
fn agent_insert_error(err: sqlx::Error, agent_id: &str) -> DeckError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some("23505") {
            return DeckError::Conflict(format!(
                "Agent with agentId '{}' already exists",
                agent_id
            ));
        }
    }
    DeckError::Database(err)
}

fn counts_with_zeroes<'a>(
    statuses: impl Iterator<Item = &'a str>,
    rows: Vec<PgRow>,
) -> Result<StatusCounts> {
    let mut counts: StatusCounts = statuses.map(|s| (s.to_string(), 0)).collect();
    for row in rows {
        let status: String = row.try_get("status")?;
        let count: i64 = row.try_get("count")?;
        counts.insert(status, count);
    }
    Ok(counts)
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== Projects ====================

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(project_from_row).collect()
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn insert_project(&self, draft: ProjectDraft) -> Result<Project> {
        let project = Project::from_draft(Uuid::new_v4(), draft, Utc::now());

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO projects (id, name, description, status, priority, progress,
                                  assigned_agents, tasks, created_by, tags, files,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.priority.as_str())
        .bind(project.progress)
        .bind(Json(&project.assigned_agents))
        .bind(Json(&project.tasks))
        .bind(&project.created_by)
        .bind(&project.tags)
        .bind(Json(&project.files))
        .bind(project.created_at)
        .fetch_one(&self.pool)
        .await?;

        project_from_row(&row)
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(project_from_row).transpose()
    }

    #[instrument(skip(self, draft))]
    async fn replace_project(&self, id: Uuid, draft: ProjectDraft) -> Result<Option<Project>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE projects SET
                name = $2,
                description = $3,
                status = $4,
                priority = $5,
                progress = $6,
                assigned_agents = $7,
                tasks = $8,
                created_by = $9,
                tags = $10,
                files = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.status.as_str())
        .bind(draft.priority.as_str())
        .bind(draft.progress)
        .bind(Json(&draft.assigned_agents))
        .bind(Json(&draft.tasks))
        .bind(&draft.created_by)
        .bind(&draft.tags)
        .bind(Json(&draft.files))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(project_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_project(&self, id: Uuid) -> Result<Option<Project>> {
        let row = sqlx::query(&format!(
            "DELETE FROM projects WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(project_from_row).transpose()
    }

    async fn project_status_counts(&self) -> Result<StatusCounts> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*)::BIGINT AS count FROM projects GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        counts_with_zeroes(ProjectStatus::ALL.iter().map(|s| s.as_str()), rows)
    }

    // ==================== Agents ====================

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        let rows = sqlx::query(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents ORDER BY agent_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(agent_from_row).collect()
    }

    #[instrument(skip(self, draft), fields(agent_id = %draft.agent_id))]
    async fn insert_agent(&self, draft: AgentDraft) -> Result<Agent> {
        let agent = Agent::from_draft(Uuid::new_v4(), draft, Utc::now());

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO agents (id, agent_id, name, agent_type, status, port, endpoint,
                                current_project, capabilities, last_seen, performance,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $10, $10)
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(agent.id)
        .bind(&agent.agent_id)
        .bind(&agent.name)
        .bind(agent.agent_type.as_str())
        .bind(agent.status.as_str())
        .bind(agent.port)
        .bind(&agent.endpoint)
        .bind(&agent.current_project)
        .bind(&agent.capabilities)
        .bind(agent.last_seen)
        .bind(Json(&agent.performance))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| agent_insert_error(e, &agent.agent_id))?;

        agent_from_row(&row)
    }

    async fn insert_agents(&self, drafts: Vec<AgentDraft>) -> Result<usize> {
        if drafts.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for draft in drafts.iter().cloned() {
            let agent = Agent::from_draft(Uuid::new_v4(), draft, now);
            sqlx::query(
                r#"
                INSERT INTO agents (id, agent_id, name, agent_type, status, port, endpoint,
                                    current_project, capabilities, last_seen, performance,
                                    created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $10, $10)
                "#,
            )
            .bind(agent.id)
            .bind(&agent.agent_id)
            .bind(&agent.name)
            .bind(agent.agent_type.as_str())
            .bind(agent.status.as_str())
            .bind(agent.port)
            .bind(&agent.endpoint)
            .bind(&agent.current_project)
            .bind(&agent.capabilities)
            .bind(agent.last_seen)
            .bind(Json(&agent.performance))
            .execute(&mut *tx)
            .await
            .map_err(|e| agent_insert_error(e, &agent.agent_id))?;
        }

        tx.commit().await?;
        debug!("Inserted {} agents", drafts.len());
        Ok(drafts.len())
    }

    #[instrument(skip(self, patch))]
    async fn update_agent(&self, id: Uuid, patch: AgentPatch) -> Result<Option<Agent>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut agent = agent_from_row(&row)?;
        agent.apply_patch(patch, Utc::now());

        let row = sqlx::query(&format!(
            r#"
            UPDATE agents SET
                name = $2,
                agent_type = $3,
                status = $4,
                port = $5,
                endpoint = $6,
                current_project = $7,
                capabilities = $8,
                performance = $9,
                last_seen = $10,
                updated_at = $10
            WHERE id = $1
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(agent.id)
        .bind(&agent.name)
        .bind(agent.agent_type.as_str())
        .bind(agent.status.as_str())
        .bind(agent.port)
        .bind(&agent.endpoint)
        .bind(&agent.current_project)
        .bind(&agent.capabilities)
        .bind(Json(&agent.performance))
        .bind(agent.last_seen)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        agent_from_row(&row).map(Some)
    }

    #[instrument(skip(self))]
    async fn delete_agent(&self, id: Uuid) -> Result<Option<Agent>> {
        let row = sqlx::query(&format!(
            "DELETE FROM agents WHERE id = $1 RETURNING {AGENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn upsert_agent_status(&self, ping: &AgentStatusPing) -> Result<Agent> {
        let placeholder = Agent::from_ping(ping, Utc::now());

        // Single statement, so concurrent pings resolve to last write wins.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO agents (id, agent_id, name, agent_type, status, current_project,
                                capabilities, last_seen, performance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), $8, NOW(), NOW())
            ON CONFLICT (agent_id) DO UPDATE SET
                status = EXCLUDED.status,
                current_project = COALESCE(EXCLUDED.current_project, agents.current_project),
                last_seen = EXCLUDED.last_seen,
                updated_at = EXCLUDED.updated_at
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(placeholder.id)
        .bind(&placeholder.agent_id)
        .bind(&placeholder.name)
        .bind(placeholder.agent_type.as_str())
        .bind(placeholder.status.as_str())
        .bind(&placeholder.current_project)
        .bind(&placeholder.capabilities)
        .bind(Json(&placeholder.performance))
        .fetch_one(&self.pool)
        .await?;

        agent_from_row(&row)
    }

    async fn count_agents(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*)::BIGINT FROM agents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn agent_status_counts(&self) -> Result<StatusCounts> {
        let rows =
            sqlx::query("SELECT status, COUNT(*)::BIGINT AS count FROM agents GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        counts_with_zeroes(AgentStatus::ALL.iter().map(|s| s.as_str()), rows)
    }
}
