//! A small task API served through stepflow pipelines.
//!
//! ```text
//! cargo run --example task_api
//! curl -i -X POST localhost:3000/api/auth/register \
//!   -H 'content-type: application/json' \
//!   -d '{"email":"ada@example.com","password":"secret1","name":"Ada"}'
//! ```
//!
//! Environment: `PORT` (default 3000), `APP_ENV`, `JWT_SECRET`,
//! `JWT_EXPIRES_IN_SECS`, `LOG_FORMAT` (`plain` or `json`) and `RUST_LOG`.

use anyhow::Context as _;
use axum::Router;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use stepflow::http;
use stepflow::prelude::*;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Task {
    id: Uuid,
    user_id: String,
    title: String,
    description: Option<String>,
    priority: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NewTask {
    title: String,
    description: Option<String>,
    priority: String,
}

#[derive(Debug, Deserialize)]
struct TaskChanges {
    title: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    completed: Option<bool>,
}

#[derive(Debug, Clone)]
struct User {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

/// Hashes and checks passwords for the user table.
trait PasswordHasher: fmt::Debug + Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Salted SHA-256, stored as `salt$digest`.
///
/// A fast digest is not a credential store; put a slow KDF such as argon2
/// behind [`PasswordHasher`] before keeping real accounts.
#[derive(Debug, Default)]
struct SaltedSha256;

impl SaltedSha256 {
    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl PasswordHasher for SaltedSha256 {
    fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        format!("{salt}${}", Self::digest(&salt, password))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        stored
            .split_once('$')
            .is_some_and(|(salt, digest)| Self::digest(salt, password) == digest)
    }
}

/// In-memory tables; everything is lost on restart.
#[derive(Debug, Default)]
struct Store {
    tasks: DashMap<Uuid, Task>,
    users: DashMap<String, User>,
}

impl Store {
    fn tasks_of(&self, user_id: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        tasks
    }

    fn owned_task(&self, id: &str, user_id: &str) -> Option<Task> {
        let id = Uuid::parse_str(id).ok()?;
        self.tasks
            .get(&id)
            .filter(|task| task.user_id == user_id)
            .map(|task| task.value().clone())
    }
}

#[derive(Debug, Clone)]
struct App {
    store: Arc<Store>,
    tokens: Arc<TokenService>,
    passwords: Arc<dyn PasswordHasher>,
    mode: ExecutionMode,
}

impl App {
    fn pipeline(&self, name: &str) -> PipelineBuilder {
        Pipeline::builder(name).mode(self.mode).enable_logging(true)
    }

    fn authenticated(&self, name: &str, mode: AuthMode) -> PipelineBuilder {
        self.pipeline(name).step(authenticate(Arc::clone(&self.tokens), mode))
    }
}

fn priority_rule() -> FieldRule {
    FieldRule::string().one_of(["low", "medium", "high"])
}

fn user_id(claims: &Value) -> anyhow::Result<String> {
    claims["userId"]
        .as_str()
        .map(str::to_string)
        .context("claims without a user id")
}

fn task_id(ctx: &RequestContext) -> String {
    ctx.param("id").unwrap_or_default().to_string()
}

fn auth_routes(app: &App) -> anyhow::Result<Router> {
    let register = {
        let app = app.clone();
        app.pipeline("register")
            .body_schema(
                ObjectSchema::new()
                    .field("email", FieldRule::email())
                    .field("password", FieldRule::string().min_len(6))
                    .field("name", FieldRule::string().min_len(1)),
            )
            .step_fn("create-user", move |_data, ctx| {
                let app = app.clone();
                async move {
                    let body = ctx.body();
                    let email = body["email"].as_str().unwrap_or_default().to_lowercase();
                    if app.store.users.contains_key(&email) {
                        return Ok(Outcome::err("Email already registered", 409));
                    }
                    let user = User {
                        id: Uuid::new_v4().to_string(),
                        email: email.clone(),
                        name: body["name"].as_str().unwrap_or_default().to_string(),
                        password_hash: app
                            .passwords
                            .hash(body["password"].as_str().unwrap_or_default()),
                        role: "user".to_string(),
                    };
                    let claims = app.tokens.claims_for(&user.id, &user.email, &user.role);
                    let token = app.tokens.issue(&claims)?;
                    let data = json!({"user": {"id": user.id, "email": user.email, "name": user.name}});
                    app.store.users.insert(email, user);
                    Ok(Outcome::ok_with(data, app.tokens.session_cookie(token), 201))
                }
            })
            .build()?
    };

    let login = {
        let app = app.clone();
        app.pipeline("login")
            .body_schema(
                ObjectSchema::new()
                    .field("email", FieldRule::email())
                    .field("password", FieldRule::string()),
            )
            .step_fn("check-credentials", move |_data, ctx| {
                let app = app.clone();
                async move {
                    let credentials: Credentials = ctx.body_as()?;
                    let user = app
                        .store
                        .users
                        .get(&credentials.email.to_lowercase())
                        .map(|user| user.value().clone())
                        .filter(|user| app.passwords.verify(&credentials.password, &user.password_hash));
                    let Some(user) = user else {
                        return Ok(Outcome::unauthorized("Invalid email or password"));
                    };
                    let token = app.tokens.issue(&app.tokens.claims_for(&user.id, &user.email, &user.role))?;
                    Ok(Outcome::ok_with_metadata(
                        json!({"user": {"id": user.id, "email": user.email, "name": user.name}}),
                        app.tokens.session_cookie(token),
                    ))
                }
            })
            .build()?
    };

    let logout = {
        let tokens = Arc::clone(&app.tokens);
        app.pipeline("logout")
            .step_fn("clear-session", move |_data, ctx: RequestContext| {
                let tokens = Arc::clone(&tokens);
                async move {
                    let target = if ctx.header("accept").is_some_and(|a| a.contains("text/html")) {
                        json!({"redirect": "/login"})
                    } else {
                        json!({"message": "Logged out"})
                    };
                    Ok(Outcome::ok_with_metadata(target, tokens.clear_session_cookie()))
                }
            })
            .build()?
    };

    Ok(Router::new()
        .route("/api/auth/register", http::post(register))
        .route("/api/auth/login", http::post(login))
        .route("/api/auth/logout", http::post(logout)))
}

fn task_routes(app: &App) -> anyhow::Result<Router> {
    let list = {
        let store = Arc::clone(&app.store);
        app.authenticated("list-tasks", AuthMode::Api)
            .step_fn("list", move |claims, _ctx| {
                let store = Arc::clone(&store);
                async move { Ok(Outcome::ok(json!(store.tasks_of(&user_id(&claims)?)))) }
            })
            .build()?
    };

    let create = {
        let store = Arc::clone(&app.store);
        app.authenticated("create-task", AuthMode::Api)
            .body_schema(
                ObjectSchema::new()
                    .field("title", FieldRule::string().min_len(1).max_len(200))
                    .field("description", FieldRule::string().max_len(2000).optional())
                    .field("priority", priority_rule().with_default(json!("medium"))),
            )
            .success_status(201)
            .step_fn("create", move |claims, ctx: RequestContext| {
                let store = Arc::clone(&store);
                async move {
                    let input: NewTask = ctx.body_as()?;
                    let now = Utc::now();
                    let task = Task {
                        id: Uuid::new_v4(),
                        user_id: user_id(&claims)?,
                        title: input.title,
                        description: input.description,
                        priority: input.priority,
                        completed: false,
                        created_at: now,
                        updated_at: now,
                    };
                    store.tasks.insert(task.id, task.clone());
                    Ok(Outcome::ok(json!(task)))
                }
            })
            .build()?
    };

    let show = {
        let store = Arc::clone(&app.store);
        app.authenticated("get-task", AuthMode::Api)
            .step_fn("find", move |claims, ctx: RequestContext| {
                let store = Arc::clone(&store);
                async move {
                    Ok(match store.owned_task(&task_id(&ctx), &user_id(&claims)?) {
                        Some(task) => Outcome::ok(json!(task)),
                        None => Outcome::not_found("Task not found"),
                    })
                }
            })
            .build()?
    };

    let update = {
        let store = Arc::clone(&app.store);
        app.authenticated("update-task", AuthMode::Api)
            .body_schema(
                ObjectSchema::new()
                    .field("title", FieldRule::string().min_len(1).max_len(200).optional())
                    .field("description", FieldRule::string().max_len(2000).optional())
                    .field("priority", priority_rule().optional())
                    .field("completed", FieldRule::boolean().optional()),
            )
            .step_fn("update", move |claims, ctx: RequestContext| {
                let store = Arc::clone(&store);
                async move {
                    let changes: TaskChanges = ctx.body_as()?;
                    let Some(mut task) = store.owned_task(&task_id(&ctx), &user_id(&claims)?) else {
                        return Ok(Outcome::not_found("Task not found"));
                    };
                    if let Some(title) = changes.title {
                        task.title = title;
                    }
                    if changes.description.is_some() {
                        task.description = changes.description;
                    }
                    if let Some(priority) = changes.priority {
                        task.priority = priority;
                    }
                    if let Some(completed) = changes.completed {
                        task.completed = completed;
                    }
                    task.updated_at = Utc::now();
                    store.tasks.insert(task.id, task.clone());
                    Ok(Outcome::ok(json!(task)))
                }
            })
            .build()?
    };

    let toggle = {
        let store = Arc::clone(&app.store);
        app.authenticated("toggle-task", AuthMode::Api)
            .step_fn("toggle", move |claims, ctx: RequestContext| {
                let store = Arc::clone(&store);
                async move {
                    let Some(mut task) = store.owned_task(&task_id(&ctx), &user_id(&claims)?) else {
                        return Ok(Outcome::not_found("Task not found"));
                    };
                    task.completed = !task.completed;
                    task.updated_at = Utc::now();
                    store.tasks.insert(task.id, task.clone());
                    Ok(Outcome::ok(json!(task)))
                }
            })
            .build()?
    };

    let remove = {
        let store = Arc::clone(&app.store);
        app.authenticated("delete-task", AuthMode::Api)
            .step_fn("delete", move |claims, ctx: RequestContext| {
                let store = Arc::clone(&store);
                async move {
                    let Some(task) = store.owned_task(&task_id(&ctx), &user_id(&claims)?) else {
                        return Ok(Outcome::not_found("Task not found"));
                    };
                    store.tasks.remove(&task.id);
                    Ok(Outcome::ok(json!({"message": "Task deleted successfully"})))
                }
            })
            .build()?
    };

    Ok(Router::new()
        .route("/api/tasks", http::get(list).merge(http::post(create)))
        .route(
            "/api/tasks/:id",
            http::get(show)
                .merge(http::put(update))
                .merge(http::delete(remove)),
        )
        .route("/api/tasks/:id/toggle", http::patch(toggle)))
}

fn web_routes(app: &App) -> anyhow::Result<Router> {
    let dashboard = {
        let store = Arc::clone(&app.store);
        app.authenticated("dashboard", AuthMode::Web)
            .renderer(Arc::new(JsonTemplateRenderer))
            .step_fn("dashboard", move |claims, _ctx| {
                let store = Arc::clone(&store);
                async move {
                    let tasks = store.tasks_of(&user_id(&claims)?);
                    let completed = tasks.iter().filter(|t| t.completed).count();
                    let high_priority = tasks
                        .iter()
                        .filter(|t| t.priority == "high" && !t.completed)
                        .count();
                    Ok(Outcome::ok(json!({
                        "view": "dashboard",
                        "data": {
                            "user": claims,
                            "tasks": tasks,
                            "stats": {
                                "total": tasks.len(),
                                "completed": completed,
                                "pending": tasks.len() - completed,
                                "highPriority": high_priority,
                            },
                        },
                    })))
                }
            })
            .build()?
    };

    let health = app
        .pipeline("health")
        .enable_logging(false)
        .step_fn("health", |_data, _ctx| async move {
            Ok(Outcome::ok(json!({"status": "ok", "timestamp": iso_timestamp()})))
        })
        .build()?;

    Ok(Router::new()
        .route("/dashboard", http::get(dashboard))
        .route("/health", http::get(health)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = std::env::var("LOG_FORMAT")
        .ok()
        .map(|raw| raw.parse::<LogFormat>())
        .transpose()?
        .unwrap_or_default();
    init_tracing(format)?;

    let app = App {
        store: Arc::new(Store::default()),
        tokens: Arc::new(TokenService::new(TokenConfig::from_env()?)),
        passwords: Arc::new(SaltedSha256),
        mode: ExecutionMode::from_env(),
    };

    let router = Router::new()
        .merge(auth_routes(&app)?)
        .merge(task_routes(&app)?)
        .merge(web_routes(&app)?);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    info!(port, mode = %app.mode, "Task API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_salted_and_verifies() {
        let hasher = SaltedSha256;
        let first = hasher.hash("secret1");
        let second = hasher.hash("secret1");

        assert_ne!(first, second);
        assert!(!first.contains("secret1"));
        assert!(hasher.verify("secret1", &first));
        assert!(hasher.verify("secret1", &second));
        assert!(!hasher.verify("secret2", &first));
        assert!(!hasher.verify("secret1", "not-a-hash"));
    }
}
