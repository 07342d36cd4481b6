//! bedrock-demo: a small service built on bedrock.
//!
//! Routes:
//! - `GET  /hello`      greeting
//! - `GET  /error`      always 500
//! - `POST /user`       echo a JSON user back with 201
//! - `POST /uploadFile` store the multipart `document` field under `uploads/`
//! - `POST /login`      check a password, issue a token
//! - `GET  /me`         bearer-protected, returns the token subject
//! - `GET  /users/{id}` path and query parameters

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json as json_value;
use tokio::sync::RwLock;

use bedrock::config::{ConfigError, EnvOverrides, Overlay};
use bedrock::observability::logging;
use bedrock::{
    decode_json, error, hash_password, issue_token, json, parse_multipart_form, query_param,
    require_auth, verify_password, App, BaseConfig, Context, Handler, Loader, Request, Response,
    Route,
};

const DEMO_USER: &str = "demo";
const DEMO_PASSWORD: &str = "demo-password";
const UPLOAD_DIR: &str = "uploads";

#[derive(Parser)]
#[command(name = "bedrock-demo")]
#[command(about = "Example service built on bedrock", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    bedrock: BaseConfig,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl EnvOverrides for DemoConfig {
    fn apply_env(&mut self, env: &Overlay<'_>) -> Result<(), ConfigError> {
        env.nested(&mut self.bedrock)?;
        env.field("jwt_secret", "JWT_SECRET", &mut self.jwt_secret)?;
        env.field("token_ttl_hours", "TOKEN_TTL_HOURS", &mut self.token_ttl_hours)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct User {
    firstname: String,
    lastname: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

struct DemoApp {
    secret: Arc<str>,
    token_ttl: chrono::Duration,
    /// username → bcrypt hash
    users: Arc<RwLock<HashMap<String, String>>>,
}

#[async_trait]
impl App for DemoApp {
    async fn on_start(&self) -> anyhow::Result<()> {
        let hash = tokio::task::spawn_blocking(|| hash_password(DEMO_PASSWORD)).await??;
        self.users.write().await.insert(DEMO_USER.to_string(), hash);
        tracing::info!(user = DEMO_USER, "Demo user provisioned");
        Ok(())
    }

    async fn on_stop(&self) -> anyhow::Result<()> {
        tracing::info!("Demo app stopped");
        Ok(())
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route::get("/hello", Handler::new(hello)),
            Route::get("/error", Handler::new(fail)),
            Route::post("/user", Handler::new(create_user)),
            Route::post("/uploadFile", Handler::new(upload_document)),
            Route::post("/login", self.login_handler()),
            Route::get("/me", Handler::new(me)).with_middleware(require_auth(&*self.secret)),
            Route::get("/users/{id}", Handler::new(get_user)),
        ]
    }
}

impl DemoApp {
    fn login_handler(&self) -> Handler {
        let secret = self.secret.clone();
        let ttl = self.token_ttl;
        let users = self.users.clone();
        Handler::new(move |_ctx: Context, request: Request| {
            let secret = secret.clone();
            let users = users.clone();
            async move {
                let Ok(credentials) = decode_json::<Credentials>(request).await else {
                    return json(StatusCode::BAD_REQUEST, json_value!({ "error": "Invalid JSON" }));
                };

                let unauthorized =
                    || json(StatusCode::UNAUTHORIZED, json_value!({ "error": "invalid credentials" }));

                let Credentials { username, password } = credentials;
                let Some(hash) = users.read().await.get(&username).cloned() else {
                    return unauthorized();
                };
                let verified =
                    tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await;
                if !matches!(verified, Ok(Ok(()))) {
                    return unauthorized();
                }

                match issue_token(&username, &secret, ttl) {
                    Ok(token) => json(StatusCode::OK, json_value!({ "token": token })),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to issue token");
                        error(json_value!({ "error": "could not issue token" }))
                    }
                }
            }
        })
    }
}

async fn hello(_ctx: Context, _request: Request) -> impl Response {
    json(StatusCode::OK, json_value!({ "message": "Hello!" }))
}

async fn fail(_ctx: Context, _request: Request) -> impl Response {
    error("Something went wrong")
}

async fn create_user(_ctx: Context, request: Request) -> impl Response {
    match decode_json::<User>(request).await {
        Ok(user) => json(StatusCode::CREATED, json_value!(user)),
        Err(_) => json(StatusCode::BAD_REQUEST, json_value!("Invalid JSON")),
    }
}

async fn upload_document(_ctx: Context, request: Request) -> impl Response {
    let Ok(form) = parse_multipart_form(request, 0).await else {
        return json(StatusCode::BAD_REQUEST, json_value!("Failed to parse form"));
    };
    let Ok(file) = form.file("document") else {
        return json(StatusCode::BAD_REQUEST, json_value!("No file uploaded"));
    };
    // Keep only the final component so a crafted name cannot escape the directory.
    let Some(name) = Path::new(&file.filename).file_name() else {
        return json(StatusCode::BAD_REQUEST, json_value!("Invalid filename"));
    };

    let dest = Path::new(UPLOAD_DIR).join(name);
    if let Err(e) = tokio::fs::create_dir_all(UPLOAD_DIR).await {
        tracing::error!(error = %e, "Failed to create upload directory");
        return json(StatusCode::INTERNAL_SERVER_ERROR, json_value!("Failed to create file"));
    }
    if let Err(e) = tokio::fs::write(&dest, &file.bytes).await {
        tracing::error!(error = %e, path = %dest.display(), "Failed to save upload");
        return json(StatusCode::INTERNAL_SERVER_ERROR, json_value!("Failed to save file"));
    }

    json(
        StatusCode::OK,
        json_value!({
            "filename": file.filename,
            "path": dest.display().to_string(),
        }),
    )
}

async fn me(ctx: Context, _request: Request) -> impl Response {
    json(StatusCode::OK, json_value!({ "user_id": ctx.user_id() }))
}

async fn get_user(ctx: Context, request: Request) -> impl Response {
    json(
        StatusCode::OK,
        json_value!({
            "id": ctx.path_param("id"),
            "fields": query_param(&request, "fields"),
        }),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config: DemoConfig = Loader::new(&cli.config).load()?;
    logging::init(&config.bedrock.log_level, &config.bedrock.environment);

    tracing::info!(
        config = %cli.config.display(),
        http_port = config.bedrock.http_port,
        health_port = config.bedrock.health_port,
        "Configuration loaded"
    );

    let secret = if config.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET not set, using an insecure development secret");
        "insecure-development-secret".to_string()
    } else {
        config.jwt_secret
    };
    let ttl_hours = if config.token_ttl_hours > 0 {
        config.token_ttl_hours
    } else {
        24
    };

    let app = DemoApp {
        secret: secret.into(),
        token_ttl: chrono::Duration::hours(ttl_hours),
        users: Arc::default(),
    };

    bedrock::run(app, config.bedrock).await?;
    Ok(())
}
