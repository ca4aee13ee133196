//! Shared fixtures: a scripted command runner, a fixed verifier and an in-memory app

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Notify;
use tower::ServiceExt;

use xistra::app::options::{AuthOptions, DeployOptions};
use xistra::app::state::AppState;
use xistra::db::Db;
use xistra::deploy::cmd::{CommandOutput, CommandRunner, CommandSpec};
use xistra::errors::AppError;
use xistra::server::serve::router;
use xistra::verify::{DomainVerifier, Verification};

pub const CONTAINER_ID: &str = "c0ffee";

struct Rule {
    program: String,
    args: Vec<String>,
    output: CommandOutput,
    remaining: Option<usize>,
}

/// Holds one matching command until opened
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Resolves once the held command is parked at the gate
    pub async fn reached(&self) {
        self.entered.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }
}

struct Hold {
    program: String,
    args: Vec<String>,
    gate: Arc<Gate>,
}

/// Records every command and answers from a list of rules; unmatched commands succeed
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<CommandSpec>>,
    rules: Mutex<Vec<Rule>>,
    holds: Mutex<Vec<Hold>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answers for a working docker engine and git
    pub fn healthy() -> Arc<Self> {
        let runner = Self::new();
        runner.on("docker", &["run"], CommandOutput::ok(&format!("{}\n", CONTAINER_ID)));
        runner.on("docker", &["port"], CommandOutput::ok("0.0.0.0:49153\n[::]:49153\n"));
        runner.on("git", &["-C"], CommandOutput::ok("abc123\nInitial commit\n"));
        runner
    }

    /// Later rules take precedence
    pub fn on(&self, program: &str, args: &[&str], output: CommandOutput) {
        self.push(program, args, output, None);
    }

    /// Like `on`, but only for the next matching command
    pub fn once(&self, program: &str, args: &[&str], output: CommandOutput) {
        self.push(program, args, output, Some(1));
    }

    fn push(&self, program: &str, args: &[&str], output: CommandOutput, remaining: Option<usize>) {
        self.rules.lock().unwrap().push(Rule {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            output,
            remaining,
        });
    }

    /// Park the next matching command until the returned gate is opened
    pub fn hold(&self, program: &str, args: &[&str]) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.holds.lock().unwrap().push(Hold {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            gate: gate.clone(),
        });
        gate
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Every recorded command as `program arg1 arg2`
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }

    pub fn count(&self, program: &str, args: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(program, args))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, AppError> {
        self.calls.lock().unwrap().push(spec.clone());

        let held = {
            let mut holds = self.holds.lock().unwrap();
            let at = holds.iter().position(|hold| {
                let args: Vec<&str> = hold.args.iter().map(String::as_str).collect();
                spec.starts_with(&hold.program, &args)
            });
            at.map(|i| holds.remove(i).gate)
        };
        if let Some(gate) = held {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let mut rules = self.rules.lock().unwrap();
        let matched = rules.iter_mut().rev().find(|rule| {
            let args: Vec<&str> = rule.args.iter().map(String::as_str).collect();
            spec.starts_with(&rule.program, &args) && rule.remaining != Some(0)
        });
        Ok(match matched {
            Some(rule) => {
                if let Some(remaining) = rule.remaining.as_mut() {
                    *remaining -= 1;
                }
                rule.output.clone()
            }
            None => CommandOutput::ok(""),
        })
    }
}

/// Verifies everything or nothing
pub struct StaticVerifier(pub bool);

#[async_trait]
impl DomainVerifier for StaticVerifier {
    async fn verify(&self, domain: &str) -> Verification {
        Verification {
            verified: self.0,
            records: json!({ "A": if self.0 { vec!["203.0.113.7"] } else { vec![] }, "checked": domain }),
        }
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    pub runner: Arc<ScriptedRunner>,
    pub backup_dir: PathBuf,
    pub work_dir: PathBuf,
    _dirs: TempDir,
}

pub async fn test_app() -> TestApp {
    test_app_with(ScriptedRunner::healthy(), true, AuthOptions::disabled()).await
}

pub async fn test_app_with(
    runner: Arc<ScriptedRunner>,
    verified: bool,
    auth: AuthOptions,
) -> TestApp {
    let dirs = tempfile::tempdir().unwrap();
    let work_dir = dirs.path().join("work");
    let backup_dir = dirs.path().join("backups");
    std::fs::create_dir_all(&work_dir).unwrap();

    let db = Db::in_memory().await.unwrap();
    let deploy = DeployOptions {
        work_dir: work_dir.clone(),
        ..DeployOptions::default()
    };
    let state = AppState::build(
        db,
        runner.clone(),
        Arc::new(StaticVerifier(verified)),
        &deploy,
        auth,
        backup_dir.clone(),
    )
    .await
    .unwrap();
    let state = Arc::new(state);

    TestApp {
        router: router(state.clone(), 64),
        state,
        runner,
        backup_dir,
        work_dir,
        _dirs: dirs,
    }
}

impl TestApp {
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request_with_token(method, uri, body, None).await
    }

    pub async fn request_with_token(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Create a project through the API and return its id
    pub async fn create_project(&self, name: &str) -> String {
        let (status, body) = self
            .request("POST", "/projects", Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
