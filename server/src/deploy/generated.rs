//! Generated-Dockerfile strategy: sniff project markers and write a Dockerfile

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::info;

use crate::deploy::deployer::{DeployOutcome, DeployStrategy, DeployTarget, StrategyError};
use crate::deploy::docker::DockerEngine;
use crate::filesys::file::File;
use crate::models::project::DeployType;

/// File name of the Dockerfile written into the checkout
pub const GENERATED_DOCKERFILE: &str = "Dockerfile.xistra";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ProjectKind {
    Node,
    Python,
    Go,
    Rust,
    Ruby,
    Php,
    Static,
    /// Nothing recognised; served as static files
    Generic,
}

struct Marker {
    file: &'static str,
    kind: ProjectKind,
}

/// Checked in order; the first marker present wins
const MARKERS: &[Marker] = &[
    Marker { file: "package.json", kind: ProjectKind::Node },
    Marker { file: "requirements.txt", kind: ProjectKind::Python },
    Marker { file: "pyproject.toml", kind: ProjectKind::Python },
    Marker { file: "Pipfile", kind: ProjectKind::Python },
    Marker { file: "go.mod", kind: ProjectKind::Go },
    Marker { file: "Cargo.toml", kind: ProjectKind::Rust },
    Marker { file: "Gemfile", kind: ProjectKind::Ruby },
    Marker { file: "composer.json", kind: ProjectKind::Php },
    Marker { file: "index.html", kind: ProjectKind::Static },
];

pub fn detect_project(repo_dir: &Path) -> ProjectKind {
    MARKERS
        .iter()
        .find(|m| repo_dir.join(m.file).is_file())
        .map_or(ProjectKind::Generic, |m| m.kind)
}

impl ProjectKind {
    pub fn default_port(&self) -> u16 {
        match self {
            ProjectKind::Node | ProjectKind::Ruby => 3000,
            ProjectKind::Python => 8000,
            ProjectKind::Go | ProjectKind::Rust => 8080,
            ProjectKind::Php | ProjectKind::Static | ProjectKind::Generic => 80,
        }
    }

    /// Render a Dockerfile for the checkout at `repo_dir`
    pub fn dockerfile(&self, repo_dir: &Path) -> String {
        let port = self.default_port();
        match self {
            ProjectKind::Node => node_dockerfile(repo_dir, port),
            ProjectKind::Python => python_dockerfile(repo_dir, port),
            ProjectKind::Go => format!(
                "FROM golang:1.22-alpine AS build\n\
                 WORKDIR /src\n\
                 COPY . .\n\
                 RUN go build -o /out/app .\n\
                 FROM alpine:3.20\n\
                 COPY --from=build /out/app /usr/local/bin/app\n\
                 ENV PORT={port}\n\
                 EXPOSE {port}\n\
                 CMD [\"app\"]\n"
            ),
            ProjectKind::Rust => {
                let bin = cargo_package_name(repo_dir).unwrap_or_else(|| "app".to_string());
                format!(
                    "FROM rust:1 AS build\n\
                     WORKDIR /src\n\
                     COPY . .\n\
                     RUN cargo build --release\n\
                     FROM debian:bookworm-slim\n\
                     COPY --from=build /src/target/release/{bin} /usr/local/bin/app\n\
                     ENV PORT={port}\n\
                     EXPOSE {port}\n\
                     CMD [\"app\"]\n"
                )
            }
            ProjectKind::Ruby => format!(
                "FROM ruby:3.3\n\
                 WORKDIR /app\n\
                 COPY . .\n\
                 RUN bundle install\n\
                 ENV PORT={port}\n\
                 EXPOSE {port}\n\
                 CMD [\"bundle\", \"exec\", \"rackup\", \"-o\", \"0.0.0.0\", \"-p\", \"{port}\"]\n"
            ),
            ProjectKind::Php => format!(
                "FROM php:8.3-apache\n\
                 COPY . /var/www/html/\n\
                 EXPOSE {port}\n"
            ),
            ProjectKind::Static | ProjectKind::Generic => format!(
                "FROM nginx:alpine\n\
                 COPY . /usr/share/nginx/html\n\
                 EXPOSE {port}\n"
            ),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    scripts: std::collections::HashMap<String, String>,
}

fn node_dockerfile(repo_dir: &Path, port: u16) -> String {
    let package: PackageJson = std::fs::read_to_string(repo_dir.join("package.json"))
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();

    let install = if repo_dir.join("package-lock.json").is_file() {
        "npm ci"
    } else {
        "npm install"
    };
    let build = if package.scripts.contains_key("build") {
        "RUN npm run build\n"
    } else {
        ""
    };
    let cmd = if package.scripts.contains_key("start") {
        "[\"npm\", \"start\"]".to_string()
    } else {
        let main = package.main.as_deref().unwrap_or("index.js");
        format!("[\"node\", \"{}\"]", main)
    };

    format!(
        "FROM node:20-alpine\n\
         WORKDIR /app\n\
         COPY package*.json ./\n\
         RUN {install}\n\
         COPY . .\n\
         {build}\
         ENV PORT={port}\n\
         EXPOSE {port}\n\
         CMD {cmd}\n"
    )
}

fn python_dockerfile(repo_dir: &Path, port: u16) -> String {
    let install = if repo_dir.join("requirements.txt").is_file() {
        "RUN pip install --no-cache-dir -r requirements.txt\n"
    } else if repo_dir.join("pyproject.toml").is_file() {
        "RUN pip install --no-cache-dir .\n"
    } else {
        "RUN pip install --no-cache-dir pipenv && pipenv install --system --deploy\n"
    };
    let cmd = if repo_dir.join("manage.py").is_file() {
        format!("[\"python\", \"manage.py\", \"runserver\", \"0.0.0.0:{port}\"]")
    } else if repo_dir.join("app.py").is_file() {
        "[\"python\", \"app.py\"]".to_string()
    } else {
        "[\"python\", \"main.py\"]".to_string()
    };

    format!(
        "FROM python:3.12-slim\n\
         WORKDIR /app\n\
         COPY . .\n\
         {install}\
         ENV PORT={port}\n\
         EXPOSE {port}\n\
         CMD {cmd}\n"
    )
}

#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: String,
}

fn cargo_package_name(repo_dir: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(repo_dir.join("Cargo.toml")).ok()?;
    let manifest: CargoManifest = toml::from_str(&contents).ok()?;
    manifest.package.map(|p| p.name)
}

/// Writes a Dockerfile for the detected project kind, then builds and runs it
pub struct GeneratedStrategy {
    engine: Arc<DockerEngine>,
}

impl GeneratedStrategy {
    pub fn new(engine: Arc<DockerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl DeployStrategy for GeneratedStrategy {
    fn method(&self) -> DeployType {
        DeployType::Generated
    }

    fn applies(&self, _repo_dir: &Path) -> bool {
        true
    }

    async fn deploy(
        &self,
        repo_dir: &Path,
        target: &DeployTarget,
    ) -> Result<DeployOutcome, StrategyError> {
        let kind = detect_project(repo_dir);
        info!("Generating Dockerfile for {} ({})", target.name, kind);

        let dockerfile = File::new(repo_dir.join(GENERATED_DOCKERFILE));
        dockerfile.write_string(&kind.dockerfile(repo_dir)).await?;

        let mut outcome = self
            .engine
            .ship(
                DeployType::Generated,
                repo_dir,
                dockerfile.path(),
                target,
                Some(kind.default_port()),
            )
            .await?;
        outcome.runtime = Some(kind.to_string());
        Ok(outcome)
    }
}
