//! Built-in catalogue of one-click application templates

use openapi_server::models::AppTemplate;

struct Entry {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
    repository_url: &'static str,
    framework: &'static str,
    default_port: u16,
}

const CATALOGUE: &[Entry] = &[
    Entry {
        id: "uptime-kuma",
        name: "Uptime Kuma",
        description: "Self-hosted monitoring tool",
        category: "monitoring",
        repository_url: "https://github.com/louislam/uptime-kuma",
        framework: "node",
        default_port: 3001,
    },
    Entry {
        id: "n8n",
        name: "n8n",
        description: "Workflow automation platform",
        category: "automation",
        repository_url: "https://github.com/n8n-io/n8n",
        framework: "node",
        default_port: 5678,
    },
    Entry {
        id: "ghost",
        name: "Ghost",
        description: "Publishing platform for blogs and newsletters",
        category: "cms",
        repository_url: "https://github.com/TryGhost/Ghost",
        framework: "node",
        default_port: 2368,
    },
    Entry {
        id: "wordpress",
        name: "WordPress",
        description: "Content management system",
        category: "cms",
        repository_url: "https://github.com/docker-library/wordpress",
        framework: "php",
        default_port: 80,
    },
    Entry {
        id: "plausible",
        name: "Plausible Analytics",
        description: "Privacy-friendly web analytics",
        category: "analytics",
        repository_url: "https://github.com/plausible/community-edition",
        framework: "docker-compose",
        default_port: 8000,
    },
    Entry {
        id: "gitea",
        name: "Gitea",
        description: "Lightweight self-hosted Git service",
        category: "development",
        repository_url: "https://github.com/go-gitea/gitea",
        framework: "go",
        default_port: 3000,
    },
    Entry {
        id: "static-site",
        name: "Static Site",
        description: "Plain HTML served by nginx",
        category: "web",
        repository_url: "https://github.com/cloudacademy/static-website-example",
        framework: "static",
        default_port: 80,
    },
];

/// Templates, optionally restricted to one category (case-insensitive)
pub fn catalogue(category: Option<&str>) -> Vec<AppTemplate> {
    CATALOGUE
        .iter()
        .filter(|entry| category.is_none_or(|c| entry.category.eq_ignore_ascii_case(c)))
        .map(|entry| AppTemplate {
            id: entry.id.to_string(),
            name: entry.name.to_string(),
            description: entry.description.to_string(),
            category: entry.category.to_string(),
            repository_url: entry.repository_url.to_string(),
            framework: entry.framework.to_string(),
            default_port: entry.default_port,
        })
        .collect()
}
