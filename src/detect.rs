//! Detector collaborator: descriptive facts about a scanned repository.
//!
//! The pipeline only folds these facts into the architecture and quickstart
//! contexts as plain text. [`ManifestDetector`] covers build manifests,
//! well-known entrypoint names and import-based framework indicators.
//! Route and data-model extraction are separate problems; their result
//! lists are part of the contract but this detector leaves them empty.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scan::{FileRecord, Language, ScanSet};

/// A way to start the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrypoint {
    /// Short tag such as `go-binary` or `docker`.
    pub kind: String,
    /// File path below the root.
    pub path: String,
    /// Command that runs it.
    pub command: String,
    /// Human description.
    pub description: String,
}

/// A framework the code imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    /// Framework name.
    pub name: String,
    /// Language it was found in.
    pub language: Language,
    /// Files that reference it, in discovery order.
    pub files: Vec<String>,
}

/// A build tool with its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTool {
    /// Tool tag: `make`, `npm`, `go`, `cargo`, `pip` or `docker-compose`.
    pub kind: String,
    /// Manifest path below the root.
    pub file: String,
    /// Script or target names.
    pub scripts: Vec<String>,
}

/// An HTTP route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// HTTP method.
    pub method: String,
    /// Route path.
    pub path: String,
    /// Handler name.
    pub handler: String,
    /// Defining file.
    pub file: String,
}

/// A data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Type name.
    pub name: String,
    /// Field names.
    pub fields: Vec<String>,
    /// Defining file.
    pub file: String,
}

/// Everything a detector reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionFacts {
    /// Detected entrypoints.
    pub entrypoints: Vec<Entrypoint>,
    /// Detected frameworks, one per (language, name).
    pub frameworks: Vec<Framework>,
    /// Detected build tools.
    pub build_tools: Vec<BuildTool>,
    /// HTTP routes. May be empty.
    pub endpoints: Vec<Endpoint>,
    /// Data models. May be empty.
    pub models: Vec<Model>,
}

/// Infers [`DetectionFacts`] from a scan. Called once before generation.
pub trait Detector {
    /// Inspects `scan`.
    fn detect(&self, scan: &ScanSet) -> DetectionFacts;
}

/// Detector driven by file names, manifests and import strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestDetector;

const FRAMEWORK_INDICATORS: &[(Language, &str, &[&str])] = &[
    (Language::Go, "gin", &["github.com/gin-gonic/gin"]),
    (Language::Go, "echo", &["github.com/labstack/echo"]),
    (Language::Go, "fiber", &["github.com/gofiber/fiber"]),
    (Language::Go, "chi", &["github.com/go-chi/chi"]),
    (Language::Go, "gorilla/mux", &["github.com/gorilla/mux"]),
    (Language::Go, "beego", &["github.com/astaxie/beego", "github.com/beego/beego"]),
    (Language::Python, "flask", &["from flask import", "Flask(__name__)"]),
    (Language::Python, "django", &["from django", "django.contrib"]),
    (Language::Python, "fastapi", &["from fastapi import", "FastAPI()"]),
    (Language::Python, "tornado", &["import tornado", "tornado.web"]),
    (Language::Python, "pyramid", &["from pyramid", "pyramid.config"]),
    (Language::JavaScript, "express", &["require('express')", "require(\"express\")", "from 'express'"]),
    (Language::JavaScript, "koa", &["require('koa')", "from 'koa'"]),
    (Language::JavaScript, "hapi", &["require('@hapi/hapi')", "from '@hapi/hapi'"]),
    (Language::JavaScript, "fastify", &["require('fastify')", "from 'fastify'"]),
    (Language::TypeScript, "express", &["from 'express'", "import express"]),
    (Language::TypeScript, "nest", &["from '@nestjs"]),
    (Language::TypeScript, "next", &["from 'next'", "from 'next/"]),
    (Language::Rust, "axum", &["use axum"]),
    (Language::Rust, "actix-web", &["use actix_web"]),
    (Language::Rust, "tokio", &["#[tokio::main]"]),
];

impl Detector for ManifestDetector {
    fn detect(&self, scan: &ScanSet) -> DetectionFacts {
        let mut facts = DetectionFacts::default();
        for file in &scan.files {
            // Unreadable files still contribute name-based facts.
            let content = fs::read(&file.path).map(|b| String::from_utf8_lossy(&b).into_owned()).ok();
            let content = content.as_deref();
            if let Some(tool) = build_tool(file, content) {
                facts.build_tools.push(tool);
            }
            if let Some(ep) = entrypoint(file, content) {
                facts.entrypoints.push(ep);
            }
            if let Some(text) = content {
                merge_frameworks(&mut facts.frameworks, file, text);
            }
        }
        debug!(
            build_tools = facts.build_tools.len(),
            entrypoints = facts.entrypoints.len(),
            frameworks = facts.frameworks.len(),
            "detection finished"
        );
        facts
    }
}

fn build_tool(file: &FileRecord, content: Option<&str>) -> Option<BuildTool> {
    let name = file.file_name().to_ascii_lowercase();
    let (kind, scripts) = match name.as_str() {
        "makefile" | "gnumakefile" => ("make", content.map(makefile_targets).unwrap_or_default()),
        "package.json" => ("npm", content.map(package_scripts).unwrap_or_default()),
        "go.mod" => ("go", vec!["go build".into(), "go test".into(), "go run".into()]),
        "cargo.toml" => ("cargo", vec!["cargo build".into(), "cargo test".into(), "cargo run".into()]),
        "requirements.txt" | "setup.py" | "pipfile" => {
            ("pip", vec!["pip install -r requirements.txt".into()])
        }
        "docker-compose.yml" | "docker-compose.yaml" => {
            ("docker-compose", vec!["docker-compose up".into(), "docker-compose build".into()])
        }
        _ => return None,
    };
    Some(BuildTool { kind: kind.into(), file: file.relative_path.clone(), scripts })
}

fn entrypoint(file: &FileRecord, content: Option<&str>) -> Option<Entrypoint> {
    let base = file.file_name();
    let path = file.relative_path.clone();
    let (kind, command, description) = match file.language {
        Language::Go => {
            let in_cmd = path.starts_with("cmd/") || path.contains("/cmd/");
            let has_main = content.is_some_and(|c| c.contains("func main()"));
            if !(base == "main.go" || in_cmd) || !has_main {
                return None;
            }
            ("go-binary", format!("go run {path}"), "Go main package")
        }
        Language::Python if matches!(base, "__main__.py" | "main.py" | "app.py") => {
            ("python-script", format!("python {path}"), "Python entrypoint")
        }
        Language::JavaScript | Language::TypeScript
            if matches!(base, "index.js" | "index.ts" | "server.js" | "app.js") =>
        {
            ("node-script", format!("node {path}"), "Node.js entrypoint")
        }
        Language::Rust if path == "src/main.rs" || path.ends_with("/src/main.rs") => {
            ("rust-binary", "cargo run".to_string(), "Rust binary crate")
        }
        Language::Dockerfile => ("docker", "docker build .".to_string(), "Docker container"),
        _ => return None,
    };
    Some(Entrypoint { kind: kind.into(), path, command, description: description.into() })
}

fn merge_frameworks(found: &mut Vec<Framework>, file: &FileRecord, content: &str) {
    let hits = FRAMEWORK_INDICATORS
        .iter()
        .filter(|(lang, _, _)| *lang == file.language)
        .filter(|(_, _, indicators)| indicators.iter().any(|i| content.contains(i)));
    for (lang, name, _) in hits {
        match found.iter_mut().find(|f| f.language == *lang && f.name == *name) {
            Some(existing) => existing.files.push(file.relative_path.clone()),
            None => found.push(Framework {
                name: (*name).to_string(),
                language: *lang,
                files: vec![file.relative_path.clone()],
            }),
        }
    }
}

/// Target names from `name:` lines, skipping comments, variables and
/// dot-targets such as `.PHONY`.
#[must_use]
pub fn makefile_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.starts_with(['\t', ' ', '#']))
        .filter_map(|line| {
            let (head, rest) = line.split_once(':')?;
            if rest.starts_with('=') {
                return None;
            }
            let target = head.trim();
            let valid = !target.is_empty()
                && !target.starts_with('.')
                && !target.contains(['=', '$', ' ', '%']);
            valid.then(|| target.to_string())
        })
        .collect()
}

/// Script names from a `package.json`. Malformed JSON yields none.
#[must_use]
pub fn package_scripts(content: &str) -> Vec<String> {
    #[derive(Deserialize)]
    struct Manifest {
        #[serde(default)]
        scripts: serde_json::Map<String, serde_json::Value>,
    }
    serde_json::from_str::<Manifest>(content)
        .map(|m| m.scripts.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scan_tree(files: &[(&str, &str)]) -> (tempfile::TempDir, ScanSet) {
        let dir = tempfile::tempdir().unwrap();
        let mut records = Vec::new();
        for (relative, content) in files {
            let path = dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            records.push(record(&path, relative));
        }
        (dir, ScanSet { files: records, ..ScanSet::default() })
    }

    fn record(path: &Path, relative: &str) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            relative_path: relative.to_string(),
            size: 0,
            lines: 0,
            language: Language::detect(relative.rsplit('/').next().unwrap()),
            is_test: false,
            hash: String::new(),
        }
    }

    #[test]
    fn manifests_become_build_tools() {
        let (_dir, scan) = scan_tree(&[
            ("Makefile", ".PHONY: build\nbuild:\n\tgo build\ntest: build\n\tgo test\nVAR := 1\n# lint:\n"),
            ("package.json", r#"{"name":"x","scripts":{"build":"tsc","start":"node ."}}"#),
            ("go.mod", "module example.com/x\n"),
        ]);
        let facts = ManifestDetector.detect(&scan);

        let kinds: Vec<_> = facts.build_tools.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(kinds, vec!["make", "npm", "go"]);
        assert_eq!(facts.build_tools[0].scripts, vec!["build", "test"]);
        assert_eq!(facts.build_tools[1].scripts, vec!["build", "start"]);
    }

    #[test]
    fn go_entrypoint_requires_main_function() {
        let (_dir, scan) = scan_tree(&[
            ("cmd/tool/main.go", "package main\n\nfunc main() {}\n"),
            ("pkg/main.go", "package pkg\n"),
        ]);
        let facts = ManifestDetector.detect(&scan);
        assert_eq!(facts.entrypoints.len(), 1);
        assert_eq!(facts.entrypoints[0].command, "go run cmd/tool/main.go");
    }

    #[test]
    fn frameworks_are_merged_per_language_and_name() {
        let (_dir, scan) = scan_tree(&[
            ("a.py", "from flask import Flask\n"),
            ("b.py", "from flask import request\n"),
            ("c.go", "import \"github.com/gin-gonic/gin\"\n"),
        ]);
        let facts = ManifestDetector.detect(&scan);
        assert_eq!(facts.frameworks.len(), 2);
        assert_eq!(facts.frameworks[0].name, "flask");
        assert_eq!(facts.frameworks[0].files, vec!["a.py", "b.py"]);
        assert_eq!(facts.frameworks[1].name, "gin");
    }

    #[test]
    fn endpoints_and_models_stay_empty() {
        let (_dir, scan) = scan_tree(&[("app.py", "@app.route('/x')\ndef x(): pass\n")]);
        let facts = ManifestDetector.detect(&scan);
        assert!(facts.endpoints.is_empty());
        assert!(facts.models.is_empty());
        assert_eq!(facts.entrypoints[0].kind, "python-script");
    }

    #[test]
    fn malformed_package_json_has_no_scripts() {
        assert!(package_scripts("{ nope").is_empty());
    }
}
