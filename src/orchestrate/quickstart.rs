//! Bullet parsing for list-shaped summaries and the rule-based quickstart.

use crate::detect::{BuildTool, DetectionFacts};

/// Maximum bullets kept from one response.
pub const MAX_BULLETS: usize = 8;

const FIRST_STEP: &str = "Clone the repository";
const NOTHING_DETECTED: &str = "Check documentation for setup instructions";

/// Extracts list items from free text.
///
/// A line counts only when, after trimming, it starts with `-`, `*`, `•`
/// or a number followed by `.`. The marker is removed and the rest trimmed;
/// empty items are dropped and at most [`MAX_BULLETS`] are kept.
#[must_use]
pub fn parse_bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| strip_marker(line.trim()))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .take(MAX_BULLETS)
        .collect()
}

fn strip_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix(['-', '*', '•']) {
        return Some(rest);
    }
    let (number, rest) = line.split_once('.')?;
    (!number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())).then_some(rest)
}

/// Deterministic steps derived from the detected build tools.
///
/// Always starts with cloning; when no tool adds anything a pointer to the
/// documentation is appended, so the list is never shorter than two steps.
#[must_use]
pub fn fallback_steps(facts: &DetectionFacts) -> Vec<String> {
    let mut steps = vec![FIRST_STEP.to_string()];
    for tool in &facts.build_tools {
        steps.extend(tool_steps(tool));
    }
    if steps.len() == 1 {
        steps.push(NOTHING_DETECTED.to_string());
    }
    steps
}

fn tool_steps(tool: &BuildTool) -> Vec<String> {
    let has = |name: &str| tool.scripts.iter().any(|s| s == name);
    let mut steps = Vec::new();
    match tool.kind.as_str() {
        "npm" => {
            steps.push("Install dependencies: npm install");
            if has("build") {
                steps.push("Build the project: npm run build");
            }
            if has("test") {
                steps.push("Run tests: npm test");
            }
            if has("start") {
                steps.push("Start the application: npm start");
            }
        }
        "go" => steps.extend([
            "Download dependencies: go mod download",
            "Build the project: go build",
            "Run tests: go test ./...",
        ]),
        "cargo" => steps.extend([
            "Fetch dependencies: cargo fetch",
            "Build the project: cargo build",
            "Run tests: cargo test",
            "Run the application: cargo run",
        ]),
        "make" => {
            if has("build") {
                steps.push("Build the project: make build");
            }
            if has("test") {
                steps.push("Run tests: make test");
            }
            if has("run") {
                steps.push("Run the application: make run");
            }
        }
        "pip" => steps.push("Install dependencies: pip install -r requirements.txt"),
        "docker-compose" => steps.push("Start services: docker-compose up"),
        _ => {}
    }
    steps.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(kind: &str, scripts: &[&str]) -> BuildTool {
        BuildTool {
            kind: kind.into(),
            file: "x".into(),
            scripts: scripts.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn strips_recognized_markers_only() {
        let text = "Here you go:\n- first\n  * second \n• third\n12. fourth\nv1.2 is not a bullet\n-\n";
        assert_eq!(parse_bullets(text), vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn bullets_are_capped() {
        let text = (1..=20).map(|i| format!("- item {i}")).collect::<Vec<_>>().join("\n");
        let bullets = parse_bullets(&text);
        assert_eq!(bullets.len(), MAX_BULLETS);
        assert_eq!(bullets[7], "item 8");
    }

    #[test]
    fn prose_yields_no_bullets() {
        assert!(parse_bullets("[quickstart summary placeholder - dry run mode]").is_empty());
    }

    #[test]
    fn fallback_without_tools_points_to_docs() {
        assert_eq!(
            fallback_steps(&DetectionFacts::default()),
            vec!["Clone the repository", "Check documentation for setup instructions"]
        );
    }

    #[test]
    fn fallback_follows_detected_scripts() {
        let facts = DetectionFacts {
            build_tools: vec![tool("npm", &["test"]), tool("make", &["build", "lint"])],
            ..DetectionFacts::default()
        };
        assert_eq!(
            fallback_steps(&facts),
            vec![
                "Clone the repository",
                "Install dependencies: npm install",
                "Run tests: npm test",
                "Build the project: make build",
            ]
        );
    }

    #[test]
    fn cargo_fallback_has_four_steps() {
        let facts =
            DetectionFacts { build_tools: vec![tool("cargo", &[])], ..DetectionFacts::default() };
        assert_eq!(fallback_steps(&facts).len(), 5);
    }
}
