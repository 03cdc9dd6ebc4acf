//! Prompt text per summary kind.

use super::{SummaryKind, SummaryRequest};

/// System preamble sent with every request.
pub const SYSTEM_PREAMBLE: &str =
    "You are a senior software engineer writing concise internal documentation.";

/// Builds the user prompt for `request`.
#[must_use]
pub fn build_prompt(request: &SummaryRequest) -> String {
    let words = request.constraints.max_words.unwrap_or(0);
    let bullets = request.constraints.max_bullets.unwrap_or(0);
    let (task, focus, closing) = match request.kind {
        SummaryKind::Architecture => (
            format!("Give an architecture overview of this codebase in at most {words} words."),
            "Cover what the project does, its main components, how data flows, and key dependencies or frameworks.",
            "Overview:",
        ),
        SummaryKind::Module => (
            format!("Summarize this module (directory) in at most {words} words."),
            "Cover its purpose, notable submodules, and dependencies on other parts of the code.",
            "Summary:",
        ),
        SummaryKind::File => (
            format!("Summarize this file in at most {words} words."),
            "Cover its role, main responsibilities, important imports, and side effects.",
            "Summary:",
        ),
        SummaryKind::Function => (
            format!("List the key functions, types or classes as bullet points (at most {bullets} bullets)."),
            "Use the form '- Name() - purpose; inputs -> outputs; side effects if any'.",
            "Key declarations:",
        ),
        SummaryKind::Quickstart => (
            format!("Write quickstart steps as at most {bullets} bullet points."),
            "Cover how to install dependencies, build, test, and run the project.",
            "Steps:",
        ),
    };
    format!("{task} {focus}\n\nContext:\n{}\n\n{closing}", request.context)
}

/// Approximate token count: one token per four bytes of prompt and response.
#[must_use]
pub fn estimate_tokens(prompt: &str, response: &str) -> usize {
    (prompt.len() + response.len()) / 4
}
