//! Filename-based language classification.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Language tag assigned to every scanned file.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Python,
    JavaScript,
    TypeScript,
    Java,
    C,
    Cpp,
    Rust,
    Ruby,
    Php,
    CSharp,
    Swift,
    Kotlin,
    Scala,
    R,
    ObjC,
    Perl,
    Shell,
    PowerShell,
    Lua,
    Dart,
    Elm,
    Clojure,
    Elixir,
    Erlang,
    FSharp,
    OCaml,
    Vim,
    Yaml,
    Json,
    Toml,
    Xml,
    Html,
    Css,
    Scss,
    Sass,
    Less,
    Sql,
    Markdown,
    Rst,
    Latex,
    Dockerfile,
    Makefile,
    CMake,
    Gradle,
    Protobuf,
    GraphQl,
    Vue,
    Svelte,
    Unknown,
}

impl Language {
    /// Classifies a file by its basename.
    ///
    /// Special basenames win over extensions, so `Dockerfile.prod` is a
    /// dockerfile and `Cargo.lock` belongs to rust. Anything unmatched is
    /// [`Language::Unknown`].
    #[must_use]
    pub fn detect(file_name: &str) -> Self {
        let base = file_name.to_ascii_lowercase();
        if let Some(lang) = Self::from_basename(&base) {
            return lang;
        }
        base.rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .and_then(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(Self::Unknown)
    }

    fn from_basename(base: &str) -> Option<Self> {
        if base == "dockerfile" || base.starts_with("dockerfile.") {
            return Some(Self::Dockerfile);
        }
        let lang = match base {
            "makefile" | "gnumakefile" => Self::Makefile,
            "cmakelists.txt" => Self::CMake,
            "package.json" | "tsconfig.json" => Self::Json,
            "go.mod" | "go.sum" => Self::Go,
            "cargo.toml" | "cargo.lock" => Self::Rust,
            "requirements.txt" | "setup.py" | "pipfile" => Self::Python,
            _ => return None,
        };
        Some(lang)
    }

    fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext {
            "go" => Self::Go,
            "py" => Self::Python,
            "js" | "jsx" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "java" => Self::Java,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "hpp" => Self::Cpp,
            "rs" => Self::Rust,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            "cs" => Self::CSharp,
            "swift" => Self::Swift,
            "kt" => Self::Kotlin,
            "scala" => Self::Scala,
            "r" => Self::R,
            "m" | "mm" => Self::ObjC,
            "pl" => Self::Perl,
            "sh" | "bash" | "zsh" | "fish" => Self::Shell,
            "ps1" => Self::PowerShell,
            "lua" => Self::Lua,
            "dart" => Self::Dart,
            "elm" => Self::Elm,
            "clj" => Self::Clojure,
            "ex" | "exs" => Self::Elixir,
            "erl" | "hrl" => Self::Erlang,
            "fs" | "fsx" | "fsi" => Self::FSharp,
            "ml" | "mli" => Self::OCaml,
            "vim" => Self::Vim,
            "yaml" | "yml" => Self::Yaml,
            "json" => Self::Json,
            "toml" => Self::Toml,
            "xml" => Self::Xml,
            "html" | "htm" => Self::Html,
            "css" => Self::Css,
            "scss" => Self::Scss,
            "sass" => Self::Sass,
            "less" => Self::Less,
            "sql" => Self::Sql,
            "md" | "markdown" => Self::Markdown,
            "rst" => Self::Rst,
            "tex" => Self::Latex,
            "dockerfile" => Self::Dockerfile,
            "makefile" => Self::Makefile,
            "cmake" => Self::CMake,
            "gradle" => Self::Gradle,
            "proto" => Self::Protobuf,
            "graphql" => Self::GraphQl,
            "vue" => Self::Vue,
            "svelte" => Self::Svelte,
            _ => return None,
        };
        Some(lang)
    }

    /// Stable lowercase tag, identical to the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Rust => "rust",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::CSharp => "csharp",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::R => "r",
            Self::ObjC => "objc",
            Self::Perl => "perl",
            Self::Shell => "shell",
            Self::PowerShell => "powershell",
            Self::Lua => "lua",
            Self::Dart => "dart",
            Self::Elm => "elm",
            Self::Clojure => "clojure",
            Self::Elixir => "elixir",
            Self::Erlang => "erlang",
            Self::FSharp => "fsharp",
            Self::OCaml => "ocaml",
            Self::Vim => "vim",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Xml => "xml",
            Self::Html => "html",
            Self::Css => "css",
            Self::Scss => "scss",
            Self::Sass => "sass",
            Self::Less => "less",
            Self::Sql => "sql",
            Self::Markdown => "markdown",
            Self::Rst => "rst",
            Self::Latex => "latex",
            Self::Dockerfile => "dockerfile",
            Self::Makefile => "makefile",
            Self::CMake => "cmake",
            Self::Gradle => "gradle",
            Self::Protobuf => "protobuf",
            Self::GraphQl => "graphql",
            Self::Vue => "vue",
            Self::Svelte => "svelte",
            Self::Unknown => "unknown",
        }
    }

    /// Tokens that introduce a declaration in this language.
    ///
    /// Head capture in the context budgeter stops at the first line that
    /// contains one of these.
    #[must_use]
    pub fn declaration_markers(self) -> &'static [&'static str] {
        match self {
            Self::Go => &["func ", "interface "],
            Self::Python => &["def ", "class "],
            Self::JavaScript | Self::TypeScript | Self::Vue | Self::Svelte => {
                &["function ", "class ", "interface "]
            }
            Self::Rust => &["fn ", "struct ", "enum ", "trait ", "impl "],
            Self::Java | Self::CSharp | Self::Kotlin | Self::Scala => {
                &["class ", "interface ", "fun ", "def "]
            }
            Self::Ruby | Self::Elixir => &["def ", "class ", "module "],
            Self::Php => &["function ", "class ", "interface "],
            Self::Swift => &["func ", "class ", "struct ", "protocol "],
            _ => &["func ", "class ", "def ", "interface "],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of language tags a scan is restricted to. Empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageFilter {
    tags: BTreeSet<String>,
}

impl LanguageFilter {
    /// Builds a filter from user-supplied names, resolving common aliases.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .map(|name| canonical_tag(&name).to_string())
            .collect();
        Self { tags }
    }

    /// Returns `true` when no restriction is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns `true` if files of `language` pass the filter.
    ///
    /// Unknown-language files never pass an active filter.
    #[must_use]
    pub fn allows(&self, language: Language) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        language != Language::Unknown && self.tags.contains(language.as_str())
    }
}

fn canonical_tag(name: &str) -> &str {
    match name {
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "md" => "markdown",
        "yml" => "yaml",
        "rs" => "rust",
        "sh" | "bash" => "shell",
        "golang" => "go",
        "c++" => "cpp",
        "c#" => "csharp",
        other => other,
    }
}
