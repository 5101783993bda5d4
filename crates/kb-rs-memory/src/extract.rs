//! Automatic metadata extraction and classification for memory content.
//!
//! Extraction is pure: the same content always yields the same
//! classification, technologies, URLs and language. Only the timestamps
//! depend on the clock.

use crate::model::{MemoryMetadata, MemoryType};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Known technology names, matched as lowercase substrings.
pub const TECHNOLOGY_VOCABULARY: &[&str] = &[
    "graphql",
    "sql",
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "docker",
    "kubernetes",
    "aws",
    "azure",
    "gcp",
    "terraform",
    "react",
    "vue",
    "angular",
    "node",
    "python",
    "java",
    "csharp",
    "javascript",
    "typescript",
    "go",
    "rust",
    "c++",
    "splunk",
    "dynatrace",
    "grafana",
    "prometheus",
    "jenkins",
    "git",
    "github",
    "gitlab",
    "bitbucket",
    "jira",
    "confluence",
    "tanzu",
    "pcf",
    "openshift",
    "helm",
    "istio",
    "envoy",
];

/// Keyword rules evaluated in order; the first rule with a hit wins.
pub const CLASSIFICATION_RULES: &[(&[&str], MemoryType)] = &[
    (
        &["config", "configuration", "environment", "env"],
        MemoryType::Environment,
    ),
    (
        &["architecture", "design", "decision", "pattern"],
        MemoryType::Architectural,
    ),
    (
        &["error", "fix", "troubleshoot", "debug", "restart"],
        MemoryType::Operational,
    ),
];

/// Keyword that marks otherwise unclassified content as environment.
const DASHBOARD_KEYWORD: &str = "dashboard";

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("url pattern is valid")
});

static CODE_FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("code fence pattern is valid")
});

/// Extract metadata from content, stamping timestamps with the current time.
pub fn extract_metadata(content: &str) -> MemoryMetadata {
    extract_metadata_at(content, Utc::now())
}

/// Extract metadata from content using an explicit timestamp.
pub fn extract_metadata_at(content: &str, now: DateTime<Utc>) -> MemoryMetadata {
    let lowered = content.to_lowercase();
    let urls = extract_urls(content);
    let fence = detect_code_fences(content);
    let technologies = detect_technologies(&lowered);

    let memory_type = match &fence {
        Some(_) => MemoryType::CodeSnippet,
        None => classify(&lowered, !urls.is_empty()),
    };

    MemoryMetadata {
        memory_type,
        technologies,
        urls,
        language: fence.unwrap_or_default(),
        tags: Vec::new(),
        created_at: now,
        last_accessed: now,
        access_count: 0,
        source: None,
        initial_load: None,
    }
}

/// Apply a caller-supplied type override when it names a specific type.
///
/// Invalid names and `general` leave the extracted classification intact.
pub fn apply_type_override(metadata: &mut MemoryMetadata, requested: Option<&str>) {
    if let Some(memory_type) = requested.and_then(MemoryType::parse_override) {
        metadata.memory_type = memory_type;
    }
}

/// Every http(s) URL occurrence, in order of appearance.
pub fn extract_urls(content: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(content)
        .map(|found| found.as_str().to_string())
        .collect()
}

/// Detect fenced code blocks.
///
/// Returns `None` when the content has no fence, otherwise the first
/// non-empty language tag (or an empty string when no fence is tagged).
pub fn detect_code_fences(content: &str) -> Option<String> {
    let mut found_fence = false;
    for captures in CODE_FENCE_PATTERN.captures_iter(content) {
        found_fence = true;
        if let Some(language) = captures.get(1).map(|tag| tag.as_str())
            && !language.is_empty()
        {
            return Some(language.to_string());
        }
    }
    found_fence.then(String::new)
}

/// Technologies mentioned in lowercased content, in vocabulary order.
pub fn detect_technologies(lowered: &str) -> Vec<String> {
    TECHNOLOGY_VOCABULARY
        .iter()
        .filter(|tech| lowered.contains(**tech))
        .map(|tech| tech.to_string())
        .collect()
}

/// Classify lowercased content that has no code fence.
pub fn classify(lowered: &str, has_urls: bool) -> MemoryType {
    for (keywords, memory_type) in CLASSIFICATION_RULES {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return *memory_type;
        }
    }
    if has_urls || lowered.contains(DASHBOARD_KEYWORD) {
        return MemoryType::Environment;
    }
    MemoryType::General
}
