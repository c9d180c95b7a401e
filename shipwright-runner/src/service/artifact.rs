//! Completion reply parsing and structural validation

use regex::Regex;
use shipwright_core::domain::artifact::ROOT_DOCUMENT;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Start of a line that opens a new file in a multi-file reply
pub const FILE_MARKER_PREFIX: &str = "=== FILE: ";
const FILE_MARKER_SUFFIX: &str = " ===";

/// Minimum trimmed length of the root document
const MIN_ROOT_DOCUMENT_LEN: usize = 50;

const REQUIRED_TAGS: &[&str] = &["<html", "<head", "<body", "</html>"];

/// `#element-id` references inside acceptance checks
static ELEMENT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#([A-Za-z][\w-]*)").expect("element marker pattern is valid")
});

/// Splits a completion reply into a file set
///
/// Replies with `=== FILE: <path> ===` lines yield one file per marker.
/// Anything else is treated as a single root document, with surrounding
/// prose and code fences removed.
pub fn parse_reply(text: &str) -> Result<BTreeMap<String, String>, String> {
    if text.trim().is_empty() {
        return Err("completion reply is empty".to_string());
    }

    let mut files = BTreeMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        if let Some(path) = marker_path(line) {
            if let Some((path, lines)) = current.take() {
                files.insert(path, strip_fence(&lines.join("\n")));
            }
            current = Some((path.to_string(), Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((path, lines)) = current {
        files.insert(path, strip_fence(&lines.join("\n")));
    }

    if files.is_empty() {
        files.insert(ROOT_DOCUMENT.to_string(), extract_document(text));
    }

    Ok(files)
}

/// Checks that a file set is deployable
///
/// Returns the `#id` markers referenced by `checks` that no file defines.
/// Those are reported, not enforced; the evaluator has the final word.
pub fn check_structure(
    files: &BTreeMap<String, String>,
    checks: &[String],
) -> Result<Vec<String>, String> {
    if files.is_empty() {
        return Err("reply contained no files".to_string());
    }

    for path in files.keys() {
        if !is_safe_path(path) {
            return Err(format!("unsafe file path '{}'", path));
        }
    }

    let root = files
        .get(ROOT_DOCUMENT)
        .ok_or_else(|| format!("{} is missing", ROOT_DOCUMENT))?;

    if root.trim().len() < MIN_ROOT_DOCUMENT_LEN {
        return Err(format!(
            "{} is too short ({} characters)",
            ROOT_DOCUMENT,
            root.trim().len()
        ));
    }

    let lowered = root.to_ascii_lowercase();
    let missing_tags: Vec<&str> = REQUIRED_TAGS
        .iter()
        .copied()
        .filter(|tag| !lowered.contains(tag))
        .collect();
    if !missing_tags.is_empty() {
        return Err(format!(
            "{} lacks required tags: {}",
            ROOT_DOCUMENT,
            missing_tags.join(", ")
        ));
    }

    Ok(missing_markers(files, checks))
}

fn missing_markers(files: &BTreeMap<String, String>, checks: &[String]) -> Vec<String> {
    let referenced: BTreeSet<&str> = checks
        .iter()
        .flat_map(|check| ELEMENT_MARKER.captures_iter(check))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    referenced
        .into_iter()
        .filter(|id| {
            let double = format!("id=\"{}\"", id);
            let single = format!("id='{}'", id);
            !files
                .values()
                .any(|content| content.contains(&double) || content.contains(&single))
        })
        .map(str::to_string)
        .collect()
}

fn marker_path(line: &str) -> Option<&str> {
    let path = line
        .trim()
        .strip_prefix(FILE_MARKER_PREFIX)?
        .strip_suffix(FILE_MARKER_SUFFIX)?
        .trim();
    (!path.is_empty()).then_some(path)
}

fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && !path.contains(':')
        && path.split('/').all(|part| !part.is_empty() && part != "..")
}

/// Body of the first fenced code block, if any
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

fn strip_fence(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        if let Some(body) = fenced_body(trimmed) {
            return body.trim().to_string();
        }
    }
    trimmed.to_string()
}

fn extract_document(text: &str) -> String {
    let body = fenced_body(text).unwrap_or(text);
    let lowered = body.to_ascii_lowercase();

    let start = lowered.find("<!doctype").or_else(|| lowered.find("<html"));
    let end = lowered.rfind("</html>").map(|idx| idx + "</html>".len());

    match (start, end) {
        (Some(start), Some(end)) if start < end => body[start..end].to_string(),
        _ => body.trim().to_string(),
    }
}
