//! Prompt construction for artifact generation

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use shipwright_core::domain::artifact::ROOT_DOCUMENT;
use shipwright_core::domain::job::Attachment;
use std::fmt::Write;

use super::artifact::FILE_MARKER_PREFIX;

pub const SYSTEM_PROMPT: &str =
    "You are an expert web developer who creates complete, functional web applications.";

/// Binary attachments larger than this are described, not inlined
const MAX_INLINE_ATTACHMENT_BYTES: usize = 256 * 1024;

const TEXT_EXTENSIONS: &[&str] = &[".txt", ".csv", ".md", ".json", ".svg", ".html", ".xml"];

/// Builds the user prompt for one generation request
pub fn build_prompt(brief: &str, checks: &[String], attachments: &[Attachment]) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "Generate a complete, self-contained web application that satisfies the brief below.\n\n",
    );
    let _ = writeln!(prompt, "PROJECT BRIEF:\n{}\n", brief.trim());

    if !checks.is_empty() {
        prompt.push_str("ACCEPTANCE CHECKS (the app will be evaluated against every one):\n");
        for (idx, check) in checks.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", idx + 1, check.trim());
        }
        prompt.push('\n');
    }

    if !attachments.is_empty() {
        prompt.push_str("ATTACHMENTS:\n");
        for attachment in attachments {
            prompt.push_str(&describe_attachment(attachment));
        }
        prompt.push('\n');
    }

    let _ = write!(
        prompt,
        "REQUIREMENTS:\n\
         1. The entry point is {root}, a complete HTML document with <html>, <head> and <body>.\n\
         2. Put CSS in <style> and JavaScript in <script> inside {root}; use CDN links only when unavoidable.\n\
         3. The app must work when served as static files from the repository root.\n\
         4. Reference attachments by their file names; embed any data the app needs.\n\
         5. Handle errors in JavaScript and give the user visible feedback.\n\
         6. Keep the interface responsive and accessible.\n\n\
         OUTPUT FORMAT:\n\
         Reply with file contents only, no explanations. For a single file, reply with the full {root}.\n\
         For several files, start each one with a line `{marker}<relative path> ===` followed by its content.\n",
        root = ROOT_DOCUMENT,
        marker = FILE_MARKER_PREFIX,
    );

    prompt
}

fn describe_attachment(attachment: &Attachment) -> String {
    let name = &attachment.name;
    let Some(content) = attachment.content.as_deref() else {
        return format!("\nFile: {}\n(no content provided)\n", name);
    };

    let Some(uri) = DataUri::parse(content) else {
        return format!("\nFile: {}\nURL: {}\n", name, content);
    };

    if !uri.base64 {
        return format!("\nFile: {} ({})\nContent:\n{}\n", name, uri.mime, uri.data);
    }

    let decoded = match BASE64.decode(uri.data.trim()) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(attachment = %name, "Attachment is not valid base64: {}", err);
            return format!("\nFile: {}\nError decoding attachment: {}\n", name, err);
        }
    };

    if is_textual(uri.mime, name) {
        if let Ok(text) = std::str::from_utf8(&decoded) {
            return format!("\nFile: {} ({})\nContent:\n{}\n", name, uri.mime, text);
        }
    }

    if decoded.len() > MAX_INLINE_ATTACHMENT_BYTES {
        return format!(
            "\nFile: {}\nBinary file: {} ({} bytes), too large to inline; content omitted\n",
            name,
            uri.mime,
            decoded.len()
        );
    }

    format!(
        "\nFile: {}\nBinary file: {} ({} bytes)\nData URI: {}\n",
        name,
        uri.mime,
        decoded.len(),
        content
    )
}

fn is_textual(mime: &str, name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    mime.starts_with("text/")
        || mime == "application/json"
        || TEXT_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// `data:[<mime>][;base64],<data>`
struct DataUri<'a> {
    mime: &'a str,
    base64: bool,
    data: &'a str,
}

impl<'a> DataUri<'a> {
    fn parse(uri: &'a str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mut params = header.split(';');
        let mime = params.next().filter(|m| !m.is_empty()).unwrap_or("text/plain");
        let base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));
        Some(Self { mime, base64, data })
    }
}
