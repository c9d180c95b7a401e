//! Repository scaffolding added next to the generated files

use chrono::{Datelike, Utc};
use shipwright_core::domain::artifact::{GeneratedArtifact, ROOT_DOCUMENT};
use shipwright_core::domain::deployment::{default_hosting_url, repository_name};
use shipwright_core::domain::job::JobRequest;
use std::fmt::Write;

pub const README: &str = "README.md";
pub const LICENSE: &str = "LICENSE";

/// Adds a README and an MIT license unless the generated output has its own
///
/// The README is rewritten every round so it tracks the latest brief.
pub fn with_supporting_files(
    artifact: GeneratedArtifact,
    request: &JobRequest,
    owner: &str,
) -> GeneratedArtifact {
    let readme = readme(&artifact, request, owner);
    artifact
        .with_default_file(README, readme)
        .with_default_file(LICENSE, mit_license(owner, Utc::now().year()))
}

fn readme(artifact: &GeneratedArtifact, request: &JobRequest, owner: &str) -> String {
    let repo = repository_name(&request.task_id);
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", title_case(&repo));
    out.push_str("## Overview\n\n");
    let _ = writeln!(out, "Generated from the following brief (round {}):\n", request.round);
    for line in request.brief.trim().lines() {
        let _ = writeln!(out, "> {}", line);
    }
    out.push('\n');

    if !request.checks.is_empty() {
        out.push_str("## Acceptance checks\n\n");
        for check in &request.checks {
            let _ = writeln!(out, "- {}", check.trim());
        }
        out.push('\n');
    }

    out.push_str("## Usage\n\n");
    let _ = writeln!(
        out,
        "This is a static web application. Open `{}` in a browser, or visit the live site at {}\n",
        ROOT_DOCUMENT,
        default_hosting_url(owner, &repo)
    );

    out.push_str("## Files\n\n");
    for path in artifact.paths() {
        let _ = writeln!(out, "- `{}`", path);
    }
    let _ = writeln!(out, "- `{}`", README);
    if !artifact.files.contains_key(LICENSE) {
        let _ = writeln!(out, "- `{}`", LICENSE);
    }

    out.push_str("\n## License\n\nMIT, see [LICENSE](LICENSE).\n");
    out
}

fn title_case(name: &str) -> String {
    name.split(['-', '.'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn mit_license(holder: &str, year: i32) -> String {
    format!(
        r#"MIT License

Copyright (c) {year} {holder}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{OWNER, sample_page, sample_request};
    use std::collections::BTreeMap;

    fn artifact() -> GeneratedArtifact {
        let mut files = BTreeMap::new();
        files.insert(ROOT_DOCUMENT.to_string(), sample_page("Demo"));
        GeneratedArtifact::new(files, true, 1)
    }

    #[test]
    fn test_adds_readme_and_license() {
        let request = sample_request("captcha-solver_01", 2);
        let scaffolded = with_supporting_files(artifact(), &request, OWNER);

        let readme = &scaffolded.files[README];
        assert!(readme.starts_with("# Captcha Solver 01\n"));
        assert!(readme.contains("round 2"));
        assert!(readme.contains("- #title is visible"));
        assert!(readme.contains("https://octo.github.io/captcha-solver-01/"));

        let license = &scaffolded.files[LICENSE];
        assert!(license.starts_with("MIT License"));
        assert!(license.contains(&format!("Copyright (c) {} octo", Utc::now().year())));
        assert_eq!(scaffolded.files.len(), 3);
    }

    #[test]
    fn test_generated_readme_wins() {
        let request = sample_request("t1", 1);
        let generated = artifact().with_default_file(README, "# Mine".to_string());

        let scaffolded = with_supporting_files(generated, &request, OWNER);

        assert_eq!(scaffolded.files[README], "# Mine");
        assert!(scaffolded.files.contains_key(LICENSE));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("weather-app.v2"), "Weather App V2");
        assert_eq!(title_case("t1"), "T1");
    }
}
