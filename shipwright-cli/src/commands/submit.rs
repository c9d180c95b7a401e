//! Submit command handler
//!
//! Builds a task submission from flags or a JSON file and posts it to the
//! gateway. Local files passed with `--attach` are sent as data URIs.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use shipwright_client::GatewayClient;
use shipwright_core::dto::task::TaskSubmission;
use std::path::PathBuf;

use crate::attachment;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Read the whole submission from a JSON file
    #[arg(long, conflicts_with_all = ["task", "brief", "checks", "attachments"])]
    file: Option<PathBuf>,

    /// Task identifier; every round of a task deploys to the same repository
    #[arg(long, required_unless_present = "file")]
    task: Option<String>,

    #[arg(long, default_value_t = 1)]
    round: u32,

    /// What the generated app should do
    #[arg(long, required_unless_present = "file")]
    brief: Option<String>,

    /// Acceptance check (repeatable)
    #[arg(long = "check")]
    checks: Vec<String>,

    /// File to attach (repeatable)
    #[arg(long = "attach")]
    attachments: Vec<PathBuf>,

    /// URL that receives the job outcome
    #[arg(long, required_unless_present = "file")]
    evaluation_url: Option<String>,

    #[arg(long, required_unless_present = "file")]
    email: Option<String>,

    /// Delivery nonce (default: random UUID)
    #[arg(long)]
    nonce: Option<String>,

    /// Shared secret; overrides the one in --file
    #[arg(long, env = "SHIPWRIGHT_SECRET", hide_env_values = true)]
    secret: Option<String>,
}

pub async fn handle_submit(args: SubmitArgs, config: &Config) -> Result<()> {
    let submission = build_submission(args)?;
    let client = GatewayClient::new(&config.gateway_url);

    let ack = client
        .submit_task(&submission)
        .await
        .with_context(|| format!("Failed to submit task to {}", client.base_url()))?;

    if ack.status == "duplicate" {
        println!(
            "{} Task {} round {} is already being processed",
            "!".yellow(),
            ack.task.bold(),
            ack.round
        );
    } else {
        println!(
            "{} Task {} round {} accepted",
            "✓".green(),
            ack.task.bold(),
            ack.round
        );
        println!("  {}", ack.status.dimmed());
        println!("  Nonce:        {}", submission.nonce);
        println!("  Attachments:  {}", submission.attachments.len());
        println!(
            "  The outcome will be posted to {}",
            submission.evaluation_url.cyan()
        );
    }

    Ok(())
}

fn build_submission(args: SubmitArgs) -> Result<TaskSubmission> {
    let mut submission = match args.file {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            serde_json::from_str::<TaskSubmission>(&raw)
                .with_context(|| format!("'{}' is not a valid task submission", path.display()))?
        }
        None => TaskSubmission {
            email: args.email.context("--email is required")?,
            secret: String::new(),
            task: args.task.context("--task is required")?,
            round: args.round,
            nonce: args
                .nonce
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            brief: args.brief.context("--brief is required")?,
            checks: args.checks,
            evaluation_url: args
                .evaluation_url
                .context("--evaluation-url is required")?,
            attachments: args
                .attachments
                .iter()
                .map(|path| attachment::from_path(path))
                .collect::<Result<Vec<_>>>()?,
        },
    };

    if let Some(secret) = args.secret {
        submission.secret = secret;
    }
    if submission.secret.is_empty() {
        anyhow::bail!("A shared secret is required (--secret or SHIPWRIGHT_SECRET)");
    }

    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SubmitArgs {
        SubmitArgs {
            file: None,
            task: Some("t1".to_string()),
            round: 2,
            brief: Some("Show the weather".to_string()),
            checks: vec!["#forecast exists".to_string()],
            attachments: vec![],
            evaluation_url: Some("https://eval.example.com/cb".to_string()),
            email: Some("a@b.io".to_string()),
            nonce: None,
            secret: Some("s3cret".to_string()),
        }
    }

    #[test]
    fn test_submission_from_flags() {
        let submission = build_submission(args()).unwrap();

        assert_eq!(submission.task, "t1");
        assert_eq!(submission.round, 2);
        assert_eq!(submission.secret, "s3cret");
        assert_eq!(submission.checks, vec!["#forecast exists".to_string()]);
        assert!(uuid::Uuid::parse_str(&submission.nonce).is_ok());
    }

    #[test]
    fn test_secret_is_required() {
        let mut args = args();
        args.secret = None;
        assert!(build_submission(args).is_err());
    }

    #[test]
    fn test_submission_from_file() {
        let path = std::env::temp_dir().join(format!("shipwright-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"email":"a@b.io","secret":"from-file","taskId":"t7","round":1,"nonce":"n1",
                "brief":"b","evaluationCallback":"https://eval.example.com/cb"}"#,
        )
        .unwrap();

        let submission = build_submission(SubmitArgs {
            file: Some(path.clone()),
            task: None,
            brief: None,
            evaluation_url: None,
            email: None,
            secret: None,
            ..args()
        })
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(submission.task, "t7");
        assert_eq!(submission.secret, "from-file");
        assert_eq!(submission.nonce, "n1");
        assert!(submission.checks.is_empty());
    }
}
