use anyhow::Context;
use tracing::info;

use turnstile_verify::{token_from_urlencoded, SubmissionValidator};

use super::args::{Cli, Command, ConfigArgs, VerifyArgs};
use crate::exit_codes;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Verify(args) => cmd_verify(args).await,
        Command::Config(args) => cmd_config(args),
    }
}

async fn cmd_verify(args: VerifyArgs) -> anyhow::Result<i32> {
    let config = args
        .source
        .resolve()
        .context("failed to resolve turnstile configuration")?;

    let validator = SubmissionValidator::from_config(&config)?.with_messages(args.messages());

    let token = match (&args.token, &args.form) {
        (Some(token), _) => Some(token.clone()),
        (None, Some(path)) => {
            let body = std::fs::read(path)
                .with_context(|| format!("failed to read form body {}", path.display()))?;
            token_from_urlencoded(&body)
        }
        (None, None) => None,
    };

    let outcome = validator.validate(token.as_deref()).await;
    info!(accepted = outcome.is_accepted(), "verification finished");

    println!("{}", serde_json::to_string(&outcome)?);

    Ok(if outcome.is_accepted() {
        exit_codes::SUCCESS
    } else {
        exit_codes::REJECTED
    })
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<i32> {
    let config = args
        .source
        .resolve()
        .context("failed to resolve turnstile configuration")?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(exit_codes::SUCCESS)
}
