//! Subcommand execution.

use std::{
    error::Error,
    future::Future,
    io::{self, Read, Write},
    sync::Arc,
};

use passgate_core::{Environment, KeyValueStore, SystemEnv};
use passgate_session::{BootstrapDecision, SecretCipher, SessionError, SessionManager};

use crate::{Command, prompt};

/// Run one subcommand against a bootstrapped manager.
pub async fn run<S, C>(
    command: &Command,
    manager: &Arc<SessionManager<S, C, SystemEnv>>,
    decision: BootstrapDecision,
) -> Result<(), Box<dyn Error>>
where
    S: KeyValueStore,
    C: SecretCipher,
{
    match command {
        Command::Status => status(manager, decision),
        Command::Lock => {
            manager.clear_password()?;
            writeln!(io::stdout(), "locked")?;
            Ok(())
        },
        Command::Encrypt { text } => {
            let plaintext = match text {
                Some(text) => text.clone(),
                None => read_stdin()?,
            };

            let prompt = prompt::spawn(Arc::clone(manager));
            let result = retry_on_mismatch(|| manager.encrypt_secret(&plaintext)).await;
            prompt.abort();

            writeln!(io::stdout(), "{}", result?)?;
            Ok(())
        },
        Command::Decrypt { file } => {
            let armored = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => read_stdin()?,
            };

            let prompt = prompt::spawn(Arc::clone(manager));
            let result = retry_on_mismatch(|| manager.decrypt_secret(&armored)).await;
            prompt.abort();

            write!(io::stdout(), "{}", result?)?;
            Ok(())
        },
    }
}

/// Run `op` again after each wrong password, up to the prompt's attempt limit.
async fn retry_on_mismatch<T, F, Fut>(mut op: F) -> Result<T, SessionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(SessionError::PasswordMismatch) if attempt < prompt::MAX_ATTEMPTS => {
                tracing::warn!(attempt, "wrong password, asking again");
                attempt += 1;
            },
            result => return result,
        }
    }
}

fn status<S, C>(
    manager: &SessionManager<S, C, SystemEnv>,
    decision: BootstrapDecision,
) -> Result<(), Box<dyn Error>>
where
    S: KeyValueStore,
    C: SecretCipher,
{
    let persisted = manager.store().load()?;
    let now = SystemEnv::new().now();
    let mut out = io::stdout().lock();

    writeln!(
        out,
        "fingerprint:  {}",
        if persisted.stored_hash.is_some() { "stored" } else { "none" }
    )?;
    match persisted.last_checked_at {
        Some(checked) => match now.duration_since(checked) {
            Some(age) => writeln!(out, "last checked: {}s ago", age.as_secs())?,
            None => writeln!(out, "last checked: in the future ({checked})")?,
        },
        None => writeln!(out, "last checked: never")?,
    }

    writeln!(
        out,
        "session:      {}",
        trust_summary(decision, persisted.stored_hash.is_some())
    )?;
    writeln!(
        out,
        "window:       {}h",
        manager.config().freshness_window.as_secs() / 3600
    )?;
    Ok(())
}

fn trust_summary(decision: BootstrapDecision, has_fingerprint: bool) -> &'static str {
    match decision {
        BootstrapDecision::FirstRun if has_fingerprint => {
            "not trusted, next password is checked against the stored fingerprint"
        },
        BootstrapDecision::FirstRun => "first run, next password becomes the master password",
        BootstrapDecision::Trusted => "trusted, no prompt needed",
        BootstrapDecision::Expired => "expired, password required",
    }
}

fn read_stdin() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}
