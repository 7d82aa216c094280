//! Terminal password prompt.
//!
//! Stands in for the popup UI: watches the session's prompt flag and answers
//! it from the terminal.

use std::sync::Arc;

use passgate_core::{Environment, KeyValueStore};
use passgate_session::{SecretCipher, SessionError, SessionManager};
use tokio::task::JoinHandle;

/// Password entries per command before the prompt is cancelled.
///
/// Commands retry a mismatched wait exactly this often, so the prompt task
/// never starts a read nobody is waiting for.
pub const MAX_ATTEMPTS: u32 = 3;

/// Answer password prompts until the manager shuts down.
pub fn spawn<S, C, E>(manager: Arc<SessionManager<S, C, E>>) -> JoinHandle<()>
where
    S: KeyValueStore,
    C: SecretCipher,
    E: Environment,
{
    tokio::spawn(async move {
        let mut asking = manager.asking_for_password();
        let mut failures = 0;

        loop {
            if asking.wait_for(|raised| *raised).await.is_err() {
                break;
            }

            let entered = tokio::task::spawn_blocking(read_password).await;
            let raw = match entered {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "could not read password");
                    manager.cancel_asking_for_password();
                    continue;
                },
                Err(e) => {
                    tracing::error!(error = %e, "password reader failed");
                    manager.cancel_asking_for_password();
                    continue;
                },
            };

            match manager.set_password(&raw) {
                Ok(()) => failures = 0,
                Err(SessionError::PasswordMismatch) => {
                    failures += 1;
                    if failures >= MAX_ATTEMPTS {
                        tracing::warn!(failures, "too many wrong passwords");
                        manager.cancel_asking_for_password();
                        failures = 0;
                    }
                },
                Err(SessionError::ShutDown) => break,
                Err(e) => {
                    tracing::error!(error = %e, "could not verify password");
                    manager.cancel_asking_for_password();
                },
            }
        }
    })
}

fn read_password() -> Result<String, dialoguer::Error> {
    dialoguer::Password::new().with_prompt("Master password").interact()
}
