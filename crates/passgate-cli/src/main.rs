//! Passgate command line.
//!
//! # Usage
//!
//! ```bash
//! # Seal a secret (prompts for the master password when needed)
//! passgate --store ~/.passgate.redb encrypt "api token"
//!
//! # Open it again
//! passgate --store ~/.passgate.redb decrypt secret.txt
//!
//! # Show whether the cached password is still trusted
//! passgate --store ~/.passgate.redb status
//!
//! # Forget the password
//! passgate --store ~/.passgate.redb lock
//! ```

mod command;
mod prompt;

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use passgate_core::{RedbStore, SessionConfig, SystemEnv};
use passgate_session::{ArmoredCipher, SessionManager};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Password-gated secret encryption
/// Ten years.
const MAX_FRESHNESS_HOURS: u64 = 87_600;

#[derive(Parser, Debug)]
#[command(name = "passgate")]
#[command(about = "Encrypt and decrypt secrets behind a master password")]
#[command(version)]
struct Args {
    /// Path to the session database
    #[arg(short, long, default_value = "passgate.redb")]
    store: PathBuf,

    /// Hours a verified password is trusted across runs
    #[arg(
        long,
        default_value = "24",
        value_parser = clap::value_parser!(u64).range(..=MAX_FRESHNESS_HOURS)
    )]
    freshness_hours: u64,

    /// PBKDF2 rounds for newly sealed secrets
    #[arg(long, default_value_t = SessionConfig::default().kdf_rounds)]
    kdf_rounds: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Show the persisted session and whether it is trusted
    Status,
    /// Encrypt text (argument or stdin) and print the armored message
    Encrypt {
        /// Text to encrypt; read from stdin when absent
        text: Option<String>,
    },
    /// Decrypt an armored message (file or stdin) and print the plaintext
    Decrypt {
        /// File holding the armored message; stdin when absent
        file: Option<PathBuf>,
    },
    /// Forget the master password
    Lock,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_freshness_window(Duration::from_secs(self.freshness_hours.saturating_mul(3600)))
            .with_kdf_rounds(self.kdf_rounds)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries command output only
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = args.session_config().validate()?;
    let store = RedbStore::open(&args.store)?;
    tracing::debug!(store = %args.store.display(), "opened session store");

    let env = SystemEnv::new();
    let cipher = ArmoredCipher::new(env.clone(), config.kdf_rounds);
    let manager = Arc::new(SessionManager::new(store, cipher, env, config));

    let decision = manager.bootstrap()?;
    let result = command::run(&args.command, &manager, decision).await;

    manager.teardown();
    result
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["passgate", "status"]).unwrap();
        assert_eq!(args.store, PathBuf::from("passgate.redb"));
        assert_eq!(args.command, Command::Status);
        assert_eq!(args.session_config(), SessionConfig::default());
    }

    #[test]
    fn overrides_map_onto_config() {
        let args = Args::try_parse_from([
            "passgate",
            "--store",
            "/tmp/s.redb",
            "--freshness-hours",
            "2",
            "--kdf-rounds",
            "5000",
            "decrypt",
            "msg.txt",
        ])
        .unwrap();

        let config = args.session_config();
        assert_eq!(config.freshness_window, Duration::from_secs(7200));
        assert_eq!(config.kdf_rounds, 5000);
        assert_eq!(args.command, Command::Decrypt { file: Some(PathBuf::from("msg.txt")) });
    }

    #[test]
    fn oversized_freshness_window_is_rejected() {
        let parse = |hours: u64| {
            let hours = hours.to_string();
            Args::try_parse_from(["passgate", "--freshness-hours", hours.as_str(), "status"])
        };
        assert!(parse(MAX_FRESHNESS_HOURS + 1).is_err());
        assert!(parse(u64::MAX).is_err());

        let args = parse(MAX_FRESHNESS_HOURS).unwrap();
        assert_eq!(
            args.session_config().freshness_window,
            Duration::from_secs(MAX_FRESHNESS_HOURS * 3600)
        );
    }

    #[test]
    fn encrypt_text_is_optional() {
        let args = Args::try_parse_from(["passgate", "encrypt"]).unwrap();
        assert_eq!(args.command, Command::Encrypt { text: None });
    }
}
