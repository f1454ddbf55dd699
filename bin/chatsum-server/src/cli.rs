//! Command-line interface.
//!
//! With no subcommand the binary runs the HTTP server. Flags override the
//! matching `CHATSUM_*` environment variables.

use clap::{Parser, Subcommand};

use crate::config::Config;

/// Chat storage and conversation summarization service.
#[derive(Parser, Debug)]
#[command(name = "chatsum-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on (overrides CHATSUM_BIND)
    #[arg(short, long, global = true)]
    pub bind: Option<String>,

    /// SQLite database URL (overrides CHATSUM_DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// List Gemini models that support content generation
    Models,

    /// Send a short prompt to each model and report which ones answer
    Probe {
        /// Model to probe; repeat for several (default: CHATSUM_GEMINI_MODEL)
        #[arg(short, long = "model")]
        models: Vec<String>,
    },
}

impl Cli {
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(bind) = &self.bind {
            cfg.bind_address = bind.clone();
        }
        if let Some(url) = &self.database_url {
            cfg.database_url = url.clone();
        }
    }

    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["chatsum-server"]).unwrap();
        assert_eq!(cli.command(), &Command::Serve);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "chatsum-server",
            "--bind",
            "127.0.0.1:9000",
            "--database-url",
            "sqlite://other.db",
        ])
        .unwrap();
        let mut cfg = Config::from_lookup(|_| None);
        cli.apply(&mut cfg);
        assert_eq!(cfg.bind_address, "127.0.0.1:9000");
        assert_eq!(cfg.database_url, "sqlite://other.db");
    }

    #[test]
    fn probe_collects_repeated_models() {
        let cli = Cli::try_parse_from(["chatsum-server", "probe", "-m", "a", "--model", "b"]).unwrap();
        assert_eq!(
            cli.command(),
            &Command::Probe {
                models: vec!["a".into(), "b".into()]
            }
        );
    }
}
