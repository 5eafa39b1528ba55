//! Interface de linha de comando do jobflow baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (demo, steps, summary)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jobflow: motor de workflow para um marketplace de jobs.
#[derive(Debug, Parser)]
#[command(name = "jobflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: `jobflow.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita logs de nível debug.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa a demonstração: um job percorre todas as etapas do workflow.
    Demo,

    /// Lista as etapas do workflow com o percentual de progresso.
    Steps {
        /// Índice (0-11) da etapa atual a destacar.
        #[arg(long)]
        at: Option<usize>,
    },

    /// Resume um arquivo de jobs por status.
    Summary {
        /// Arquivo JSON ou TOML com os registros de job.
        #[arg(long)]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_summary_subcommand() {
        let cli = Cli::parse_from(["jobflow", "summary", "--file", "jobs.json"]);
        match cli.command {
            Command::Summary { file } => assert_eq!(file, PathBuf::from("jobs.json")),
            _ => panic!("expected Summary command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["jobflow", "--config", "custom.toml", "--verbose", "demo"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Command::Demo));
    }

    #[test]
    fn cli_parses_steps_with_current_index() {
        let cli = Cli::parse_from(["jobflow", "steps", "--at", "5"]);
        assert!(matches!(cli.command, Command::Steps { at: Some(5) }));
    }

    #[test]
    fn summary_requires_file() {
        assert!(Cli::try_parse_from(["jobflow", "summary"]).is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
