//! Configuração do jobflow carregada a partir de `jobflow.toml`.
//!
//! A struct [`EngineConfig`] contém os parâmetros do motor e da CLI.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `JOBFLOW_LOG` tem precedência sobre `log_filter`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::error::AppError;

/// Nome do arquivo procurado no diretório atual.
pub const CONFIG_FILE: &str = "jobflow.toml";

/// Variável de ambiente que sobrescreve o filtro de log.
pub const LOG_ENV: &str = "JOBFLOW_LOG";

/// Configuração de nível superior carregada de `jobflow.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Capacidade do canal de broadcast de cada store.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Filtro do `tracing-subscriber` (ex.: `"info"`, `"jobflow=debug"`).
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Se a demo deve carregar jobs e notificações de exemplo.
    #[serde(default = "default_sample_data")]
    pub sample_data: bool,
}

// Valor padrão da capacidade do canal: 256 snapshots.
fn default_channel_capacity() -> usize {
    crate::store::DEFAULT_CAPACITY
}

// Valor padrão do filtro de log: "info".
fn default_log_filter() -> String {
    "info".to_string()
}

fn default_sample_data() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            log_filter: default_log_filter(),
            sample_data: default_sample_data(),
        }
    }
}

impl EngineConfig {
    /// Carrega a configuração de `jobflow.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<EngineConfig>(&contents).map_err(AppError::from)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo.
        if let Ok(filter) = std::env::var(LOG_ENV)
            && !filter.is_empty()
        {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejeita valores que o runtime não aceita.
    fn validate(&self) -> Result<(), AppError> {
        // broadcast::channel entra em pânico com capacidade zero.
        if self.channel_capacity == 0 {
            return Err(AppError::Config(
                "channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.channel_capacity, 256);
        assert_eq!(config.log_filter, "info");
        assert!(config.sample_data);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            channel_capacity = 32
            sample_data = false
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.channel_capacity, 32);
        assert!(!config.sample_data);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = 8").unwrap();
        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.channel_capacity, 8);
        assert!(config.sample_data);
    }

    #[test]
    fn load_from_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = 0").unwrap();
        let err = EngineConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = \"many\"").unwrap();
        assert!(EngineConfig::load_from(file.path()).is_err());
    }
}
