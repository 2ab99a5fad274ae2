//! Configuração do enroll carregada a partir de `enroll.toml`.
//!
//! A struct [`EnrollConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `ENROLL_API_TOKEN` tem precedência sobre o arquivo,
//! e as flags da CLI têm precedência sobre ambos.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::backoff::{DEFAULT_BASE_INTERVAL, DEFAULT_MAX_RETRIES};
use crate::cli::Cli;
use crate::error::EnrollError;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "enroll.toml";

/// Variável de ambiente com o token da API.
pub const TOKEN_ENV: &str = "ENROLL_API_TOKEN";

/// Configuração de nível superior carregada de `enroll.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollConfig {
    /// URL do endpoint de criação de usuários.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Token enviado no cabeçalho `Authorization: Bearer`.
    #[serde(default)]
    pub api_token: String,

    /// Máximo de tentativas por registro.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Intervalo base em segundos para o backoff exponencial.
    #[serde(default = "default_base_interval_secs")]
    pub base_interval_secs: u64,

    /// Timeout de cada requisição, em segundos.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Arquivo onde os logs são gravados.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

// Valor padrão para o endpoint.
fn default_endpoint_url() -> String {
    "https://example.com/api/create_user".to_string()
}

// Valor padrão para tentativas máximas: 5.
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

// Valor padrão para o intervalo base: 2s.
fn default_base_interval_secs() -> u64 {
    DEFAULT_BASE_INTERVAL.as_secs()
}

// Valor padrão para o timeout: 10s.
fn default_timeout_secs() -> u64 {
    10
}

fn default_log_file() -> PathBuf {
    PathBuf::from("error_log.txt")
}

impl Default for EnrollConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            api_token: String::new(),
            max_retries: default_max_retries(),
            base_interval_secs: default_base_interval_secs(),
            timeout_secs: default_timeout_secs(),
            log_file: default_log_file(),
        }
    }
}

impl EnrollConfig {
    /// Carrega a configuração de `enroll.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito; ausente significa defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<EnrollConfig>(&contents)
                .map_err(EnrollError::from)
                .with_context(|| format!("invalid config file {}", path.display()))?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração para o token.
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                config.api_token = token;
            }
        }

        Ok(config)
    }

    /// Aplica as flags da CLI por cima da configuração carregada.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.endpoint_url {
            self.endpoint_url = url.clone();
        }
        if let Some(token) = &cli.api_token {
            self.api_token = token.clone();
        }
        if let Some(n) = cli.max_retries {
            self.max_retries = n;
        }
        if let Some(secs) = cli.base_interval {
            self.base_interval_secs = secs;
        }
    }

    /// Verifica os valores necessários para submeter registros.
    pub fn validate(&self) -> Result<(), EnrollError> {
        if self.api_token.trim().is_empty() {
            return Err(EnrollError::MissingToken);
        }
        if self.max_retries == 0 {
            return Err(EnrollError::Config("max_retries must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(EnrollError::Config("timeout_secs must be greater than 0".into()));
        }
        if self.endpoint_url.trim().is_empty() {
            return Err(EnrollError::Config("endpoint_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_secs(self.base_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
