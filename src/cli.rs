//! Interface de linha de comando do enroll baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (import, check)
//! e flags globais (--endpoint-url, --api-token, --max-retries, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// enroll: cria usuários em lote a partir de um arquivo CSV.
#[derive(Debug, Parser)]
#[command(name = "enroll", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// URL do endpoint de criação de usuários.
    #[arg(long, global = true, alias = "endpoint_url")]
    pub endpoint_url: Option<String>,

    /// Token da API (também lido de ENROLL_API_TOKEN).
    #[arg(long, global = true, alias = "api_token")]
    pub api_token: Option<String>,

    /// Número máximo de tentativas por registro.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Intervalo base do backoff exponencial, em segundos.
    #[arg(long, global = true)]
    pub base_interval: Option<u64>,

    /// Caminho para o arquivo de configuração (padrão: ./enroll.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Valida e envia cada registro do arquivo para a API.
    Import {
        /// Caminho para o arquivo CSV com os dados dos usuários.
        file: PathBuf,
    },

    /// Apenas lê e valida o arquivo, sem enviar nada.
    Check {
        /// Caminho para o arquivo CSV com os dados dos usuários.
        file: PathBuf,
    },
}
