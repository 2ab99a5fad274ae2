//! Interface de terminal do enroll: barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso e `console` para
//! estilização com cores. O [`RunProgress`] acompanha visualmente
//! o processamento dos registros no terminal.

use std::io::{self, Write};

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::{Progress, RecordOutcome, RunSummary};
use crate::record::{Record, validate};
use crate::source::SourceError;

/// Indicador visual de progresso para uma execução.
///
/// Exibe uma barra durante o processamento e uma linha colorida por registro:
/// sucesso (verde), registro ignorado (amarelo) e falha (vermelho).
/// Sem terminal (cron, CI, redirecionamento) a barra fica oculta e as linhas
/// vão direto para a saída.
pub struct RunProgress {
    // Barra de progresso do indicatif; oculta até `started`.
    pb: ProgressBar,
    // Destino das linhas quando a barra está oculta.
    out: Box<dyn Write + Send>,
    // Falso quando a saída foi injetada: nunca desenha a barra.
    draw_bar: bool,
    green: Style,
    red: Style,
    yellow: Style,
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl RunProgress {
    pub fn new() -> Self {
        Self {
            pb: ProgressBar::hidden(),
            out: Box::new(io::stdout()),
            draw_bar: true,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Escreve todas as linhas em `out`, sem barra de progresso.
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(out),
            draw_bar: false,
            ..Self::new()
        }
    }

    // Com a barra visível, `println` a mantém no rodapé; oculta, ele descarta a linha.
    fn line(&mut self, text: impl AsRef<str>) {
        if self.pb.is_hidden() {
            let _ = writeln!(self.out, "{}", text.as_ref());
        } else {
            self.pb.println(text);
        }
    }

    /// Formata a linha exibida para o resultado de um registro.
    pub fn outcome_line(&self, outcome: &RecordOutcome) -> String {
        match outcome {
            RecordOutcome::Created { email, attempts } => format!(
                "  {} Successfully created user: {email} ({attempts} attempt{})",
                self.green.apply_to("✓"),
                if *attempts == 1 { "" } else { "s" }
            ),
            RecordOutcome::Skipped { missing } => format!(
                "  {} Skipping invalid record, missing: {}",
                self.yellow.apply_to("⊘"),
                missing.join(", ")
            ),
            RecordOutcome::Exhausted {
                email,
                attempts,
                last_failure,
            } => {
                let mut line = format!(
                    "  {} Failed to create user after {attempts} attempts: {email}",
                    self.red.apply_to("✗")
                );
                if let Some(failure) = last_failure {
                    line.push_str(&format!(" ({}. {})", failure.reason, failure.reason.hint()));
                }
                line
            }
        }
    }

    /// Finaliza a barra e exibe o resumo da execução.
    pub fn finish(&mut self, summary: &RunSummary) {
        self.pb.finish_and_clear();
        if summary.is_empty() {
            self.no_records();
            return;
        }
        let style = if summary.exhausted() > 0 {
            &self.red
        } else {
            &self.green
        };
        let text = style.apply_to(summary.to_string()).to_string();
        let _ = writeln!(self.out, "{text}");
    }

    fn no_records(&mut self) {
        let text = self
            .yellow
            .apply_to("No records found in the provided file.")
            .to_string();
        let _ = writeln!(self.out, "{text}");
    }

    /// Exibe um erro de leitura do arquivo de entrada.
    pub fn source_error(&self, err: &SourceError) {
        eprintln!("{} {err}", self.red.apply_to("Error:"));
    }

    /// Exibe o resultado do comando `check`: uma linha por registro inválido
    /// (com o número da linha no arquivo) e a contagem final.
    pub fn print_check(&mut self, records: &[Record]) -> usize {
        if records.is_empty() {
            self.no_records();
            return 0;
        }
        let mut invalid = 0;
        for (index, record) in records.iter().enumerate() {
            let result = validate(record);
            if !result.is_valid() {
                invalid += 1;
                // Linha 1 é o cabeçalho.
                let text = format!(
                    "  {} line {}: missing {}",
                    self.yellow.apply_to("⊘"),
                    index + 2,
                    result.missing.join(", ")
                );
                let _ = writeln!(self.out, "{text}");
            }
        }
        let valid = records.len() - invalid;
        let style = if invalid > 0 { &self.yellow } else { &self.green };
        let text = style
            .apply_to(format!("{valid} valid, {invalid} invalid"))
            .to_string();
        let _ = writeln!(self.out, "{text}");
        invalid
    }

    /// Imprime o resumo completo formatado em JSON.
    pub fn print_report(&mut self, summary: &RunSummary) {
        let header = self.yellow.apply_to("─── Run Report ───").to_string();
        let body = serde_json::to_string_pretty(summary).unwrap_or_default();
        let _ = writeln!(self.out, "\n{header}\n{body}");
    }
}

impl Progress for RunProgress {
    fn started(&mut self, total: usize) {
        if !self.draw_bar {
            self.pb.set_length(total as u64);
            return;
        }
        self.pb = ProgressBar::new(total as u64);
        self.pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.pb
            .enable_steady_tick(std::time::Duration::from_millis(100));
    }

    fn record_finished(&mut self, _index: usize, record: &Record, outcome: &RecordOutcome) {
        let text = self.outcome_line(outcome);
        self.line(text);
        self.pb.set_message(record.email().to_string());
        self.pb.inc(1);
    }
}
