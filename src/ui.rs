//! Interface de terminal do jobflow: barra de progresso e saída colorida.
//!
//! Usa `indicatif` para a barra de progresso do workflow e `console` para
//! estilização com cores. O [`WorkflowProgress`] acompanha visualmente um
//! job percorrendo as etapas.

use anyhow::Result;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use jobflow::error::EngineError;
use jobflow::notify::Notification;
use jobflow::workflow::{JobRecord, JobStatus, StepPosition, WorkflowStep};

/// Barra de progresso de um job no terminal, de 0 a 100%.
///
/// Cada transição aplicada avança a barra e imprime a etapa em verde;
/// rejeições aparecem em vermelho sem mover a barra.
pub struct WorkflowProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    // Estilo verde para transições aplicadas.
    green: Style,
    // Estilo vermelho para transições rejeitadas.
    red: Style,
    dim: Style,
}

impl WorkflowProgress {
    /// Cria a barra para o job informado.
    pub fn start(job: &JobRecord) -> Result<Self> {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:32.cyan/blue} {pos:>3}% {msg}")?
                .progress_chars("=> "),
        );
        pb.set_position(u64::from(job.progress()));
        pb.set_message(job.workflow_step.display_name());

        let progress = Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
        };
        progress.pb.println(format!(
            "{} {} ({})",
            Style::new().bold().apply_to(&job.title),
            progress.dim.apply_to(&job.id),
            job.status
        ));
        Ok(progress)
    }

    /// Registra uma transição aplicada.
    pub fn applied(&self, operation: &str, job: &JobRecord) {
        self.pb.set_position(u64::from(job.progress()));
        self.pb.set_message(job.workflow_step.display_name());
        self.pb.println(format!(
            "  {} {operation:<38} {}",
            self.green.apply_to("✓"),
            job.workflow_step
        ));
    }

    /// Registra uma transição rejeitada.
    pub fn rejected(&self, err: &EngineError) {
        self.pb
            .println(format!("  {} {err}", self.red.apply_to("✗")));
    }

    /// Finaliza a barra com o status final do job.
    pub fn finish(&self, job: &JobRecord) {
        self.pb.finish_and_clear();
        let style = status_style(job.status);
        println!(
            "  {} {} at {}%",
            style.apply_to(job.status.to_string()),
            job.workflow_step.display_name(),
            job.progress()
        );
    }
}

fn status_style(status: JobStatus) -> Style {
    match status {
        JobStatus::Completed => Style::new().green().bold(),
        JobStatus::Cancelled => Style::new().red().bold(),
        JobStatus::Draft => Style::new().dim(),
        JobStatus::Active | JobStatus::InProgress => Style::new().yellow(),
    }
}

fn step_marker(position: StepPosition) -> &'static str {
    match position {
        StepPosition::Completed => "✓",
        StepPosition::Current => "▶",
        StepPosition::Upcoming => "·",
    }
}

/// Imprime a tabela de etapas; `current` destaca a etapa atual.
pub fn print_steps(current: Option<WorkflowStep>) {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to("─── Workflow Steps ───"));
    for step in WorkflowStep::ORDER {
        let marker = current.map_or(" ", |c| step_marker(step.position_relative_to(c)));
        println!(
            "  {marker} {:>2}  {:<30} {:>3}%",
            step.index(),
            step.to_string(),
            step.progress()
        );
    }
}

/// Imprime a caixa de entrada de um destinatário, mais recentes primeiro.
pub fn print_inbox(recipient: &str, notes: &[Notification], unread: usize) {
    let bold = Style::new().bold();
    let dim = Style::new().dim();
    println!();
    println!(
        "{} {}",
        bold.apply_to(format!("─── {recipient} ───")),
        dim.apply_to(format!("{unread} unread"))
    );
    if notes.is_empty() {
        println!("  {}", dim.apply_to("(empty)"));
    }
    for note in notes {
        let flag = if note.is_read { " " } else { "•" };
        println!(
            "  {} {}: {}",
            Style::new().cyan().apply_to(flag),
            bold.apply_to(&note.title),
            note.message
        );
    }
}

/// Imprime as contagens por status, os registros inconsistentes e os ids
/// repetidos no arquivo (só o último registro de cada id é contado).
pub fn print_summary(
    counts: &[(JobStatus, usize)],
    inconsistent: &[JobRecord],
    duplicates: &[(String, usize)],
) {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to("─── Jobs by Status ───"));
    for (status, count) in counts {
        println!("  {:<12} {count:>4}", status_style(*status).apply_to(status.to_string()));
    }
    if !inconsistent.is_empty() {
        let red = Style::new().red().bold();
        println!();
        println!("{}", red.apply_to("─── Inconsistent Records ───"));
        for job in inconsistent {
            println!("  {} {} is {} at {}", red.apply_to("✗"), job.id, job.status, job.workflow_step);
        }
    }
    if !duplicates.is_empty() {
        let yellow = Style::new().yellow().bold();
        println!();
        println!("{}", yellow.apply_to("─── Duplicate Ids ───"));
        for (id, count) in duplicates {
            println!("  {} {id} appears {count} times", yellow.apply_to("!"));
        }
    }
}
