use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use churn_dash::chart::{ChartKind, ChartSpec, ChartSurface};
use churn_dash::config::DEFAULT_BASE_URL;
use churn_dash::{
    ranking_csv, BulkResultRow, BulkTable, BusyControl, BusyGuard, ChartRenderer, ClientConfig,
    ClientError, FormInputs, KpiView, Operation, PredictionClient, PredictionRequest,
    PredictionResponse, RuleEffect, UploadFile, ViewMode, PREDICT_BUSY_LABEL, UPLOAD_BUSY_LABEL,
};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Customer churn-risk dashboard for the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one customer and show the KPI cards and charts
    Predict(PredictArgs),
    /// Upload a CSV of customers and show the ranked results
    Upload(UploadArgs),
    /// Print which regions each view mode shows or hides
    Layout(LayoutArgs),
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Base URL of the prediction service
    #[arg(long, env = "CHURN_API_URL", default_value = DEFAULT_BASE_URL, value_hint = ValueHint::Url)]
    api_url: String,

    /// Abort a prediction that takes longer than this (milliseconds)
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl ServiceArgs {
    fn client(&self) -> Result<PredictionClient> {
        let config = ClientConfig::new(&self.api_url)?
            .with_predict_timeout(Duration::from_millis(self.timeout_ms));
        Ok(PredictionClient::new(config)?)
    }
}

#[derive(Parser, Debug)]
struct PredictArgs {
    /// Months with the company
    #[arg(long, default_value = "")]
    tenure: String,

    /// Monthly charge in dollars
    #[arg(long, default_value = "")]
    monthly_charges: String,

    /// Total charged to date in dollars
    #[arg(long, default_value = "")]
    total_charges: String,

    /// 1 for senior citizens, 0 otherwise
    #[arg(long, default_value = "0")]
    senior_citizen: String,

    /// Contract type (Month-to-month, One year, Two year)
    #[arg(long, default_value = "Month-to-month")]
    contract: String,

    /// Customer gender (Male, Female)
    #[arg(long, default_value = "Male")]
    gender: String,

    /// Print the service response as JSON instead of the dashboard
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Parser, Debug)]
struct UploadArgs {
    /// CSV file with one customer per row
    #[arg(value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// Also write the ranking as CSV (`-` for stdout)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// View mode to describe
    #[arg(value_enum, default_value_t = ModeOpt::Single)]
    mode: ModeOpt,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeOpt {
    Single,
    Bulk,
}

impl From<ModeOpt> for ViewMode {
    fn from(value: ModeOpt) -> Self {
        match value {
            ModeOpt::Single => ViewMode::Single,
            ModeOpt::Bulk => ViewMode::Bulk,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match &cli.command {
        Command::Predict(args) if args.service.verbose => "debug",
        Command::Upload(args) if args.service.verbose => "debug",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Upload(args) => handle_upload(args),
        Command::Layout(args) => handle_layout(args),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn handle_predict(args: PredictArgs) -> Result<()> {
    let inputs = FormInputs {
        tenure: args.tenure,
        monthly_charges: args.monthly_charges,
        total_charges: args.total_charges,
        senior_citizen: args.senior_citizen,
        contract: args.contract,
        gender: args.gender,
    };
    let request = PredictionRequest::from_inputs(&inputs);
    let client = args.service.client()?;
    info!(url = %client.config().predict_url(), "requesting prediction");

    let status = StatusLine::new("Predict Risk");
    let outcome = runtime()?.block_on(predict_with(&client, &request, &status));
    let response = outcome.map_err(|err| report(err, Operation::Predict))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let view = KpiView::render(&response);
    let mut charts = ChartRenderer::new(TextSurface::default());
    charts.render(&request, response.probability);

    print!("{}", format_kpis(&view, &Local::now().format("%H:%M:%S").to_string()));
    print!("{}", charts.surface().output);
    Ok(())
}

fn handle_upload(args: UploadArgs) -> Result<()> {
    let file = match &args.file {
        Some(path) => Some(read_upload(path)?),
        None => None,
    };
    let client = args.service.client()?;

    let status = StatusLine::new("Upload & Analyze");
    let outcome = runtime()?.block_on(upload_with(&client, file.as_ref(), &status));
    let rows = outcome.map_err(|err| report(err, Operation::Upload))?;

    let table = BulkTable::render(&rows);
    print!("{}", format_table(&table));

    if let Some(path) = &args.output {
        let csv = ranking_csv(&table).context("failed to encode ranking CSV")?;
        if path.as_os_str() == "-" {
            print!("{csv}");
        } else {
            fs::write(path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote ranking CSV: {}", path.display());
        }
    }
    Ok(())
}

/// Runs a prediction with `control` busy for exactly the duration of the call.
async fn predict_with<C: BusyControl>(
    client: &PredictionClient,
    request: &PredictionRequest,
    control: C,
) -> churn_dash::Result<PredictionResponse> {
    let _busy = BusyGuard::engage(control, PREDICT_BUSY_LABEL);
    client.predict(request).await
}

/// Without a file the control is left alone and nothing is sent.
async fn upload_with<C: BusyControl>(
    client: &PredictionClient,
    file: Option<&UploadFile>,
    control: C,
) -> churn_dash::Result<Vec<BulkResultRow>> {
    let _busy = file.map(|_| BusyGuard::engage(control, UPLOAD_BUSY_LABEL));
    client.upload(file).await
}

fn handle_layout(args: LayoutArgs) -> Result<()> {
    let mode = ViewMode::from(args.mode);
    println!("mode: {mode}");
    for rule in mode.layout() {
        let effect = match rule.effect {
            RuleEffect::Display(value) => format!("display: {value}"),
            RuleEffect::Class(value) => format!("class: {value}"),
        };
        println!("  {:<18} {}", rule.region.selector(), effect);
    }
    Ok(())
}

fn read_upload(path: &Path) -> Result<UploadFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    Ok(UploadFile::new(name, bytes))
}

/// Log the detailed failure and surface only the static user message.
fn report(err: ClientError, op: Operation) -> anyhow::Error {
    error!(%err, ?op, "call failed");
    anyhow!(err.user_message(op))
}

/// Busy indicator on stderr standing in for the triggering button.
struct StatusLine {
    label: RefCell<String>,
    disabled: Cell<bool>,
}

impl StatusLine {
    fn new(label: &str) -> Self {
        Self {
            label: RefCell::new(label.to_string()),
            disabled: Cell::new(false),
        }
    }
}

impl BusyControl for &StatusLine {
    fn label(&self) -> String {
        self.label.borrow().clone()
    }

    fn set_label(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
        let mut stderr = io::stderr();
        if disabled {
            let _ = write!(stderr, "{}", self.label.borrow());
        } else {
            let _ = write!(stderr, "\r\x1b[2K");
        }
        let _ = stderr.flush();
    }
}

const BAR_WIDTH: usize = 40;

/// Draws charts as text. Handles are the chart kind; an update redraws the
/// chart below the previous drawing.
#[derive(Default)]
struct TextSurface {
    output: String,
}

impl TextSurface {
    fn draw(&mut self, kind: ChartKind, data: &[f64]) {
        match kind {
            ChartKind::Usage => {
                let _ = writeln!(self.output, "\nUsage");
                let max = data.iter().cloned().fold(0.0_f64, f64::max);
                for (label, value) in kind.labels().iter().zip(data) {
                    let filled = if max > 0.0 {
                        ((value.max(0.0) / max) * BAR_WIDTH as f64).round() as usize
                    } else {
                        0
                    };
                    let _ = writeln!(
                        self.output,
                        "  {:<14} {:<width$} {:.1}",
                        label,
                        "█".repeat(filled),
                        value,
                        width = BAR_WIDTH
                    );
                }
            }
            ChartKind::Risk => {
                let _ = writeln!(self.output, "\nRisk split");
                let risk = data.first().copied().unwrap_or(0.0).clamp(0.0, 100.0);
                let filled = ((risk / 100.0) * BAR_WIDTH as f64).round() as usize;
                let _ = writeln!(
                    self.output,
                    "  {}{}",
                    "█".repeat(filled),
                    "░".repeat(BAR_WIDTH - filled)
                );
                for (label, value) in kind.labels().iter().zip(data) {
                    let _ = writeln!(self.output, "  {:<20} {:.1}", label, value);
                }
            }
        }
    }
}

impl ChartSurface for TextSurface {
    type Handle = ChartKind;

    fn create(&mut self, spec: &ChartSpec) -> Option<ChartKind> {
        self.draw(spec.kind, &spec.data);
        Some(spec.kind)
    }

    fn update(&mut self, _handle: &mut ChartKind, kind: ChartKind, data: &[f64]) {
        self.draw(kind, data);
    }
}

fn format_kpis(view: &KpiView, updated_at: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Churn probability  {:<10} [{}]",
        view.probability_text,
        view.probability_card_class()
    );
    let _ = writeln!(
        out,
        "Risk level         {:<10} [{}]",
        view.risk_text,
        view.risk_card_class()
    );
    let _ = writeln!(out, "Top reason         {}", view.reason_text);
    let _ = writeln!(out, "Suggestion         {}", view.suggestion_text);
    let _ = writeln!(out, "Tip                {}", view.tip_text);
    let _ = writeln!(out, "Last updated       {updated_at}");
    out
}

fn format_table(table: &BulkTable) -> String {
    let headers = ["Rank", "Customer", "Probability", "Risk", "Top reason"];
    let cells: Vec<[String; 5]> = table
        .rows
        .iter()
        .map(|row| {
            [
                row.rank_label(),
                row.customer_id.clone(),
                row.probability_text.clone(),
                format!("{} ({})", row.risk, row.badge_color),
                row.top_reason.clone(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |values: &[&str]| {
        let line: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    };
    push_line(&headers);
    for row in &cells {
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&refs);
    }
    if table.is_empty() {
        let _ = writeln!(out, "(no rows)");
    }
    out
}
