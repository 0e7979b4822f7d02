use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pension_view::api::{DEFAULT_SCREEN_WIDTH, describe_change, run_http_server};
use pension_view::client::{CalcClient, ClientConfig, DEFAULT_BASE_URL, PlanQuery};
use pension_view::core::format::{format_brl, format_brl_opt};
use pension_view::core::{
    ChartLayout, ChartMode, ChartView, MonthlyRecord, ProjectionPayload, SimulationRequest,
    build_chart, diagnose,
};
use pension_view::session::SessionManager;
use pension_view::storage::{FileStore, default_store_path};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliChartMode {
    Beneficio,
    Saldo,
}

impl From<CliChartMode> for ChartMode {
    fn from(value: CliChartMode) -> Self {
        match value {
            CliChartMode::Beneficio => ChartMode::Benefit,
            CliChartMode::Saldo => ChartMode::Balance,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pension-view", version, about = "Pension projection dashboard and chart service")]
struct Cli {
    #[arg(long, global = true, env = "PENSION_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    api_base_url: String,
    #[arg(long, global = true, env = "PENSION_STORE", help = "Session file; defaults to the user data directory")]
    store: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Render the yearly chart series of a projection file.
    Chart {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = CliChartMode::Beneficio)]
        mode: CliChartMode,
        #[arg(long, default_value_t = DEFAULT_SCREEN_WIDTH)]
        screen_width: f64,
    },
    /// Show the exact values behind one rendered chart point.
    Detail {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        index: i64,
        #[arg(long, default_value_t = DEFAULT_SCREEN_WIDTH)]
        screen_width: f64,
    },
    Login {
        #[arg(long)]
        cpf: String,
        #[arg(long, env = "PENSION_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Fetch the plan, project it as currently paid, and print the diagnosis.
    Dashboard {
        #[arg(long, default_value_t = DEFAULT_SCREEN_WIDTH)]
        screen_width: f64,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectionFile {
    Payload(ProjectionPayload),
    Records(Vec<MonthlyRecord>),
}

fn read_projection(path: &Path) -> Result<Vec<MonthlyRecord>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed: ProjectionFile = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a projection", path.display()))?;
    Ok(match parsed {
        ProjectionFile::Payload(payload) => payload.records,
        ProjectionFile::Records(records) => records,
    })
}

fn print_chart(chart: &ChartView) {
    println!("{}", chart.title);
    println!("y axis: {}", chart.y_ticks.join(" | "));
    for (label, value) in chart.labels.iter().zip(&chart.values) {
        println!("  {label}  {}", format_brl(*value));
    }
}

fn session_manager(cli: &Cli) -> Result<SessionManager<FileStore>> {
    let path = cli
        .store
        .clone()
        .or_else(default_store_path)
        .context("no user data directory; pass --store")?;
    Ok(SessionManager::new(FileStore::new(path)))
}

fn client(cli: &Cli) -> Result<CalcClient> {
    CalcClient::new(ClientConfig {
        base_url: cli.api_base_url.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
    })
    .context("building HTTP client")
}

async fn dashboard(cli: &Cli, screen_width: f64) -> Result<()> {
    let sessions = session_manager(cli)?;
    let Some(session) = sessions.load().context("loading session")? else {
        bail!("not signed in; run `pension-view login` first");
    };
    let client = client(cli)?;
    let today = Local::now().date_naive();
    let birth = session
        .user
        .parsed_birth_date()
        .with_context(|| format!("unreadable birth date {:?}", session.user.birth_date))?;

    let pension = client
        .pension_data(&PlanQuery::for_session(&session))
        .await
        .context("fetching pension data")?;
    sessions.cache_pension(&pension).context("caching pension data")?;
    let request = SimulationRequest::for_dashboard(&pension, birth, today)?;
    let projection = client.simulate(&request).await.context("projecting benefit")?;
    let diagnosis = diagnose(&pension, &projection, birth, today);

    println!("Olá, {} | {}", session.user.first_name(), session.product.plan_name);
    println!("Saldo: {}", format_brl(pension.balance.value));
    println!("Benefício atual: {}", format_brl(diagnosis.current_benefit));
    if let Some(form) = &diagnosis.payment_form {
        println!("{form}");
    }
    println!(
        "Saldo até {} (mais {} anos) | {}",
        diagnosis.depletion_date, diagnosis.years_remaining, diagnosis.termination_reason
    );
    println!("Benefício final: {}", format_brl_opt(diagnosis.final_benefit));
    if let Some((label, _)) = describe_change(&diagnosis) {
        println!("Variação do benefício: {label}");
    }

    let max_points = ChartLayout::new(screen_width).max_points();
    for mode in [ChartMode::Benefit, ChartMode::Balance] {
        print_chart(&build_chart(&projection.records, mode, max_points)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Serve { port } => {
            run_http_server(*port, client(&cli)?).await?;
        }
        Command::Chart {
            input,
            mode,
            screen_width,
        } => {
            let records = read_projection(input)?;
            let max_points = ChartLayout::new(*screen_width).max_points();
            print_chart(&build_chart(&records, (*mode).into(), max_points)?);
        }
        Command::Detail {
            input,
            index,
            screen_width,
        } => {
            let records = read_projection(input)?;
            let max_points = ChartLayout::new(*screen_width).max_points();
            let point = build_chart(&records, ChartMode::Benefit, max_points)?.detail(*index)?;
            println!("Ano: {}", point.year);
            println!("Saldo: {}", format_brl(point.opening_balance));
            println!("Benefício: {}", format_brl(point.paid_benefit));
        }
        Command::Login { cpf, password } => {
            let session = client(&cli)?
                .sign_in(cpf, password)
                .await
                .context("signing in")?;
            let name = session.user.first_name().to_string();
            session_manager(&cli)?.save(session)?;
            info!("signed in");
            println!("Bem-vindo, {name}.");
        }
        Command::Logout => {
            session_manager(&cli)?.clear()?;
            println!("Sessão encerrada.");
        }
        Command::Dashboard { screen_width } => dashboard(&cli, *screen_width).await?,
    }
    Ok(())
}
