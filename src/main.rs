use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use funnel_service::config::AppConfig;
use funnel_service::error::AppError;
use funnel_service::funnel::{
    funnel_router, FunnelController, FunnelService, FunnelView, HttpJsonGateway, LeadContact,
    LeadSubmissionClient, LockedAreaInteraction, Profile, ScholarshipQueryClient, Stage,
};
use funnel_service::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct OpsState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Scholarship Lead Funnel",
    about = "Host the scholarship finder lead funnel or drive it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Drive the funnel end to end against the configured upstreams
    Funnel {
        #[command(subcommand)]
        command: FunnelCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum FunnelCommand {
    /// Submit a profile, print the results, and optionally capture a lead
    Run(FunnelRunArgs),
}

#[derive(Args, Debug)]
struct FunnelRunArgs {
    /// Path to a JSON file holding the applicant profile object
    #[arg(long)]
    profile: PathBuf,
    /// Contact name for lead capture
    #[arg(long)]
    name: Option<String>,
    /// Contact email for lead capture
    #[arg(long)]
    email: Option<String>,
    /// Contact phone for lead capture
    #[arg(long)]
    phone: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Funnel {
            command: FunnelCommand::Run(args),
        } => run_funnel(args).await,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let ops_state = OpsState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let gateway = Arc::new(HttpJsonGateway::new(config.upstream.request_timeout)?);
    let service = Arc::new(FunnelService::new(gateway, config.upstream.clone()));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(ops_state)
        .merge(funnel_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead funnel service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_funnel(args: FunnelRunArgs) -> Result<(), AppError> {
    let FunnelRunArgs {
        profile,
        name,
        email,
        phone,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let raw = std::fs::read_to_string(&profile)?;
    let fields = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Object(fields)) => fields,
        Ok(_) => {
            return Err(AppError::ProfileInput(format!(
                "{} must contain a JSON object",
                profile.display()
            )))
        }
        Err(err) => {
            return Err(AppError::ProfileInput(format!(
                "{} is not valid JSON ({err})",
                profile.display()
            )))
        }
    };

    let gateway = Arc::new(HttpJsonGateway::new(config.upstream.request_timeout)?);
    let mut controller = FunnelController::new(
        ScholarshipQueryClient::new(gateway.clone(), config.upstream.scholarship_base_url.clone()),
        LeadSubmissionClient::new(gateway, config.upstream.lead_base_url.clone()),
    );

    controller.submit_profile(Profile(fields)).await;
    render_funnel_view(&controller.view());

    if controller.stage() != Stage::Results {
        return Ok(());
    }

    let contact = match (name, email, phone) {
        (None, None, None) => {
            println!("\nNo contact details supplied; stopping before lead capture.");
            return Ok(());
        }
        (name, email, phone) => LeadContact {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            phone: phone.unwrap_or_default(),
        },
    };

    // Mirror the interactive path: the teaser fires on the first locked-card
    // gesture, then the lead form opens.
    controller.observe_interaction(LockedAreaInteraction::Tap);
    controller.request_lead_form();

    if controller.capture_lead(contact).await {
        println!("\nLead captured. The full report is on its way by email.");
    } else if let Some(presenter) = controller.presenter() {
        if let Some(message) = presenter.view().lead_error {
            println!("\nLead capture failed: {message}");
        }
    }

    render_funnel_view(&controller.view());
    Ok(())
}

fn render_funnel_view(view: &FunnelView) {
    println!("\nStage: {}", view.stage.label());

    if let Some(error) = &view.error {
        println!("Error: {error}");
    }

    let Some(results) = &view.results else {
        return;
    };

    println!(
        "We found {} high-match scholarships (estimated success probability {}%)",
        results.matches_found, results.summary_probability
    );

    println!("\nTop pick");
    println!(
        "- {} | {} | due {} | {}% match",
        results.top_pick.name,
        results.top_pick.amount,
        results.top_pick.deadline,
        results.top_pick.match_score
    );
    println!("  Why you'll win: {}", results.top_pick.one_liner_reason);

    if results.locked.is_empty() {
        println!("\nThis is the only match; request the full report for strategy tips.");
    } else {
        println!("\nLocked matches (details withheld until lead capture)");
        for card in &results.locked {
            println!("- match {}%", card.match_score);
        }
    }

    if let Some(message) = &results.lead_error {
        println!("\nLead capture error: {message}");
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
