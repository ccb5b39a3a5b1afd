mod api;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use cp_domain::config::Config;
use cp_graph::GraphRuntime;
use cp_model::{HttpModelAdapter, MockModelAdapter, ModelAdapter};
use cp_runner::AgentRunner;
use cp_sessions::SessionStore;
use cp_tools::{stubs, ToolRegistry};

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(load_config()?);
    tracing::info!("clinical-pipeline gateway starting");

    // ── Model adapter ────────────────────────────────────────────────
    // `CP_MOCK_MODEL=1` swaps in a canned adapter for local smoke-testing
    // without a live completions endpoint; production always uses the
    // HTTP adapter against `config.model` (spec.md §4.A, §6.4).
    let model: Arc<dyn ModelAdapter> = if std::env::var("CP_MOCK_MODEL").is_ok() {
        tracing::warn!("CP_MOCK_MODEL set — using the mock model adapter, not a live endpoint");
        Arc::new(MockModelAdapter::new())
    } else {
        let api_key = config
            .model
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok());
        Arc::new(HttpModelAdapter::new(&config.model, api_key, config.timeouts.lm_call())?)
    };
    tracing::info!(base_url = %config.model.base_url, model = %config.model.model, "model adapter ready");

    // ── Tool registry ─────────────────────────────────────────────────
    let tools = Arc::new(ToolRegistry::new());
    register_stub_tools(&tools).await;
    tracing::info!(tools = tools.names().await.len(), "tool registry ready");

    // ── Session store ───────────────────────────────────────────────
    let sessions = Arc::new(match &config.sessions.data_dir {
        Some(dir) => SessionStore::open(dir).context("opening session store")?,
        None => {
            tracing::warn!("no [sessions].data_dir configured — sessions are in-memory only");
            SessionStore::in_memory()
        }
    });
    tracing::info!(sessions = sessions.list().len(), "session store ready");

    // ── Graph runtime + runner ───────────────────────────────────────
    let graph = Arc::new(GraphRuntime::new(model, tools.clone(), config.graph.clone()));
    let runner = Arc::new(AgentRunner::new(graph.clone(), sessions.clone()));
    tracing::info!(tool_loop_ceiling = config.graph.tool_loop_ceiling, "graph runtime ready");

    let app_state = AppState {
        config: config.clone(),
        sessions,
        tools,
        graph,
        runner,
    };

    // ── Router ───────────────────────────────────────────────────────
    let cors_layer = build_cors_layer(&config.server.cors);
    let app = api::router().layer(cors_layer).with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "clinical-pipeline gateway listening");

    axum::serve(listener, app).await.context("axum server error")?;
    Ok(())
}

/// Initialize structured JSON tracing (spec.md "ambient stack" — carried
/// from the teacher regardless of this spec's observability non-goals).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cp_gateway=debug")),
        )
        .json()
        .init();
}

/// Load configuration from `CP_CONFIG_PATH` (TOML), falling back to
/// built-in defaults when unset or unreadable — config *loading* is out
/// of this core's scope (spec.md §1), but the gateway binary still needs
/// somewhere to read it from.
fn load_config() -> anyhow::Result<Config> {
    match std::env::var("CP_CONFIG_PATH") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            Config::from_toml_str(&raw).with_context(|| format!("parsing {path}"))
        }
        Err(_) => Ok(Config::default()),
    }
}

/// Register the six external-tool stand-ins plus the local FHIR record
/// store (spec.md §1's "individual external medical-data endpoints" are
/// out of this core's scope; `cp-tools::stubs` stands in for them at the
/// gateway's startup boundary — see `crates/tools/src/stubs.rs`).
async fn register_stub_tools(tools: &ToolRegistry) {
    tools
        .register(
            "check_drug_safety",
            "Look up FDA boxed warnings for a drug",
            vec![("brand_name", "brand or generic drug name")],
            Arc::new(stubs::CheckDrugSafety),
            Default::default(),
        )
        .await;
    tools
        .register(
            "check_drug_interactions",
            "Check for interactions among a list of drugs",
            vec![("drug_names", "list of drug names")],
            Arc::new(stubs::CheckDrugInteractions),
            Default::default(),
        )
        .await;
    tools
        .register(
            "search_medical_literature",
            "Search medical literature (PubMed-style)",
            vec![("query", "search query")],
            Arc::new(stubs::SearchMedicalLiterature),
            Default::default(),
        )
        .await;
    tools
        .register(
            "find_clinical_trials",
            "Search active clinical trials for a condition",
            vec![("condition", "condition or disease name")],
            Arc::new(stubs::FindClinicalTrials),
            Default::default(),
        )
        .await;
    tools
        .register(
            "analyze_medical_image",
            "Analyze an attached medical image",
            vec![],
            Arc::new(stubs::AnalyzeMedicalImage),
            Default::default(),
        )
        .await;
    tools
        .register(
            "get_patient_record",
            "Look up a patient's record in the local chart store",
            vec![("patient_name", "patient name to search for")],
            Arc::new(stubs::GetPatientRecord),
            Default::default(),
        )
        .await;
    tools
        .register(
            "update_patient_record",
            "Write a note to a patient's chart",
            vec![("patient_id", "patient identifier"), ("note", "note text")],
            Arc::new(stubs::UpdatePatientRecord),
            Default::default(),
        )
        .await;
}

/// Build a [`CorsLayer`] from the configured allowed origins. Origins may
/// carry a trailing `:*` wildcard port; a bare `"*"` allows everything
/// (grounded on `sa_gateway::main`'s `build_cors_layer`).
fn build_cors_layer(cors: &cp_domain::config::CorsConfig) -> CorsLayer {
    use axum::http::header;

    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();
    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            wildcard_prefixes.push(origin.trim_end_matches('*').to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
