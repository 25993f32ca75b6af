use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Responder};
use battle_core::{
    compute_submission_hash, Asset, BattleConfig, BattleSession, BattleSubmission, MatchResult,
    MatchSnapshot, PriceSample,
};
use host::ledger::MAX_PLAYER_LEN;
use host::scheduler::wall_clock_ms;
use host::{
    spawn_ledger_worker, AssetStats, BattleError, BattleHost, BattleRecord, Ledger,
    LedgerObserver, LoopExit, MemoryLedger, RetryPolicy, StartReport, StaticMarket, UserStats,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Most battles a single listing request returns
const MAX_LISTING: usize = 100;

struct AppState {
    ledger: Arc<Mutex<MemoryLedger>>,
    submitter: LedgerObserver,
}

// Request/Response types

#[derive(Deserialize)]
struct BattleRequest {
    asset_a: Asset,
    asset_b: Asset,
    /// Price history for A; synthetic prices are used when absent
    #[serde(default)]
    series_a: Option<Vec<PriceSample>>,
    #[serde(default)]
    series_b: Option<Vec<PriceSample>>,
    #[serde(default)]
    config: Option<BattleConfig>,
    #[serde(default)]
    seed: Option<u64>,
    /// Who the ledger records the battle for
    #[serde(default)]
    player: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BattleResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<MatchSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<StartReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submission_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BattleResponse {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            result: None,
            snapshot: None,
            sources: None,
            submission_hash: None,
            error: Some(error),
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct CountResponse {
    count: u64,
}

#[derive(Serialize)]
struct UserStatsResponse {
    player: String,
    #[serde(flatten)]
    stats: UserStats,
}

#[derive(Serialize)]
struct StatsResponse {
    symbol: String,
    #[serde(flatten)]
    stats: AssetStats,
}

struct BattleOutcome {
    result: MatchResult,
    snapshot: Option<MatchSnapshot>,
    sources: StartReport,
}

enum RunError {
    BadRequest(String),
    Failed(String),
}

fn run_battle(req: BattleRequest, submitter: LedgerObserver) -> Result<BattleOutcome, RunError> {
    let config = req.config.unwrap_or_default();
    let seed = req.seed.unwrap_or_else(|| wall_clock_ms() as u64);
    let mut session = BattleSession::new(config, StdRng::seed_from_u64(seed))
        .map_err(|e| RunError::BadRequest(e.to_string()))?;
    let submitter = match req.player {
        Some(player) if player.is_empty() || player.len() > MAX_PLAYER_LEN || !player.is_ascii() => {
            return Err(RunError::BadRequest(format!(
                "player must be 1-{} ASCII characters",
                MAX_PLAYER_LEN
            )));
        }
        Some(player) => submitter.with_player(player),
        None => submitter,
    };
    session.subscribe(Box::new(submitter));

    let mut market = StaticMarket::new();
    if let Some(series) = req.series_a {
        market = market.with_series(req.asset_a.clone(), series);
    }
    if let Some(series) = req.series_b {
        market = market.with_series(req.asset_b.clone(), series);
    }
    // in-memory data: nothing to wait for between attempts
    let host = BattleHost::new(market, RetryPolicy::immediate(1));

    let (sources, exit) = host
        .play_headless(&mut session, &req.asset_a, &req.asset_b, wall_clock_ms())
        .map_err(|e: BattleError| {
            if e.is_precondition() {
                RunError::BadRequest(e.to_string())
            } else {
                RunError::Failed(e.to_string())
            }
        })?;

    match exit {
        LoopExit::Finished(result) => Ok(BattleOutcome { result, snapshot: session.snapshot(), sources }),
        other => Err(RunError::Failed(format!("battle did not finish: {:?}", other))),
    }
}

// API Handlers

/// POST /api/battle
/// Play a headless battle and submit its result to the ledger
async fn battle(state: web::Data<AppState>, req: web::Json<BattleRequest>) -> impl Responder {
    let req = req.into_inner();
    tracing::info!("Received battle request: {} vs {}", req.asset_a.id, req.asset_b.id);

    let submitter = state.submitter.clone();
    let outcome = match web::block(move || run_battle(req, submitter)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Battle worker failed: {}", e);
            return HttpResponse::InternalServerError().json(BattleResponse::failed(e.to_string()));
        }
    };

    match outcome {
        Ok(BattleOutcome { result, snapshot, sources }) => {
            let hash = hex::encode(compute_submission_hash(&BattleSubmission::from(&result)));
            tracing::info!(
                "Battle finished: {} ({}-{})",
                result.winner_symbol(),
                result.final_score_a,
                result.final_score_b
            );
            HttpResponse::Ok().json(BattleResponse {
                success: true,
                result: Some(result),
                snapshot,
                sources: Some(sources),
                submission_hash: Some(hash),
                error: None,
            })
        }
        Err(RunError::BadRequest(e)) => {
            tracing::warn!("Rejected battle request: {}", e);
            HttpResponse::BadRequest().json(BattleResponse::failed(e))
        }
        Err(RunError::Failed(e)) => {
            tracing::error!("Battle failed: {}", e);
            HttpResponse::InternalServerError().json(BattleResponse::failed(e))
        }
    }
}

/// GET /api/battles?limit=n
/// Most recent battles, newest first
async fn battles(state: web::Data<AppState>, query: web::Query<ListQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(10).min(MAX_LISTING);
    let records: Vec<BattleRecord> = match state.ledger.lock() {
        Ok(ledger) => ledger.recent_battles(limit),
        Err(_) => return HttpResponse::InternalServerError().finish(),
    };
    HttpResponse::Ok().json(records)
}

/// GET /api/battles/count
async fn battle_count(state: web::Data<AppState>) -> impl Responder {
    let count = match state.ledger.lock() {
        Ok(ledger) => ledger.battle_count(),
        Err(_) => return HttpResponse::InternalServerError().finish(),
    };
    HttpResponse::Ok().json(CountResponse { count })
}

/// GET /api/battles/{id}
async fn battle_by_id(state: web::Data<AppState>, path: web::Path<u64>) -> impl Responder {
    let id = path.into_inner();
    let record = match state.ledger.lock() {
        Ok(ledger) => ledger.battle_by_id(id),
        Err(_) => return HttpResponse::InternalServerError().finish(),
    };
    match record {
        Some(record) => HttpResponse::Ok().json(record),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("no battle with id {}", id)
        })),
    }
}

/// GET /api/users/{player}/stats
async fn user_stats(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let player = path.into_inner();
    let stats = match state.ledger.lock() {
        Ok(ledger) => ledger.user_stats(&player),
        Err(_) => return HttpResponse::InternalServerError().finish(),
    };
    HttpResponse::Ok().json(UserStatsResponse { player, stats })
}

/// GET /api/stats/{symbol}
async fn stats(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let symbol = path.into_inner().to_uppercase();
    let stats = match state.ledger.lock() {
        Ok(ledger) => ledger.asset_stats(&symbol),
        Err(_) => return HttpResponse::InternalServerError().finish(),
    };
    HttpResponse::Ok().json(StatsResponse { symbol, stats })
}

/// GET /health
/// Health check endpoint
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "crypto-pong-api"
    }))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/battle", web::post().to(battle))
        .route("/api/battles", web::get().to(battles))
        .route("/api/battles/count", web::get().to(battle_count))
        .route("/api/battles/{id}", web::get().to(battle_by_id))
        .route("/api/users/{player}/stats", web::get().to(user_stats))
        .route("/api/stats/{symbol}", web::get().to(stats));
}

fn app_state() -> web::Data<AppState> {
    let ledger = Arc::new(Mutex::new(MemoryLedger::new()));
    // the worker lives as long as any submitter clone does
    let (submitter, _worker) = spawn_ledger_worker(ledger.clone());
    web::Data::new(AppState { ledger, submitter })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Crypto Pong API Server");

    let bind_address = "0.0.0.0:8080";
    tracing::info!("Binding to {}", bind_address);

    let state = app_state();

    HttpServer::new(move || {
        // Configure CORS to allow all origins
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .max_age(86400);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(10_485_760)) // 10MB limit
            .configure(routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
