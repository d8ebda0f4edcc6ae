//! Single binary web server: REST API over the tournament service.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! TOURNAMENT_STATE=path/to/state.json keeps the tournament across restarts;
//! TOURNAMENT_SEED=<u64> makes the group shuffle reproducible.

use actix_web::{
    get, post,
    web::{Data, Json},
    App, HttpResponse, HttpServer, Responder,
};
use group_bracket::{
    Config, JsonFileStore, MemoryStore, Request, Response, Store, TournamentError,
    TournamentService,
};
use serde::Deserialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type SharedStore = Box<dyn Store + Send + Sync>;

/// One tournament at a time; the lock serializes every write to it.
type AppState = Data<RwLock<TournamentService<SharedStore>>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct ResetBody {
    name: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    external_id: String,
    name: String,
}

#[derive(Deserialize)]
struct StartBody {
    group_size: u32,
    #[serde(default = "default_best_of")]
    best_of: u32,
    #[serde(default = "default_best_of")]
    finals_best_of: u32,
}

fn default_best_of() -> u32 {
    3
}

#[derive(Deserialize)]
struct ResultBody {
    player_1: String,
    score_1: u32,
    player_2: String,
    score_2: u32,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::Validation(_) => HttpResponse::BadRequest().json(body),
        TournamentError::NotFound(_) => HttpResponse::NotFound().json(body),
        TournamentError::State { .. } | TournamentError::Draw(_) => HttpResponse::Conflict().json(body),
        TournamentError::Consistency(_) | TournamentError::Storage(_) => {
            log::error!("Internal error: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond(result: Result<Response, TournamentError>) -> HttpResponse {
    match result {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => error_response(&e),
    }
}

/// Write access; a lock poisoned by a panicking request is recovered and its transaction undone.
fn write_service(state: &AppState) -> RwLockWriteGuard<'_, TournamentService<SharedStore>> {
    match state.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("Tournament lock poisoned by an earlier request, recovering");
            state.clear_poison();
            let mut guard = poisoned.into_inner();
            guard.recover();
            guard
        }
    }
}

fn read_service(state: &AppState) -> RwLockReadGuard<'_, TournamentService<SharedStore>> {
    state.read().unwrap_or_else(|poisoned| {
        log::error!("Tournament lock poisoned by an earlier request, reading anyway");
        PoisonError::into_inner(poisoned)
    })
}

/// Run a command under the write lock.
fn dispatch(state: &AppState, request: Request) -> HttpResponse {
    respond(write_service(state).dispatch(request))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "group-bracket",
    })
}

/// Tournament status: registrations and grouping options while open, groups while running.
#[get("/api/tournament")]
async fn api_status(state: AppState) -> HttpResponse {
    let service = read_service(&state);
    respond(service.status().map(Response::Status))
}

/// Start over with a new, empty tournament.
#[post("/api/tournament/reset")]
async fn api_reset(state: AppState, body: Json<ResetBody>) -> HttpResponse {
    let body = body.into_inner();
    dispatch(&state, Request::Reset { name: body.name })
}

/// Build the bracket (registration must be open).
#[post("/api/tournament/start")]
async fn api_start(state: AppState, body: Json<StartBody>) -> HttpResponse {
    let body = body.into_inner();
    dispatch(
        &state,
        Request::Start {
            group_size: body.group_size,
            best_of: body.best_of,
            finals_best_of: body.finals_best_of,
        },
    )
}

/// Register a participant (registration must be open).
#[post("/api/participants")]
async fn api_register(state: AppState, body: Json<RegisterBody>) -> HttpResponse {
    let body = body.into_inner();
    dispatch(
        &state,
        Request::Register {
            external_id: body.external_id,
            name: body.name,
        },
    )
}

/// Register participants from a CSV body with header `external_id,name`.
#[post("/api/participants/import")]
async fn api_import(state: AppState, body: String) -> HttpResponse {
    dispatch(&state, Request::Import { csv: body })
}

/// Record a match result; may promote players or declare the champion.
#[post("/api/results")]
async fn api_submit_result(state: AppState, body: Json<ResultBody>) -> HttpResponse {
    let body = body.into_inner();
    dispatch(
        &state,
        Request::SubmitResult {
            player_1: body.player_1,
            score_1: body.score_1,
            player_2: body.player_2,
            score_2: body.score_2,
        },
    )
}

/// Playable matches of every open group.
#[get("/api/games")]
async fn api_games(state: AppState) -> HttpResponse {
    let service = read_service(&state);
    respond(service.games().map(|groups| Response::Games { groups }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let store: SharedStore = match &config.state_path {
        Some(path) => match JsonFileStore::open(path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::error!("Cannot open tournament state: {}", e);
                return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
            }
        },
        None => {
            log::warn!("TOURNAMENT_STATE not set, tournament is kept in memory only");
            Box::new(MemoryStore::new())
        }
    };
    let state = Data::new(RwLock::new(TournamentService::new(store, config.service.clone())));

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_status)
            .service(api_reset)
            .service(api_start)
            .service(api_register)
            .service(api_import)
            .service(api_submit_result)
            .service(api_games)
    })
    .bind(bind)?
    .run()
    .await
}
