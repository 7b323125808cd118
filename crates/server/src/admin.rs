//! Internal `/admin/*` JSON routes: list/create/start/finish tournaments and
//! round-trip a snapshot, for an operator tool rather than a player client.
//! Registered only when `ARBITER_ADMIN_TOKEN` is set (§6); every handler
//! re-checks the bearer token so a misconfigured proxy in front of the
//! server can't leak the surface.
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use tc_core::ID;
use tc_core::TournamentId;
use tc_engines::GameId;
use tc_tournament::Tournament;

fn tournament_id(path: web::Path<uuid::Uuid>) -> TournamentId {
    ID::from(path.into_inner())
}

use crate::hub::Hub;

fn authorized(req: &HttpRequest, token: &str) -> bool {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|presented| presented == token)
}

#[derive(serde::Serialize)]
struct TournamentSummary {
    id: TournamentId,
    game_id: GameId,
    label: String,
    phase: tc_tournament::TournamentPhase,
    player_count: usize,
}

#[derive(serde::Deserialize)]
pub struct CreateRequest {
    game_id: GameId,
    label: Option<String>,
    bot_count: Option<usize>,
}

#[derive(serde::Deserialize)]
pub struct AddBotsRequest {
    count: usize,
}

pub async fn list(req: HttpRequest, token: web::Data<String>, hub: web::Data<Hub>) -> impl Responder {
    if !authorized(&req, &token) {
        return HttpResponse::Unauthorized().finish();
    }
    let coordinator = hub.coordinator().lock().await;
    let summaries: Vec<TournamentSummary> = coordinator
        .registry()
        .tournaments()
        .map(|t| TournamentSummary {
            id: t.id(),
            game_id: t.game_id(),
            label: t.label().to_string(),
            phase: t.phase(),
            player_count: t.players().count(),
        })
        .collect();
    HttpResponse::Ok().json(summaries)
}

pub async fn create(
    req: HttpRequest,
    token: web::Data<String>,
    hub: web::Data<Hub>,
    body: web::Json<CreateRequest>,
) -> impl Responder {
    if !authorized(&req, &token) {
        return HttpResponse::Unauthorized().finish();
    }
    let mut coordinator = hub.coordinator().lock().await;
    let label = body.label.clone().unwrap_or_else(|| body.game_id.to_string());
    let id = coordinator.registry_mut().create(body.game_id, label);
    if let Some(count) = body.bot_count {
        if let Some(t) = coordinator.registry_mut().get_mut(id) {
            if let Err(e) = t.add_bots(count, "bot") {
                return HttpResponse::BadRequest().body(e.to_string());
            }
        }
    }
    HttpResponse::Ok().json(serde_json::json!({ "tournament_id": id }))
}

pub async fn add_bots(
    req: HttpRequest,
    token: web::Data<String>,
    hub: web::Data<Hub>,
    path: web::Path<uuid::Uuid>,
    body: web::Json<AddBotsRequest>,
) -> impl Responder {
    if !authorized(&req, &token) {
        return HttpResponse::Unauthorized().finish();
    }
    let mut coordinator = hub.coordinator().lock().await;
    match coordinator.registry_mut().get_mut(tournament_id(path)) {
        Some(t) => match t.add_bots(body.count, "bot") {
            Ok(ids) => HttpResponse::Ok().json(ids),
            Err(e) => HttpResponse::BadRequest().body(e.to_string()),
        },
        None => HttpResponse::NotFound().finish(),
    }
}

pub async fn start(
    req: HttpRequest,
    token: web::Data<String>,
    hub: web::Data<Hub>,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    if !authorized(&req, &token) {
        return HttpResponse::Unauthorized().finish();
    }
    let hub = hub.into_inner();
    let result = {
        let mut coordinator = hub.coordinator().lock().await;
        match coordinator.registry_mut().get_mut(tournament_id(path)) {
            Some(t) => t.start().map_err(|e| e.to_string()),
            None => Err("tournament not found".to_string()),
        }
    };
    match result {
        Ok(()) => {
            hub.drive().await;
            HttpResponse::Ok().finish()
        }
        Err(e) => HttpResponse::BadRequest().body(e),
    }
}

pub async fn finish(
    req: HttpRequest,
    token: web::Data<String>,
    hub: web::Data<Hub>,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    if !authorized(&req, &token) {
        return HttpResponse::Unauthorized().finish();
    }
    let mut coordinator = hub.coordinator().lock().await;
    match coordinator.registry_mut().get_mut(tournament_id(path)) {
        Some(t) => {
            t.force_finish();
            HttpResponse::Ok().finish()
        }
        None => HttpResponse::NotFound().finish(),
    }
}

pub async fn snapshot(
    req: HttpRequest,
    token: web::Data<String>,
    hub: web::Data<Hub>,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    if !authorized(&req, &token) {
        return HttpResponse::Unauthorized().finish();
    }
    let coordinator = hub.coordinator().lock().await;
    match coordinator.registry().get(tournament_id(path)) {
        Some(t) => HttpResponse::Ok().json(t),
        None => HttpResponse::NotFound().finish(),
    }
}

pub async fn restore(
    req: HttpRequest,
    token: web::Data<String>,
    hub: web::Data<Hub>,
    body: web::Json<Tournament>,
) -> impl Responder {
    if !authorized(&req, &token) {
        return HttpResponse::Unauthorized().finish();
    }
    let mut coordinator = hub.coordinator().lock().await;
    let id = coordinator.registry_mut().restore(body.into_inner());
    HttpResponse::Ok().json(serde_json::json!({ "tournament_id": id }))
}
