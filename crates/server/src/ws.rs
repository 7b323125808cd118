//! WebSocket upgrade and the per-connection bridge between a client's socket
//! and the [`Hub`]'s coordinator, grounded on the teacher's `Casino::bridge`.
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use futures::StreamExt;
use tc_core::ConnectionId;
use tc_coordinator::ClientMessage;
use tc_coordinator::Recipient;
use tc_coordinator::ServerMessage;
use tc_core::ID;

use crate::hub::Hub;

/// `GET /ws` — upgrades to a websocket and bridges it to the coordinator for
/// the lifetime of the connection.
pub async fn connect(req: HttpRequest, body: web::Payload, hub: web::Data<Hub>) -> impl Responder {
    let (response, mut session, mut stream) = match actix_ws::handle(&req, body) {
        Ok(parts) => parts,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let hub = hub.into_inner();
    let conn: ConnectionId = ID::default();
    actix_web::rt::spawn(async move {
        log::debug!("[ws {conn}] connected");
        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(actix_ws::Message::Text(text)) => text,
                Ok(actix_ws::Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            };
            let msg: ClientMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(_) => {
                    let err = ServerMessage::error(tc_core::ErrorCode::ParseError);
                    if let Ok(json) = serde_json::to_string(&err) {
                        let _ = session.text(json).await;
                    }
                    continue;
                }
            };
            let outcome = {
                let mut coordinator = hub.coordinator().lock().await;
                coordinator.dispatch(conn, msg)
            };
            match outcome {
                Ok(outbox) => {
                    if let Some(player_id) = outbox.iter().find_map(|(r, m)| match (r, m) {
                        (Recipient::Player(id), ServerMessage::Welcome { .. }) => Some(*id),
                        _ => None,
                    }) {
                        hub.register_session(conn, player_id, session.clone()).await;
                    }
                    hub.deliver(outbox).await;
                    hub.drive().await;
                }
                Err(code) => {
                    let err = ServerMessage::error(code);
                    if let Ok(json) = serde_json::to_string(&err) {
                        let _ = session.text(json).await;
                    }
                }
            }
        }
        {
            let mut coordinator = hub.coordinator().lock().await;
            let _ = coordinator.dispatch(conn, ClientMessage::LeaveTournament);
        }
        hub.forget_connection(conn).await;
        log::debug!("[ws {conn}] disconnected");
    });
    response
}
