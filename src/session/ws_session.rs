use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Running, StreamHandler};
use actix_web_actors::ws;
use metrics::ACTIVE_WS_CONNECTIONS;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::GameError,
    protocol::{parse_client_message, ClientMessage, ServerMessage},
    server::{
        messages::{Connect, CreateUnit, Disconnect, FindMatch, GetGameState},
        GameServer,
    },
};

type Ctx = ws::WebsocketContext<WsSession>;

/// 연결 단계에서 걸러진 요청은 GameServer 를 거치지 않고 바로 거절한다.
fn send_err(ctx: &mut Ctx, error: GameError) {
    metrics::REJECTED_REQUESTS_TOTAL.inc();
    ctx.text(ServerMessage::from(error).to_json());
}

/// 클라이언트 한 명의 웹소켓 연결.
///
/// 연결 자체는 상태를 들고 있지 않고, 요청을 GameServer 로 넘기고
/// GameServer 가 보낸 ServerMessage 를 그대로 직렬화해서 내려보낸다.
pub struct WsSession {
    connection_id: Uuid,
    hb: Instant,
    game_server: Addr<GameServer>,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

impl WsSession {
    pub fn new(
        connection_id: Uuid,
        game_server: Addr<GameServer>,
        heartbeat_interval: Duration,
        client_timeout: Duration,
    ) -> Self {
        Self {
            connection_id,
            hb: Instant::now(),
            game_server,
            heartbeat_interval,
            client_timeout,
        }
    }

    fn hb(&self, ctx: &mut Ctx) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.hb) > act.client_timeout {
                info!(
                    "Websocket client {} heartbeat failed, disconnecting!",
                    act.connection_id
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_client_message(&mut self, msg: ClientMessage) {
        let connection_id = self.connection_id;
        match msg {
            ClientMessage::FindMatch => {
                self.game_server.do_send(FindMatch { connection_id });
            }
            ClientMessage::CreateUnit {
                similarity,
                artifact_ref,
            } => {
                self.game_server.do_send(CreateUnit {
                    connection_id,
                    similarity,
                    artifact_ref,
                });
            }
            ClientMessage::GetGameState => {
                self.game_server.do_send(GetGameState { connection_id });
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("Client connected: {}", self.connection_id);
        ACTIVE_WS_CONNECTIONS.inc();
        self.hb(ctx);

        self.game_server.do_send(Connect {
            connection_id: self.connection_id,
            addr: ctx.address().recipient(),
        });
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        info!("Client disconnected: {}", self.connection_id);
        ACTIVE_WS_CONNECTIONS.dec();
        self.game_server.do_send(Disconnect {
            connection_id: self.connection_id,
        });
        Running::Stop
    }
}

impl Handler<ServerMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!(
                "Failed to serialize {} for client {}: {}",
                msg.event_name(),
                self.connection_id,
                e
            ),
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                match parse_client_message(&text) {
                    Ok(client_msg) => self.handle_client_message(client_msg),
                    Err(e) => {
                        // 잘못된 메시지는 거절만 하고 연결은 유지한다
                        warn!("Rejected frame from {}: {}", self.connection_id, e);
                        send_err(ctx, e);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                debug!("Binary frame from {} ignored.", self.connection_id);
                send_err(
                    ctx,
                    GameError::InvalidMessage("binary frames are not supported".to_string()),
                );
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("Websocket protocol error from {}: {}", self.connection_id, e);
                ctx.stop();
            }
        }
    }
}
