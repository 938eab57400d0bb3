//! Axum REST API routes.
//!
//!   GET  /boards                         -> board summaries
//!   POST /boards                         -> create a board with starter columns
//!   GET  /boards/{id}                    -> full board (columns, cards, votes)
//!   PUT  /boards/{id}                    -> update board configuration
//!   POST /boards/{id}/timer              -> start the shared countdown
//!   POST /boards/{id}/move-card          -> move one card
//!   POST /boards/{id}/move-pile          -> move a whole slot
//!   POST /boards/{id}/combine-cards      -> stack one card onto another
//!   POST /boards/{id}/combine-piles      -> merge a pile into a slot
//!   POST /boards/{id}/card-flip          -> reveal a different pile top
//!   GET  /events                         -> SSE stream of board events
//!   GET  /status                         -> health check
//!
//! Responses mirror the broadcast payloads, so the acting client and the
//! room subscribers converge on identical data.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use corkboard_core::arrange::{
    self, CardFlipRequest, CombineCardsRequest, CombinePilesRequest, MoveCardRequest,
    MovePileRequest,
};
use corkboard_core::boards;
use corkboard_core::events::BoardEvent;
use corkboard_core::store::BoardPatch;
use corkboard_core::types::{BoardId, CardId, ColumnId};
use corkboard_core::EngineError;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route("/boards/{board_id}", get(get_board).put(update_board))
        .route("/boards/{board_id}/timer", post(start_timer))
        .route("/boards/{board_id}/move-card", post(move_card))
        .route("/boards/{board_id}/move-pile", post(move_pile))
        .route("/boards/{board_id}/combine-cards", post(combine_cards))
        .route("/boards/{board_id}/combine-piles", post(combine_piles))
        .route("/boards/{board_id}/card-flip", post(card_flip))
        .route("/events", get(sse_events))
        .route("/status", get(status))
}

fn log_api_issue(status: StatusCode, endpoint: &str, message: &str) {
    if status.is_server_error() {
        log::error!("[{}] {}", endpoint, message);
    } else {
        log::warn!("[{}] {}", endpoint, message);
    }
}

/// The one place engine errors become status codes.
fn engine_error(endpoint: &str, err: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        EngineError::BoardNotFound(_)
        | EngineError::ColumnNotFound(_)
        | EngineError::CardNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::PositionOutOfRange { .. }
        | EngineError::SelfCombine
        | EngineError::MissingCardId => StatusCode::BAD_REQUEST,
        EngineError::MissingSlotCard(_) | EngineError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    log_api_issue(status, endpoint, &err.to_string());
    (status, Json(ErrorResponse { error: err.to_string() }))
}

// ── Board lifecycle ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBoardBody {
    title: String,
    #[serde(default)]
    creator: i64,
    #[serde(default = "default_colset")]
    colset_id: i64,
    #[serde(default)]
    votes_per_user: i64,
    #[serde(default)]
    p_see_votes: bool,
    #[serde(default)]
    p_see_content: bool,
    #[serde(default)]
    p_combine_cards: bool,
    #[serde(default)]
    p_lock: bool,
}

fn default_colset() -> i64 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBoardBody {
    title: Option<String>,
    votes_per_user: Option<i64>,
    p_see_votes: Option<bool>,
    p_see_content: Option<bool>,
    p_combine_cards: Option<bool>,
    p_lock: Option<bool>,
}

#[derive(Deserialize)]
struct TimerBody {
    seconds: i64,
}

async fn list_boards(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let boards = boards::list_boards(state.store.as_ref())
        .await
        .map_err(|e| engine_error("corkboard.api.list_boards", e))?;
    Ok(Json(serde_json::json!({ "boards": boards })))
}

async fn create_board(
    State(state): State<AppState>,
    Json(body): Json<CreateBoardBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<ErrorResponse>)> {
    let view = boards::create_board(
        state.store.as_ref(),
        boards::CreateBoardRequest {
            title: body.title,
            creator: body.creator,
            colset_id: body.colset_id,
            votes_per_user: body.votes_per_user,
            p_see_votes: body.p_see_votes,
            p_see_content: body.p_see_content,
            p_combine_cards: body.p_combine_cards,
            p_lock: body.p_lock,
        },
    )
    .await
    .map_err(|e| engine_error("corkboard.api.create_board", e))?;

    let board_id = view.board.id;
    state
        .publisher
        .publish(board_id, &BoardEvent::BoardCreated { board: view.clone() })
        .await;
    Ok((StatusCode::CREATED, Json(serde_json::json!(view))))
}

async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let view = boards::load_full(state.store.as_ref(), board_id)
        .await
        .map_err(|e| engine_error("corkboard.api.get_board", e))?;
    Ok(Json(serde_json::json!(view)))
}

async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<UpdateBoardBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let patch = BoardPatch {
        title: body.title,
        votes_per_user: body.votes_per_user,
        p_see_votes: body.p_see_votes,
        p_see_content: body.p_see_content,
        p_combine_cards: body.p_combine_cards,
        p_lock: body.p_lock,
        ..BoardPatch::default()
    };
    let board = boards::update_board(state.store.as_ref(), board_id, patch)
        .await
        .map_err(|e| engine_error("corkboard.api.update_board", e))?;

    state
        .publisher
        .publish(board_id, &BoardEvent::BoardUpdated { board: board.clone() })
        .await;
    Ok(Json(serde_json::json!(board)))
}

async fn start_timer(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<TimerBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let board = boards::start_timer(state.store.as_ref(), board_id, body.seconds)
        .await
        .map_err(|e| engine_error("corkboard.api.start_timer", e))?;

    state
        .publisher
        .publish(
            board_id,
            &BoardEvent::TimerStart {
                board_id,
                seconds: body.seconds,
            },
        )
        .await;
    Ok(Json(serde_json::json!(board)))
}

// ── Arrangement operations ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveCardBody {
    card_id: CardId,
    dest_column_id: ColumnId,
    dest_position: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovePileBody {
    source_column_id: ColumnId,
    source_position: i64,
    dest_column_id: ColumnId,
    dest_position: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CombineCardsBody {
    source_card_id: CardId,
    dest_card_id: CardId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CombinePilesBody {
    source_column_id: ColumnId,
    source_position: i64,
    dest_card_id: CardId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardFlipBody {
    card_id: CardId,
    column_id: ColumnId,
    position: i64,
}

async fn move_card(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<MoveCardBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = arrange::move_card(
        state.store.as_ref(),
        MoveCardRequest {
            board_id,
            card_id: body.card_id,
            dest_column_id: body.dest_column_id,
            dest_position: body.dest_position,
        },
    )
    .await
    .map_err(|e| engine_error("corkboard.api.move_card", e))?;

    state.publisher.publish(board_id, &outcome.event).await;
    Ok(Json(serde_json::json!(outcome.columns)))
}

async fn move_pile(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<MovePileBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = arrange::move_pile(
        state.store.as_ref(),
        MovePileRequest {
            board_id,
            source_column_id: body.source_column_id,
            source_position: body.source_position,
            dest_column_id: body.dest_column_id,
            dest_position: body.dest_position,
        },
    )
    .await
    .map_err(|e| engine_error("corkboard.api.move_pile", e))?;

    state.publisher.publish(board_id, &outcome.event).await;
    Ok(Json(serde_json::json!(outcome.columns)))
}

async fn combine_cards(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<CombineCardsBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = arrange::combine_cards(
        state.store.as_ref(),
        CombineCardsRequest {
            board_id,
            source_card_id: body.source_card_id,
            dest_card_id: body.dest_card_id,
        },
    )
    .await
    .map_err(|e| engine_error("corkboard.api.combine_cards", e))?;

    state.publisher.publish(board_id, &outcome.event).await;
    Ok(Json(serde_json::json!({
        "card": outcome.card,
        "sourceMap": outcome.source_map,
        "sourceColumnId": outcome.source_column_id,
    })))
}

async fn combine_piles(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<CombinePilesBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = arrange::combine_piles(
        state.store.as_ref(),
        CombinePilesRequest {
            board_id,
            source_column_id: body.source_column_id,
            source_position: body.source_position,
            dest_card_id: body.dest_card_id,
        },
    )
    .await
    .map_err(|e| engine_error("corkboard.api.combine_piles", e))?;

    state.publisher.publish(board_id, &outcome.event).await;
    Ok(Json(serde_json::json!(outcome.columns)))
}

async fn card_flip(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<CardFlipBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = arrange::card_flip(
        state.store.as_ref(),
        CardFlipRequest {
            board_id,
            card_id: body.card_id,
            column_id: body.column_id,
            position: body.position,
        },
    )
    .await
    .map_err(|e| engine_error("corkboard.api.card_flip", e))?;

    state.publisher.publish(board_id, &outcome.event).await;
    Ok(Json(serde_json::json!({ "cardId": outcome.card_id })))
}

// ── Events + status ─────────────────────────────────────────────────────────

/// SSE endpoint: streams every board event as JSON to connected clients.
async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let json = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    // Keep-alive every 30 seconds
    let stream = stream.merge(tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(
            std::time::Duration::from_secs(30),
        )),
        |_| Ok(Event::default().comment("keep-alive")),
    ));

    Sse::new(stream)
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "port": state.port,
    }))
}
