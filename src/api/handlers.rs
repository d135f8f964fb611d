//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{error, info, warn};

use crate::{
    engine::TaskEngine,
    state::{AppState, Task},
};
use super::responses::{ApiResponse, HealthResponse, StatusResponse, TaskView};

/// Apply a single-task command and answer with the full task list.
///
/// Unknown ids are not an error: the list is returned unchanged.
fn run_command<F>(
    state: &AppState,
    action: &str,
    task_id: u32,
    command: F,
) -> Result<Json<ApiResponse>, StatusCode>
where
    F: FnOnce(&Arc<TaskEngine>) -> Result<Option<Task>, String>,
{
    let outcome = command(&state.engine).map_err(|e| {
        error!("Failed to {} task {}: {}", action, task_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let tasks = state.engine.tasks().map_err(|e| {
        error!("Failed to read tasks: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match outcome {
        Some(_) => {
            state.record_action(&format!("{} {}", action, task_id));
            info!("{} endpoint called for task {}", action, task_id);
            Ok(Json(ApiResponse::applied(
                format!("Task {} {} applied", task_id, action),
                tasks,
            )))
        }
        None => {
            warn!("{} requested for unknown task {}", action, task_id);
            Ok(Json(ApiResponse::ignored(
                format!("No task with id {}", task_id),
                tasks,
            )))
        }
    }
}

/// Handle POST /tasks/:id/start - Start or restart a countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u32>,
) -> Result<Json<ApiResponse>, StatusCode> {
    run_command(&state, "start", task_id, |engine| engine.start(task_id))
}

/// Handle POST /tasks/:id/pause - Freeze a running countdown
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u32>,
) -> Result<Json<ApiResponse>, StatusCode> {
    run_command(&state, "pause", task_id, |engine| engine.pause(task_id))
}

/// Handle POST /tasks/:id/reset - Restore a task to its full duration
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u32>,
) -> Result<Json<ApiResponse>, StatusCode> {
    run_command(&state, "reset", task_id, |engine| engine.reset(task_id))
}

/// Handle POST /tasks/:id/toggle - Flip the completion checkbox
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u32>,
) -> Result<Json<ApiResponse>, StatusCode> {
    run_command(&state, "toggle", task_id, |engine| engine.toggle_completion(task_id))
}

/// Handle POST /tasks/:id/stop-alarm - Acknowledge a ringing task
pub async fn stop_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u32>,
) -> Result<Json<ApiResponse>, StatusCode> {
    run_command(&state, "stop-alarm", task_id, |engine| engine.stop_alarm(task_id))
}

/// Handle POST /tasks/reset-all - Reset every task for today
pub async fn reset_all_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.engine.reset_all() {
        Ok(tasks) => {
            state.record_action("reset-all");
            info!("Reset-all endpoint called");
            Ok(Json(ApiResponse::applied("All tasks reset".to_string(), tasks)))
        }
        Err(e) => {
            error!("Failed to reset all tasks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /tasks - Return the current task list
pub async fn tasks_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TaskView>>, StatusCode> {
    match state.engine.tasks() {
        Ok(tasks) => Ok(Json(TaskView::list(tasks))),
        Err(e) => {
            error!("Failed to read tasks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /events - Push the task list on every change
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut updates = state.engine.subscribe();
    // Send the current list as the first event.
    updates.mark_changed();

    let events = stream::unfold(updates, |mut updates| async move {
        updates.changed().await.ok()?;
        let tasks = TaskView::list(updates.borrow_and_update().clone());
        let event = match Event::default().event("tasks").json_data(&tasks) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to encode task event: {}", e);
                Event::default().comment("encoding error")
            }
        };
        Some((Ok(event), updates))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return tasks, progress and server status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let engine = &state.engine;
    let read = || -> Result<StatusResponse, String> {
        let (last_action, last_action_time) = state.get_last_action();
        Ok(StatusResponse {
            tasks: TaskView::list(engine.tasks()?),
            progress: engine.progress()?,
            practice_day: engine.practice_day()?,
            ringing: engine.ringing()?,
            uptime: state.get_uptime(),
            port: state.port,
            host: state.host.clone(),
            last_action,
            last_action_time,
        })
    };

    match read() {
        Ok(status) => Ok(Json(status)),
        Err(e) => {
            error!("Failed to read status: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
