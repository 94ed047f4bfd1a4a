//! D-Bus interface for the attendance daemon.
//!
//! Bus name: org.rollcall.Rollcall1
//! Object path: /org/rollcall/Rollcall1
//!
//! All payloads are JSON strings; every data-integrity failure maps to
//! a distinguishable error message. One camera-driving operation runs
//! at a time: overlapping enroll/session requests are rejected here
//! rather than queued invisibly behind the engine.

use crate::engine::{EngineError, EngineHandle, SessionSummary, SessionView};
use crate::slot::SharedSlot;
use rollcall_core::enroll::EnrollProgress;
use rollcall_store::{Store, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use zbus::interface;

/// How long StartSession waits for an immediate engine failure (empty
/// roster, busy camera) before reporting the session as running.
const START_FAILURE_WINDOW: Duration = Duration::from_millis(300);

struct EnrollState {
    stop: Arc<AtomicBool>,
    progress: Arc<SharedSlot<EnrollProgress>>,
}

struct SessionState {
    stop: Arc<AtomicBool>,
    view: Arc<SharedSlot<SessionView>>,
    done: JoinHandle<Result<SessionSummary, EngineError>>,
}

pub struct RollcallService {
    engine: EngineHandle,
    store: Store,
    enroll: Arc<Mutex<Option<EnrollState>>>,
    session: Arc<Mutex<Option<SessionState>>>,
}

impl RollcallService {
    pub fn new(engine: EngineHandle, store: Store) -> Self {
        Self {
            engine,
            store,
            enroll: Arc::new(Mutex::new(None)),
            session: Arc::new(Mutex::new(None)),
        }
    }
}

#[interface(name = "org.rollcall.Rollcall1")]
impl RollcallService {
    /// Enroll a new student (or retrain an existing one's embedding).
    /// Blocks until the capture-and-average run completes; progress is
    /// readable through EnrollProgress while it runs.
    async fn enroll(&self, roll_no: i64, name: String, retrain: bool) -> zbus::fdo::Result<String> {
        tracing::info!(roll_no, name = %name, retrain, "enroll requested");

        if self.session.lock().await.is_some() {
            return Err(zbus::fdo::Error::Failed(
                "an attendance session is running".into(),
            ));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let progress: Arc<SharedSlot<EnrollProgress>> = Arc::new(SharedSlot::new());
        {
            let mut guard = self.enroll.lock().await;
            if guard.is_some() {
                return Err(zbus::fdo::Error::Failed(
                    "an enrollment is already in progress".into(),
                ));
            }
            *guard = Some(EnrollState {
                stop: stop.clone(),
                progress: progress.clone(),
            });
        }

        let result = self
            .engine
            .enroll(roll_no, name, retrain, stop, progress)
            .await;
        self.enroll.lock().await.take();

        let outcome = result.map_err(engine_error)?;
        to_json(&outcome)
    }

    /// Latest enrollment progress as JSON, or "null" before the first
    /// frame is classified.
    async fn enroll_progress(&self) -> zbus::fdo::Result<String> {
        let guard = self.enroll.lock().await;
        let Some(state) = guard.as_ref() else {
            return Err(zbus::fdo::Error::Failed(
                "no enrollment is in progress".into(),
            ));
        };
        match state.progress.read() {
            Some(progress) => to_json(&*progress),
            None => Ok("null".to_string()),
        }
    }

    /// Cancel a running enrollment. Returns false when none is running.
    async fn cancel_enroll(&self) -> zbus::fdo::Result<bool> {
        match self.enroll.lock().await.as_ref() {
            Some(state) => {
                state.stop.store(true, Ordering::Relaxed);
                tracing::info!("enrollment cancellation requested");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Start an attendance session. The session runs until StopSession.
    async fn start_session(&self) -> zbus::fdo::Result<bool> {
        if self.enroll.lock().await.is_some() {
            return Err(zbus::fdo::Error::Failed(
                "an enrollment is in progress".into(),
            ));
        }

        let mut guard = self.session.lock().await;
        if guard.is_some() {
            return Err(zbus::fdo::Error::Failed(
                "an attendance session is already running".into(),
            ));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let view: Arc<SharedSlot<SessionView>> = Arc::new(SharedSlot::new());
        let engine = self.engine.clone();
        let (task_stop, task_view) = (stop.clone(), view.clone());
        let mut done = tokio::spawn(async move { engine.run_session(task_stop, task_view).await });

        // Surface immediate failures (empty roster, camera trouble) to
        // the caller now instead of at stop time.
        match tokio::time::timeout(START_FAILURE_WINDOW, &mut done).await {
            Ok(finished) => {
                let result = finished
                    .map_err(|e| zbus::fdo::Error::Failed(format!("engine task failed: {e}")))?;
                match result {
                    Ok(_) => Err(zbus::fdo::Error::Failed(
                        "session ended before it was stopped".into(),
                    )),
                    Err(e) => Err(engine_error(e)),
                }
            }
            Err(_) => {
                *guard = Some(SessionState { stop, view, done });
                tracing::info!("attendance session started");
                Ok(true)
            }
        }
    }

    /// Stop the running session and return its summary as JSON.
    async fn stop_session(&self) -> zbus::fdo::Result<String> {
        let state = self.session.lock().await.take().ok_or_else(|| {
            zbus::fdo::Error::Failed("no attendance session is running".into())
        })?;

        state.stop.store(true, Ordering::Relaxed);
        let summary = state
            .done
            .await
            .map_err(|e| zbus::fdo::Error::Failed(format!("engine task failed: {e}")))?
            .map_err(engine_error)?;

        to_json(&summary)
    }

    /// Latest recognition overlay (full-resolution coordinates) as
    /// JSON, or "null" before the first result lands.
    async fn session_view(&self) -> zbus::fdo::Result<String> {
        let guard = self.session.lock().await;
        let Some(state) = guard.as_ref() else {
            return Err(zbus::fdo::Error::Failed(
                "no attendance session is running".into(),
            ));
        };
        match state.view.read() {
            Some(view) => to_json(&*view),
            None => Ok("null".to_string()),
        }
    }

    /// All enrolled students (roll number and name) as JSON.
    async fn list_students(&self) -> zbus::fdo::Result<String> {
        let store = self.store.clone();
        let students = tokio::task::spawn_blocking(move || store.list_students())
            .await
            .map_err(|e| zbus::fdo::Error::Failed(format!("store task failed: {e}")))?
            .map_err(store_error)?;

        let entries: Vec<_> = students
            .iter()
            .map(|s| serde_json::json!({ "roll_no": s.roll_no, "name": s.name }))
            .collect();
        to_json(&entries)
    }

    /// Delete a student and (by cascade) their attendance events.
    async fn remove_student(&self, roll_no: i64) -> zbus::fdo::Result<bool> {
        tracing::info!(roll_no, "remove_student requested");
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.delete_student(roll_no))
            .await
            .map_err(|e| zbus::fdo::Error::Failed(format!("store task failed: {e}")))?
            .map_err(store_error)?;
        Ok(true)
    }

    /// Full attendance report as JSON, most recent event first.
    async fn report(&self) -> zbus::fdo::Result<String> {
        let store = self.store.clone();
        let rows = tokio::task::spawn_blocking(move || store.attendance_report())
            .await
            .map_err(|e| zbus::fdo::Error::Failed(format!("store task failed: {e}")))?
            .map_err(store_error)?;
        to_json(&rows)
    }

    /// Daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let session_active = self.session.lock().await.is_some();
        let enroll_active = self.enroll.lock().await.is_some();
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "database": self.store.path().display().to_string(),
            "session_active": session_active,
            "enroll_active": enroll_active,
        })
        .to_string())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> zbus::fdo::Result<String> {
    serde_json::to_string(value).map_err(|e| zbus::fdo::Error::Failed(format!("serialize: {e}")))
}

/// Engine errors already carry distinguishable messages (duplicate
/// roll, unknown roll, no usable samples, cancelled, ...); pass them
/// through verbatim.
fn engine_error(e: EngineError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(e.to_string())
}

fn store_error(e: StoreError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(e.to_string())
}
