//! Panic recovery stage.
//!
//! Wraps everything downstream in `catch_unwind`. A panic is logged with its
//! backtrace, reported to the alert webhook on a detached task, and answered
//! with a generic 500 envelope. The request task itself keeps running.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

use crate::api::middleware::client_ip::ClientIp;
use crate::application::services::PanicReport;
use crate::error::AppError;
use crate::state::AppState;

thread_local! {
    static LAST_PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Installs a panic hook that stores the panicking thread's backtrace.
///
/// The recovery stage runs on the same thread as the poll that panicked, so
/// it picks the backtrace up right after `catch_unwind` returns. The
/// previously installed hook still runs. Calling this more than once is a no-op.
pub fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            LAST_PANIC_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

fn take_panic_backtrace() -> Option<String> {
    LAST_PANIC_BACKTRACE.with(|slot| slot.borrow_mut().take())
}

/// Extracts a printable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Converts a panic anywhere downstream into a 500 response.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/v1/examples", get(list_examples_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), recovery::layer));
/// ```
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let client_ip = ClientIp::resolve(&req, state.config.behind_proxy);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(&*payload);
            let backtrace =
                take_panic_backtrace().unwrap_or_else(|| Backtrace::force_capture().to_string());

            state.metrics.record_panic();
            tracing::error!(
                method = %method,
                path = %path,
                client_ip = %client_ip,
                panic = %message,
                backtrace = %backtrace,
                "recovered from handler panic"
            );

            state.alerts.notify_panic(PanicReport {
                method,
                path,
                client_ip: client_ip.0,
                message: message.clone(),
                backtrace,
                occurred_at: Utc::now(),
            });

            AppError::Internal(format!("handler panicked: {message}")).into_response()
        }
    }
}
