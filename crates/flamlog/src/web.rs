//! HTTP front end.
//!
//! Four pages wrap the record store: a home listing, search, an entry form
//! and the pass/fail predictor. Every failure is logged with the route that
//! hit it and answered with the same HTML error page; the status code depends
//! only on the kind of error.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::html;
use crate::predict::predict;
use crate::record::Record;
use crate::store::RecordStore;

/// Cookie carrying the one-shot confirmation notice across a redirect.
pub const NOTICE_COOKIE: &str = "flamlog_notice";

/// Notice shown on the home page after a successful add.
pub const ADDED_NOTICE: &str = "New entry added successfully!";

type FormFields = HashMap<String, String>;

/// Shared state for all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The record store.
    pub store: Arc<RecordStore>,
}

/// Build the application router.
pub fn router(store: Arc<RecordStore>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/search", get(search_form).post(search))
        .route("/add", get(add_form).post(add_entry))
        .route("/add_edit", get(add_form).post(add_entry))
        .route("/predict", get(predict_form).post(predict_flammability))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

/// Serve the application on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, store: Arc<RecordStore>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// The HTTP status for an error kind.
#[must_use]
pub fn status_code(err: &Error) -> StatusCode {
    match err {
        Error::MissingField { .. } | Error::InvalidForm { .. } => StatusCode::BAD_REQUEST,
        Error::Unencodable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Load { .. }
        | Error::Write { .. }
        | Error::Render(_)
        | Error::Task(_)
        | Error::ConfigLoad(_)
        | Error::ConfigValidation { .. }
        | Error::Io(_)
        | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// An error raised while handling a route.
#[derive(Debug)]
pub struct HandlerError {
    route: &'static str,
    source: Error,
}

impl HandlerError {
    fn at(route: &'static str) -> impl FnOnce(Error) -> Self {
        move |source| Self { route, source }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = status_code(&self.source);
        let message = if self.source.is_client_error() {
            warn!(route = self.route, "Rejected request: {}", self.source);
            self.source.to_string()
        } else {
            error!(route = self.route, "Request failed: {}", self.source);
            format!("An error occurred while handling {}.", self.route)
        };
        (status, Html(html::error_page(&message))).into_response()
    }
}

type HandlerResult = std::result::Result<Response, HandlerError>;

/// Run `op` against the store on the blocking pool.
///
/// Store calls take a `std` lock and appends rewrite the backing file, so
/// they stay off the async workers.
async fn with_store<T, F>(store: &Arc<RecordStore>, op: F) -> Result<T>
where
    F: FnOnce(&RecordStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    Ok(tokio::task::spawn_blocking(move || op(&store)).await?)
}

fn form_fields(
    form: std::result::Result<Form<FormFields>, FormRejection>,
) -> Result<FormFields> {
    form.map(|Form(fields)| fields)
        .map_err(|rejection| Error::invalid_form(rejection.body_text()))
}

fn required<'a>(fields: &'a FormFields, name: &str) -> Result<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::missing_field(name))
}

async fn home(State(state): State<AppState>, headers: HeaderMap) -> HandlerResult {
    let notice = read_notice(&headers);
    let page = render_home(&state.store, notice.as_deref())
        .await
        .map_err(HandlerError::at("home"))?;

    let mut response = Html(page).into_response();
    if notice.is_some() {
        response.headers_mut().insert(
            header::SET_COOKIE,
            HeaderValue::from_static("flamlog_notice=; Path=/; Max-Age=0"),
        );
    }
    Ok(response)
}

async fn render_home(store: &Arc<RecordStore>, notice: Option<&str>) -> Result<String> {
    let records = with_store(store, RecordStore::records).await?;
    let table = html::render_table(records.iter().enumerate())?;
    html::index_page(&table, notice)
}

async fn search_form() -> HandlerResult {
    let page = html::search_page(None, None).map_err(HandlerError::at("search"))?;
    Ok(Html(page).into_response())
}

async fn search(
    State(state): State<AppState>,
    form: std::result::Result<Form<FormFields>, FormRejection>,
) -> HandlerResult {
    let page = run_search(&state.store, form)
        .await
        .map_err(HandlerError::at("search"))?;
    Ok(Html(page).into_response())
}

async fn run_search(
    store: &Arc<RecordStore>,
    form: std::result::Result<Form<FormFields>, FormRejection>,
) -> Result<String> {
    let fields = form_fields(form)?;
    let query = required(&fields, "query")?.to_string();
    let matches = {
        let query = query.clone();
        with_store(store, move |store| store.filter(&query)).await?
    };
    let table = html::render_table(matches.iter().map(|m| (m.index, &m.record)))?;
    html::search_page(Some(&query), Some(&table))
}

async fn add_form() -> HandlerResult {
    let page = html::add_page().map_err(HandlerError::at("add"))?;
    Ok(Html(page).into_response())
}

async fn add_entry(
    State(state): State<AppState>,
    form: std::result::Result<Form<FormFields>, FormRejection>,
) -> HandlerResult {
    run_add(&state.store, form)
        .await
        .map_err(HandlerError::at("add"))
}

async fn run_add(
    store: &Arc<RecordStore>,
    form: std::result::Result<Form<FormFields>, FormRejection>,
) -> Result<Response> {
    let fields = form_fields(form)?;
    let record = Record::from_form(&fields)?;
    debug!("Adding record for {:?}", record.material_name);
    with_store(store, move |store| store.append(record)).await??;

    let cookie = HeaderValue::from_str(&notice_cookie(ADDED_NOTICE))
        .map_err(|e| Error::render(e.to_string()))?;
    let mut response = Redirect::to("/").into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn predict_form() -> HandlerResult {
    let page = html::predict_page(None).map_err(HandlerError::at("predict"))?;
    Ok(Html(page).into_response())
}

async fn predict_flammability(
    form: std::result::Result<Form<FormFields>, FormRejection>,
) -> HandlerResult {
    let fail = HandlerError::at("predict");
    let run = || -> Result<String> {
        let fields = form_fields(form)?;
        let material_name = required(&fields, "material_name")?;
        let prediction = predict(required(&fields, "flammability_class")?);
        debug!("Predicted {prediction} for {material_name:?}");
        html::predict_page(Some((material_name, prediction)))
    };
    Ok(Html(run().map_err(fail)?).into_response())
}

fn notice_cookie(message: &str) -> String {
    format!(
        "{NOTICE_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        percent_encode(message)
    )
}

/// Read the notice cookie, if any.
fn read_notice(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == NOTICE_COOKIE && !value.is_empty())
        .and_then(|(_, value)| percent_decode(value))
}

fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn percent_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3)?;
            // from_str_radix alone would take a leading sign
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_code(&Error::missing_field("query")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_code(&Error::invalid_form("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_code(&Error::unencodable("density")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_code(&Error::render("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_code(&Error::load("a.csv", "x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_percent_round_trip() {
        let encoded = percent_encode(ADDED_NOTICE);
        assert_eq!(encoded, "New%20entry%20added%20successfully!");
        assert_eq!(percent_decode(&encoded).unwrap(), ADDED_NOTICE);
    }

    #[test]
    fn test_percent_encode_utf8() {
        let encoded = percent_encode("Entrée ajoutée; ok");
        assert!(!encoded.contains(';'));
        assert_eq!(percent_decode(&encoded).unwrap(), "Entrée ajoutée; ok");
    }

    #[test]
    fn test_percent_decode_invalid() {
        assert!(percent_decode("%Z1").is_none());
        assert!(percent_decode("trailing%4").is_none());
    }

    #[test]
    fn test_percent_decode_rejects_signs() {
        assert!(percent_decode("%+1").is_none());
        assert!(percent_decode("%-1").is_none());
        assert!(percent_decode("a%+Fb").is_none());
        assert_eq!(percent_decode("%2B1").as_deref(), Some("+1"));
    }

    #[tokio::test]
    async fn test_with_store_runs_operation() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Arc::new(RecordStore::open(dir.path().join("data.csv")).unwrap());
        let len = with_store(&store, RecordStore::len).await.unwrap();
        assert_eq!(len, 0);
    }

    #[tokio::test]
    async fn test_with_store_panic_is_500() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Arc::new(RecordStore::open(dir.path().join("data.csv")).unwrap());
        let err = with_store(&store, |_| -> usize { panic!("store operation panicked") })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Task(_)));
        assert_eq!(status_code(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_read_notice() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; flamlog_notice=Saved%21; other=1"),
        );
        assert_eq!(read_notice(&headers).as_deref(), Some("Saved!"));
    }

    #[test]
    fn test_read_notice_absent_or_cleared() {
        let mut headers = HeaderMap::new();
        assert!(read_notice(&headers).is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("flamlog_notice="));
        assert!(read_notice(&headers).is_none());
    }

    #[test]
    fn test_notice_cookie_attributes() {
        let cookie = notice_cookie(ADDED_NOTICE);
        assert!(cookie.starts_with("flamlog_notice=New%20entry"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }
}
