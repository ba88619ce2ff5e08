//! `fetch`-based client for the prediction service.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use churn_dash::config::DEFAULT_BASE_URL;
use churn_dash::{BulkResultRow, ClientConfig, ClientError, PredictionRequest, PredictionResponse, Result};
use serde::de::DeserializeOwned;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, File, FormData, Headers, Request, RequestInit, Response};

use crate::console_warn;

#[derive(Clone, Debug)]
pub struct WebClient {
    config: ClientConfig,
}

impl WebClient {
    /// Uses the `CHURN_API_URL` value present when the bundle was built.
    pub fn from_build_env() -> Self {
        let raw = option_env!("CHURN_API_URL").unwrap_or(DEFAULT_BASE_URL);
        let config = ClientConfig::new(raw).unwrap_or_else(|err| {
            console_warn(&format!("{err}; using {DEFAULT_BASE_URL}"));
            ClientConfig::default()
        });
        Self { config }
    }

    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let body = serde_json::to_string(request)
            .map_err(|err| ClientError::Transport(format!("failed to encode request: {err}")))?;
        let headers = Headers::new().map_err(js_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_error)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        let deadline = Deadline::arm(self.config.predict_timeout)?;
        init.set_signal(Some(&deadline.signal()));
        let result = fetch_json(&self.config.predict_url(), &init).await;
        deadline.settle(result)
    }

    /// No file means no request.
    pub async fn upload(&self, file: Option<File>) -> Result<Vec<BulkResultRow>> {
        let file = file.ok_or(ClientError::NoFileSelected)?;
        let form = FormData::new().map_err(js_error)?;
        form.append_with_blob_and_filename("file", &file, &file.name())
            .map_err(js_error)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&form);
        fetch_json(&self.config.upload_url(), &init).await
    }
}

async fn fetch_json<T: DeserializeOwned>(url: &str, init: &RequestInit) -> Result<T> {
    let window =
        web_sys::window().ok_or_else(|| ClientError::Transport("no window available".into()))?;
    let request = Request::new_with_str_and_init(url, init).map_err(js_error)?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: Response = value.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(ClientError::Status(response.status()));
    }
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .ok_or_else(|| ClientError::Decode("response body is not text".into()))?;
    serde_json::from_str(&text).map_err(|err| ClientError::Decode(err.to_string()))
}

fn js_error(value: JsValue) -> ClientError {
    ClientError::Transport(format!("{value:?}"))
}

/// Aborts the request it signals once the timeout elapses. Dropping it clears
/// the pending timer.
struct Deadline {
    controller: AbortController,
    fired: Rc<Cell<bool>>,
    timer: i32,
    timeout_ms: u64,
    _on_expiry: Closure<dyn FnMut()>,
}

impl Deadline {
    fn arm(timeout: Duration) -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| ClientError::Transport("no window available".into()))?;
        let controller = AbortController::new().map_err(js_error)?;
        let fired = Rc::new(Cell::new(false));
        let on_expiry = {
            let controller = controller.clone();
            let fired = fired.clone();
            Closure::<dyn FnMut()>::new(move || {
                fired.set(true);
                controller.abort();
            })
        };
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let timer = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                on_expiry.as_ref().unchecked_ref(),
                i32::try_from(timeout_ms).unwrap_or(i32::MAX),
            )
            .map_err(js_error)?;
        Ok(Self {
            controller,
            fired,
            timer,
            timeout_ms,
            _on_expiry: on_expiry,
        })
    }

    fn signal(&self) -> AbortSignal {
        self.controller.signal()
    }

    /// An error caused by the abort is reported as a timeout.
    fn settle<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Err(_) if self.fired.get() => Err(ClientError::Timeout(self.timeout_ms)),
            other => other,
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(self.timer);
        }
    }
}
