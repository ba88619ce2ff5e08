//! Native HTTP client for the prediction service.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::wire::{BulkResultRow, PredictionRequest, PredictionResponse, UploadFile};
use crate::{ClientError, Result};

const UPLOAD_FIELD: &str = "file";
const CSV_MIME: &str = "text/csv";

pub struct PredictionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl PredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST /predict`. The whole exchange, body included, must finish within
    /// the configured timeout; otherwise the request is dropped mid-flight.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let url = self.config.predict_url();
        let timeout = self.config.predict_timeout;
        debug!(%url, "sending prediction request");

        let exchange = async {
            let response = self
                .http
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(transport_error)?;
            read_json::<PredictionResponse>(response).await
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(prediction)) => {
                info!(
                    probability = prediction.probability,
                    risk = %prediction.risk,
                    "prediction received"
                );
                Ok(prediction)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                warn!(timeout_ms = millis(timeout), %url, "prediction request aborted");
                Err(ClientError::Timeout(millis(timeout)))
            }
        }
    }

    /// `POST /upload` with the file as the multipart field `file`. Without a
    /// file nothing is sent.
    pub async fn upload(&self, file: Option<&UploadFile>) -> Result<Vec<BulkResultRow>> {
        let file = file.ok_or(ClientError::NoFileSelected)?;
        let url = self.config.upload_url();
        debug!(%url, file = %file.name, bytes = file.bytes.len(), "uploading bulk file");

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(CSV_MIME)
            .map_err(transport_error)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let rows = read_json::<Vec<BulkResultRow>>(response).await?;
        info!(rows = rows.len(), "bulk ranking received");
        Ok(rows)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status(status.as_u16()));
    }
    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()))
}

fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FormInputs;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Accept one connection, capture the raw request, wait `delay`, answer.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
            if head.contains("transfer-encoding: chunked") {
                if buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
                continue;
            }
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + length {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(base_url: &str, timeout: Duration) -> PredictionClient {
        let config = ClientConfig::new(base_url)
            .unwrap()
            .with_predict_timeout(timeout);
        PredictionClient::new(config).unwrap()
    }

    fn sample_request() -> PredictionRequest {
        PredictionRequest::from_inputs(&FormInputs {
            tenure: "12".into(),
            monthly_charges: "70.5".into(),
            total_charges: "846".into(),
            senior_citizen: "0".into(),
            contract: "Month-to-month".into(),
            gender: "Female".into(),
        })
    }

    #[tokio::test]
    async fn predict_posts_json_and_parses_response() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"probability": 82, "risk": "High", "reasons": [], "suggestion": "Offer 20% Discount for 1-year commitment."}"#,
            Duration::ZERO,
        )
        .await;
        let response = client(&base, Duration::from_secs(5))
            .predict(&sample_request())
            .await
            .unwrap();
        assert_eq!(response.probability, 82.0);
        assert_eq!(response.risk, "High");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /predict HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.contains(r#""MonthlyCharges":70.5"#));
        assert!(raw.contains(r#""PaymentMethod":"Electronic check""#));
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let (base, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"error": "boom"}"#,
            Duration::ZERO,
        )
        .await;
        let err = client(&base, Duration::from_secs(5))
            .predict(&sample_request())
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Status(500));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_failure() {
        let (base, _server) = serve_once("200 OK", "<html>oops</html>", Duration::ZERO).await;
        let err = client(&base, Duration::from_secs(5))
            .predict(&sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_service_hits_the_timeout() {
        let (base, _server) = serve_once(
            "200 OK",
            r#"{"probability": 10, "risk": "Low"}"#,
            Duration::from_secs(3),
        )
        .await;
        let err = client(&base, Duration::from_millis(200))
            .predict(&sample_request())
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Timeout(200));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client(&format!("http://{addr}"), Duration::from_secs(5))
            .predict(&sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn upload_without_file_never_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let err = client(&format!("http://{addr}"), Duration::from_secs(5))
            .upload(None)
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::NoFileSelected);
        let accepted = tokio::time::timeout(Duration::from_millis(50), listener.accept()).await;
        assert!(accepted.is_err(), "upload opened a connection");
    }

    #[tokio::test]
    async fn upload_sends_multipart_file_field() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"customer_id": "7590-VHVEG", "probability": 91, "risk": "Critical", "reasons": ["High Monthly Charges"]},
                {"customer_id": "Row-2", "probability": 12, "risk": "Low", "reasons": []}]"#,
            Duration::ZERO,
        )
        .await;
        let file = UploadFile::new(
            "customers.csv",
            b"customerID,tenure,MonthlyCharges\n7590-VHVEG,1,29.85\n".to_vec(),
        );
        let rows = client(&base, Duration::from_secs(5))
            .upload(Some(&file))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customer_id, "7590-VHVEG");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /upload HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("multipart/form-data; boundary="));
        assert!(raw.contains(r#"name="file""#));
        assert!(raw.contains(r#"filename="customers.csv""#));
        assert!(raw.contains("7590-VHVEG,1,29.85"));
    }

    #[tokio::test]
    async fn upload_rejects_non_array_body() {
        let (base, _server) =
            serve_once("200 OK", r#"{"error": "No file part"}"#, Duration::ZERO).await;
        let file = UploadFile::new("customers.csv", b"a,b\n".to_vec());
        let err = client(&base, Duration::from_secs(5))
            .upload(Some(&file))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
