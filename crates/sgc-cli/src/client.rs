//! Async HTTP client wrapping the SGC REST API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Response, multipart};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use sgc_core::{
  acpm::{Acpm, AcpmStatus, AcpmTransition},
  certificate::GeneratedCertificate,
  drive::{DriveFile, Folder, FolderContents},
  template::FilledValues,
};
use uuid::Uuid;

/// Connection settings for the SGC API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub api_key:  String,
}

/// Async HTTP client for the SGC REST API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Response of `POST /acpm/:id/evidencia`.
#[derive(Debug, serde::Deserialize)]
pub struct Evidence {
  pub url:  String,
  pub file: DriveFile,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(120))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.api_key.is_empty() {
      req
    } else {
      req.header("x-api-key", &self.config.api_key)
    }
  }

  /// Send, then turn a non-2xx status into an error carrying the server's
  /// `{"error": ...}` message.
  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
      .unwrap_or_default();
    Err(anyhow!("{what} → {status} {message}"))
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    let what = format!("GET {path}");
    self
      .send(self.client.get(self.url(path)).query(query), &what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  async fn send_json<B: Serialize, T: DeserializeOwned>(
    &self,
    req: RequestBuilder,
    what: &str,
    body: &B,
  ) -> Result<T> {
    self
      .send(req.json(body), what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising response of {what}"))
  }

  async fn delete(&self, path: &str) -> Result<()> {
    let what = format!("DELETE {path}");
    self.send(self.client.delete(self.url(path)), &what).await?;
    Ok(())
  }

  // ── Drive ─────────────────────────────────────────────────────────────────

  /// `GET /drive/contenido[/:id]`
  pub async fn list(&self, folder: Option<Uuid>) -> Result<FolderContents> {
    let path = match folder {
      Some(id) => format!("/drive/contenido/{id}"),
      None => "/drive/contenido".to_owned(),
    };
    self.get_json(&path, &[]).await
  }

  /// `POST /drive/carpeta`
  pub async fn create_folder(&self, name: &str, parent: Option<Uuid>) -> Result<Folder> {
    self
      .send_json(
        self.client.post(self.url("/drive/carpeta")),
        "POST /drive/carpeta",
        &json!({ "name": name, "parent_id": parent }),
      )
      .await
  }

  /// `DELETE /drive/carpeta/:id`
  pub async fn delete_folder(&self, id: Uuid) -> Result<()> {
    self.delete(&format!("/drive/carpeta/{id}")).await
  }

  /// `POST /drive/archivo`
  pub async fn upload(
    &self,
    folder: Uuid,
    file_name: String,
    content: Vec<u8>,
  ) -> Result<DriveFile> {
    let form = multipart::Form::new()
      .text("folder_id", folder.to_string())
      .part("file", multipart::Part::bytes(content).file_name(file_name));
    self
      .send(
        self.client.post(self.url("/drive/archivo")).multipart(form),
        "POST /drive/archivo",
      )
      .await?
      .json()
      .await
      .context("deserialising uploaded file")
  }

  /// `GET /drive/archivo/:id`: the file name from `Content-Disposition` and
  /// the bytes.
  pub async fn download(&self, id: Uuid) -> Result<(Option<String>, Vec<u8>)> {
    let path = format!("/drive/archivo/{id}");
    let what = format!("GET {path}");
    let resp = self.send(self.client.get(self.url(&path)), &what).await?;
    let name = resp
      .headers()
      .get(reqwest::header::CONTENT_DISPOSITION)
      .and_then(|v| v.to_str().ok())
      .and_then(disposition_file_name);
    let bytes = resp.bytes().await.context("reading file body")?;
    Ok((name, bytes.to_vec()))
  }

  /// `DELETE /drive/archivo/:id`
  pub async fn delete_file(&self, id: Uuid) -> Result<()> {
    self.delete(&format!("/drive/archivo/{id}")).await
  }

  // ── ACPM ──────────────────────────────────────────────────────────────────

  /// `GET /acpm[?status=<status>]`
  pub async fn list_acpms(&self, status: Option<AcpmStatus>) -> Result<Vec<Acpm>> {
    let query: Vec<(&str, String)> = status
      .map(|s| {
        let value = serde_json::to_value(s)
          .ok()
          .and_then(|v| v.as_str().map(str::to_owned))
          .unwrap_or_default();
        ("status", value)
      })
      .into_iter()
      .collect();
    self.get_json("/acpm", &query).await
  }

  /// `POST /acpm/:id/evidencia`
  pub async fn upload_evidence(
    &self,
    id: Uuid,
    file_name: String,
    content: Vec<u8>,
  ) -> Result<Evidence> {
    let path = format!("/acpm/{id}/evidencia");
    let form = multipart::Form::new()
      .part("file", multipart::Part::bytes(content).file_name(file_name));
    let what = format!("POST {path}");
    self
      .send(self.client.post(self.url(&path)).multipart(form), &what)
      .await?
      .json()
      .await
      .context("deserialising evidence")
  }

  /// `PUT /acpm/:id/estado`
  pub async fn transition(&self, id: Uuid, transition: &AcpmTransition) -> Result<Acpm> {
    let path = format!("/acpm/{id}/estado");
    let what = format!("PUT {path}");
    self
      .send_json(self.client.put(self.url(&path)), &what, transition)
      .await
  }

  // ── Certificates ──────────────────────────────────────────────────────────

  /// `POST /certificados/generar`
  pub async fn generate(
    &self,
    template_id: Uuid,
    values: FilledValues,
    batch: Option<String>,
    client: Option<String>,
  ) -> Result<GeneratedCertificate> {
    self
      .send_json(
        self.client.post(self.url("/certificados/generar")),
        "POST /certificados/generar",
        &json!({
          "template_id": template_id,
          "values": values,
          "batch": batch,
          "client": client,
        }),
      )
      .await
  }

  /// `GET /certificados/generados[?q=<text>]`
  pub async fn search_generated(&self, q: Option<String>) -> Result<Vec<GeneratedCertificate>> {
    let query: Vec<(&str, String)> = q.map(|q| ("q", q)).into_iter().collect();
    self.get_json("/certificados/generados", &query).await
  }
}

/// The plain `filename="..."` parameter of a `Content-Disposition` value.
fn disposition_file_name(value: &str) -> Option<String> {
  value.split(';').map(str::trim).find_map(|param| {
    param
      .strip_prefix("filename=")
      .map(|v| v.trim_matches('"').to_owned())
      .filter(|v| !v.is_empty())
  })
}
