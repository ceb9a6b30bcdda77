use actix_cors::Cors;
use actix_multipart::{Field, Multipart};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, post, web};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::config::{AppConfig, Profile};
use crate::dto::TranscriptDto;
use crate::error::AsrError;
use crate::store::{GcsTextStore, TextStore};
use crate::transcriber::{self, Transcriber};
use crate::upload;

pub struct AppState {
    pub config: AppConfig,
    pub transcriber: Arc<dyn Transcriber>,
    pub store: Arc<dyn TextStore>,
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    debug!("Health check endpoint called");
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}

#[post("/asr")]
pub async fn asr_handler(
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, AsrError> {
    debug!("Transcription request received");

    let mut uploaded: Option<(String, Vec<u8>)> = None;
    loop {
        let field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read multipart payload: {e}");
                return Err(AsrError::InvalidInput(
                    "Failed to read uploaded file".to_string(),
                ));
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let bytes = read_field_data(field, data.config.max_upload_bytes).await?;
        uploaded = Some((filename, bytes));
    }

    let (filename, bytes) = uploaded.ok_or_else(|| {
        warn!("No file field in transcription request");
        AsrError::InvalidInput("No file provided".to_string())
    })?;

    let extension = upload::validate_upload(&filename, &data.config)?;
    let staged = upload::stage_upload(&bytes, &extension)?;

    // Any failure from here drops `staged`, which removes the temp file.
    let text = data.transcriber.transcribe(staged.path()).await?;

    let text_url = match data.config.profile {
        Profile::Remote => Some(data.store.save(&text).await?),
        Profile::Local => {
            // Archival only; a failed save never fails the request.
            if let Err(e) = data.store.save(&text).await {
                warn!("Transcript archival failed, response unaffected: {e}");
            }
            None
        }
    };

    // The staged audio is gone before the response leaves. A file that
    // already vanished is not worth more than a debug line.
    if let Err(e) = staged.close() {
        debug!("Temp file already gone at cleanup: {e}");
    }

    info!("Transcription completed: {} characters", text.len());
    Ok(HttpResponse::Ok().json(TranscriptDto { text, text_url }))
}

/// Buffers one multipart field, refusing to grow past `limit` bytes. The
/// cap has to live here because the raw `Multipart` stream ignores the
/// typed-form extractor limits.
async fn read_field_data(mut field: Field, limit: usize) -> Result<Vec<u8>, AsrError> {
    let mut data = Vec::new();
    loop {
        let chunk = match field.try_next().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read upload field: {e}");
                return Err(AsrError::InvalidInput(
                    "Failed to read uploaded file".to_string(),
                ));
            }
        };
        if data.len() + chunk.len() > limit {
            warn!("Upload exceeds the {limit} byte limit");
            return Err(AsrError::InvalidInput(
                "Uploaded file is too large".to_string(),
            ));
        }
        data.extend_from_slice(&chunk);
    }
    debug!("Read field data: {} bytes", data.len());
    Ok(data)
}

pub async fn run_server(host: String, port: u16, config: AppConfig) -> anyhow::Result<()> {
    let transcriber = transcriber::build_transcriber(&config)?;
    let store: Arc<dyn TextStore> = Arc::new(GcsTextStore::new(config.store.clone()));

    let state = web::Data::new(AppState {
        config,
        transcriber,
        store,
    });

    info!("Starting HTTP server on {host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health_check)
            .service(asr_handler)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
