use std::io::Write;
use std::time::Duration;

use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::inference::classifier::Classifier;
use crate::pipeline::{self, PipelineError, UploadedImage};

/// Upper bound on one full analysis; a hung forward pass must not block
/// the request forever.
const ANALYZE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: String) {
    cfg.service(web::resource("/analyze").route(web::post().to(handle_analyze)))
        .service(Files::new("/", static_dir).index_file("index.html"));
}

async fn handle_analyze(
    classifier: web::Data<Classifier>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();
    let upload = read_image_field(&mut payload).await?;

    let classifier = classifier.get_ref().clone();
    let outcome = tokio::time::timeout(
        ANALYZE_TIMEOUT,
        web::block(move || pipeline::run(&classifier, upload)),
    )
    .await;

    let result = match outcome {
        Ok(blocked) => blocked?,
        Err(_) => {
            error!("[{}] Analysis timed out after {:?}", request_id, ANALYZE_TIMEOUT);
            Err(PipelineError::Timeout)
        }
    };

    match result {
        Ok(response) => {
            info!(
                "[{}] Verdict: {} ({})",
                request_id, response.prediction, response.confidence
            );
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!("[{}] Analysis failed: {}", request_id, e);
            } else {
                warn!("[{}] Rejected upload: {}", request_id, e);
            }
            Ok(HttpResponse::build(status).json(ErrorResponse {
                error: e.client_message(),
            }))
        }
    }
}

/// Pulls the `image` field out of the multipart payload, if present.
/// Other fields are drained and ignored.
async fn read_image_field(payload: &mut Multipart) -> Result<Option<UploadedImage>, Error> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.write_all(&chunk?)?;
        }

        return Ok(Some(UploadedImage { data, filename }));
    }

    Ok(None)
}
