// src/handlers.rs
use crate::operations::Operation;
use crate::services::OutputStore;
use crate::{AppState, errors::ImgDropError, models::*};
use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_operations(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "operations": data.operations.list()
    }))
}

pub async fn run_operation(
    path: web::Path<String>,
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let name = path.into_inner();
    let operation = data
        .operations
        .find(&name)
        .ok_or_else(|| ImgDropError::InvalidOperation(name.clone()))?;

    let input = collect_form(payload, data.config.max_upload_bytes).await?;
    execute(operation, input, &data).await
}

/// Single-form entry point: the `mode` field picks the operation.
pub async fn process_form(payload: Multipart, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let input = collect_form(payload, data.config.max_upload_bytes).await?;

    let mode = input
        .fields
        .get("mode")
        .ok_or_else(|| ImgDropError::InvalidOperation("no mode selected".to_string()))?;
    let operation = data
        .operations
        .find(mode)
        .ok_or_else(|| ImgDropError::InvalidOperation(mode.to_string()))?;

    execute(operation, input, &data).await
}

pub async fn download(path: web::Path<Uuid>, data: web::Data<AppState>) -> Result<NamedFile, Error> {
    let id = path.into_inner();
    let stored = data.output_store.get(&id)?;

    let file = NamedFile::open(&stored.path)
        .map_err(|_| ImgDropError::NotFound(format!("Output {} not found", id)))?
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(stored.filename)],
        });

    Ok(file)
}

async fn execute(
    operation: Arc<dyn Operation>,
    input: OperationInput,
    data: &web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    if input.files.is_empty() {
        return Err(ImgDropError::Validation("No image file selected".to_string()).into());
    }

    let name = operation.name();
    let store = data.output_store.clone();
    let (output, stored) = web::block(move || -> Result<_, ImgDropError> {
        let output = operation.execute(&input)?;
        let stored = store.save(&output)?;
        Ok((output, stored))
    })
    .await
    .map_err(ImgDropError::from)??;

    info!(
        "{} produced {} ({} bytes) as {}",
        name, stored.filename, stored.size, stored.id
    );
    if let Some(warning) = &output.warning {
        warn!("{}: {}", name, warning);
    }

    let receipt = OperationReceipt {
        id: stored.id,
        operation: name.to_string(),
        download_url: format!("{}/download/{}", data.config.public_url, stored.id),
        filename: stored.filename,
        content_type: stored.content_type,
        size: stored.size,
        expires_at: stored.expires_at,
        warning: output.warning,
        width: output.width,
        height: output.height,
        quality: output.quality,
    };

    Ok(HttpResponse::Ok().json(receipt))
}

/// Runs the expiry purge on the blocking pool.
pub async fn sweep_expired(store: Arc<OutputStore>) -> Result<usize, ImgDropError> {
    Ok(web::block(move || store.purge_expired()).await?)
}

/// Reads every multipart field: parts with a filename become uploads, the
/// rest are text fields. Browsers send an empty file part when nothing was
/// chosen; those are dropped.
async fn collect_form(mut payload: Multipart, limit: usize) -> Result<OperationInput, ImgDropError> {
    let mut input = OperationInput::default();
    let mut total = 0usize;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ImgDropError::Upload(e.to_string()))?
    {
        let content_disposition = field.content_disposition();
        let name = content_disposition.get_name().unwrap_or_default().to_string();
        let filename = content_disposition.get_filename().map(|f| f.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ImgDropError::Upload(e.to_string()))?
        {
            total += chunk.len();
            if total > limit {
                return Err(ImgDropError::PayloadTooLarge(limit));
            }
            data.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) if !data.is_empty() => input.files.push(UploadedImage { filename, data }),
            Some(_) => {}
            None => {
                let value = String::from_utf8(data).map_err(|_| {
                    ImgDropError::Upload(format!("Field {} is not valid UTF-8", name))
                })?;
                input.fields.insert(name, value);
            }
        }
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::image_processor::tests::create_test_png;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use image::GenericImageView;
    use tempfile::TempDir;

    const BOUNDARY: &str = "----imgdrop-test-boundary";

    fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        for (name, filename, data) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, name, filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn post_multipart(uri: &str, body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    fn test_state(dir: &TempDir) -> AppState {
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            max_upload_bytes: 1024 * 1024,
            ..Config::default()
        };
        AppState::new(config, crate::services::CaptionRenderer::unavailable()).unwrap()
    }

    #[actix_web::test]
    async fn test_sweep_removes_expired_outputs() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(OutputStore::new(dir.path(), std::time::Duration::ZERO).unwrap());
        let stored = store
            .save(&ProcessedOutput {
                data: vec![7; 16],
                filename: "meme.png".to_string(),
                content_type: "image/png".to_string(),
                warning: None,
                width: None,
                height: None,
                quality: None,
            })
            .unwrap();

        assert_eq!(sweep_expired(store.clone()).await.unwrap(), 1);
        assert!(!stored.path.exists());
        assert_eq!(sweep_expired(store).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn test_resize_then_download() {
        let dir = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(&dir)))
                .configure(crate::configure),
        )
        .await;

        let body = multipart_body(
            &[("width", "16"), ("height", "8"), ("format", "png")],
            &[("image", "photo.png", create_test_png(64, 64))],
        );
        let resp = test::call_service(&app, post_multipart("/api/v1/operations/resize", body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let receipt: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(receipt["operation"], "resize");
        assert_eq!(receipt["filename"], "resized_image.png");
        assert_eq!(receipt["width"], 16);
        assert!(receipt.get("warning").is_none());

        let url = receipt["download_url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/download/"));

        let resp = test::call_service(&app, test::TestRequest::get().uri(&url).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("resized_image.png"));

        let bytes = test::read_body(resp).await;
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (16, 8));
    }

    #[actix_web::test]
    async fn test_process_form_uses_mode_field() {
        let dir = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(&dir)))
                .configure(crate::configure),
        )
        .await;

        let body = multipart_body(
            &[("mode", "filesize"), ("target_size", "200"), ("size_unit", "KB")],
            &[("image", "photo.png", create_test_png(32, 32))],
        );
        let resp = test::call_service(&app, post_multipart("/api/v1/process", body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let receipt: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(receipt["operation"], "reduce");
        assert_eq!(receipt["filename"], "reduced_to_200KB.jpg");
        assert_eq!(receipt["quality"], 95);
    }

    #[actix_web::test]
    async fn test_unknown_mode_is_rejected() {
        let dir = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(&dir)))
                .configure(crate::configure),
        )
        .await;

        let body = multipart_body(
            &[("mode", "sharpen")],
            &[("image", "photo.png", create_test_png(8, 8))],
        );
        let resp = test::call_service(&app, post_multipart("/api/v1/process", body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            post_multipart("/api/v1/operations/sharpen", multipart_body(&[], &[])).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_missing_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(&dir)))
                .configure(crate::configure),
        )
        .await;

        let body = multipart_body(
            &[("width", "10"), ("height", "10")],
            &[("image", "", Vec::new())],
        );
        let resp = test::call_service(&app, post_multipart("/api/v1/operations/resize", body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let error: serde_json::Value = test::read_body_json(resp).await;
        assert!(error["message"].as_str().unwrap().contains("No image file selected"));
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(
            Config {
                output_dir: dir.path().to_path_buf(),
                max_upload_bytes: 64,
                ..Config::default()
            },
            crate::services::CaptionRenderer::unavailable(),
        )
        .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::configure),
        )
        .await;

        let body = multipart_body(&[], &[("image", "big.png", vec![0u8; 1024])]);
        let resp = test::call_service(&app, post_multipart("/api/v1/operations/convert", body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_download_unknown_id() {
        let dir = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(&dir)))
                .configure(crate::configure),
        )
        .await;

        let uri = format!("/download/{}", Uuid::new_v4());
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_list_operations_and_health() {
        let dir = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(&dir)))
                .configure(crate::configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/operations").to_request()).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        let operations = body["operations"].as_array().unwrap();
        assert_eq!(operations.len(), 7);
        assert_eq!(operations[0]["name"], "resize");
        assert_eq!(operations[0]["aliases"][0], "dimension");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "imgdrop");
    }
}
