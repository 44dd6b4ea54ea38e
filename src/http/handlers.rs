use crate::app::{CheckoutCreated, OrderStatus, Services};
use crate::http::error::{ApiJson, ApiPath};
use crate::domain::model::{Event, PhotoRecord};
use crate::utils::error::{LensError, Result};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CreateEventBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutBody {
    pub event_id: String,
    pub photo_ids: Vec<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn create_event(
    State(services): State<Services>,
    ApiJson(body): ApiJson<CreateEventBody>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = services.events.create_event(&body.name).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(services): State<Services>,
    ApiPath(event_id): ApiPath<String>,
) -> Result<Json<Event>> {
    Ok(Json(services.events.get_event(&event_id).await?))
}

pub async fn upload_photos(
    State(services): State<Services>,
    ApiPath(event_id): ApiPath<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let mut multipart = multipart?;
    let files = read_files(&mut multipart, None).await?;
    let uploaded = services.photos.upload_many(&event_id, files).await?;
    Ok((StatusCode::CREATED, Json(json!({ "photos": uploaded }))))
}

pub async fn list_photos(
    State(services): State<Services>,
    ApiPath(event_id): ApiPath<String>,
) -> Result<Json<Value>> {
    let photos = services.photos.list(&event_id).await?;
    Ok(Json(json!({ "photos": photos })))
}

pub async fn photo_report(
    State(services): State<Services>,
    ApiPath(event_id): ApiPath<String>,
) -> Result<Response> {
    let csv = services.photos.report_csv(&event_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"event-{}.csv\"", event_id),
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn get_photo(
    State(services): State<Services>,
    ApiPath((event_id, photo_id)): ApiPath<(String, String)>,
) -> Result<Json<PhotoRecord>> {
    Ok(Json(services.photos.get(&event_id, &photo_id).await?))
}

pub async fn delete_photo(
    State(services): State<Services>,
    ApiPath((event_id, photo_id)): ApiPath<(String, String)>,
) -> Result<StatusCode> {
    services.photos.delete(&event_id, &photo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn photo_preview(
    State(services): State<Services>,
    ApiPath((event_id, photo_id)): ApiPath<(String, String)>,
) -> Result<Response> {
    let object = services.photos.preview(&event_id, &photo_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        object.bytes,
    )
        .into_response())
}

pub async fn search_faces(
    State(services): State<Services>,
    ApiPath(event_id): ApiPath<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart = multipart?;
    let (_, selfie) = read_files(&mut multipart, Some("selfie"))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| LensError::invalid_input("selfie", "multipart field 'selfie' is required"))?;

    let matches = services.search.find_photos(&event_id, selfie).await?;
    Ok(Json(json!({ "matches": matches })))
}

pub async fn create_checkout(
    State(services): State<Services>,
    ApiJson(body): ApiJson<CreateCheckoutBody>,
) -> Result<(StatusCode, Json<CheckoutCreated>)> {
    let created = services
        .checkout
        .create_checkout(&body.event_id, &body.photo_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn checkout_status(
    State(services): State<Services>,
    ApiPath(session_id): ApiPath<String>,
) -> Result<Json<OrderStatus>> {
    Ok(Json(services.checkout.status(&session_id).await?))
}

pub async fn download_photo(
    State(services): State<Services>,
    ApiPath((session_id, photo_id)): ApiPath<(String, String)>,
) -> Result<Response> {
    let download = services.checkout.download(&session_id, &photo_id).await?;
    Ok(attachment(download.filename, download.object.content_type, download.object.bytes))
}

pub async fn download_archive(
    State(services): State<Services>,
    ApiPath(session_id): ApiPath<String>,
) -> Result<Response> {
    let download = services.checkout.archive(&session_id).await?;
    Ok(attachment(download.filename, download.object.content_type, download.object.bytes))
}

fn attachment(filename: String, content_type: String, bytes: Vec<u8>) -> Response {
    // header 只放 ASCII 檔名
    let ascii_name: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect();

    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ascii_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn multipart_error(e: MultipartError) -> LensError {
    LensError::invalid_input("multipart body", e.body_text())
}

/// 讀取 multipart 中的檔案欄位；`only_field` 指定時只取該名稱的欄位
async fn read_files(
    multipart: &mut Multipart,
    only_field: Option<&str>,
) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);

        let wanted = match only_field {
            Some(expected) => name == expected,
            None => filename.is_some(),
        };
        if !wanted {
            continue;
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        files.push((filename.unwrap_or(name), bytes.to_vec()));
    }

    Ok(files)
}
