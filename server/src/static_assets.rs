use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use color_eyre::eyre::{bail, WrapErr};
use include_dir::{include_dir, Dir};
use mime_guess::from_path;

use crate::state::AppState;
use crate::user::DEFAULT_IMAGE_FILE;

// Include the static directory in the binary
static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Profile pictures are thumbnailed to fit this square.
const PICTURE_SIZE: u32 = 125;

/// Serve static files: uploaded profile pictures from the uploads directory
/// on disk, everything else from the embedded directory.
pub async fn serve_static_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Response {
    if let Some(name) = path.strip_prefix("profile_pics/") {
        if !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..") {
            let on_disk = state.config.uploads_dir.join(name);
            if let Ok(contents) = tokio::fs::read(&on_disk).await {
                let mime_type = from_path(name).first_or_octet_stream().to_string();
                return ([(header::CONTENT_TYPE, mime_type)], contents).into_response();
            }
        }
        // Accounts that never uploaded anything point here
        return serve_embedded(DEFAULT_IMAGE_FILE);
    }

    serve_embedded(&path)
}

fn serve_embedded(path: &str) -> Response {
    if let Some(file) = STATIC_DIR.get_file(path) {
        let contents = file.contents().to_vec();
        let mime_type = from_path(path).first_or_octet_stream().to_string();

        (
            [
                (header::CONTENT_TYPE, mime_type),
                (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
            ],
            contents,
        )
            .into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// URL a stored `image_file` reference is served under.
pub fn profile_pic_url(image_file: &str) -> String {
    format!("/static/profile_pics/{image_file}")
}

/// Decode an uploaded picture, shrink it to a thumbnail and write it to the
/// uploads directory under a fresh random name that cannot collide with any
/// earlier upload. Returns the stored filename.
pub async fn store_profile_picture(
    uploads_dir: &std::path::Path,
    original_name: &str,
    data: &[u8],
) -> color_eyre::Result<String> {
    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let ext = match ext.as_deref() {
        Some("png") => "png",
        Some("jpg") | Some("jpeg") => "jpg",
        _ => bail!("unsupported picture type: {original_name}"),
    };

    let img = image::load_from_memory(data).wrap_err("failed to decode uploaded picture")?;
    let thumb = img.thumbnail(PICTURE_SIZE, PICTURE_SIZE);

    let filename = format!("{}.{ext}", uuid::Uuid::new_v4().simple());
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .wrap_err("failed to create uploads directory")?;
    thumb
        .save(uploads_dir.join(&filename))
        .wrap_err("failed to write resized picture")?;

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 120, 200, 255]));
        let mut buffer = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .expect("failed to encode sample image");
        buffer
    }

    #[tokio::test]
    async fn stores_a_thumbnail_under_a_new_name() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let data = sample_png(500, 400);

        let filename = store_profile_picture(dir.path(), "holiday.PNG", &data)
            .await
            .expect("storing picture failed");

        assert!(filename.ends_with(".png"));

        let stored = image::open(dir.path().join(&filename)).expect("stored file unreadable");
        assert!(stored.width() <= PICTURE_SIZE);
        assert!(stored.height() <= PICTURE_SIZE);
    }

    #[tokio::test]
    async fn rejects_unsupported_extensions() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");

        let result = store_profile_picture(dir.path(), "script.exe", &sample_png(10, 10)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejects_garbage_data() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");

        let result = store_profile_picture(dir.path(), "broken.png", b"not an image").await;
        assert!(result.is_err());
    }
}
