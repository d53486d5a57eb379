use actix_web::http::StatusCode;
use shared::AnalyzeResponse;

use crate::inference::classifier::Classifier;
use crate::inference::model::ModelError;
use crate::inference::preprocess::{PreprocessError, preprocess};

/// Hard cap on one accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// One multipart upload; lives only for the request that carried it.
pub struct UploadedImage {
    pub data: Vec<u8>,
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No image file provided")]
    MissingFile,
    #[error("No image selected")]
    EmptyFilename,
    #[error("Image is too large")]
    TooLarge,
    #[error("Preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Analysis timed out")]
    Timeout,
}

impl PipelineError {
    /// Intake validation failures are the caller's to fix; everything past
    /// validation is an analysis failure on our side.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::EmptyFilename | Self::TooLarge => StatusCode::BAD_REQUEST,
            Self::Preprocess(_) | Self::Model(_) | Self::Timeout => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-visible message. Validation errors are echoed verbatim;
    /// analysis failures collapse to one generic message and the detail
    /// only goes to the server log.
    pub fn client_message(&self) -> String {
        match self {
            Self::MissingFile | Self::EmptyFilename | Self::TooLarge => self.to_string(),
            Self::Preprocess(_) | Self::Model(_) | Self::Timeout => {
                "Image analysis failed".to_string()
            }
        }
    }
}

/// Runs one upload through intake validation, preprocessing and
/// classification. The first failure wins; nothing partial is returned.
pub fn run(
    classifier: &Classifier,
    upload: Option<UploadedImage>,
) -> Result<AnalyzeResponse, PipelineError> {
    let upload = upload.ok_or(PipelineError::MissingFile)?;
    // Browsers submit a present-but-empty file input when nothing was
    // picked, which is distinct from omitting the field entirely.
    if upload.filename.is_empty() {
        return Err(PipelineError::EmptyFilename);
    }
    if upload.data.len() > MAX_UPLOAD_BYTES {
        return Err(PipelineError::TooLarge);
    }

    let batch = preprocess(&upload.data)?;
    let outcome = classifier.classify(&batch)?;

    Ok(AnalyzeResponse {
        prediction: outcome.label,
        confidence: format_confidence(outcome.confidence),
    })
}

/// Formats a confidence fraction for the response payload, e.g. `0.8734`
/// becomes `"87.34%"`.
pub fn format_confidence(fraction: f32) -> String {
    format!("{:.2}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::model::ModelHandle;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(32, 32, Rgb([120, 90, 60]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn offline_classifier() -> Classifier {
        Classifier::new(ModelHandle::unavailable())
    }

    fn upload(filename: &str, data: Vec<u8>) -> Option<UploadedImage> {
        Some(UploadedImage {
            data,
            filename: filename.to_string(),
        })
    }

    #[test]
    fn missing_file_is_a_client_error() {
        let err = run(&offline_classifier(), None).unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "No image file provided");
    }

    #[test]
    fn empty_filename_is_a_client_error() {
        let err = run(&offline_classifier(), upload("", png_bytes())).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyFilename));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "No image selected");
    }

    #[test]
    fn oversized_upload_is_rejected_before_decoding() {
        let data = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = run(&offline_classifier(), upload("big.png", data)).unwrap_err();
        assert!(matches!(err, PipelineError::TooLarge));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn undecodable_bytes_surface_as_a_generic_analysis_failure() {
        let err = run(&offline_classifier(), upload("noise.png", b"junk".to_vec())).unwrap_err();
        assert!(matches!(err, PipelineError::Preprocess(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Image analysis failed");
    }

    #[test]
    fn unavailable_model_fails_valid_uploads_server_side() {
        let err = run(&offline_classifier(), upload("photo.png", png_bytes())).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Model(ModelError::Unavailable)
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Image analysis failed");
    }

    #[test]
    fn confidence_formatting_uses_two_decimals() {
        assert_eq!(format_confidence(0.8734), "87.34%");
        assert_eq!(format_confidence(1.0), "100.00%");
        assert_eq!(format_confidence(0.5), "50.00%");
    }
}
