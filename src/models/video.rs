use serde::Deserialize;

use crate::artifact_store::ArtifactStore;
use crate::error::ApiError;
use crate::jobs::VideoOptions;
use crate::veo_client::{AspectRatio, VideoModel};

/// JSON body of `POST /api/v1/generate-video`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoBody {
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
    pub watermark: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub filename: Option<String>,
}

impl GenerateVideoBody {
    /// Validate the body, returning the prompt and the resolved options.
    pub fn into_job(self) -> Result<(String, VideoOptions), ApiError> {
        let prompt = self
            .prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ApiError::validation("Prompt is required for video generation"))?;

        let model = match non_empty(self.model) {
            Some(raw) => raw.parse::<VideoModel>().map_err(ApiError::Validation)?,
            None => Default::default(),
        };
        let aspect_ratio = match non_empty(self.aspect_ratio) {
            Some(raw) => raw.parse::<AspectRatio>().map_err(ApiError::Validation)?,
            None => Default::default(),
        };

        let output_filename = non_empty(self.filename);
        if let Some(name) = &output_filename {
            if ArtifactStore::file_name_of(name).is_none() {
                return Err(ApiError::validation(format!("Invalid filename: {name}")));
            }
        }

        Ok((
            prompt,
            VideoOptions {
                model,
                aspect_ratio,
                watermark: non_empty(self.watermark),
                image_urls: self.image_urls.filter(|urls| !urls.is_empty()),
                output_filename,
            },
        ))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let body: GenerateVideoBody =
            serde_json::from_value(serde_json::json!({ "prompt": "sunrise" })).unwrap();
        let (prompt, options) = body.into_job().unwrap();
        assert_eq!(prompt, "sunrise");
        assert_eq!(options.model, VideoModel::Veo3);
        assert_eq!(options.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(options.watermark, None);
        assert_eq!(options.image_urls, None);
        assert_eq!(options.output_filename, None);
    }

    #[test]
    fn test_missing_prompt_rejected() {
        let err = GenerateVideoBody::default().into_job().unwrap_err();
        assert_eq!(err.to_string(), "Prompt is required for video generation");
    }

    #[test]
    fn test_unknown_aspect_ratio_rejected() {
        let body = GenerateVideoBody {
            prompt: Some("x".into()),
            aspect_ratio: Some("4:3".into()),
            ..Default::default()
        };
        assert!(matches!(body.into_job(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_all_fields_parsed() {
        let body: GenerateVideoBody = serde_json::from_value(serde_json::json!({
            "prompt": "city at night",
            "model": "veo3_fast",
            "aspectRatio": "9:16",
            "watermark": "brand",
            "imageUrls": ["https://img/1.png"],
            "filename": "night.mp4"
        }))
        .unwrap();
        let (_, options) = body.into_job().unwrap();
        assert_eq!(options.model, VideoModel::Veo3Fast);
        assert_eq!(options.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(options.watermark.as_deref(), Some("brand"));
        assert_eq!(options.output_filename.as_deref(), Some("night.mp4"));
    }

    #[test]
    fn test_unusable_filename_rejected() {
        for name in ["..", "/", "."] {
            let body = GenerateVideoBody {
                prompt: Some("x".into()),
                filename: Some(name.into()),
                ..Default::default()
            };
            let err = body.into_job().unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{name:?}");
            assert_eq!(err.to_string(), format!("Invalid filename: {name}"));
        }
    }
}
