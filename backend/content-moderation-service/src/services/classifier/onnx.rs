use super::{ClassifierAnalysis, ContentClassifier};
use crate::error::{ModerationError, Result};
use crate::models::{ContentSubmission, ContentType, ModerationCategory};
use async_trait::async_trait;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::{Session, SessionInputValue, SessionOutputs};
use serde_json::json;
use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, Mutex};

const MODEL_ID: &str = "resnet50-nsfw-onnx";

/// Image classifier backed by an NSFW ResNet model in ONNX format.
/// Non-image submissions get an empty analysis.
pub struct OnnxImageClassifier {
    session: Arc<Mutex<Session>>,
    input_size: (u32, u32),
    http: reqwest::Client,
}

impl OnnxImageClassifier {
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(ModerationError::Config(format!(
                "NSFW model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| ModerationError::Classifier(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| ModerationError::Classifier(e.to_string()))?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_size: (224, 224),
            http: reqwest::Client::new(),
        })
    }

    /// NSFW probability for the image at `url`
    pub async fn score_url(&self, url: &str) -> Result<f32> {
        let img = self.download_image(url).await?;
        let input_tensor = self.preprocess_image(img);
        self.run_inference(input_tensor)
    }

    async fn download_image(&self, url: &str) -> Result<DynamicImage> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ModerationError::Classifier(format!("image download failed: {}", e)))?
            .bytes()
            .await
            .map_err(|e| ModerationError::Classifier(format!("image download failed: {}", e)))?;

        image::load_from_memory(&bytes)
            .map_err(|e| ModerationError::Classifier(format!("image decode failed: {}", e)))
    }

    /// NCHW tensor [1, 3, H, W] with pixel values in [0, 1]
    fn preprocess_image(&self, img: DynamicImage) -> Array4<f32> {
        let img = img.resize_exact(
            self.input_size.0,
            self.input_size.1,
            image::imageops::FilterType::Lanczos3,
        );

        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in rgb_img.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] = pixel[channel] as f32 / 255.0;
            }
        }

        tensor
    }

    fn run_inference(&self, input_tensor: Array4<f32>) -> Result<f32> {
        let input_value = ort::value::Value::from_array(input_tensor)
            .map_err(|e| ModerationError::Classifier(e.to_string()))?;

        let inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
            vec![(Cow::Borrowed("input"), SessionInputValue::from(input_value))];

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModerationError::Internal(format!("Failed to lock session: {}", e)))?;

        let outputs: SessionOutputs = session
            .run(inputs)
            .map_err(|e| ModerationError::Classifier(e.to_string()))?;

        let output = outputs
            .get("output")
            .ok_or_else(|| ModerationError::Classifier("No output tensor".to_string()))?;

        let (_, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModerationError::Classifier(e.to_string()))?;

        // Index 1 is the NSFW class
        Ok(scores.get(1).copied().unwrap_or(0.0))
    }
}

#[async_trait]
impl ContentClassifier for OnnxImageClassifier {
    async fn classify(&self, submission: &ContentSubmission) -> Result<ClassifierAnalysis> {
        let mut analysis = ClassifierAnalysis::new(MODEL_ID);

        let image_url = match submission.content_type {
            ContentType::Image => Some(submission.url.as_str()),
            _ => submission.thumbnail_url.as_deref(),
        };

        let Some(url) = image_url else {
            return Ok(analysis);
        };

        let nsfw_score = f64::from(self.score_url(url).await?);
        analysis.score(ModerationCategory::ExplicitContent, nsfw_score);
        if nsfw_score > 0.5 {
            analysis.detected_objects.push("adult_content".to_string());
            analysis
                .risk_factors
                .push("high_risk_visual_content".to_string());
        }
        analysis.text_analysis = json!({ "nsfw_score": nsfw_score, "source_url": url });

        tracing::debug!(
            submission_id = %submission.id,
            nsfw_score,
            "ONNX image classification finished"
        );

        Ok(analysis)
    }
}
