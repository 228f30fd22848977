use base64::{engine::general_purpose, Engine as _};

use crate::data_uri::PNG_MIME;
use crate::error::ExpandError;
use crate::gemini::{
    GenerateContentRequest, GenerateContentResponse, ImageService, Part, ServiceFailure,
};

/// Sends a composited canvas and a prompt to the image service and turns the
/// reply into image payloads or a classified error.
///
/// Each call is independent: no retries, no queuing, no local state.
pub struct ExpansionClient<S> {
    service: S,
}

impl<S: ImageService> ExpansionClient<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    #[cfg(test)]
    pub(crate) fn service(&self) -> &S {
        &self.service
    }

    /// Returns the raw bytes of every image the service sent back, in order.
    pub async fn expand(
        &self,
        composite_png: &[u8],
        prompt: &str,
        api_key: &str,
    ) -> Result<Vec<Vec<u8>>, ExpandError> {
        if api_key.trim().is_empty() {
            return Err(ExpandError::MissingApiKey);
        }

        let request = build_request(composite_png, prompt);
        log::info!(
            "🚀 Requesting expansion ({} byte canvas, {} char prompt)",
            composite_png.len(),
            prompt.chars().count()
        );

        let response = self
            .service
            .generate(api_key, &request)
            .await
            .map_err(|failure| {
                log::error!("❌ Image service call failed: {:?}", failure.message);
                classify_failure(failure)
            })?;

        let images = extract_images(response)?;
        log::info!("✅ Received {} image(s)", images.len());
        Ok(images)
    }
}

pub fn build_request(composite_png: &[u8], prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest::image_edit(vec![
        Part::inline(PNG_MIME, composite_png),
        Part::text(prompt),
    ])
}

/// Applies the response checks in order: no candidates, no image parts
/// (with or without an explanatory text part), then decodes every image part.
pub fn extract_images(response: GenerateContentResponse) -> Result<Vec<Vec<u8>>, ExpandError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            log::warn!("⚠ Prompt blocked: {}", reason);
        }
        return Err(ExpandError::NoContentGenerated);
    };

    let parts = candidate.content.map(|content| content.parts).unwrap_or_default();

    let payloads: Vec<_> = parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .collect();

    if payloads.is_empty() {
        let reason = parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .find(|text| !text.is_empty());
        return Err(match reason {
            Some(text) => ExpandError::GenerationFailed(text.to_string()),
            None => ExpandError::GenerationFailed("no image data received".to_string()),
        });
    }

    payloads
        .into_iter()
        .map(|blob| {
            general_purpose::STANDARD
                .decode(blob.data.as_bytes())
                .map_err(|e| ExpandError::Service(format!("invalid inline image data: {}", e)))
        })
        .collect()
}

/// Maps a transport/service failure onto the user-facing taxonomy.
pub fn classify_failure(failure: ServiceFailure) -> ExpandError {
    let Some(message) = failure.message else {
        return ExpandError::UnknownService;
    };

    let normalized = message.to_lowercase().replace('_', " ");
    if normalized.contains("api key not valid") || normalized.contains("permission denied") {
        ExpandError::Auth
    } else {
        ExpandError::Service(message)
    }
}
