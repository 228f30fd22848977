use crate::canvas;
use crate::error::ExpandError;
use crate::expansion_client::ExpansionClient;
use crate::gemini::ImageService;
use crate::geometry::TargetDimensions;
use crate::history::GeneratedImage;
use crate::image_loader::OriginalImage;

/// Everything one generation call needs. Built fresh for every call.
#[derive(Debug, Clone)]
pub struct ExpansionRequest {
    pub original: OriginalImage,
    pub target: TargetDimensions,
    pub prompt: String,
    pub api_key: String,
}

/// Composites the original onto the target canvas, sends it to the service
/// and wraps every returned image as a new `GeneratedImage`.
pub async fn request_expansion<S: ImageService>(
    client: &ExpansionClient<S>,
    request: &ExpansionRequest,
) -> Result<Vec<GeneratedImage>, ExpandError> {
    let original = &request.original;
    let target = request.target;

    let canvas = canvas::composite(
        &original.bytes,
        original.width,
        original.height,
        target.width,
        target.height,
    )
    .await?;
    log::info!(
        "🖼 Canvas ready: {}x{} -> {}x{} ({} bytes)",
        original.width,
        original.height,
        target.width,
        target.height,
        canvas.len()
    );

    let payloads = client
        .expand(&canvas, &request.prompt, &request.api_key)
        .await?;

    Ok(payloads.into_iter().map(GeneratedImage::new).collect())
}
