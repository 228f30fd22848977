use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::ExpandError;
use crate::expansion_client::ExpansionClient;
use crate::gemini::{key_prefix, ImageService};
use crate::history::GeneratedImage;
use crate::pipeline::request_expansion;
use crate::session::ExpansionJob;

/// Outcome of one job, tagged with the session epoch it was started in.
#[derive(Debug)]
pub struct ExpansionEvent {
    pub epoch: u64,
    pub result: Result<Vec<GeneratedImage>, ExpandError>,
}

/// Runs expansion jobs on a tokio runtime and reports each outcome on a channel.
///
/// Jobs are not queued or serialized here; the caller keeps at most one in
/// flight by disabling its trigger while the session is busy.
pub struct ExpansionManager<S> {
    client: Arc<ExpansionClient<S>>,
    event_sender: mpsc::UnboundedSender<ExpansionEvent>,
}

impl<S> ExpansionManager<S>
where
    S: ImageService + Send + Sync + 'static,
{
    pub fn new(client: ExpansionClient<S>, event_sender: mpsc::UnboundedSender<ExpansionEvent>) -> Self {
        Self {
            client: Arc::new(client),
            event_sender,
        }
    }

    pub fn start(&self, runtime: &Handle, job: ExpansionJob) {
        let client = self.client.clone();
        let event_sender = self.event_sender.clone();

        log::info!(
            "🚀 Starting expansion to {}x{} (key {}...)",
            job.request.target.width,
            job.request.target.height,
            key_prefix(&job.request.api_key)
        );

        runtime.spawn(async move {
            let result = request_expansion(&client, &job.request).await;

            match &result {
                Ok(images) => log::info!("✅ Expansion produced {} image(s)", images.len()),
                Err(e) => log::error!("❌ Expansion failed: {}", e),
            }

            let event = ExpansionEvent {
                epoch: job.epoch,
                result,
            };
            if event_sender.send(event).is_err() {
                log::warn!("⚠ Expansion finished after the receiver was dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{GenerateContentRequest, GenerateContentResponse, ServiceFailure};
    use crate::geometry::TargetDimensions;
    use crate::image_loader::OriginalImage;
    use crate::pipeline::ExpansionRequest;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    struct FailingService;

    impl ImageService for FailingService {
        async fn generate(
            &self,
            _api_key: &str,
            _request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, ServiceFailure> {
            Err(ServiceFailure::new("HTTP 500 Internal Server Error: boom"))
        }
    }

    fn job(epoch: u64) -> ExpansionJob {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        ExpansionJob {
            epoch,
            request: ExpansionRequest {
                original: OriginalImage::from_bytes(bytes, None).unwrap(),
                target: TargetDimensions::new(4, 4),
                prompt: "expand".to_string(),
                api_key: "key".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_outcome_is_reported_with_epoch() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let manager = ExpansionManager::new(ExpansionClient::new(FailingService), sender);

        manager.start(&Handle::current(), job(7));
        let event = receiver.recv().await.unwrap();

        assert_eq!(event.epoch, 7);
        match event.result {
            Err(ExpandError::Service(message)) => {
                assert_eq!(message, "HTTP 500 Internal Server Error: boom")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
