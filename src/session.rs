use crate::error::ExpandError;
use crate::geometry::{Preset, TargetDimensions};
use crate::history::{GeneratedImage, History};
use crate::image_loader::OriginalImage;
use crate::pipeline::ExpansionRequest;

/// Instruction sent when the user leaves the prompt blank.
pub const DEFAULT_PROMPT: &str = "Photorealistically expand this image to fill the transparent areas. Do not alter, change, or edit the original centered image content. Match the style, lighting, and details of the original image to create a seamless, cohesive, and natural-looking extension.";

/// A generation request tagged with the session epoch it was started in.
#[derive(Debug, Clone)]
pub struct ExpansionJob {
    pub epoch: u64,
    pub request: ExpansionRequest,
}

/// State of one editing session.
///
/// Created at startup, changed only through the methods below, and cleared
/// by `reset`. The epoch changes whenever the image changes so results of a
/// request started for an earlier image can be recognized and dropped.
#[derive(Debug, Default)]
pub struct Session {
    original: Option<OriginalImage>,
    target: TargetDimensions,
    prompt: String,
    api_key: Option<String>,
    history: History,
    busy: bool,
    last_error: Option<String>,
    epoch: u64,
}

impl Session {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.is_empty()),
            ..Default::default()
        }
    }

    /// Whether a new upload would be taken. Only before an image is loaded
    /// or after `reset`, so the history is never replaced behind the user's back.
    pub fn accepts_upload(&self) -> bool {
        self.original.is_none()
    }

    /// Starts editing a new image with the canvas matching its size.
    ///
    /// Returns false and leaves the session alone while another image is
    /// being edited.
    pub fn load_image(&mut self, image: OriginalImage) -> bool {
        if !self.accepts_upload() {
            log::warn!("⚠ Ignoring upload while another image is being edited");
            return false;
        }

        log::info!("🖼 Editing {}x{} image", image.width, image.height);
        self.target = TargetDimensions::new(image.width, image.height);
        self.original = Some(image);
        self.history = History::new();
        self.busy = false;
        self.last_error = None;
        self.epoch += 1;
        true
    }

    pub fn reset(&mut self) {
        self.original = None;
        self.target = TargetDimensions::default();
        self.prompt.clear();
        self.history = History::new();
        self.busy = false;
        self.last_error = None;
        self.epoch += 1;
    }

    pub fn original(&self) -> Option<&OriginalImage> {
        self.original.as_ref()
    }

    pub fn target(&self) -> TargetDimensions {
        self.target
    }

    pub fn set_width(&mut self, width: u32) {
        self.target = TargetDimensions::manual(width, self.target.height);
    }

    pub fn set_height(&mut self, height: u32) {
        self.target = TargetDimensions::manual(self.target.width, height);
    }

    /// Ignored until an image is loaded.
    pub fn apply_preset(&mut self, preset: Preset) {
        if let Some(original) = &self.original {
            self.target = TargetDimensions::from_preset(preset, original.width, original.height);
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: String) {
        self.prompt = prompt;
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key.filter(|key| !key.is_empty());
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Checks the editor state and assembles the request without touching it.
    pub fn prepare_request(&self) -> Result<ExpansionRequest, ExpandError> {
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ExpandError::MissingApiKey)?;
        let original = self.original.clone().ok_or(ExpandError::NoImageLoaded)?;

        if self.target.width == original.width && self.target.height == original.height {
            return Err(ExpandError::UnchangedDimensions);
        }

        let prompt = if self.prompt.trim().is_empty() {
            DEFAULT_PROMPT.to_string()
        } else {
            self.prompt.clone()
        };

        Ok(ExpansionRequest {
            original,
            target: self.target,
            prompt,
            api_key,
        })
    }

    /// Marks the session busy and hands out the job to run.
    ///
    /// Validation failures are recorded as the session's last error.
    pub fn begin_generation(&mut self) -> Result<ExpansionJob, ExpandError> {
        match self.prepare_request() {
            Ok(request) => {
                self.busy = true;
                self.last_error = None;
                Ok(ExpansionJob {
                    epoch: self.epoch,
                    request,
                })
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Records the outcome of a job. Returns whether it was applied.
    pub fn finish_generation(
        &mut self,
        epoch: u64,
        result: Result<Vec<GeneratedImage>, ExpandError>,
    ) -> bool {
        if epoch != self.epoch {
            log::warn!("⚠ Dropping result of a request for a previous image");
            return false;
        }

        self.busy = false;
        match result {
            Ok(images) => {
                self.history.prepend_batch(images);
                self.last_error = None;
            }
            Err(e) => {
                log::error!("❌ Expansion failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
        true
    }
}
