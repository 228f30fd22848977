use thiserror::Error;

/// Every failure the expansion pipeline can report.
///
/// The `Display` text of each variant is meant to be shown to the user as is.
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("API key is not configured. Please add it via the settings.")]
    MissingApiKey,

    #[error("Could not get a drawing surface: {0}")]
    CanvasUnavailable(String),

    #[error("Failed to load image for canvas manipulation: {0}")]
    ImageDecode(String),

    #[error("No content generated. The response may have been blocked.")]
    NoContentGenerated,

    #[error("Image generation failed: {0}")]
    GenerationFailed(String),

    #[error("Gemini API Error: Permission denied. Please check that your API key is correct and has the necessary permissions.")]
    Auth,

    #[error("Gemini API Error: {0}")]
    Service(String),

    #[error("An unexpected error occurred while communicating with the Gemini API.")]
    UnknownService,

    #[error("Please upload an image first.")]
    NoImageLoaded,

    #[error("The new dimensions are the same as the original. Please expand the canvas.")]
    UnchangedDimensions,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExpandError {
    /// True for failures the user fixes by editing their API key.
    pub fn is_credential_problem(&self) -> bool {
        matches!(self, ExpandError::MissingApiKey | ExpandError::Auth)
    }
}

impl From<serde_json::Error> for ExpandError {
    fn from(error: serde_json::Error) -> Self {
        ExpandError::Settings(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_displayable() {
        assert_eq!(
            ExpandError::GenerationFailed("blocked: policy".to_string()).to_string(),
            "Image generation failed: blocked: policy"
        );
        assert_eq!(
            ExpandError::Service("quota exceeded".to_string()).to_string(),
            "Gemini API Error: quota exceeded"
        );
        assert!(ExpandError::Auth.to_string().contains("check that your API key is correct"));
    }

    #[test]
    fn test_credential_problems() {
        assert!(ExpandError::MissingApiKey.is_credential_problem());
        assert!(ExpandError::Auth.is_credential_problem());
        assert!(!ExpandError::NoContentGenerated.is_credential_problem());
    }
}
