use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data_uri::{self, PNG_MIME};
use crate::error::ExpandError;

/// One image returned by the service. Never modified after creation.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub id: Uuid,
    /// `data:` URI, directly renderable or downloadable.
    pub src: String,
    pub bytes: Arc<[u8]>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: data_uri::encode(PNG_MIME, &bytes),
            bytes: bytes.into(),
            created_at: Utc::now(),
        }
    }

    /// Export name, `expanded-<id>.png`.
    pub fn file_name(&self) -> String {
        format!("expanded-{}.png", self.id)
    }
}

/// Session-lifetime list of generated images, newest batch first.
///
/// Append-only: results are only ever added in front.
#[derive(Debug, Default)]
pub struct History {
    items: VecDeque<GeneratedImage>,
}

impl History {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Puts a whole batch in front of older results, keeping the batch's own order.
    pub fn prepend_batch(&mut self, batch: Vec<GeneratedImage>) {
        log::info!("➕ Adding {} image(s) to history", batch.len());
        for image in batch.into_iter().rev() {
            self.items.push_front(image);
        }
        log::debug!("📊 Total images in history: {}", self.items.len());
    }

    pub fn get_items(&self) -> Vec<&GeneratedImage> {
        self.items.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item_by_id(&self, id: Uuid) -> Option<&GeneratedImage> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Writes the image into `dir` under its export name and returns the path.
    pub fn save_item(&self, id: Uuid, dir: &Path) -> Result<PathBuf, ExpandError> {
        let item = self.get_item_by_id(id).ok_or_else(|| {
            ExpandError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no generated image with id {}", id),
            ))
        })?;

        let path = dir.join(item.file_name());
        std::fs::write(&path, &item.bytes)?;
        log::info!("💾 Saved {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(payloads: &[&str]) -> Vec<GeneratedImage> {
        payloads
            .iter()
            .map(|p| GeneratedImage::new(p.as_bytes().to_vec()))
            .collect()
    }

    fn payloads(history: &History) -> Vec<Vec<u8>> {
        history.get_items().iter().map(|i| i.bytes.to_vec()).collect()
    }

    #[test]
    fn test_newest_batch_first_with_batch_order_kept() {
        let mut history = History::new();
        history.prepend_batch(batch(&["a1", "a2"]));
        history.prepend_batch(batch(&["b1", "b2", "b3"]));

        assert_eq!(
            payloads(&history),
            vec![b"b1".to_vec(), b"b2".to_vec(), b"b3".to_vec(), b"a1".to_vec(), b"a2".to_vec()]
        );
    }

    #[test]
    fn test_generated_image_src_and_name() {
        let image = GeneratedImage::new(b"abc".to_vec());
        assert_eq!(image.src, "data:image/png;base64,YWJj");
        assert_eq!(image.file_name(), format!("expanded-{}.png", image.id));
    }

    #[test]
    fn test_ids_are_unique() {
        let images = batch(&["x", "x"]);
        assert_ne!(images[0].id, images[1].id);
    }

    #[test]
    fn test_lookup_by_id() {
        let mut history = History::new();
        assert!(history.is_empty());
        history.prepend_batch(batch(&["a", "b"]));
        let id = history.get_items()[1].id;

        assert_eq!(history.len(), 2);
        assert_eq!(history.get_item_by_id(id).unwrap().bytes[..], b"b"[..]);
        assert!(history.get_item_by_id(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_save_item_uses_export_name() {
        let dir = std::env::temp_dir().join(format!("image-expander-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut history = History::new();
        history.prepend_batch(batch(&["png bytes"]));
        let id = history.get_items()[0].id;

        let path = history.save_item(id, &dir).unwrap();
        assert_eq!(path, dir.join(format!("expanded-{}.png", id)));
        assert_eq!(std::fs::read(&path).unwrap(), b"png bytes");

        assert!(history.save_item(Uuid::new_v4(), &dir).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
