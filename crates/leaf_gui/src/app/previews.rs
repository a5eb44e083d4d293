//! egui textures as preview references.

use eframe::egui;
use leaf_core::{PreviewError, PreviewId, PreviewStore};
use std::collections::HashMap;

const PREVIEW_MAX: u32 = 480;

/// Owns one texture per live preview. Files that do not decode keep an
/// entry without a texture so the UI can draw a placeholder.
pub struct TexturePreviews {
    ctx: egui::Context,
    next: u64,
    textures: HashMap<PreviewId, Option<egui::TextureHandle>>,
}

impl TexturePreviews {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            next: 0,
            textures: HashMap::new(),
        }
    }

    pub fn texture(&self, id: PreviewId) -> Option<&egui::TextureHandle> {
        self.textures.get(&id).and_then(Option::as_ref)
    }

    #[cfg(test)]
    fn live(&self) -> usize {
        self.textures.len()
    }

    fn load(&self, name: &str, bytes: &[u8]) -> image::ImageResult<egui::TextureHandle> {
        let img = image::load_from_memory(bytes)?;
        let thumb = img.thumbnail(PREVIEW_MAX, PREVIEW_MAX).to_rgba8();
        let size = [thumb.width() as usize, thumb.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, thumb.as_raw());
        Ok(self
            .ctx
            .load_texture(format!("preview:{name}"), color, egui::TextureOptions::LINEAR))
    }
}

impl PreviewStore for TexturePreviews {
    fn create(&mut self, file_name: &str, bytes: &[u8]) -> Result<PreviewId, PreviewError> {
        let texture = match self.load(file_name, bytes) {
            Ok(tex) => Some(tex),
            Err(e) => {
                tracing::warn!("Failed to decode preview for {file_name}: {e}");
                None
            }
        };
        self.next += 1;
        let id = PreviewId::new(self.next);
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn release(&mut self, id: PreviewId) {
        // Dropping the last handle frees the texture.
        if self.textures.remove(&id).is_none() {
            tracing::warn!(preview = id.get(), "release of unknown preview");
        }
    }
}
