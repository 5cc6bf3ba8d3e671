// renderer/fonts.rs - Font Atlas Upload and Reload
//
// The UI layer rasterizes fonts into an RGBA atlas; the renderer owns the GPU
// copy at the reserved font-atlas handle. A reload releases the old atlas,
// rebuilds the UI's font set from a `FontRequest`, and uploads the result.

use log::{debug, info, warn};

use super::FrameRenderer;
use crate::error::Result;
use crate::platform::{GpuBackend, TextureData, TextureFormat};
use crate::ui::{FontRequest, GlyphRanges, TextureHandle, UiLayer};

impl<G: GpuBackend> FrameRenderer<G> {
    /// Build the UI's current font atlas and bind it at the reserved handle
    pub fn upload_font_atlas(&mut self, ui: &mut dyn UiLayer) -> Result<()> {
        let atlas = ui.build_font_atlas();
        let texture = self.gpu.create_texture(TextureData {
            width: atlas.width,
            height: atlas.height,
            format: TextureFormat::Rgba8Unorm,
            pixels: atlas.pixels,
        })?;
        info!("Font atlas uploaded ({}x{})", atlas.width, atlas.height);

        if self.textures.insert_reserved(TextureHandle::FONT_ATLAS, texture).is_some() {
            debug!("Replaced a font atlas that was still bound");
        }
        ui.set_font_texture(TextureHandle::FONT_ATLAS);
        ui.clear_font_atlas_data();
        Ok(())
    }

    /// Replace the UI's fonts. A font that fails to load falls back to the
    /// UI's built-in font so the atlas is never left empty.
    pub fn reload_font(&mut self, ui: &mut dyn UiLayer, request: &FontRequest) -> Result<()> {
        if self.textures.deregister(TextureHandle::FONT_ATLAS).is_some() {
            debug!("Released previous font atlas");
        }
        ui.clear_fonts();

        let loaded = match request {
            FontRequest::Default => {
                ui.add_default_font();
                Ok(())
            }
            FontRequest::Named { path, size, range } => {
                info!("Loading font {} at {}px ({:?})", path.display(), size, range);
                ui.add_font_from_file(path, *size, GlyphRanges::Named(*range))
            }
            FontRequest::Custom { path, size, ranges } => {
                info!("Loading font {} at {}px ({} custom ranges)", path.display(), size, ranges.len());
                ui.add_font_from_file(path, *size, GlyphRanges::Custom(ranges))
            }
        };

        if let Err(e) = loaded {
            warn!("Font reload failed, using the default font: {}", e);
            ui.clear_fonts();
            ui.add_default_font();
        }

        self.upload_font_atlas(ui)
    }
}
