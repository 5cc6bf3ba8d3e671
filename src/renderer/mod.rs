// renderer/mod.rs - Frame Renderer
//
// Turns one frame of UI draw data into GPU draw calls and owns every GPU
// resource the overlay creates: the grow-on-demand vertex/index buffers, the
// projection constant buffer, and the texture registry (font atlas included).

mod buffers;
mod fonts;
mod registry;

pub use buffers::{list_offsets, GrowableBuffer, ListOffset};
pub use registry::TextureRegistry;

use image::RgbaImage;
use log::{debug, info};

use crate::constants::buffers::{CONSTANT_BUFFER_SIZE, INDEX_SLACK, VERTEX_SLACK};
use crate::error::{OverlayError, Result};
use crate::platform::{BufferKind, GpuBackend, ScissorRect, TextureData, TextureFormat};
use crate::ui::{DrawCommand, DrawData, DrawIdx, DrawVert, TextureHandle};

/// Texture creation and release, as seen from application render code
pub trait TextureStore {
    /// Upload `image` under `key`, or return the handle already registered for it
    fn upload_image(&mut self, key: &str, image: &RgbaImage, srgb: bool) -> Result<TextureHandle>;
    /// Release a texture; false if the handle was not registered
    fn release_texture(&mut self, handle: TextureHandle) -> bool;
}

/// Column-major orthographic projection mapping the display rectangle to clip space
pub fn ortho_projection(display_pos: [f32; 2], display_size: [f32; 2]) -> [f32; 16] {
    let l = display_pos[0];
    let r = display_pos[0] + display_size[0];
    let t = display_pos[1];
    let b = display_pos[1] + display_size[1];
    [
        2.0 / (r - l), 0.0, 0.0, 0.0,
        0.0, 2.0 / (t - b), 0.0, 0.0,
        0.0, 0.0, 0.5, 0.0,
        (r + l) / (l - r), (t + b) / (b - t), 0.5, 1.0,
    ]
}

/// Scissor for a clip rectangle, `None` when the clipped area is empty
pub fn scissor_for(clip_rect: [f32; 4], display_pos: [f32; 2]) -> Option<ScissorRect> {
    let left = clip_rect[0] - display_pos[0];
    let top = clip_rect[1] - display_pos[1];
    let right = clip_rect[2] - display_pos[0];
    let bottom = clip_rect[3] - display_pos[1];
    if right <= left || bottom <= top {
        return None;
    }
    Some(ScissorRect {
        left: left as i32,
        top: top as i32,
        right: right as i32,
        bottom: bottom as i32,
    })
}

/// GPU side of the overlay
///
/// Fields drop in declaration order, so textures and buffers are released
/// before the device they were created on.
pub struct FrameRenderer<G: GpuBackend> {
    textures: TextureRegistry<G::Texture>,
    vertices: GrowableBuffer<G::Buffer>,
    indices: GrowableBuffer<G::Buffer>,
    constants: Option<G::Buffer>,
    gpu: G,
}

impl<G: GpuBackend> FrameRenderer<G> {
    pub fn new(mut gpu: G) -> Result<Self> {
        let constants = gpu.create_buffer(BufferKind::Constant, CONSTANT_BUFFER_SIZE)?;
        info!("Frame renderer created");
        Ok(Self {
            textures: TextureRegistry::new(),
            vertices: GrowableBuffer::new(std::mem::size_of::<DrawVert>(), VERTEX_SLACK),
            indices: GrowableBuffer::new(std::mem::size_of::<DrawIdx>(), INDEX_SLACK),
            constants: Some(constants),
            gpu,
        })
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn textures(&self) -> &TextureRegistry<G::Texture> {
        &self.textures
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    pub fn index_capacity(&self) -> usize {
        self.indices.capacity()
    }

    /// Register an already-created texture under a fresh handle
    pub fn register_texture(&mut self, texture: G::Texture) -> TextureHandle {
        self.textures.register(texture)
    }

    pub fn deregister_texture(&mut self, handle: TextureHandle) -> Option<G::Texture> {
        self.textures.deregister(handle)
    }

    /// Submit one frame of draw data. Returns the number of draw calls issued.
    pub fn render(&mut self, data: &DrawData) -> Result<u32> {
        // Minimized
        if !data.is_visible() {
            return Ok(0);
        }
        let vertex_count = data.total_vertex_count();
        let index_count = data.total_index_count();
        if vertex_count == 0 || index_count == 0 {
            return Ok(0);
        }

        let Self {
            textures,
            vertices,
            indices,
            constants,
            gpu,
        } = self;

        if vertices.ensure(vertex_count, |bytes| gpu.create_buffer(BufferKind::Vertex, bytes))? {
            debug!("Vertex buffer grown to {} vertices", vertices.capacity());
        }
        if indices.ensure(index_count, |bytes| gpu.create_buffer(BufferKind::Index, bytes))? {
            debug!("Index buffer grown to {} indices", indices.capacity());
        }
        let (Some(vb), Some(ib), Some(cb)) = (vertices.buffer(), indices.buffer(), constants.as_ref())
        else {
            return Err(OverlayError::Init("renderer buffers were released".into()));
        };

        let vertex_chunks: Vec<&[u8]> = data
            .lists
            .iter()
            .map(|list| bytemuck::cast_slice(&list.vertices))
            .collect();
        let index_chunks: Vec<&[u8]> = data
            .lists
            .iter()
            .map(|list| bytemuck::cast_slice(&list.indices))
            .collect();
        gpu.upload(vb, &vertex_chunks)?;
        gpu.upload(ib, &index_chunks)?;

        let projection = ortho_projection(data.display_pos, data.display_size);
        gpu.upload(cb, &[bytemuck::cast_slice(&projection)])?;

        gpu.setup_render_state(data.display_size, vb, ib, cb);

        let mut draws = 0;
        for (list, offset) in data.lists.iter().zip(list_offsets(data)) {
            for command in &list.commands {
                match command {
                    DrawCommand::Callback => {
                        return Err(OverlayError::Unsupported("user draw callbacks"));
                    }
                    DrawCommand::Elements {
                        count,
                        clip_rect,
                        texture,
                        vtx_offset,
                        idx_offset,
                    } => {
                        let Some(scissor) = scissor_for(*clip_rect, data.display_pos) else {
                            continue;
                        };
                        gpu.set_scissor(scissor);

                        if !texture.is_null() {
                            let view = textures
                                .get(*texture)
                                .ok_or(OverlayError::UnknownTexture(*texture))?;
                            gpu.bind_texture(view);
                        }

                        gpu.draw_indexed(
                            *count,
                            idx_offset + offset.index,
                            (vtx_offset + offset.vertex) as i32,
                        );
                        draws += 1;
                    }
                }
            }
        }
        Ok(draws)
    }

    /// Release everything except the device itself, views first
    pub fn shutdown(&mut self) {
        let released = self.textures.clear_all();
        self.vertices.release();
        self.indices.release();
        self.constants = None;
        self.gpu.release_surface();
        info!("Frame renderer released {} textures", released);
    }
}

impl<G: GpuBackend> TextureStore for FrameRenderer<G> {
    fn upload_image(&mut self, key: &str, image: &RgbaImage, srgb: bool) -> Result<TextureHandle> {
        let gpu = &mut self.gpu;
        let (handle, created) = self.textures.get_or_register_with(key, || {
            gpu.create_texture(TextureData {
                width: image.width(),
                height: image.height(),
                format: TextureFormat::for_srgb(srgb),
                pixels: image.as_raw(),
            })
        })?;
        if created {
            info!("Uploaded texture '{}' ({}x{})", key, image.width(), image.height());
        }
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) -> bool {
        let released = self.textures.deregister(handle).is_some();
        if released {
            debug!("Released texture {:?}", handle);
        }
        released
    }
}
