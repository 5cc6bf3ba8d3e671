// renderer/registry.rs - Texture Registry
//
// Maps opaque texture handles to GPU shader-resource views. User handles are
// handed out monotonically starting at 100; the font atlas lives at a reserved
// handle below that range. Keyed registrations (file path or image name) are
// deduplicated so one source never owns two live textures.

use std::collections::HashMap;

use log::debug;

use crate::constants::textures;
use crate::error::Result;
use crate::ui::TextureHandle;

/// Handle to resource map owned by the frame renderer
#[derive(Debug)]
pub struct TextureRegistry<T> {
    textures: HashMap<TextureHandle, T>,
    keys: HashMap<String, TextureHandle>,
    next: u64,
}

impl<T> Default for TextureRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TextureRegistry<T> {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            keys: HashMap::new(),
            next: textures::FIRST_USER_HANDLE,
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&T> {
        self.textures.get(&handle)
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(&handle)
    }

    pub fn handle_for(&self, key: &str) -> Option<TextureHandle> {
        self.keys.get(key).copied()
    }

    /// Register an unkeyed resource under a fresh handle
    pub fn register(&mut self, texture: T) -> TextureHandle {
        let handle = TextureHandle(self.next);
        self.next += 1;
        self.textures.insert(handle, texture);
        handle
    }

    /// Return the handle already registered for `key`, or create and register
    /// a new resource. The flag is true when `create` ran.
    pub fn get_or_register_with(
        &mut self,
        key: &str,
        create: impl FnOnce() -> Result<T>,
    ) -> Result<(TextureHandle, bool)> {
        if let Some(handle) = self.handle_for(key) {
            return Ok((handle, false));
        }
        let handle = self.register(create()?);
        self.keys.insert(key.to_string(), handle);
        debug!("Registered texture {:?} for '{}'", handle, key);
        Ok((handle, true))
    }

    /// Store a resource at a fixed reserved handle, returning the one it replaces
    pub fn insert_reserved(&mut self, handle: TextureHandle, texture: T) -> Option<T> {
        self.textures.insert(handle, texture)
    }

    /// Remove a resource; the caller disposes it. `None` if the handle is unknown.
    pub fn deregister(&mut self, handle: TextureHandle) -> Option<T> {
        let texture = self.textures.remove(&handle)?;
        self.keys.retain(|_, h| *h != handle);
        Some(texture)
    }

    /// Dispose every resource and restart handle numbering
    pub fn clear_all(&mut self) -> usize {
        let released = self.textures.len();
        self.textures.clear();
        self.keys.clear();
        self.next = textures::FIRST_USER_HANDLE;
        released
    }
}
