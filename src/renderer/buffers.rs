// renderer/buffers.rs - Grow-on-demand GPU Buffers
//
// Vertex and index buffers are sized in elements. When a frame needs more
// than the current capacity the old buffer is released and a new one is
// allocated with fixed headroom on top of the requirement. Buffers never
// shrink.

use crate::error::Result;
use crate::ui::DrawData;

/// A GPU buffer that is recreated whenever it is too small
#[derive(Debug)]
pub struct GrowableBuffer<B> {
    buffer: Option<B>,
    /// Capacity in elements
    capacity: usize,
    element_size: usize,
    slack: usize,
}

impl<B> GrowableBuffer<B> {
    pub fn new(element_size: usize, slack: usize) -> Self {
        Self {
            buffer: None,
            capacity: 0,
            element_size,
            slack,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffer(&self) -> Option<&B> {
        self.buffer.as_ref()
    }

    /// Make room for `required` elements. `create` receives the new size in
    /// bytes. Returns true if a new buffer was allocated.
    pub fn ensure(
        &mut self,
        required: usize,
        create: impl FnOnce(usize) -> Result<B>,
    ) -> Result<bool> {
        if self.buffer.is_some() && required <= self.capacity {
            return Ok(false);
        }

        // Release before allocating so peak memory stays at one buffer
        self.release();
        let capacity = required + self.slack;
        self.buffer = Some(create(capacity * self.element_size)?);
        self.capacity = capacity;
        Ok(true)
    }

    pub fn release(&mut self) {
        self.buffer = None;
        self.capacity = 0;
    }
}

/// Where one draw list starts inside the merged vertex/index buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOffset {
    pub vertex: u32,
    pub index: u32,
}

/// Running offsets of every list, in list order
pub fn list_offsets(data: &DrawData) -> Vec<ListOffset> {
    let mut offset = ListOffset::default();
    data.lists
        .iter()
        .map(|list| {
            let current = offset;
            offset.vertex += list.vertices.len() as u32;
            offset.index += list.indices.len() as u32;
            current
        })
        .collect()
}
