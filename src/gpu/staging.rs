//! Persistently mapped transfer slots for the streaming upload path.
//!
//! Two CPU-writable, GPU-visible buffers alternate per frame: while the
//! GPU copies one slot into the plane textures, the producer writes the
//! next frame into the other. Mapping cost is paid once per configuration
//! rather than once per frame; after each flush the slot is re-mapped
//! asynchronously and refuses writes until the map completes, so a slot
//! can never be written while the GPU still reads it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::StreamError;
use crate::format::FrameLayout;
use crate::gpu::planes::PlaneTextures;

struct TransferSlot {
    buffer: wgpu::Buffer,
    /// Set while the slot is mapped and owned by the CPU.
    writable: Arc<AtomicBool>,
    /// Set by the map callback if re-mapping failed.
    map_failed: Arc<AtomicBool>,
}

impl TransferSlot {
    fn new(device: &wgpu::Device, index: usize, size: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Transfer Slot {index}")),
            size,
            usage: wgpu::BufferUsages::MAP_WRITE
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        Self {
            buffer,
            writable: Arc::new(AtomicBool::new(true)),
            map_failed: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// The double-buffered pool of transfer slots.
///
/// Exactly one slot is active for CPU writes at a time; the other is
/// in flight for GPU reads from the previous flush. Dropping the pool
/// releases both buffers and any live mapping.
pub struct TransferSlots {
    slots: [TransferSlot; 2],
    active: usize,
    slot_size: u64,
}

impl TransferSlots {
    /// Allocate both slots, each `slot_size` bytes and mapped from
    /// creation.
    #[must_use]
    pub fn new(device: &wgpu::Device, slot_size: u64) -> Self {
        Self {
            slots: [
                TransferSlot::new(device, 0, slot_size),
                TransferSlot::new(device, 1, slot_size),
            ],
            active: 0,
            slot_size,
        }
    }

    /// Byte size each slot was allocated with.
    #[must_use]
    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    /// Index of the slot currently active for CPU writes.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// `true` once any slot's re-map has failed. A poisoned pool can
    /// never stream again and must be replaced.
    #[must_use]
    pub fn poisoned(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.map_failed.load(Ordering::SeqCst))
    }

    /// Advance to the other slot for the next frame write.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::SlotBusy`] while the slot's re-map has not
    /// completed (the GPU still owns it), and [`StreamError::MapFailed`]
    /// if the re-map failed, in which case the pool must be recreated.
    pub fn acquire_next(
        &mut self,
        device: &wgpu::Device,
    ) -> Result<(), StreamError> {
        let next = self.active ^ 1;
        let slot = &self.slots[next];

        // Pump map callbacks without blocking.
        let _ = device.poll(wgpu::PollType::Poll);

        if slot.map_failed.load(Ordering::SeqCst) {
            return Err(StreamError::MapFailed);
        }
        if !slot.writable.load(Ordering::SeqCst) {
            return Err(StreamError::SlotBusy);
        }
        self.active = next;
        Ok(())
    }

    /// Copy one frame into the active slot's mapped range, plane by
    /// plane, padding each row out to the slot's aligned stride. Rows
    /// that are already aligned move as one contiguous copy per plane.
    ///
    /// The caller has validated `frame` against the layout's
    /// `buffer_size` and acquired a writable slot.
    pub fn write_active(&self, layout: &FrameLayout, frame: &[u8]) {
        let slot = &self.slots[self.active];
        let mut mapped = slot.buffer.slice(..).get_mapped_range_mut();
        for plane in layout.planes() {
            let src_row = plane.bytes_per_row as usize;
            let dst_row = plane.padded_bytes_per_row as usize;
            let src_base = plane.byte_offset as usize;
            let dst_base = plane.slot_offset as usize;
            let rows = plane.height as usize;
            if src_row == dst_row {
                let len = src_row * rows;
                mapped[dst_base..dst_base + len]
                    .copy_from_slice(&frame[src_base..src_base + len]);
            } else {
                for row in 0..rows {
                    let src = src_base + row * src_row;
                    let dst = dst_base + row * dst_row;
                    mapped[dst..dst + src_row]
                        .copy_from_slice(&frame[src..src + src_row]);
                }
            }
        }
    }

    /// Unmap the active slot and encode the per-plane copies into the
    /// plane textures.
    pub fn encode_flush(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        layout: &FrameLayout,
        planes: &PlaneTextures,
    ) {
        let slot = &self.slots[self.active];
        slot.buffer.unmap();
        for (i, plane) in layout.planes().iter().enumerate() {
            let Some(texture) = planes.texture(i) else {
                continue;
            };
            encoder.copy_buffer_to_texture(
                wgpu::TexelCopyBufferInfo {
                    buffer: &slot.buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: plane.slot_offset,
                        bytes_per_row: Some(plane.padded_bytes_per_row),
                        rows_per_image: Some(plane.height),
                    },
                },
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::Extent3d {
                    width: plane.width,
                    height: plane.height,
                    depth_or_array_layers: 1,
                },
            );
        }
    }

    /// Request the asynchronous re-map of the active slot. Call after the
    /// flush has been submitted; the completion callback returns the slot
    /// to the writable state.
    pub fn rearm_active(&self) {
        let slot = &self.slots[self.active];
        slot.writable.store(false, Ordering::SeqCst);
        slot.map_failed.store(false, Ordering::SeqCst);
        let writable = Arc::clone(&slot.writable);
        let map_failed = Arc::clone(&slot.map_failed);
        slot.buffer.slice(..).map_async(
            wgpu::MapMode::Write,
            move |result| match result {
                Ok(()) => writable.store(true, Ordering::SeqCst),
                Err(e) => {
                    log::error!("transfer slot re-map failed: {e}");
                    map_failed.store(true, Ordering::SeqCst);
                }
            },
        );
    }

    /// Put a slot into the state the map callback leaves on failure.
    #[cfg(test)]
    pub(crate) fn poison_slot(&self, index: usize) {
        let slot = &self.slots[index];
        slot.writable.store(false, Ordering::SeqCst);
        slot.map_failed.store(true, Ordering::SeqCst);
    }
}
