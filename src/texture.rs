//! The streamable frame texture: setup, per-frame update, and bind.

use crate::error::StreamError;
use crate::format::{FrameConfig, FrameLayout};
use crate::gpu::planes::PlaneTextures;
use crate::gpu::staging::TransferSlots;

/// A GPU texture fed from raw CPU frames.
///
/// One `FrameTexture` owns the plane textures, samplers, and (in
/// streaming mode) the pair of persistently mapped transfer slots for a
/// single streamable surface. The per-frame cycle is
/// [`update`](Self::update) with a new frame, then [`bind`](Self::bind)
/// at draw time, which lazily flushes the pending frame to the GPU and
/// yields the bind group for the draw call.
///
/// Operations take `&mut self` and are not internally synchronized;
/// cross-thread frame handoff is the producer's responsibility.
pub struct FrameTexture {
    layout: Option<FrameLayout>,
    streaming: bool,
    planes: PlaneTextures,
    slots: Option<TransferSlots>,
    pending_upload: bool,
}

impl Default for FrameTexture {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTexture {
    /// Create a valid but unconfigured texture. Every operation except
    /// [`setup`](Self::setup) fails with [`StreamError::NotConfigured`]
    /// until the first successful setup.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: None,
            streaming: false,
            planes: PlaneTextures::new(),
            slots: None,
            pending_upload: false,
        }
    }

    /// Configure the texture for a frame geometry and update strategy.
    ///
    /// May be called again across resolution or format changes; it is the
    /// only operation that changes plane count, dimensions, or mode.
    /// Identical consecutive configurations allocate nothing, with one
    /// exception: a transfer slot whose re-map failed is never kept, so
    /// setting up again after [`StreamError::MapFailed`] always yields a
    /// fresh streaming pool. A pending frame from the previous geometry
    /// is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Layout`] when the geometry is invalid; the
    /// previous configuration is left untouched.
    pub fn setup(
        &mut self,
        device: &wgpu::Device,
        config: &FrameConfig,
    ) -> Result<(), StreamError> {
        let layout = config.layout()?;

        self.planes.configure(device, &layout);

        if config.streaming {
            let keep = self.slots.as_ref().is_some_and(|s| {
                s.slot_size() == layout.slot_size && !s.poisoned()
            });
            if !keep {
                self.slots =
                    Some(TransferSlots::new(device, layout.slot_size));
            }
        } else {
            self.slots = None;
        }

        self.streaming = config.streaming;
        self.pending_upload = false;
        log::debug!(
            "configured {}x{} {:?} texture, {} planes (streaming: {})",
            config.width,
            config.height,
            config.format,
            layout.plane_count(),
            config.streaming
        );
        self.layout = Some(layout);
        Ok(())
    }

    /// Submit one frame matching the configured layout.
    ///
    /// In streaming mode the frame is copied into the next transfer slot
    /// and held until [`bind`](Self::bind) flushes it; nothing is
    /// submitted to the GPU here. In non-streaming mode each plane is
    /// written directly through the queue, which may stall in the driver;
    /// that path is for low-frequency textures such as static overlays.
    ///
    /// # Errors
    ///
    /// - [`StreamError::NotConfigured`] before the first setup.
    /// - [`StreamError::FrameSizeMismatch`] when `frame` is not exactly
    ///   the configured buffer size.
    /// - [`StreamError::FrameNotConsumed`] (streaming) while a previous
    ///   frame is still pending; the caller drops or retries the frame.
    /// - [`StreamError::SlotBusy`] (streaming) while the GPU still owns
    ///   the next slot; same back-pressure contract.
    /// - [`StreamError::MapFailed`] (streaming) when the slot's re-map
    ///   failed; the texture must be set up again.
    ///
    /// On every error the texture state is unchanged.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &[u8],
    ) -> Result<(), StreamError> {
        let Some(layout) = self.layout.as_ref() else {
            return Err(StreamError::NotConfigured);
        };
        let expected = layout.buffer_size as usize;
        if frame.len() != expected {
            return Err(StreamError::FrameSizeMismatch {
                expected,
                actual: frame.len(),
            });
        }

        if self.streaming {
            if self.pending_upload {
                return Err(StreamError::FrameNotConsumed);
            }
            let Some(slots) = self.slots.as_mut() else {
                return Err(StreamError::NotConfigured);
            };
            slots.acquire_next(device)?;
            slots.write_active(layout, frame);
            self.pending_upload = true;
        } else {
            for (i, plane) in layout.planes().iter().enumerate() {
                let Some(texture) = self.planes.texture(i) else {
                    return Err(StreamError::NotConfigured);
                };
                let start = plane.byte_offset as usize;
                let len =
                    plane.bytes_per_row as usize * plane.height as usize;
                queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    &frame[start..start + len],
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(plane.bytes_per_row),
                        rows_per_image: Some(plane.height),
                    },
                    wgpu::Extent3d {
                        width: plane.width,
                        height: plane.height,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }
        Ok(())
    }

    /// Prepare the texture for the next draw call.
    ///
    /// If a frame is pending, encodes and submits the slot-to-texture
    /// copies (asynchronous relative to the CPU) and re-arms the slot's
    /// mapping. Always returns the bind group covering every plane, with
    /// plane `i` at bindings `2i` and `2i + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NotConfigured`] before the first setup.
    pub fn bind(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<&wgpu::BindGroup, StreamError> {
        if self.streaming && self.pending_upload {
            let (Some(layout), Some(slots)) =
                (self.layout.as_ref(), self.slots.as_ref())
            else {
                return Err(StreamError::NotConfigured);
            };
            let mut encoder = device.create_command_encoder(
                &wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Upload Encoder"),
                },
            );
            slots.encode_flush(&mut encoder, layout, &self.planes);
            let _ = queue.submit(std::iter::once(encoder.finish()));
            slots.rearm_active();
            self.pending_upload = false;
            log::trace!("flushed frame from slot {}", slots.active_index());
        }
        self.planes.bind_group().ok_or(StreamError::NotConfigured)
    }

    /// Number of planes in the configured format, 0 before setup. Shader
    /// selection keys off this to pick single-plane or planar sampling.
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.layout.as_ref().map_or(0, FrameLayout::plane_count)
    }

    /// Layout matching the bind group returned by [`bind`](Self::bind),
    /// for consumer pipeline creation. `None` before setup.
    #[must_use]
    pub fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.planes.bind_group_layout()
    }

    /// The configured frame layout, `None` before setup.
    #[must_use]
    pub fn layout(&self) -> Option<&FrameLayout> {
        self.layout.as_ref()
    }

    /// `true` when configured for the streaming upload path.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// `true` between a successful streaming [`update`](Self::update) and
    /// the [`bind`](Self::bind) that flushes it.
    #[must_use]
    pub fn pending_upload(&self) -> bool {
        self.pending_upload
    }

    /// Index of the transfer slot the last streaming update wrote into.
    /// `None` when not streaming.
    #[must_use]
    pub fn active_slot(&self) -> Option<usize> {
        self.slots.as_ref().map(TransferSlots::active_index)
    }

    /// Number of plane texture slots ever allocated (monotonic across
    /// reconfiguration).
    #[must_use]
    pub fn allocated_planes(&self) -> usize {
        self.planes.allocated_planes()
    }
}
