//! Pixel formats and pure frame-layout computation.
//!
//! [`FrameLayout::compute`] turns a frame description (format, dimensions,
//! row stride) into per-plane geometry: texture dimensions, byte offsets
//! into the source frame, and the staging geometry used by the streaming
//! upload path. Buffer-to-texture copies require rows aligned to
//! [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`], so every plane carries both its
//! source stride and a padded stride for the transfer slots.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Maximum number of planes any supported format uses.
pub const MAX_PLANES: usize = 3;

/// Pixel layout of one source frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Packed 8-bit blue/green/red/alpha, one plane.
    Bgra,
    /// Packed 8-bit red/green/blue/alpha, one plane.
    Rgba,
    /// Packed 10-10-10-2 red/green/blue/alpha in a 32-bit word, one plane.
    Rgba10,
    /// Planar 8-bit Y'CbCr 4:2:0: a full-resolution luma plane followed by
    /// two quarter-resolution chroma planes.
    Yuv420,
}

impl PixelFormat {
    /// Number of planes a frame of this format carries.
    #[must_use]
    pub fn plane_count(self) -> usize {
        match self {
            Self::Bgra | Self::Rgba | Self::Rgba10 => 1,
            Self::Yuv420 => 3,
        }
    }

    /// Bytes per texel of plane 0.
    #[must_use]
    pub fn texel_bytes(self) -> u32 {
        match self {
            Self::Bgra | Self::Rgba | Self::Rgba10 => 4,
            Self::Yuv420 => 1,
        }
    }

    /// GPU texture format used for every plane of this pixel format.
    #[must_use]
    pub fn plane_format(self) -> wgpu::TextureFormat {
        match self {
            Self::Bgra => wgpu::TextureFormat::Bgra8Unorm,
            Self::Rgba => wgpu::TextureFormat::Rgba8Unorm,
            Self::Rgba10 => wgpu::TextureFormat::Rgb10a2Unorm,
            Self::Yuv420 => wgpu::TextureFormat::R8Unorm,
        }
    }
}

/// One complete frame description: everything `setup` needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Source pixel format.
    pub format: PixelFormat,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Source row stride of plane 0 in bytes.
    pub stride: u32,
    /// Use the double-buffered streaming upload path.
    pub streaming: bool,
}

impl FrameConfig {
    /// Compute the frame layout for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] when the dimensions or stride are invalid.
    pub fn layout(&self) -> Result<FrameLayout, LayoutError> {
        FrameLayout::compute(self.format, self.width, self.height, self.stride)
    }
}

/// Geometry of one plane within a source frame and within a transfer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Plane width in texels.
    pub width: u32,
    /// Plane height in rows.
    pub height: u32,
    /// Source row stride in texels.
    pub row_texels: u32,
    /// Byte offset of the plane within the source frame.
    pub byte_offset: u64,
    /// Source row stride in bytes.
    pub bytes_per_row: u32,
    /// Row stride in bytes inside a transfer slot, aligned to
    /// [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].
    pub padded_bytes_per_row: u32,
    /// Byte offset of the plane within a transfer slot.
    pub slot_offset: u64,
}

impl PlaneLayout {
    const EMPTY: Self = Self {
        width: 0,
        height: 0,
        row_texels: 0,
        byte_offset: 0,
        bytes_per_row: 0,
        padded_bytes_per_row: 0,
        slot_offset: 0,
    };
}

/// Complete layout of one frame: per-plane geometry and total sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    /// Source pixel format.
    pub format: PixelFormat,
    /// Logical frame width in pixels.
    pub width: u32,
    /// Logical frame height in pixels.
    pub height: u32,
    /// Source row stride of plane 0 in bytes.
    pub stride: u32,
    /// Total bytes of one frame in the source layout.
    pub buffer_size: u64,
    /// Bytes required per transfer slot (rows padded for GPU copies).
    pub slot_size: u64,
    planes: [PlaneLayout; MAX_PLANES],
    plane_count: usize,
}

impl FrameLayout {
    /// Compute the full layout for one frame configuration.
    ///
    /// Plane geometry follows the source layout exactly: packed formats are
    /// a single plane of `height * stride` bytes; planar 4:2:0 is a luma
    /// plane followed by two chroma planes at half width, half height, and
    /// half stride (integer floor division), with the second chroma plane
    /// offset a quarter of the luma extent past the first.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidDimensions`] when width or height is
    /// zero, too small to produce a chroma texel, or large enough that the
    /// frame's byte extent overflows, and [`LayoutError::InvalidStride`]
    /// when the stride cannot hold one row, is not a whole number of
    /// texels, or pads past `u32::MAX` for the GPU copy geometry.
    pub fn compute(
        format: PixelFormat,
        width: u32,
        height: u32,
        stride: u32,
    ) -> Result<Self, LayoutError> {
        if width == 0 || height == 0 {
            return Err(LayoutError::InvalidDimensions { width, height });
        }
        // Sub-sampled planes must still be at least one texel.
        if format.plane_count() > 1 && (width < 2 || height < 2) {
            return Err(LayoutError::InvalidDimensions { width, height });
        }
        let texel = format.texel_bytes();
        let min = u64::from(width) * u64::from(texel);
        if u64::from(stride) < min || stride % texel != 0 {
            return Err(LayoutError::InvalidStride { stride, min });
        }

        let (plane_count, mut planes, buffer_size) = match format {
            PixelFormat::Bgra | PixelFormat::Rgba | PixelFormat::Rgba10 => {
                let plane = PlaneLayout {
                    width,
                    height,
                    row_texels: stride / texel,
                    byte_offset: 0,
                    bytes_per_row: stride,
                    ..PlaneLayout::EMPTY
                };
                let size = u64::from(height) * u64::from(stride);
                (1, [plane, PlaneLayout::EMPTY, PlaneLayout::EMPTY], size)
            }
            PixelFormat::Yuv420 => {
                let luma_bytes = u64::from(stride) * u64::from(height);
                let quarter = luma_bytes / 4;
                let chroma2_offset = luma_bytes
                    .checked_add(quarter)
                    .ok_or(LayoutError::InvalidDimensions { width, height })?;
                let size = chroma2_offset
                    .checked_add(quarter)
                    .ok_or(LayoutError::InvalidDimensions { width, height })?;
                let luma = PlaneLayout {
                    width,
                    height,
                    row_texels: stride,
                    byte_offset: 0,
                    bytes_per_row: stride,
                    ..PlaneLayout::EMPTY
                };
                let chroma = PlaneLayout {
                    width: width / 2,
                    height: height / 2,
                    row_texels: stride / 2,
                    bytes_per_row: stride / 2,
                    ..PlaneLayout::EMPTY
                };
                let planes = [
                    luma,
                    PlaneLayout {
                        byte_offset: luma_bytes,
                        ..chroma
                    },
                    PlaneLayout {
                        byte_offset: chroma2_offset,
                        ..chroma
                    },
                ];
                (3, planes, size)
            }
        };

        // Staging geometry: pad every row out to the copy alignment and
        // pack the planes back to back. Copy descriptors carry u32 row
        // strides, so rows that pad past u32::MAX are rejected.
        let align = u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let mut slot_offset = 0u64;
        for plane in planes.iter_mut().take(plane_count) {
            let padded =
                u64::from(plane.bytes_per_row).div_ceil(align) * align;
            plane.padded_bytes_per_row = u32::try_from(padded)
                .map_err(|_| LayoutError::InvalidStride { stride, min })?;
            plane.slot_offset = slot_offset;
            slot_offset = slot_offset
                .checked_add(padded * u64::from(plane.height))
                .ok_or(LayoutError::InvalidDimensions { width, height })?;
        }

        Ok(Self {
            format,
            width,
            height,
            stride,
            buffer_size,
            slot_size: slot_offset,
            planes,
            plane_count,
        })
    }

    /// The planes of this layout, in source order (plane 0 first).
    #[must_use]
    pub fn planes(&self) -> &[PlaneLayout] {
        &self.planes[..self.plane_count]
    }

    /// Number of planes in this layout.
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.plane_count
    }

    /// `true` when every plane's source rows are already aligned for GPU
    /// copies, so a frame moves into a transfer slot with one contiguous
    /// copy per plane instead of a per-row repack.
    #[must_use]
    pub fn is_packed(&self) -> bool {
        self.planes()
            .iter()
            .all(|p| p.padded_bytes_per_row == p.bytes_per_row)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_bgra_1080p_layout() {
        let layout =
            FrameLayout::compute(PixelFormat::Bgra, 1920, 1080, 7680)
                .unwrap();
        assert_eq!(layout.plane_count(), 1);
        assert_eq!(layout.buffer_size, 8_294_400);
        let plane = layout.planes()[0];
        assert_eq!(plane.width, 1920);
        assert_eq!(plane.height, 1080);
        assert_eq!(plane.row_texels, 1920);
        assert_eq!(plane.byte_offset, 0);
        // 7680 is already a multiple of the copy alignment.
        assert_eq!(plane.padded_bytes_per_row, 7680);
        assert!(layout.is_packed());
        assert_eq!(layout.slot_size, 8_294_400);
    }

    #[test]
    fn test_yuv420_1080p_offsets() {
        let layout =
            FrameLayout::compute(PixelFormat::Yuv420, 1920, 1080, 1920)
                .unwrap();
        assert_eq!(layout.plane_count(), 3);
        let planes = layout.planes();
        assert_eq!(planes[0].byte_offset, 0);
        assert_eq!(planes[1].byte_offset, 2_073_600);
        assert_eq!(planes[2].byte_offset, 2_592_000);
        assert_eq!(layout.buffer_size, 3_110_400);
        assert_eq!((planes[1].width, planes[1].height), (960, 540));
        assert_eq!((planes[2].width, planes[2].height), (960, 540));
        assert_eq!(planes[1].row_texels, 960);
    }

    #[test]
    fn test_yuv420_staging_geometry() {
        let layout =
            FrameLayout::compute(PixelFormat::Yuv420, 1920, 1080, 1920)
                .unwrap();
        let planes = layout.planes();
        // 1920 is not 256-aligned; 2048 is the next multiple.
        assert_eq!(planes[0].padded_bytes_per_row, 2048);
        assert_eq!(planes[1].padded_bytes_per_row, 1024);
        assert_eq!(planes[0].slot_offset, 0);
        assert_eq!(planes[1].slot_offset, 2_211_840);
        assert_eq!(planes[2].slot_offset, 2_764_800);
        assert_eq!(layout.slot_size, 3_317_760);
        assert!(!layout.is_packed());
    }

    #[test]
    fn test_yuv420_chroma_floor_division() {
        let layout =
            FrameLayout::compute(PixelFormat::Yuv420, 1919, 1079, 1920)
                .unwrap();
        let planes = layout.planes();
        assert_eq!((planes[1].width, planes[1].height), (959, 539));
        assert_eq!(planes[1].byte_offset, 2_071_680);
        assert_eq!(planes[2].byte_offset, 2_589_600);
        assert_eq!(layout.buffer_size, 3_107_520);
    }

    #[test]
    fn test_rgba10_single_plane() {
        let layout =
            FrameLayout::compute(PixelFormat::Rgba10, 1920, 1080, 7680)
                .unwrap();
        assert_eq!(layout.plane_count(), 1);
        assert_eq!(layout.buffer_size, 8_294_400);
        assert_eq!(
            PixelFormat::Rgba10.plane_format(),
            wgpu::TextureFormat::Rgb10a2Unorm
        );
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Bgra, 0, 1080, 7680),
            Err(LayoutError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Rgba, 1920, 0, 7680),
            Err(LayoutError::InvalidDimensions { .. })
        ));
        // A 1x1 planar frame has no chroma texels.
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Yuv420, 1, 1, 1),
            Err(LayoutError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_strides() {
        // Too small for one row.
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Bgra, 100, 100, 399),
            Err(LayoutError::InvalidStride { min: 400, .. })
        ));
        // Large enough but not a whole number of texels.
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Bgra, 100, 100, 402),
            Err(LayoutError::InvalidStride { .. })
        ));
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Yuv420, 64, 64, 63),
            Err(LayoutError::InvalidStride { .. })
        ));
    }

    #[test]
    fn test_rejects_overflowing_geometry() {
        // Strides this close to u32::MAX would pad past it.
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Yuv420, 2, 2, u32::MAX),
            Err(LayoutError::InvalidStride { .. })
        ));
        assert!(matches!(
            FrameLayout::compute(PixelFormat::Bgra, 2, 2, u32::MAX - 3),
            Err(LayoutError::InvalidStride { .. })
        ));

        // A frame whose byte extent overflows u64 is rejected up front.
        assert!(matches!(
            FrameLayout::compute(
                PixelFormat::Yuv420,
                2,
                u32::MAX,
                u32::MAX,
            ),
            Err(LayoutError::InvalidDimensions { .. })
        ));

        // The largest copy-aligned stride still computes.
        let layout =
            FrameLayout::compute(PixelFormat::Bgra, 2, 2, u32::MAX - 255)
                .unwrap();
        assert_eq!(layout.planes()[0].padded_bytes_per_row, u32::MAX - 255);
        assert!(layout.is_packed());
        assert_eq!(layout.slot_size, 2 * u64::from(u32::MAX - 255));
    }

    #[test]
    fn test_plane_ranges_non_overlapping() {
        let formats = [
            PixelFormat::Bgra,
            PixelFormat::Rgba,
            PixelFormat::Rgba10,
            PixelFormat::Yuv420,
        ];
        let mut rng = rand::rng();
        for format in formats {
            let texel = format.texel_bytes();
            for _ in 0..200 {
                let width = rng.random_range(2..=512_u32);
                let height = rng.random_range(2..=512_u32);
                let stride =
                    width * texel + rng.random_range(0..8_u32) * texel;
                let layout =
                    FrameLayout::compute(format, width, height, stride)
                        .unwrap();

                let mut last_end = 0u64;
                for plane in layout.planes() {
                    assert!(plane.byte_offset >= last_end);
                    let extent = u64::from(plane.bytes_per_row)
                        * u64::from(plane.height);
                    last_end = plane.byte_offset + extent;
                    assert!(last_end <= layout.buffer_size);
                    assert!(plane.bytes_per_row >= plane.width * texel);
                }

                // Single-plane formats are bounded exactly; planar frames
                // with even geometry are too.
                let even = stride % 2 == 0 && height % 2 == 0;
                if layout.plane_count() == 1 || even {
                    assert_eq!(last_end, layout.buffer_size);
                }
            }
        }
    }

    #[test]
    fn test_slot_geometry_aligned() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let width = rng.random_range(2..=512_u32);
            let height = rng.random_range(2..=512_u32);
            let stride = width + rng.random_range(0..64_u32);
            let layout =
                FrameLayout::compute(PixelFormat::Yuv420, width, height, stride)
                    .unwrap();

            let align = u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
            let mut expected_offset = 0u64;
            for plane in layout.planes() {
                assert_eq!(plane.slot_offset % align, 0);
                assert_eq!(plane.slot_offset, expected_offset);
                assert!(plane.padded_bytes_per_row >= plane.bytes_per_row);
                assert_eq!(
                    u64::from(plane.padded_bytes_per_row) % align,
                    0
                );
                expected_offset += u64::from(plane.padded_bytes_per_row)
                    * u64::from(plane.height);
            }
            assert_eq!(layout.slot_size, expected_offset);
            assert!(layout.slot_size >= layout.buffer_size);
        }
    }

    #[test]
    fn test_packed_iff_rows_aligned() {
        // 64 pixels * 4 bytes = 256-byte rows: packed.
        let layout =
            FrameLayout::compute(PixelFormat::Rgba, 64, 16, 256).unwrap();
        assert!(layout.is_packed());

        // 60-pixel rows are not.
        let layout =
            FrameLayout::compute(PixelFormat::Rgba, 60, 16, 240).unwrap();
        assert!(!layout.is_packed());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = FrameConfig {
            format: PixelFormat::Yuv420,
            width: 1920,
            height: 1080,
            stride: 1920,
            streaming: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"yuv420\""));
        let back: FrameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        // Unknown format tags are a configuration error.
        let bad = json.replace("yuv420", "nv12");
        assert!(serde_json::from_str::<FrameConfig>(&bad).is_err());
    }

    #[test]
    fn test_config_layout_propagates_errors() {
        let config = FrameConfig {
            format: PixelFormat::Bgra,
            width: 0,
            height: 0,
            stride: 0,
            streaming: false,
        };
        assert!(config.layout().is_err());
    }
}
