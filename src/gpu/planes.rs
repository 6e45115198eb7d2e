//! Per-plane GPU texture and sampler resources.
//!
//! A frame is sampled through one bind group holding every plane's texture
//! view and sampler: plane `i` occupies bindings `2i` (view) and `2i + 1`
//! (sampler), so a shader addresses plane 0 as the primary/luma image and
//! planes 1 and 2 as chroma.

use crate::format::FrameLayout;

struct PlaneTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

/// GPU resources for every plane of the configured format.
///
/// Allocation is monotonic: reconfiguring to a format with fewer planes
/// keeps the extra textures and samplers alive, so alternating between
/// formats with equal plane counts never churns resources.
pub struct PlaneTextures {
    planes: Vec<PlaneTexture>,
    samplers: Vec<wgpu::Sampler>,
    in_use: usize,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
}

impl Default for PlaneTextures {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaneTextures {
    /// Create an empty set. No GPU resources are allocated until the first
    /// [`configure`](Self::configure).
    #[must_use]
    pub fn new() -> Self {
        Self {
            planes: Vec::new(),
            samplers: Vec::new(),
            in_use: 0,
            bind_group_layout: None,
            bind_group: None,
        }
    }

    /// Size the set for `layout`, allocating or resizing plane storage as
    /// needed and rebuilding the bind group when anything changed.
    ///
    /// Identical consecutive layouts allocate nothing.
    pub fn configure(&mut self, device: &wgpu::Device, layout: &FrameLayout) {
        let required = layout.plane_count();
        let format = layout.format.plane_format();

        if required > self.planes.len() {
            log::debug!(
                "growing plane set: {} -> {required}",
                self.planes.len()
            );
        }
        while self.samplers.len() < required {
            self.samplers
                .push(create_plane_sampler(device, self.samplers.len()));
        }

        let mut textures_changed = false;
        for (i, plane) in layout.planes().iter().enumerate() {
            let up_to_date = self.planes.get(i).is_some_and(|p| {
                p.width == plane.width
                    && p.height == plane.height
                    && p.format == format
            });
            if up_to_date {
                continue;
            }
            let created =
                create_plane_texture(device, i, plane.width, plane.height, format);
            if i < self.planes.len() {
                self.planes[i] = created;
            } else {
                self.planes.push(created);
            }
            textures_changed = true;
        }

        let count_changed = self.in_use != required;
        self.in_use = required;

        if count_changed || self.bind_group_layout.is_none() {
            self.bind_group_layout =
                Some(create_bind_group_layout(device, required));
        }
        if textures_changed || count_changed || self.bind_group.is_none() {
            self.rebuild_bind_group(device);
        }
    }

    fn rebuild_bind_group(&mut self, device: &wgpu::Device) {
        let Some(layout) = self.bind_group_layout.as_ref() else {
            return;
        };
        let mut entries = Vec::with_capacity(self.in_use * 2);
        for i in 0..self.in_use {
            entries.push(wgpu::BindGroupEntry {
                binding: (2 * i) as u32,
                resource: wgpu::BindingResource::TextureView(
                    &self.planes[i].view,
                ),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: (2 * i + 1) as u32,
                resource: wgpu::BindingResource::Sampler(&self.samplers[i]),
            });
        }
        self.bind_group =
            Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Frame Plane Bind Group"),
                layout,
                entries: &entries,
            }));
    }

    /// Number of planes currently in use.
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.in_use
    }

    /// Number of plane slots ever allocated (monotonic).
    #[must_use]
    pub fn allocated_planes(&self) -> usize {
        self.planes.len()
    }

    /// The texture for plane `index`, if that plane is in use.
    #[must_use]
    pub fn texture(&self, index: usize) -> Option<&wgpu::Texture> {
        if index < self.in_use {
            self.planes.get(index).map(|p| &p.texture)
        } else {
            None
        }
    }

    /// The bind group holding every in-use plane, `None` before the first
    /// configure.
    #[must_use]
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Layout matching [`bind_group`](Self::bind_group), for consumer
    /// pipeline creation.
    #[must_use]
    pub fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.bind_group_layout.as_ref()
    }
}

fn create_plane_texture(
    device: &wgpu::Device,
    index: usize,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> PlaneTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("Frame Plane Texture {index}")),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    PlaneTexture {
        texture,
        view,
        width,
        height,
        format,
    }
}

fn create_plane_sampler(device: &wgpu::Device, index: usize) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("Frame Plane Sampler {index}")),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

fn create_bind_group_layout(
    device: &wgpu::Device,
    plane_count: usize,
) -> wgpu::BindGroupLayout {
    let mut entries = Vec::with_capacity(plane_count * 2);
    for i in 0..plane_count {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (2 * i) as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float {
                    filterable: true,
                },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (2 * i + 1) as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Frame Plane Bind Group Layout"),
        entries: &entries,
    })
}
