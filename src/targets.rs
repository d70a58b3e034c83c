//! Offscreen colour targets the outline pass renders into.

/// Raw outlines and the glow source, both sampled by the composite pass.
/// With MSAA the pass draws into multisampled twins that resolve into them.
pub struct OutlineTargets {
    pub raw: wgpu::TextureView,
    pub bloom: wgpu::TextureView,
    multisampled: Option<[wgpu::TextureView; 2]>,
}

impl OutlineTargets {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: (u32, u32),
        sample_count: u32,
    ) -> Self {
        let raw = create_target(device, "Outline Raw Target", format, size, 1);
        let bloom = create_target(device, "Outline Bloom Target", format, size, 1);
        let multisampled = (sample_count > 1).then(|| {
            [
                create_target(device, "Outline Raw Target MSAA", format, size, sample_count),
                create_target(device, "Outline Bloom Target MSAA", format, size, sample_count),
            ]
        });

        Self {
            raw,
            bloom,
            multisampled,
        }
    }

    /// Attachments for locations 0 (raw) and 1 (bloom), cleared to
    /// transparent black.
    pub fn color_attachments(&self) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 2] {
        let ops = |store| wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store,
        };

        match &self.multisampled {
            Some([raw_msaa, bloom_msaa]) => [
                Some(wgpu::RenderPassColorAttachment {
                    view: raw_msaa,
                    resolve_target: Some(&self.raw),
                    ops: ops(wgpu::StoreOp::Discard),
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: bloom_msaa,
                    resolve_target: Some(&self.bloom),
                    ops: ops(wgpu::StoreOp::Discard),
                }),
            ],
            None => [
                Some(wgpu::RenderPassColorAttachment {
                    view: &self.raw,
                    resolve_target: None,
                    ops: ops(wgpu::StoreOp::Store),
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: &self.bloom,
                    resolve_target: None,
                    ops: ops(wgpu::StoreOp::Store),
                }),
            ],
        }
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    (width, height): (u32, u32),
    sample_count: u32,
) -> wgpu::TextureView {
    let usage = if sample_count > 1 {
        wgpu::TextureUsages::RENDER_ATTACHMENT
    } else {
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
    };

    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}
