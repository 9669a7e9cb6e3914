use std::collections::HashMap;

use bytemuck::{bytes_of, Pod, Zeroable};

use crate::environment::EnvironmentMap;
use crate::params::SkyUniforms;

use super::shaders::BAKE_SHADER;

/// Face size of the sharp cubemap sampled by water reflections.
const RADIANCE_SIZE: u32 = 128;
/// Face size of the cosine-filtered cubemap used for ambient light.
const IRRADIANCE_SIZE: u32 = 16;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const PASSES: u64 = 12;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BakeUniform {
    face: [f32; 4],
    coefficients: [f32; 4],
    sun: [f32; 4],
}

pub(super) struct CubeTexture {
    texture: wgpu::Texture,
    pub(super) view: wgpu::TextureView,
}

impl CubeTexture {
    fn create(device: &wgpu::Device, size: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Self { texture, view }
    }

    /// Single-texel cube filled with one colour, bound while no map is baked.
    fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        let cube = Self::create(device, 1, label);
        let texels: Vec<u8> = rgba.iter().copied().cycle().take(4 * 6).collect();
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &cube.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 6,
            },
        );
        cube
    }

    fn face_view(&self, face: u32) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("environment-face"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_array_layer: face,
            array_layer_count: Some(1),
            ..Default::default()
        })
    }

    fn destroy(self) {
        self.texture.destroy();
    }
}

/// Radiance and irradiance cubes baked from one sky state.
pub(super) struct BakedEnvironment {
    pub(super) radiance: CubeTexture,
    pub(super) irradiance: CubeTexture,
}

/// Renders the sky into cubemaps and owns every live bake.
pub(super) struct CubemapBaker {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    next_id: u64,
    maps: HashMap<u64, BakedEnvironment>,
    fallback: BakedEnvironment,
}

impl CubemapBaker {
    pub(super) fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let size = std::mem::size_of::<BakeUniform>() as u64;
        let stride = size.div_ceil(alignment) * alignment;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bake-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(size),
                },
                count: None,
            }],
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake-uniform"),
            size: stride * PASSES,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bake-bind-group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size),
                }),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bake-shader"),
            source: wgpu::ShaderSource::Wgsl(BAKE_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bake-pipeline-layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("bake-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        let fallback = BakedEnvironment {
            radiance: CubeTexture::solid(device, queue, [40, 48, 64, 255], "fallback-radiance"),
            irradiance: CubeTexture::solid(device, queue, [40, 48, 64, 255], "fallback-irradiance"),
        };

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            stride,
            next_id: 0,
            maps: HashMap::new(),
            fallback,
        }
    }

    pub(super) fn bake(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sky: &SkyUniforms,
    ) -> EnvironmentMap {
        let baked = BakedEnvironment {
            radiance: CubeTexture::create(device, RADIANCE_SIZE, "environment-radiance"),
            irradiance: CubeTexture::create(device, IRRADIANCE_SIZE, "environment-irradiance"),
        };

        let targets = [(&baked.radiance, RADIANCE_SIZE, 0.0), (&baked.irradiance, IRRADIANCE_SIZE, 1.0)];
        let mut uniforms = vec![0u8; (self.stride * PASSES) as usize];
        let mut passes = Vec::with_capacity(PASSES as usize);
        for (target, size, irradiance) in targets {
            for face in 0..6u32 {
                let offset = passes.len() as u64 * self.stride;
                let uniform = BakeUniform {
                    face: [face as f32, irradiance, size as f32, 0.0],
                    coefficients: [
                        sky.turbidity,
                        sky.rayleigh,
                        sky.mie_coefficient,
                        sky.mie_directional_g,
                    ],
                    sun: sky.sun_position.extend(0.0).into(),
                };
                let start = offset as usize;
                uniforms[start..start + std::mem::size_of::<BakeUniform>()]
                    .copy_from_slice(bytes_of(&uniform));
                passes.push((target.face_view(face), offset as u32));
            }
        }
        queue.write_buffer(&self.uniform_buffer, 0, &uniforms);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("bake-encoder"),
        });
        for (view, offset) in &passes {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("bake-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[*offset]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));

        self.next_id += 1;
        self.maps.insert(self.next_id, baked);
        EnvironmentMap { id: self.next_id }
    }

    pub(super) fn release(&mut self, map: EnvironmentMap) {
        if let Some(baked) = self.maps.remove(&map.id) {
            baked.radiance.destroy();
            baked.irradiance.destroy();
        }
    }

    /// Cubes for `map`, or the neutral fallback when it is not live.
    pub(super) fn textures(&self, map: Option<EnvironmentMap>) -> &BakedEnvironment {
        map.and_then(|map| self.maps.get(&map.id))
            .unwrap_or(&self.fallback)
    }

    pub(super) fn live_maps(&self) -> usize {
        self.maps.len()
    }
}
