use anyhow::{anyhow, Context, Result};
use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::{debug, info};
use wgpu::util::DeviceExt;

use crate::app::{SceneAssets, SceneState};
use crate::camera::PerspectiveCamera;
use crate::environment::{EnvironmentBaker, EnvironmentMap};
use crate::obj::{ModelMesh, ModelVertex};
use crate::params::scene_constants::{SKY_SCALE, WATER_PLANE_SIZE};
use crate::params::SkyUniforms;
use crate::render_loop::SceneRenderer;
use crate::texture::NormalMap;

use super::environment::CubemapBaker;
use super::shaders::{MODEL_SHADER, SKY_SHADER, WATER_SHADER};

/// GPU renderer backed by wgpu that draws the sky, the water and the model.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    normal_view: wgpu::TextureView,
    normal_sampler: wgpu::Sampler,
    cube_sampler: wgpu::Sampler,
    sky_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    model_pipeline: wgpu::RenderPipeline,
    sky_box: MeshBuffers,
    water_plane: MeshBuffers,
    model: Option<MeshBuffers>,
    baker: CubemapBaker,
    active_map: Option<EnvironmentMap>,
}

impl Renderer {
    /// Initializes the GPU renderer for a window or canvas of `width` x
    /// `height` physical pixels.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        assets: &SceneAssets,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("surface has zero area"));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .context("failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        info!("using adapter {}", adapter.get_info().name);

        #[cfg(target_arch = "wasm32")]
        let required_limits =
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        #[cfg(not(target_arch = "wasm32"))]
        let required_limits = wgpu::Limits::default();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("renderer-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, width, height);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<FrameUniform>() as u64
                    ),
                },
                count: None,
            }],
        });
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame-uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture-bind-layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
                texture_entry(2, wgpu::TextureViewDimension::Cube),
                texture_entry(3, wgpu::TextureViewDimension::Cube),
                sampler_entry(4),
            ],
        });

        let normal_view = upload_normal_map(&device, &queue, &assets.normals);
        let normal_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("normal-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let cube_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cube-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let baker = CubemapBaker::new(&device, &queue);
        let texture_bind_group = bind_textures(
            &device,
            &texture_layout,
            &normal_view,
            &normal_sampler,
            &cube_sampler,
            &baker,
            None,
        );

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&frame_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let sky_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky-pipeline-layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let position_layout = wgpu::VertexBufferLayout {
            array_stride: (3 * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        };
        let model_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
        };

        let sky_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "sky",
                source: SKY_SHADER,
                layout: &sky_layout,
                vertex: position_layout.clone(),
                format: surface_format,
                blend: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
        );
        let water_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "water",
                source: WATER_SHADER,
                layout: &scene_layout,
                vertex: position_layout,
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let model_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "model",
                source: MODEL_SHADER,
                layout: &scene_layout,
                vertex: model_layout,
                format: surface_format,
                blend: None,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let sky_box = MeshBuffers::positions(
            &device,
            &SKY_BOX_VERTICES,
            &SKY_BOX_INDICES,
            SKY_SCALE,
            "sky-box",
        );
        let water_plane = MeshBuffers::positions(
            &device,
            &WATER_PLANE_VERTICES,
            &WATER_PLANE_INDICES,
            WATER_PLANE_SIZE,
            "water-plane",
        );
        let model = assets
            .model
            .as_ref()
            .map(|mesh| MeshBuffers::model(&device, mesh, "model"));

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            frame_buffer,
            frame_bind_group,
            texture_layout,
            texture_bind_group,
            normal_view,
            normal_sampler,
            cube_sampler,
            sky_pipeline,
            water_pipeline,
            model_pipeline,
            sky_box,
            water_plane,
            model,
            baker,
            active_map: None,
        })
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, width, height);
    }

    fn rebind_textures(&mut self) {
        self.texture_bind_group = bind_textures(
            &self.device,
            &self.texture_layout,
            &self.normal_view,
            &self.normal_sampler,
            &self.cube_sampler,
            &self.baker,
            self.active_map,
        );
    }

    fn update_frame(&self, scene: &SceneState, camera: &PerspectiveCamera) {
        let uniform = FrameUniform::new(scene, camera);
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytes_of(&uniform));
    }

    fn draw(&mut self, scene: &SceneState, camera: &PerspectiveCamera) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.update_frame(scene, camera);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            pass.set_pipeline(&self.sky_pipeline);
            self.sky_box.draw(&mut pass);

            pass.set_bind_group(1, &self.texture_bind_group, &[]);
            if let (Some(model), Some(_)) = (&self.model, scene.model_transform) {
                pass.set_pipeline(&self.model_pipeline);
                model.draw(&mut pass);
            }

            pass.set_pipeline(&self.water_pipeline);
            self.water_plane.draw(&mut pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl SceneRenderer for Renderer {
    fn render(&mut self, scene: &SceneState, camera: &PerspectiveCamera) -> Result<()> {
        match self.draw(scene, camera) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.resize_surface(self.config.width, self.config.height);
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            #[allow(unreachable_patterns)]
            Err(err) => Err(anyhow!("failed to acquire surface texture: {err}")),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resize_surface(width, height);
    }
}

impl EnvironmentBaker for Renderer {
    fn bake(&mut self, sky: &SkyUniforms) -> Result<EnvironmentMap> {
        let map = self.baker.bake(&self.device, &self.queue, sky);
        self.active_map = Some(map);
        self.rebind_textures();
        debug!("baked environment map #{} ({} live)", map.id, self.baker.live_maps());
        Ok(map)
    }

    fn release(&mut self, map: EnvironmentMap) {
        if self.active_map == Some(map) {
            self.active_map = None;
            self.rebind_textures();
        }
        self.baker.release(map);
    }
}

fn texture_entry(binding: u32, dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn bind_textures(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    normal_view: &wgpu::TextureView,
    normal_sampler: &wgpu::Sampler,
    cube_sampler: &wgpu::Sampler,
    baker: &CubemapBaker,
    map: Option<EnvironmentMap>,
) -> wgpu::BindGroup {
    let environment = baker.textures(map);
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(normal_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(normal_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&environment.radiance.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&environment.irradiance.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(cube_sampler),
            },
        ],
    })
}

fn upload_normal_map(device: &wgpu::Device, queue: &wgpu::Queue, map: &NormalMap) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: map.width,
        height: map.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("water-normals"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &map.rgba,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * map.width),
            rows_per_image: Some(map.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

struct PipelineSpec<'a> {
    label: &'a str,
    source: &'a str,
    layout: &'a wgpu::PipelineLayout,
    vertex: wgpu::VertexBufferLayout<'a>,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_pipeline(device: &wgpu::Device, pipeline: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(pipeline.label),
        source: wgpu::ShaderSource::Wgsl(pipeline.source.into()),
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(pipeline.label),
        layout: Some(pipeline.layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[pipeline.vertex],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: pipeline.depth_write,
            depth_compare: pipeline.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: pipeline.format,
                blend: pipeline.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    /// Position-only mesh with every vertex multiplied by `scale`.
    fn positions(
        device: &wgpu::Device,
        vertices: &[[f32; 3]],
        indices: &[u32],
        scale: f32,
        label: &str,
    ) -> Self {
        let scaled: Vec<[f32; 3]> = vertices
            .iter()
            .map(|v| (Vec3::from(*v) * scale).to_array())
            .collect();
        Self::upload(device, bytemuck::cast_slice(&scaled), indices, label)
    }

    fn model(device: &wgpu::Device, mesh: &ModelMesh, label: &str) -> Self {
        Self::upload(
            device,
            bytemuck::cast_slice(&mesh.vertices),
            &mesh.indices,
            label,
        )
    }

    fn upload(device: &wgpu::Device, vertices: &[u8], indices: &[u32], label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        pass.set_index_buffer(self.index.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    sun: [f32; 4],
    sun_direction: [f32; 4],
    scattering: [f32; 4],
    water: [f32; 4],
    sun_color: [f32; 4],
    water_color: [f32; 4],
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
}

impl FrameUniform {
    fn new(scene: &SceneState, camera: &PerspectiveCamera) -> Self {
        let model = scene.model_transform.unwrap_or(Mat4::IDENTITY);
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let sky = &scene.sky;
        let water = &scene.water;
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            sun: sky.sun_position.extend(0.0).into(),
            sun_direction: water.sun_direction.extend(0.0).into(),
            scattering: [
                sky.turbidity,
                sky.rayleigh,
                sky.mie_coefficient,
                sky.mie_directional_g,
            ],
            water: [
                water.distortion_scale,
                water.size,
                water.time as f32,
                water.alpha,
            ],
            sun_color: water.sun_color.extend(1.0).into(),
            water_color: water.water_color.extend(1.0).into(),
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
        }
    }
}

/// Unit cube centred on the origin.
const SKY_BOX_VERTICES: [[f32; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
];

const SKY_BOX_INDICES: [u32; 36] = [
    0, 2, 1, 0, 3, 2, // back
    4, 5, 6, 4, 6, 7, // front
    0, 4, 7, 0, 7, 3, // left
    1, 2, 6, 1, 6, 5, // right
    3, 7, 6, 3, 6, 2, // top
    0, 1, 5, 0, 5, 4, // bottom
];

/// Unit square in the XZ plane.
const WATER_PLANE_VERTICES: [[f32; 3]; 4] = [
    [-0.5, 0.0, -0.5],
    [0.5, 0.0, -0.5],
    [0.5, 0.0, 0.5],
    [-0.5, 0.0, 0.5],
];

const WATER_PLANE_INDICES: [u32; 6] = [0, 2, 1, 0, 3, 2];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_uniform_matches_wgsl_layout() {
        // mat4 + 7 vec4 + mat4 + mat3x4
        assert_eq!(std::mem::size_of::<FrameUniform>(), 64 + 7 * 16 + 64 + 48);
    }

    #[test]
    fn frame_uniform_carries_the_water_sun_direction() {
        let mut scene = SceneState::default();
        scene.sky.sun_position = Vec3::new(0.0, 3.0, -4.0);
        scene.water.sun_direction = Vec3::new(0.0, 0.6, -0.8);
        scene.water.time = 12.5;
        let uniform = FrameUniform::new(&scene, &PerspectiveCamera::default());
        assert_eq!(uniform.sun, [0.0, 3.0, -4.0, 0.0]);
        assert_eq!(uniform.sun_direction, [0.0, 0.6, -0.8, 0.0]);
        assert_eq!(uniform.water[2], 12.5);
    }

    #[test]
    fn water_plane_faces_up() {
        for tri in WATER_PLANE_INDICES.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(WATER_PLANE_VERTICES[tri[i] as usize]));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn sky_box_covers_every_face() {
        let mut used = [false; 8];
        for &index in &SKY_BOX_INDICES {
            used[index as usize] = true;
        }
        assert!(used.iter().all(|&u| u));
        assert_eq!(SKY_BOX_INDICES.len(), 12 * 3);
    }
}
