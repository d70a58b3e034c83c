// Great thanks to https://github.com/sotrh/learn-wgpu
// This code is modified

use std::{
    iter,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::Parser;
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

pub mod buffers;
pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod lines;
pub mod scene;
pub mod shader_types;
pub mod targets;

use buffers::LineBuffers;
use camera::Camera;
use config::{Args, Config};
use error::{FrameError, InitError};
use input::Pointer;
use lines::{LineBatch, Projection};
use shader_types::{FULLSCREEN_TRIANGLE, FullscreenVertex, OutlineVertex, VertexInputIndex};
use targets::OutlineTargets;

pub struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    window: Arc<Window>,
    settings: Config,
    sample_count: u32,
    outline_pipeline: wgpu::RenderPipeline,
    fullscreen_pipeline: wgpu::RenderPipeline,
    targets: OutlineTargets,
    composite_layout: wgpu::BindGroupLayout,
    composite_sampler: wgpu::Sampler,
    composite_bind_group: wgpu::BindGroup,
    fullscreen_buffer: wgpu::Buffer,
    lines: LineBatch,
    line_buffers: LineBuffers,
    camera: Camera,
    pointer: Pointer,
    frame_count: u32,
    last_fps_update: Instant,
    fps: f64,
    last_frame_time: Instant,
}

impl State {
    async fn new(window: Arc<Window>, settings: Config) -> Result<State, InitError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let sample_count = supported_sample_count(&adapter, surface_format, settings.sample_count);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let outline_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Outline Pipeline Layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        let outline_target = Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        });

        let outline_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Outline Pipeline"),
            layout: Some(&outline_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("outline_vs"),
                buffers: &[OutlineVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("outline_fs"),
                targets: &[outline_target.clone(), outline_target],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // quads wind either way depending on line direction
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let fullscreen_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Fullscreen Pipeline Layout"),
                bind_group_layouts: &[&composite_layout],
                push_constant_ranges: &[],
            });

        let fullscreen_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Fullscreen Pipeline"),
            layout: Some(&fullscreen_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("fullscreen_vs"),
                buffers: &[FullscreenVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fullscreen_fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent::REPLACE,
                        alpha: wgpu::BlendComponent::REPLACE,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let composite_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Composite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let targets = OutlineTargets::new(
            &device,
            surface_format,
            (config.width, config.height),
            sample_count,
        );
        let composite_bind_group =
            create_composite_bind_group(&device, &composite_layout, &targets, &composite_sampler);

        let fullscreen_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fullscreen Triangle"),
            contents: shader_types::vertex_bytes(&FULLSCREEN_TRIANGLE),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let line_buffers = LineBuffers::new(&device, settings.initial_line_capacity);

        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            size,
            config,
            window,
            settings,
            sample_count,
            outline_pipeline,
            fullscreen_pipeline,
            targets,
            composite_layout,
            composite_sampler,
            composite_bind_group,
            fullscreen_buffer,
            lines: LineBatch::new(),
            line_buffers,
            camera: Camera::default(),
            pointer: Pointer::default(),
            frame_count: 0,
            last_fps_update: Instant::now(),
            fps: 0.0,
            last_frame_time: Instant::now(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            self.targets = OutlineTargets::new(
                &self.device,
                self.config.format,
                (new_size.width, new_size.height),
                self.sample_count,
            );
            self.composite_bind_group = create_composite_bind_group(
                &self.device,
                &self.composite_layout,
                &self.targets,
                &self.composite_sampler,
            );
        }
    }

    fn update(&mut self) -> Result<(), FrameError> {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let projection = Projection {
            mvp: self.camera.view_projection(aspect),
            aspect,
        };

        self.lines.clear();
        self.settings
            .scene
            .build(&mut self.lines, &projection, self.settings.thickness)?;
        self.line_buffers.upload(&self.device, &self.queue, &self.lines);
        Ok(())
    }

    fn update_window_title(&self) {
        let cap_status = if self.settings.fps_cap_enabled {
            format!("(capped at {} FPS)", self.settings.target_fps)
        } else {
            "(uncapped)".to_string()
        };

        self.window.set_title(&format!(
            "{} - FPS: {:.1} {} - {} lines",
            env!("CARGO_PKG_NAME"),
            self.fps,
            cap_status,
            self.lines.line_count()
        ));
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // If FPS cap is enabled, wait until the next frame should be rendered
        if self.settings.fps_cap_enabled {
            let frame_duration = Duration::from_secs_f64(1.0 / self.settings.target_fps as f64);
            let elapsed = self.last_frame_time.elapsed();

            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }

            self.last_frame_time = Instant::now();
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut outline_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Outline Pass"),
                color_attachments: &self.targets.color_attachments(),
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if !self.lines.is_empty() {
                outline_pass.set_pipeline(&self.outline_pipeline);
                outline_pass.set_vertex_buffer(
                    VertexInputIndex::Vertices.slot(),
                    self.line_buffers.vertex.slice(..),
                );
                outline_pass
                    .set_index_buffer(self.line_buffers.index.slice(..), wgpu::IndexFormat::Uint16);
                outline_pass.draw_indexed(0..self.lines.indices().len() as u32, 0, 0..1);
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.fullscreen_pipeline);
            render_pass.set_bind_group(0, &self.composite_bind_group, &[]);
            render_pass.set_vertex_buffer(
                VertexInputIndex::Vertices.slot(),
                self.fullscreen_buffer.slice(..),
            );
            render_pass.draw(0..FULLSCREEN_TRIANGLE.len() as u32, 0..1);
        }

        self.queue.submit(iter::once(encoder.finish()));
        output.present();

        // Update FPS counter
        self.frame_count += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update);

        if elapsed.as_secs_f64() > 0.1 {
            self.fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_fps_update = now;

            self.update_window_title();
        }

        Ok(())
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_composite_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    targets: &OutlineTargets,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Composite Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&targets.raw),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&targets.bloom),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Falls back to no MSAA when the adapter cannot multisample `format` at
/// the requested count.
fn supported_sample_count(adapter: &wgpu::Adapter, format: wgpu::TextureFormat, requested: u32) -> u32 {
    if requested <= 1 {
        return 1;
    }
    let flags = adapter.get_texture_format_features(format).flags;
    if flags.sample_count_supported(requested) {
        requested
    } else {
        log::warn!("{requested}x MSAA unsupported for {format:?}, rendering without it");
        1
    }
}

struct App {
    settings: Config,
    state: Option<State>,
    error: Option<InitError>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attributes = Window::default_attributes().with_title(env!("CARGO_PKG_NAME"));
        let state = event_loop
            .create_window(attributes)
            .map_err(InitError::from)
            .and_then(|window| {
                pollster::block_on(State::new(Arc::new(window), self.settings.clone()))
            });

        match state {
            Ok(state) => {
                state.window().request_redraw();
                self.state = Some(state);
            }
            Err(err) => {
                log::error!("{err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if window_id != state.window().id() || input::handle_input(state, &event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(physical_size) => state.resize(physical_size),
            WindowEvent::RedrawRequested => {
                state.window().request_redraw();

                match state.update().and_then(|()| state.render().map_err(FrameError::from)) {
                    Ok(_) => {}
                    Err(FrameError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => state.resize(state.size),
                    Err(FrameError::Surface(
                        wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other,
                    )) => {
                        log::error!("OutOfMemory");
                        event_loop.exit();
                    }
                    Err(FrameError::Surface(wgpu::SurfaceError::Timeout)) => {
                        log::warn!("Surface timeout")
                    }
                    Err(err @ FrameError::Lines(_)) => {
                        log::error!("{err}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> Result<(), InitError> {
    env_logger::init();

    let settings = Config::from_args(Args::parse())?;
    log::debug!("{settings:?}");

    let event_loop = EventLoop::new()?;
    let mut app = App {
        settings,
        state: None,
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
