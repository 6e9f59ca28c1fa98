//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in fragment shader using signed distance fields.
//! Scene data goes up as fixed-size uniform arrays so the same pipeline runs
//! on WebGL2 downlevel limits.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::{MAX_BLADE_POINTS, MAX_RENDER_ITEMS, MAX_RENDER_PARTICLES};
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, ItemKind, ParticleKind, TreatKind};

/// Peak screen shake displacement (CSS px)
const SHAKE_AMPLITUDE: f32 = 10.0;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0
    time: f32,            // offset 8
    pixel_ratio: f32,     // offset 12
    item_count: u32,      // offset 16
    particle_count: u32,  // offset 20
    blade_count: u32,     // offset 24
    flash: f32,           // offset 28
    shake: [f32; 2],      // offset 32
    phase: u32,           // offset 40 - 0 title, 1 playing, 2 paused, 3 game over
    _pad: u32,            // pad to 48 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
struct ItemData {
    pos: [f32; 2],
    radius: f32,
    rot: f32,
    kind: u32,    // 0 = treat, 1 = bomb, 2 = piece
    variant: u32, // Treat index
    side: f32,    // Piece half: -1 left, +1 right, 0 whole
    _pad: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
struct ParticleData {
    pos: [f32; 2],
    size: f32,
    alpha: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
struct BladeData {
    pos: [f32; 2],
    alpha: f32,
    width: f32,
}

/// Shader index for a treat
fn treat_index(kind: TreatKind) -> u32 {
    match kind {
        TreatKind::Cupcake => 0,
        TreatKind::Cake => 1,
        TreatKind::Donut => 2,
        TreatKind::Croissant => 3,
    }
}

/// Juice color for a treat
fn treat_color(kind: TreatKind) -> [f32; 4] {
    match kind {
        TreatKind::Cupcake => [1.0, 0.55, 0.75, 1.0],
        TreatKind::Cake => [1.0, 0.93, 0.82, 1.0],
        TreatKind::Donut => [0.95, 0.45, 0.65, 1.0],
        TreatKind::Croissant => [0.95, 0.75, 0.35, 1.0],
    }
}

const SPARK_COLOR: [f32; 4] = [1.0, 0.8, 0.35, 1.0];

fn phase_index(phase: GamePhase) -> u32 {
    match phase {
        GamePhase::Title => 0,
        GamePhase::Playing => 1,
        GamePhase::Paused => 2,
        GamePhase::GameOver => 3,
    }
}

fn pack_items(state: &GameState) -> Vec<ItemData> {
    let mut items = vec![ItemData::default(); MAX_RENDER_ITEMS];
    for (slot, item) in items.iter_mut().zip(state.items.iter().filter(|i| !i.sliced)) {
        let (kind, variant, side) = match item.kind {
            ItemKind::Treat(t) => (0, treat_index(t), 0.0),
            ItemKind::Bomb => (1, 0, 0.0),
            ItemKind::Piece { of, side } => (2, treat_index(of), side.sign()),
        };
        *slot = ItemData {
            pos: [item.pos.x, item.pos.y],
            radius: item.radius,
            rot: item.rot,
            kind,
            variant,
            side,
            _pad: 0,
        };
    }
    items
}

fn pack_particles(state: &GameState, max: usize) -> Vec<ParticleData> {
    let mut particles = vec![ParticleData::default(); MAX_RENDER_PARTICLES];
    // Newest particles win when over the cap
    let skip = state.particles.len().saturating_sub(max);
    for (slot, p) in particles.iter_mut().zip(state.particles.iter().skip(skip)) {
        let color = match p.kind {
            ParticleKind::Juice(kind) => treat_color(kind),
            ParticleKind::Spark => SPARK_COLOR,
        };
        *slot = ParticleData {
            pos: [p.pos.x, p.pos.y],
            size: p.size,
            alpha: p.alpha(),
            color,
        };
    }
    particles
}

fn pack_blade(state: &GameState) -> Vec<BladeData> {
    let mut blade = vec![BladeData::default(); MAX_BLADE_POINTS];
    let n = state.blade.len().max(1) as f32;
    for (i, (slot, point)) in blade.iter_mut().zip(state.blade.points()).enumerate() {
        // Older points are thinner and fainter
        let alpha = (i + 1) as f32 / n;
        *slot = BladeData {
            pos: [point.pos.x, point.pos.y],
            alpha: 0.95 * alpha,
            width: 6.0 * (0.6 + alpha),
        };
    }
    blade
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    items_buffer: wgpu::Buffer,
    particles_buffer: wgpu::Buffer,
    blade_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    pixel_ratio: f32,
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        pixel_ratio: f32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                time: 0.0,
                pixel_ratio,
                item_count: 0,
                particle_count: 0,
                blade_count: 0,
                flash: 0.0,
                shake: [0.0, 0.0],
                phase: 0,
                _pad: 0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let items_buffer = uniform_array::<ItemData>(&device, "items", MAX_RENDER_ITEMS);
        let particles_buffer =
            uniform_array::<ParticleData>(&device, "particles", MAX_RENDER_PARTICLES);
        let blade_buffer = uniform_array::<BladeData>(&device, "blade", MAX_BLADE_POINTS);

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                uniform_entry(2),
                uniform_entry(3),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: items_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: particles_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: blade_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // Fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            items_buffer,
            particles_buffer,
            blade_buffer,
            bind_group,
            size: (width, height),
            pixel_ratio,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32, pixel_ratio: f32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.pixel_ratio = pixel_ratio;
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Update GPU buffers from game state and render
    pub fn render(
        &mut self,
        state: &GameState,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms since page load from requestAnimationFrame
        let elapsed = (time / 1000.0) as f32;

        let visible_items = state.items.iter().filter(|i| !i.sliced).count();
        let item_count = visible_items.min(MAX_RENDER_ITEMS) as u32;
        let max_particles = settings.max_particles().min(MAX_RENDER_PARTICLES);
        let particle_count = state.particles.len().min(max_particles) as u32;
        let blade_count = if settings.blade_trail {
            state.blade.len().min(MAX_BLADE_POINTS) as u32
        } else {
            0
        };

        let shake = if settings.effective_screen_shake() && state.shake > 0.0 {
            let amp = state.shake * state.shake * SHAKE_AMPLITUDE;
            [
                (elapsed * 71.0).sin() * amp,
                (elapsed * 93.0).cos() * amp,
            ]
        } else {
            [0.0, 0.0]
        };
        let flash = if settings.effective_flash() {
            state.flash
        } else {
            0.0
        };

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            time: elapsed,
            pixel_ratio: self.pixel_ratio,
            item_count,
            particle_count,
            blade_count,
            flash,
            shake,
            phase: phase_index(state.phase),
            _pad: 0,
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue.write_buffer(
            &self.items_buffer,
            0,
            bytemuck::cast_slice(&pack_items(state)),
        );
        self.queue.write_buffer(
            &self.particles_buffer,
            0,
            bytemuck::cast_slice(&pack_particles(state, max_particles)),
        );
        self.queue.write_buffer(
            &self.blade_buffer,
            0,
            bytemuck::cast_slice(&pack_blade(state)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn uniform_array<T: Pod>(device: &wgpu::Device, label: &str, len: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (std::mem::size_of::<T>() * len) as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
