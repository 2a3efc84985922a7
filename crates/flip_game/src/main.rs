//! Card Flip -- memory matching game, main loop and entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`
//! runs one frame in a fixed order:
//!
//!   1. `begin_frame()` -- sample the clock, handle Escape / R / F3
//!   2. feed queued clicks to `MatchEngine::handle_click`
//!   3. `MatchEngine::tick(now)` -- resolve a revealed pair once its delay is up
//!   4. rebuild the board mesh, issue draw calls, composite the egui overlay
//!
//! Startup is all-or-nothing: config, card images, window and GPU context must
//! all be available or the process exits non-zero. Resources are owned by
//! `GameState`, so an early return drops whatever was already acquired.

mod assets;
mod board_mesh;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::{load_card_textures, CardAssetPaths, CardTextures};
use board_mesh::{build_board_mesh, clear_color, DrawCall};
use error::StartupError;
use flip_core::board::{Board, BoardError, BoardLayout, CardState};
use flip_core::config::{config_path_from_env, load_config_or_default, GameConfig};
use flip_core::engine::{ClickOutcome, MatchEngine, PairOutcome};
use flip_core::input::{InputState, Key, MouseBtn};
use flip_core::time::FrameClock;
use flip_devtools::{DebugOverlay, OverlayStats};
use flip_platform::window::PlatformConfig;
use flip_render::{GpuContext, ScreenCamera, SpritePipeline, SpriteVertex};

/// All mutable game state. Constructed in `ApplicationHandler::resumed` once the
/// window can be created.
///
/// Fields drop in declaration order, so GPU objects (textures, buffers, overlay,
/// pipeline) are released before the GPU context, and the context before the window.
struct GameState {
    // --- GPU resources -----------------------------------------------------------
    card_textures: CardTextures,
    debug_overlay: DebugOverlay,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sprite_pipeline: SpritePipeline,
    gpu: GpuContext,
    window: Arc<Window>,

    // --- Session ---------------------------------------------------------------
    engine: MatchEngine,
    layout: BoardLayout,
    reveal_delay_ms: u64,
    background: wgpu::Color,

    // --- Per-frame -------------------------------------------------------------
    clock: FrameClock,
    input: InputState,
    camera: ScreenCamera,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
}

impl GameState {
    fn new(event_loop: &ActiveEventLoop, config: &GameConfig) -> Result<Self, StartupError> {
        let platform_config = PlatformConfig {
            title: config.window.title.clone(),
            width: config.window.width,
            height: config.window.height,
            ..PlatformConfig::default()
        };
        let window = flip_platform::window::create_window(event_loop, &platform_config)?;
        log::info!(
            "Window created: {}x{}",
            platform_config.width,
            platform_config.height
        );

        let gpu = GpuContext::new(window.clone()).map_err(StartupError::Gpu)?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let asset_paths = CardAssetPaths::resolve(&config.assets, config.board.pair_count);
        let card_textures =
            load_card_textures(&gpu.device, &gpu.queue, &sprite_pipeline, &asset_paths)?;

        let logical = window.inner_size().to_logical::<f32>(window.scale_factor());
        let camera = ScreenCamera::new(logical.width, logical.height);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let engine = new_session(config.board, config.reveal_delay_ms)?;

        Ok(Self {
            card_textures,
            debug_overlay,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            sprite_pipeline,
            gpu,
            window,
            engine,
            layout: config.board,
            reveal_delay_ms: config.reveal_delay_ms,
            background: clear_color(config.background),
            clock: FrameClock::new(),
            input: InputState::new(),
            camera,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
        })
    }

    fn restart(&mut self, reason: &str) {
        match new_session(self.layout, self.reveal_delay_ms) {
            Ok(engine) => {
                self.engine = engine;
                log::info!("New game ({reason})");
            }
            Err(err) => log::error!("New game failed, keeping current board: {err}"),
        }
    }

    /// Hand every queued click to the engine, then poll for a due resolution.
    fn update_session(&mut self) {
        let now = self.clock.ticks_ms();

        for click in self.input.drain_clicks() {
            match self.engine.handle_click(click.x, click.y, now) {
                ClickOutcome::RevealedFirst { index } => {
                    log::debug!("Revealed card {index} at ({}, {})", click.x, click.y);
                }
                ClickOutcome::RevealedSecond { index, deadline_ms } => {
                    log::debug!("Revealed card {index}, resolving at {deadline_ms} ms");
                }
                ClickOutcome::Ignored => {
                    log::trace!("Click at ({}, {}) ignored", click.x, click.y);
                }
            }
        }

        if let Some(resolution) = self.engine.tick(now) {
            match resolution.outcome {
                PairOutcome::Matched => log::debug!(
                    "Cards {} and {} match",
                    resolution.first,
                    resolution.second
                ),
                PairOutcome::Mismatched => log::debug!(
                    "Cards {} and {} do not match",
                    resolution.first,
                    resolution.second
                ),
            }
            if resolution.won {
                let stats = self.engine.stats();
                log::info!(
                    "You win! {} pairs matched in {} turns",
                    stats.pairs_matched,
                    stats.turns
                );
            }
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let stats = self.engine.stats();
        OverlayStats {
            phase_label: self.engine.phase().label().to_string(),
            turns: stats.turns,
            pairs_matched: stats.pairs_matched,
            total_pairs: stats.total_pairs,
            revealed_cards: self.engine.board().count_in_state(CardState::Revealed),
            ticks_ms: self.clock.ticks_ms(),
        }
    }

    fn rebuild_board_mesh(&mut self) {
        let mesh = build_board_mesh(self.engine.board());
        self.ensure_mesh_capacity(mesh.vertices.len(), mesh.indices.len());
        self.draw_calls = mesh.draw_calls;

        if !mesh.vertices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&mesh.vertices),
            );
        }
        if !mesh.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn render(&mut self) {
        self.rebuild_board_mesh();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let overlay_stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.clock, &overlay_stats);
        if overlay_actions.restart {
            self.restart("overlay button");
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Board Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.draw_calls {
                let Some(texture) = self.card_textures.get(draw.slot) else {
                    log::warn!("No texture for {:?}, skipping draw", draw.slot);
                    continue;
                };
                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

fn new_session(layout: BoardLayout, reveal_delay_ms: u64) -> Result<MatchEngine, BoardError> {
    let board = Board::shuffled(layout)?;
    log::debug!(
        "Shuffled {} cards into {} rows",
        board.cards().len(),
        layout.rows()
    );
    Ok(MatchEngine::new(board, reveal_delay_ms))
}

struct App {
    config: GameConfig,
    state: Option<GameState>,
    startup_error: Option<StartupError>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
            startup_error: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.startup_error.is_some() {
            return;
        }
        match GameState::new(event_loop, &self.config) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    let logical = physical_size.to_logical::<f32>(state.window.scale_factor());
                    state.camera.resize(logical.width, logical.height);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(state.window.scale_factor());
                state.input.pointer_moved(logical.x, logical.y);
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                if let Some(btn) = map_mouse_button(button) {
                    match button_state {
                        // Presses the overlay consumed never reach the board.
                        ElementState::Pressed if !egui_consumed => state.input.mouse_down(btn),
                        ElementState::Pressed => {}
                        ElementState::Released => state.input.mouse_up(btn),
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                state.clock.begin_frame();
                if state.input.is_just_pressed(Key::Escape) {
                    log::info!("Escape pressed, exiting.");
                    event_loop.exit();
                    return;
                }
                if state.input.is_just_pressed(Key::F3) {
                    state.debug_overlay.toggle();
                }
                if state.input.is_just_pressed(Key::R) {
                    // Clicks queued before the restart belong to the old board.
                    state.input.drain_clicks();
                    state.restart("manual trigger (R)");
                }

                state.update_session();
                state.render();
                state.input.end_frame();
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.state.take().is_some() {
            log::info!("Released window and GPU resources");
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Board Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Board Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

fn run() -> Result<(), StartupError> {
    let config_path = config_path_from_env();
    let config = load_config_or_default(&config_path)?;
    CardAssetPaths::resolve(&config.assets, config.board.pair_count).check_present()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Card Flip starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Startup failed: {err}");
            ExitCode::FAILURE
        }
    }
}
