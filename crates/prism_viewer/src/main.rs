//! Interactive viewer entry point.
//!
//! Takes a scene description (.json) or a bare mesh (.obj), commits it for
//! tracing, and drives a progressively refining render while the window
//! reacts to orbit, dolly, and resize input.

mod display;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use prism_core::{MeshLoader, NodeId, ObjLoader, SceneGraph, SceneGraphBuilder};
use prism_math::Mat4;
use prism_render::{Camera, ProgressiveRenderer};
use prism_trace::CommittedScene;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

struct App {
    scene: Arc<CommittedScene>,
    window: Option<Arc<Window>>,
    display: Option<display::Display>,
    renderer: Option<ProgressiveRenderer>,

    left_mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn new(scene: Arc<CommittedScene>) -> Self {
        Self {
            scene,
            window: None,
            display: None,
            renderer: None,
            left_mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    fn update_camera(&mut self, update: impl FnOnce(&mut Camera)) {
        if let Some(renderer) = &mut self.renderer {
            let mut camera = renderer.camera();
            update(&mut camera);
            if let Err(e) = renderer.set_camera(camera) {
                log::error!("restarting render job failed: {e}");
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("Prism Viewer")
                .with_inner_size(winit::dpi::PhysicalSize::new(1280, 720));

            let window = Arc::new(
                event_loop
                    .create_window(window_attrs)
                    .expect("failed to create window"),
            );

            let display = pollster::block_on(display::Display::new(window.clone()))
                .expect("failed to initialize display");

            let size = window.inner_size();
            let camera = Camera::framing(&self.scene.bounds());
            let renderer =
                ProgressiveRenderer::new(Arc::clone(&self.scene), size.width, size.height, camera);

            self.window = Some(window);
            self.display = Some(display);
            self.renderer = Some(renderer);

            log::info!("window and display initialized at {}x{}", size.width, size.height);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(display) = &mut self.display {
                    display.resize((physical_size.width, physical_size.height));
                }
                if physical_size.width > 0 && physical_size.height > 0 {
                    if let Some(renderer) = &mut self.renderer {
                        if let Err(e) = renderer.resize(physical_size.width, physical_size.height) {
                            log::error!("restarting render job failed: {e}");
                        }
                    }
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.left_mouse_pressed = state == ElementState::Pressed;
                if !self.left_mouse_pressed {
                    self.last_mouse_pos = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.left_mouse_pressed {
                    if let Some(last_pos) = self.last_mouse_pos {
                        let delta_x = (position.x - last_pos.0) as f32;
                        let delta_y = (position.y - last_pos.1) as f32;

                        let sensitivity = 0.005;
                        self.update_camera(|camera| {
                            camera.orbit(-delta_x * sensitivity, delta_y * sensitivity);
                        });
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                let factor = (1.0 - scroll * 0.1).clamp(0.5, 2.0);
                self.update_camera(|camera| camera.dolly(factor));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::KeyF),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                // Reframe the whole scene
                let bounds = self.scene.bounds();
                self.update_camera(|camera| *camera = Camera::framing(&bounds));
            }
            WindowEvent::RedrawRequested => {
                if let (Some(renderer), Some(display)) = (&self.renderer, &mut self.display) {
                    if let Some(buffer) = renderer.acquire_for_display() {
                        if let Err(e) = display.present(buffer) {
                            match e.downcast_ref::<wgpu::SurfaceError>() {
                                Some(wgpu::SurfaceError::Lost) => {
                                    let size = display.size;
                                    display.resize(size);
                                }
                                Some(wgpu::SurfaceError::OutOfMemory) => {
                                    log::error!("out of GPU memory");
                                    event_loop.exit();
                                }
                                _ => log::error!("present failed: {e:?}"),
                            }
                        }
                    }
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Load either a scene description or a bare mesh into a committed graph.
fn load_scene(path: &Path) -> Result<(SceneGraph, NodeId)> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let (graph, root) = SceneGraphBuilder::new(ObjLoader, ".").build_file(path)?;
            Ok((graph, root))
        }
        Some("obj") => {
            // Wrap a single mesh in a one-instance scene
            let geometry = ObjLoader.load(path)?;

            let mut graph = SceneGraph::new();
            let mesh = graph.add_node();
            graph.attach_geometry(mesh, geometry);
            graph.commit(mesh);

            let root = graph.add_node();
            graph.add_instance(root, mesh, Mat4::IDENTITY);
            graph.commit(root);
            Ok((graph, root))
        }
        other => bail!(
            "unsupported file type {:?}: expected a .json scene description or a .obj mesh",
            other.unwrap_or("")
        ),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: prism_viewer <scene.json | mesh.obj>")?;

    let (graph, root) = load_scene(Path::new(&path))
        .with_context(|| format!("failed to load scene from {path}"))?;
    let scene = Arc::new(CommittedScene::commit(&graph, root));

    log::info!(
        "loaded {path}: {} prototypes, {} instances",
        scene.prototype_count(),
        scene.instance_count()
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene);
    event_loop.run_app(&mut app)?;

    Ok(())
}
