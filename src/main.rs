use anyhow::{Context, Result};
use log::{error, info};
use quad_blend::{state::State, SceneConfig};
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    env_logger::init();

    let scene = match std::env::args().nth(1) {
        Some(path) => SceneConfig::load_from(&path)
            .with_context(|| format!("Failed to load scene {:?}", path))?,
        None => {
            info!("No scene given, showing the built-in demo");
            SceneConfig::demo()
        }
    };

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(&scene.title)
        .with_inner_size(PhysicalSize::new(scene.width, scene.height))
        .build(&event_loop)
        .context("Failed to create window")?;

    let mut state = pollster::block_on(State::new(&window, &scene))?;

    event_loop.run(move |event, _, control_flow| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == window.id() => match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(VirtualKeyCode::Escape),
                        ..
                    },
                ..
            } => *control_flow = ControlFlow::Exit,

            WindowEvent::Resized(physical_size) => {
                state.resize(*physical_size);
            }

            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                state.resize(**new_inner_size);
            }

            _ => {}
        },

        Event::RedrawRequested(_) => match state.render() {
            Ok(_) => {}
            // Reconfigure the surface if lost
            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Out of GPU memory");
                *control_flow = ControlFlow::Exit
            }
            // All other errors should be resolved by the next frame
            Err(e) => error!("{:?}", e),
        },

        Event::MainEventsCleared => {
            window.request_redraw();
        }
        _ => {}
    });
}
