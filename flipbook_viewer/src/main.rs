mod cli;
mod headless;
mod texture;
mod viewer;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use flipbook_core::{Book, BookConfig, BookSession, MonotonicClock};
use pollster::FutureExt;
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use cli::Args;
use texture::base_texture_for;
use viewer::ViewerState;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();
    args.validate()?;

    let pages_dir = args.pages_dir.as_deref();
    let book = Book::with_base_textures(BookConfig::default(), |page| {
        base_texture_for(pages_dir, page)
    })
    .context("building flip book")?;
    println!(
        "[flipbook_viewer] {} pages on {} sheets ({})",
        book.page_count(),
        book.spread_count(),
        pages_dir
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "blank pages".to_string())
    );

    if args.headless {
        return headless::run(&args, book);
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Flipbook - 0")
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let session = BookSession::from_book(book, MonotonicClock::new());
    let mut state = ViewerState::new(window, session).block_on()?;

    println!(
        "[flipbook_viewer] controls: arrows flip, digits + Enter seek, Home/End jump, \
         d toggles drawing, drag pans, right-drag orbits, wheel zooms, Esc exits"
    );

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if state.handle_key_event(&event) {
                                target.exit();
                            }
                        }
                        WindowEvent::ModifiersChanged(modifiers) => {
                            state.set_modifiers(modifiers.state())
                        }
                        WindowEvent::CursorMoved { position, .. } => state.cursor_moved(position),
                        WindowEvent::MouseInput {
                            state: button_state,
                            button,
                            ..
                        } => state.pointer_button(button, button_state),
                        WindowEvent::Focused(false) => state.focus_lost(),
                        WindowEvent::MouseWheel { delta, .. } => state.scroll(delta),
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::RedrawRequested => {
                            state.update();
                            match state.render() {
                                Ok(_) => {}
                                Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                                    state.resize(state.size())
                                }
                                Err(SurfaceError::OutOfMemory) => target.exit(),
                                Err(err) => eprintln!("[flipbook_viewer] render error: {err:?}"),
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}
