use flipbook_core::{BookSession, Clock, GestureState, Modifiers, NavigationEvent, StrokeOutcome};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{Key, ModifiersState, NamedKey},
};

use super::super::camera::{MapCamera, cursor_to_ndc};
use super::super::picking::ScenePicker;
use super::ViewerState;

/// Longest page number accepted from the keyboard.
const MAX_ENTRY_DIGITS: usize = 4;
/// Trackpad pixels that count as one wheel notch.
const PIXELS_PER_NOTCH: f32 = 50.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct HeldButtons {
    left: bool,
    right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraDrag {
    Pan,
    Orbit,
}

/// Right-drag orbits, as does a left-drag with Ctrl, Shift or Meta held. A
/// plain left-drag pans, except in draw mode where it belongs to the pen.
fn camera_drag(held: HeldButtons, modifiers: Modifiers, draw_mode: bool) -> Option<CameraDrag> {
    if held.right || (held.left && modifiers.any()) {
        Some(CameraDrag::Orbit)
    } else if held.left && !draw_mode {
        Some(CameraDrag::Pan)
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub(super) struct InputState {
    cursor: Option<PhysicalPosition<f64>>,
    modifiers: Modifiers,
    held: HeldButtons,
    /// Digits typed towards a seek; arrows are ignored while non-empty.
    entry: String,
}

impl InputState {
    fn push_digit(&mut self, digit: char) -> bool {
        if self.entry.len() >= MAX_ENTRY_DIGITS {
            return false;
        }
        self.entry.push(digit);
        true
    }

    fn take_entry(&mut self) -> Option<usize> {
        let entry = std::mem::take(&mut self.entry);
        entry.parse().ok()
    }

    fn set_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = Modifiers {
            ctrl: modifiers.control_key(),
            shift: modifiers.shift_key(),
            meta: modifiers.super_key(),
        };
    }

    fn button<C: Clock>(
        &mut self,
        button: MouseButton,
        button_state: ElementState,
        session: &mut BookSession<C>,
    ) {
        let pressed = button_state == ElementState::Pressed;
        match button {
            MouseButton::Left => {
                self.held.left = pressed;
                if pressed {
                    session.pointer_down();
                } else {
                    session.pointer_up();
                }
            }
            MouseButton::Right => self.held.right = pressed,
            _ => {}
        }
    }

    /// Drops every held button; releases that happen while the window is
    /// unfocused never reach us.
    fn release_all<C: Clock>(&mut self, session: &mut BookSession<C>) {
        self.held = HeldButtons::default();
        if let Some(page) = session.pointer_up() {
            log::debug!("focus lost mid-stroke on {page}");
        }
    }

    /// Applies camera drags, then feeds the pen if a gesture is active.
    fn cursor_moved<C: Clock>(
        &mut self,
        position: PhysicalPosition<f64>,
        size: PhysicalSize<u32>,
        camera: &mut MapCamera,
        session: &mut BookSession<C>,
    ) -> Option<StrokeOutcome> {
        let previous = self.cursor.replace(position);
        let drag = camera_drag(self.held, self.modifiers, session.draw_mode());
        if let (Some(drag), Some(previous)) = (drag, previous) {
            let dx = (position.x - previous.x) as f32;
            let dy = (position.y - previous.y) as f32;
            match drag {
                CameraDrag::Pan => camera.pan_pixels(dx, dy, size.height),
                CameraDrag::Orbit => camera.orbit_pixels(dx, dy, size.height),
            }
        }

        if !matches!(session.router().state(), GestureState::Drawing { .. }) {
            return None;
        }
        let ndc = cursor_to_ndc(position.x, position.y, size.width, size.height);
        let picker = ScenePicker::new(camera, session.book());
        let outcome = session.pointer_move(ndc, self.modifiers, &picker);
        log::trace!("pointer at {ndc:?}: {outcome:?}");
        Some(outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyCommand {
    Exit,
    StepLeft,
    StepRight,
    SeekFirst,
    SeekLast,
    Digit(char),
    Backspace,
    SubmitEntry,
    ClearEntry,
    ToggleDraw,
}

fn key_command(key: Key<&str>, entry_active: bool) -> Option<KeyCommand> {
    match key {
        Key::Named(NamedKey::Escape) if entry_active => Some(KeyCommand::ClearEntry),
        Key::Named(NamedKey::Escape) => Some(KeyCommand::Exit),
        Key::Named(NamedKey::ArrowLeft) if !entry_active => Some(KeyCommand::StepLeft),
        Key::Named(NamedKey::ArrowRight) if !entry_active => Some(KeyCommand::StepRight),
        Key::Named(NamedKey::Home) => Some(KeyCommand::SeekFirst),
        Key::Named(NamedKey::End) => Some(KeyCommand::SeekLast),
        Key::Named(NamedKey::Enter) if entry_active => Some(KeyCommand::SubmitEntry),
        Key::Named(NamedKey::Backspace) if entry_active => Some(KeyCommand::Backspace),
        Key::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(digit), None) if digit.is_ascii_digit() => Some(KeyCommand::Digit(digit)),
                (Some('d' | 'D'), None) => Some(KeyCommand::ToggleDraw),
                _ => None,
            }
        }
        _ => None,
    }
}

pub(super) fn handle_key_event(state: &mut ViewerState, event: &KeyEvent) -> bool {
    if event.state != ElementState::Pressed {
        return false;
    }
    let entry_active = !state.input.entry.is_empty();
    let Some(command) = key_command(event.logical_key.as_ref(), entry_active) else {
        return false;
    };

    match command {
        KeyCommand::Exit => return true,
        KeyCommand::StepLeft => {
            state.session.step_left();
        }
        KeyCommand::StepRight => {
            state.session.step_right();
        }
        KeyCommand::SeekFirst => request_seek(state, 0),
        KeyCommand::SeekLast => {
            let last = state.session.book().spread_count();
            request_seek(state, last);
        }
        KeyCommand::Digit(digit) => {
            if state.input.push_digit(digit) {
                refresh_title(state);
            }
        }
        KeyCommand::Backspace => {
            state.input.entry.pop();
            refresh_title(state);
        }
        KeyCommand::SubmitEntry => {
            if let Some(target) = state.input.take_entry() {
                request_seek(state, target);
            }
            refresh_title(state);
        }
        KeyCommand::ClearEntry => {
            state.input.entry.clear();
            refresh_title(state);
        }
        KeyCommand::ToggleDraw => {
            let enabled = state.session.toggle_draw_mode();
            println!(
                "[flipbook_viewer] draw mode {}",
                if enabled { "on" } else { "off" }
            );
            refresh_title(state);
        }
    }
    false
}

fn request_seek(state: &mut ViewerState, target: usize) {
    if !state.session.seek_to(target) {
        log::debug!("seek to {target} ignored");
    }
}

pub(super) fn set_modifiers(state: &mut ViewerState, modifiers: ModifiersState) {
    state.input.set_modifiers(modifiers);
}

pub(super) fn cursor_moved(state: &mut ViewerState, position: PhysicalPosition<f64>) {
    let ViewerState {
        input,
        camera,
        session,
        size,
        ..
    } = state;
    input.cursor_moved(position, *size, camera, session);
}

pub(super) fn pointer_button(
    state: &mut ViewerState,
    button: MouseButton,
    button_state: ElementState,
) {
    state.input.button(button, button_state, &mut state.session);
}

pub(super) fn focus_lost(state: &mut ViewerState) {
    state.input.release_all(&mut state.session);
}

pub(super) fn scroll(state: &mut ViewerState, delta: MouseScrollDelta) {
    let notches = match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_NOTCH,
    };
    state.camera.zoom(notches);
}

/// Moves the indicator to the page reported by each event. Returns whether
/// anything changed.
pub(super) fn apply_navigation_events(state: &mut ViewerState, events: &[NavigationEvent]) -> bool {
    let mut changed = false;
    for event in events {
        match *event {
            NavigationEvent::PageChanged { page } | NavigationEvent::SeekFinished { page } => {
                state.indicator_page = page;
                changed = true;
            }
            NavigationEvent::SeekStarted { from, target } => {
                println!("[flipbook_viewer] scrubbing {from} -> {target}");
            }
        }
    }
    changed
}

pub(super) fn refresh_title(state: &mut ViewerState) {
    let title = format_title(
        state.indicator_page,
        state.session.book().spread_count(),
        state.session.draw_mode(),
        &state.input.entry,
    );
    state.window.set_title(&title);
}

fn format_title(page: usize, spreads: usize, draw_mode: bool, entry: &str) -> String {
    let mut title = format!("Flipbook - {page} / {spreads}");
    if draw_mode {
        title.push_str(" [draw]");
    }
    if !entry.is_empty() {
        title.push_str(&format!(" - go to {entry}_"));
    }
    title
}

#[cfg(test)]
mod tests {
    use flipbook_core::{BookConfig, ManualClock, PageId};

    use super::*;

    const SIZE: PhysicalSize<u32> = PhysicalSize::new(800, 600);

    fn session(clock: &ManualClock) -> BookSession<&ManualClock> {
        BookSession::new(
            BookConfig {
                page_count: 2,
                surface_width: 64,
                surface_height: 64,
                ..BookConfig::default()
            },
            clock,
        )
        .expect("session builds")
    }

    fn segments_on_front_page(session: &BookSession<&ManualClock>) -> usize {
        session
            .book()
            .page(PageId(0))
            .expect("page 0")
            .surface()
            .segments_drawn()
    }

    /// Moves to the first x, presses `button`, then drags through the rest.
    fn drag(
        input: &mut InputState,
        camera: &mut MapCamera,
        session: &mut BookSession<&ManualClock>,
        button: MouseButton,
        xs: &[f64],
    ) -> Vec<Option<StrokeOutcome>> {
        let (first, rest) = xs.split_first().expect("at least one position");
        input.cursor_moved(PhysicalPosition::new(*first, 300.0), SIZE, camera, session);
        input.button(button, ElementState::Pressed, session);
        rest.iter()
            .map(|x| input.cursor_moved(PhysicalPosition::new(*x, 300.0), SIZE, camera, session))
            .collect()
    }

    #[test]
    fn drag_routing_follows_buttons_modifiers_and_mode() {
        let left = HeldButtons {
            left: true,
            right: false,
        };
        let right = HeldButtons {
            left: false,
            right: true,
        };
        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        let none = Modifiers::default();

        assert_eq!(camera_drag(left, none, false), Some(CameraDrag::Pan));
        assert_eq!(camera_drag(left, none, true), None);
        assert_eq!(camera_drag(left, shift, true), Some(CameraDrag::Orbit));
        assert_eq!(camera_drag(right, none, true), Some(CameraDrag::Orbit));
        assert_eq!(camera_drag(HeldButtons::default(), shift, false), None);
    }

    #[test]
    fn modifier_drag_in_draw_mode_orbits_instead_of_painting() {
        let clock = ManualClock::new();
        let mut session = session(&clock);
        session.set_draw_mode(true);
        let mut camera = MapCamera::new(SIZE.width, SIZE.height);
        let mut input = InputState::default();
        input.set_modifiers(ModifiersState::SHIFT);

        let outcomes = drag(
            &mut input,
            &mut camera,
            &mut session,
            MouseButton::Left,
            &[420.0, 440.0, 460.0],
        );

        assert_eq!(outcomes, vec![Some(StrokeOutcome::Ignored); 2]);
        assert!(camera.azimuth() != 0.0);
        assert_eq!(camera.target(), glam::Vec3::ZERO);
        assert_eq!(segments_on_front_page(&session), 0);
    }

    #[test]
    fn plain_drag_in_draw_mode_paints_and_leaves_the_camera() {
        let clock = ManualClock::new();
        let mut session = session(&clock);
        session.set_draw_mode(true);
        let mut camera = MapCamera::new(SIZE.width, SIZE.height);
        let eye = camera.position();
        let mut input = InputState::default();

        let outcomes = drag(
            &mut input,
            &mut camera,
            &mut session,
            MouseButton::Left,
            &[420.0, 430.0, 440.0],
        );

        assert!(outcomes.iter().all(|outcome| matches!(
            outcome,
            Some(StrokeOutcome::Painted { page: PageId(0), .. })
        )));
        assert_eq!(camera.position(), eye);
        assert_eq!(segments_on_front_page(&session), 1);
    }

    #[test]
    fn left_drag_pans_and_right_drag_orbits_outside_draw_mode() {
        let clock = ManualClock::new();
        let mut session = session(&clock);
        let mut camera = MapCamera::new(SIZE.width, SIZE.height);
        let mut input = InputState::default();

        let outcomes = drag(
            &mut input,
            &mut camera,
            &mut session,
            MouseButton::Left,
            &[420.0, 480.0],
        );
        assert_eq!(outcomes, vec![None]);
        assert!(camera.target().x < 0.0);
        assert_eq!(camera.azimuth(), 0.0);
        input.button(MouseButton::Left, ElementState::Released, &mut session);

        let target = camera.target();
        drag(
            &mut input,
            &mut camera,
            &mut session,
            MouseButton::Right,
            &[480.0, 520.0],
        );
        assert_eq!(camera.target(), target);
        assert!(camera.azimuth() != 0.0);
    }

    #[test]
    fn focus_loss_ends_the_stroke_and_the_drag() {
        let clock = ManualClock::new();
        let mut session = session(&clock);
        session.set_draw_mode(true);
        let mut camera = MapCamera::new(SIZE.width, SIZE.height);
        let mut input = InputState::default();
        drag(
            &mut input,
            &mut camera,
            &mut session,
            MouseButton::Left,
            &[420.0, 430.0, 440.0],
        );
        assert_eq!(segments_on_front_page(&session), 1);

        input.release_all(&mut session);
        assert_eq!(input.held, HeldButtons::default());
        assert_eq!(session.router().state(), GestureState::Idle);

        // The release arrives after refocus; the next press starts afresh.
        input.button(MouseButton::Left, ElementState::Released, &mut session);
        let outcomes = drag(
            &mut input,
            &mut camera,
            &mut session,
            MouseButton::Left,
            &[300.0, 440.0],
        );
        assert_eq!(
            outcomes,
            vec![Some(StrokeOutcome::Painted {
                page: PageId(0),
                segment: None,
            })]
        );
        assert_eq!(segments_on_front_page(&session), 1);
    }

    fn named(key: NamedKey) -> Key<&'static str> {
        Key::Named(key)
    }

    #[test]
    fn arrows_step_unless_a_page_number_is_being_typed() {
        assert_eq!(
            key_command(named(NamedKey::ArrowLeft), false),
            Some(KeyCommand::StepLeft)
        );
        assert_eq!(
            key_command(named(NamedKey::ArrowRight), false),
            Some(KeyCommand::StepRight)
        );
        assert_eq!(key_command(named(NamedKey::ArrowLeft), true), None);
        assert_eq!(key_command(named(NamedKey::ArrowRight), true), None);
    }

    #[test]
    fn escape_clears_entry_before_exiting() {
        assert_eq!(
            key_command(named(NamedKey::Escape), true),
            Some(KeyCommand::ClearEntry)
        );
        assert_eq!(
            key_command(named(NamedKey::Escape), false),
            Some(KeyCommand::Exit)
        );
    }

    #[test]
    fn characters_map_to_digits_and_draw_toggle() {
        assert_eq!(
            key_command(Key::Character("7"), false),
            Some(KeyCommand::Digit('7'))
        );
        assert_eq!(
            key_command(Key::Character("D"), false),
            Some(KeyCommand::ToggleDraw)
        );
        assert_eq!(key_command(Key::Character("x"), false), None);
        assert_eq!(key_command(Key::Character("12"), false), None);
        assert_eq!(key_command(named(NamedKey::Enter), false), None);
        assert_eq!(
            key_command(named(NamedKey::Enter), true),
            Some(KeyCommand::SubmitEntry)
        );
    }

    #[test]
    fn entry_is_capped_and_consumed() {
        let mut input = InputState::default();
        for digit in "12345".chars() {
            input.push_digit(digit);
        }
        assert_eq!(input.entry, "1234");
        assert_eq!(input.take_entry(), Some(1234));
        assert!(input.entry.is_empty());
        assert_eq!(input.take_entry(), None);
    }

    #[test]
    fn title_shows_position_mode_and_entry() {
        assert_eq!(format_title(3, 32, false, ""), "Flipbook - 3 / 32");
        assert_eq!(
            format_title(0, 32, true, "17"),
            "Flipbook - 0 / 32 [draw] - go to 17_"
        );
    }
}
