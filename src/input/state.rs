//! Keyboard and mouse polling.

use macroquad::input::{is_key_down, is_key_pressed, mouse_position, KeyCode};
use macroquad::math::{vec2, Vec2};

use crate::game::controller::ControlFlags;
use super::Action;

/// Polls platform input once per frame into snapshot form.
pub struct InputState {
    last_mouse: Vec2,
    mouse_primed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            last_mouse: Vec2::ZERO,
            mouse_primed: false,
        }
    }

    /// Movement snapshot for this frame.
    pub fn control_flags(&self) -> ControlFlags {
        ControlFlags {
            forward: self.action_down(Action::MoveForward),
            backward: self.action_down(Action::MoveBackward),
            left: self.action_down(Action::MoveLeft),
            right: self.action_down(Action::MoveRight),
            jump: self.action_down(Action::Jump),
            sprint: self.action_down(Action::Sprint),
        }
    }

    /// Pointer movement since the previous call. The first poll primes the
    /// reference point and reports zero, so the camera never jumps when
    /// the window gains focus.
    pub fn pointer_delta(&mut self) -> Vec2 {
        let (x, y) = mouse_position();
        let current = vec2(x, y);
        let delta = if self.mouse_primed {
            current - self.last_mouse
        } else {
            Vec2::ZERO
        };
        self.last_mouse = current;
        self.mouse_primed = true;
        delta
    }

    /// Forget the pointer reference point, e.g. after a pause menu.
    pub fn reset_pointer(&mut self) {
        self.mouse_primed = false;
    }

    pub fn action_down(&self, action: Action) -> bool {
        match action {
            Action::MoveForward => is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            Action::MoveBackward => is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            Action::MoveLeft => is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            Action::MoveRight => is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            Action::Jump => is_key_down(KeyCode::Space),
            Action::Sprint => is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
            Action::Pause => is_key_down(KeyCode::Escape),
            Action::Reset => is_key_down(KeyCode::R),
        }
    }

    /// Edge-triggered variant for menu-like actions.
    pub fn action_pressed(&self, action: Action) -> bool {
        match action {
            Action::Pause => is_key_pressed(KeyCode::Escape),
            Action::Reset => is_key_pressed(KeyCode::R),
            Action::Jump => is_key_pressed(KeyCode::Space),
            _ => false,
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
