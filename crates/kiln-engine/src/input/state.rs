use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{
    InputEvent,
    Key,
    KeyState,
    Modifiers,
    MouseButton,
    MouseButtonState,
    PointerButtonEvent,
    PointerMoveEvent,
};

/// Current input state for a single window.
///
/// Holds "is down" information and current pointer position.
/// Per-frame transitions are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    /// Current modifier state.
    pub modifiers: Modifiers,

    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // On focus loss, clear "down" sets so a drag cannot stick.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                if let Some((px, py)) = self.pointer_pos {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key {
                key,
                state,
                modifiers,
                repeat,
            } => {
                self.modifiers = *modifiers;

                match state {
                    KeyState::Pressed => {
                        let inserted = self.keys_down.insert(*key);
                        if inserted && !*repeat {
                            frame.keys_pressed.insert(*key);
                        }
                    }
                    KeyState::Released => {
                        if self.keys_down.remove(key) {
                            frame.keys_released.insert(*key);
                        }
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;

                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            frame.buttons_pressed.insert(*button);
                        }
                    }
                    MouseButtonState::Released => {
                        if self.buttons_down.remove(button) {
                            frame.buttons_released.insert(*button);
                        }
                    }
                }
            }
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved(PointerMoveEvent { x, y })
    }

    fn left(state: MouseButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state,
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::default(),
        })
    }

    #[test]
    fn first_move_does_not_produce_delta() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, moved(100.0, 50.0));
        assert_eq!(f.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn moves_accumulate_within_a_frame() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, moved(10.0, 10.0));
        s.apply_event(&mut f, moved(15.0, 8.0));
        s.apply_event(&mut f, moved(25.0, 8.0));
        assert_eq!(f.pointer_delta, (15.0, -2.0));

        f.clear();
        assert_eq!(f.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn button_transitions_are_recorded_once() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, left(MouseButtonState::Pressed));
        s.apply_event(&mut f, left(MouseButtonState::Pressed));
        assert!(s.button_down(MouseButton::Left));
        assert_eq!(f.buttons_pressed.len(), 1);

        s.apply_event(&mut f, left(MouseButtonState::Released));
        assert!(!s.button_down(MouseButton::Left));
        assert!(f.buttons_released.contains(&MouseButton::Left));
    }

    #[test]
    fn key_repeat_is_not_a_press() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        let key = |repeat| InputEvent::Key {
            key: Key::N,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat,
        };
        s.apply_event(&mut f, key(true));
        assert!(!f.key_pressed(Key::N));
        assert!(s.key_down(Key::N));
    }

    #[test]
    fn focus_loss_releases_held_buttons() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, left(MouseButtonState::Pressed));
        s.apply_event(&mut f, InputEvent::Focused(false));
        assert!(s.buttons_down.is_empty());
    }
}
