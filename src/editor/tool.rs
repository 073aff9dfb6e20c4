//! Tool selection, pointer input, and the gesture state machine.

use super::geometry::Point;

/// The active tool. The eraser is a mode of drawing, not a tool of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Draw { eraser: bool },
    Pan,
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Draw { eraser: false }
    }
}

impl Tool {
    /// The "draw" button: always a plain brush.
    pub fn draw() -> Self {
        Tool::Draw { eraser: false }
    }

    /// The eraser button: switch to drawing and flip the eraser.
    pub fn toggle_eraser(self) -> Self {
        match self {
            Tool::Draw { eraser } => Tool::Draw { eraser: !eraser },
            Tool::Pan => Tool::Draw { eraser: true },
        }
    }

    /// Picking a colour while drawing drops back to the plain brush.
    pub fn color_picked(self) -> Self {
        match self {
            Tool::Draw { .. } => Tool::draw(),
            Tool::Pan => Tool::Pan,
        }
    }

    pub fn is_eraser(self) -> bool {
        matches!(self, Tool::Draw { eraser: true })
    }
}

/// What the pointer is currently doing.
///
/// `last` is in image pixels; `anchor` is in screen pixels (pointer minus
/// the pan offset at the moment the pan started).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Drawing { last: Point },
    Panning { anchor: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// The pointer left the surface; ends any gesture like `Up`.
    Leave,
}

/// `MouseEvent.buttons` bit for the middle button.
pub const MIDDLE_BUTTON: u16 = 4;

/// A mouse or touch event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub kind: PointerKind,
    pub position: Point,
    /// Pressed-buttons bitmask, as in `MouseEvent.buttons`.
    pub buttons: u16,
}

impl PointerInput {
    pub fn mouse(kind: PointerKind, position: Point, buttons: u16) -> Self {
        Self {
            kind,
            position,
            buttons,
        }
    }

    /// Build from a touch event: only the first touch point counts.
    ///
    /// `touchend` carries no touches, which is fine for `Up` and `Leave`.
    /// `Down` and `Move` without a touch point are dropped.
    pub fn touch(kind: PointerKind, touches: &[Point]) -> Option<Self> {
        match (kind, touches.first()) {
            (_, Some(&position)) => Some(Self::mouse(kind, position, 0)),
            (PointerKind::Up | PointerKind::Leave, None) => {
                Some(Self::mouse(kind, Point::ZERO, 0))
            }
            (PointerKind::Down | PointerKind::Move, None) => None,
        }
    }

    pub fn is_middle_button(&self) -> bool {
        self.buttons == MIDDLE_BUTTON
    }
}

/// Cursor to show over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Crosshair,
    Grab,
    Grabbing,
}

impl Cursor {
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Crosshair => "crosshair",
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_button_clears_eraser() {
        assert_eq!(Tool::draw(), Tool::Draw { eraser: false });
    }

    #[test]
    fn eraser_button_toggles_and_selects_draw() {
        let tool = Tool::draw().toggle_eraser();
        assert!(tool.is_eraser());
        assert_eq!(tool.toggle_eraser(), Tool::draw());
        assert_eq!(Tool::Pan.toggle_eraser(), Tool::Draw { eraser: true });
    }

    #[test]
    fn color_pick_clears_eraser_only_when_drawing() {
        assert_eq!(Tool::Draw { eraser: true }.color_picked(), Tool::draw());
        assert_eq!(Tool::Pan.color_picked(), Tool::Pan);
    }

    #[test]
    fn touch_uses_first_point() {
        let input = PointerInput::touch(
            PointerKind::Down,
            &[Point::new(1.0, 2.0), Point::new(9.0, 9.0)],
        )
        .unwrap();
        assert_eq!(input.position, Point::new(1.0, 2.0));
        assert!(!input.is_middle_button());
    }

    #[test]
    fn touch_end_without_points_still_ends() {
        assert!(PointerInput::touch(PointerKind::Up, &[]).is_some());
        assert!(PointerInput::touch(PointerKind::Move, &[]).is_none());
    }

    #[test]
    fn middle_button_mask() {
        let input = PointerInput::mouse(PointerKind::Down, Point::ZERO, MIDDLE_BUTTON);
        assert!(input.is_middle_button());
        assert_eq!(Cursor::Grabbing.css(), "grabbing");
    }
}
