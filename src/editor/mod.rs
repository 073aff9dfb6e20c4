//! The editing surface, as plain state.
//!
//! Nothing here knows about a GUI toolkit or the DOM. A front end feeds
//! [`Editor`] pointer, wheel, and key events in screen coordinates together
//! with the surface's layout rect, and reads back the viewport transform, the
//! cursor, and the stroke layer. [`EditSession`] adds the server round trip.
//!
//! | Module | Role |
//! |---|---|
//! | [`geometry`] | `Point`, `Size`, `Rect` |
//! | [`viewport`] | zoom/pan and the screen → pixel mapping |
//! | [`tool`] | tools, pointer input, the gesture enum, cursors |
//! | [`brush`] | colour, size, paint vs erase |
//! | [`surface`] | the RGBA stroke layer |
//! | [`session`] | open / submit against the server |

pub mod brush;
pub mod geometry;
pub mod session;
pub mod surface;
pub mod tool;
pub mod viewport;

pub use brush::{Brush, CompositeOp};
pub use geometry::{Point, Rect, Size};
pub use session::{EditSession, SubmitStatus};
pub use surface::StrokeLayer;
pub use tool::{Cursor, Gesture, PointerInput, PointerKind, Tool};
pub use viewport::Viewport;

use crate::client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("'{0}' is not a colour")]
    InvalidColor(String),
    #[error("a submission is already in flight")]
    SubmitInFlight,
    #[error("could not read target image: {0}")]
    Decode(String),
    #[error("could not encode overlay: {0}")]
    Encode(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// What an input event changed, for the front end to redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// A segment was stroked onto the layer (image pixels).
    Stroke { from: Point, to: Point },
    /// The viewport moved.
    Panned,
    /// A gesture started or ended; only the cursor changed.
    CursorChanged,
}

/// Editor state for one target image.
#[derive(Debug, Clone)]
pub struct Editor {
    native: Size,
    layout: Rect,
    viewport: Viewport,
    tool: Tool,
    brush: Brush,
    gesture: Gesture,
    space_held: bool,
    layer: StrokeLayer,
}

impl Editor {
    /// Fresh editor for an image of `width × height` pixels. The layout rect
    /// defaults to the image at its natural size at the screen origin.
    pub fn new(width: u32, height: u32) -> Self {
        let native = Size::new(width as f64, height as f64);
        Self {
            native,
            layout: Rect::new(0.0, 0.0, native.width, native.height),
            viewport: Viewport::default(),
            tool: Tool::default(),
            brush: Brush::default(),
            gesture: Gesture::Idle,
            space_held: false,
            layer: StrokeLayer::new(width, height),
        }
    }

    pub fn native_size(&self) -> Size {
        self.native
    }

    /// Where the surface sits on screen before zoom and pan.
    pub fn set_layout(&mut self, layout: Rect) {
        self.layout = layout;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn layer(&self) -> &StrokeLayer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut StrokeLayer {
        &mut self.layer
    }

    pub fn select_draw(&mut self) {
        self.tool = Tool::draw();
    }

    pub fn select_pan(&mut self) {
        self.tool = Tool::Pan;
    }

    pub fn toggle_eraser(&mut self) {
        self.tool = self.tool.toggle_eraser();
    }

    pub fn pick_color(&mut self, hex: &str) -> Result<(), EditorError> {
        self.brush.set_color_hex(hex)?;
        self.tool = self.tool.color_picked();
        Ok(())
    }

    pub fn set_brush_size(&mut self, size: f64) {
        self.brush.size = size.max(0.0);
    }

    /// Stroke width in image pixels for the current brush.
    pub fn line_width(&self) -> f64 {
        self.brush.line_width(self.native.width)
    }

    pub fn set_space_held(&mut self, held: bool) {
        self.space_held = held;
    }

    pub fn on_wheel(&mut self, delta_y: f64) {
        self.viewport.on_wheel(delta_y);
    }

    pub fn cursor(&self) -> Cursor {
        match (self.gesture, self.tool) {
            (Gesture::Panning { .. }, _) => Cursor::Grabbing,
            (_, Tool::Pan) => Cursor::Grab,
            _ if self.space_held => Cursor::Grab,
            _ => Cursor::Crosshair,
        }
    }

    /// Map a screen position to image pixels through the current view.
    pub fn to_pixel(&self, screen: Point) -> Point {
        self.viewport.to_pixel(screen, self.layout, self.native)
    }

    /// Feed one pointer event through the gesture state machine.
    pub fn handle_pointer(&mut self, input: PointerInput) -> Option<Effect> {
        match (input.kind, self.gesture) {
            (PointerKind::Down, _) => {
                let pans = self.tool == Tool::Pan || input.is_middle_button() || self.space_held;
                self.gesture = if pans {
                    Gesture::Panning {
                        anchor: input.position - self.viewport.pan(),
                    }
                } else {
                    Gesture::Drawing {
                        last: self.to_pixel(input.position),
                    }
                };
                Some(Effect::CursorChanged)
            }
            (PointerKind::Move, Gesture::Panning { anchor }) => {
                self.viewport.set_pan(input.position - anchor);
                Some(Effect::Panned)
            }
            (PointerKind::Move, Gesture::Drawing { last }) => {
                let to = self.to_pixel(input.position);
                let op = if self.tool.is_eraser() {
                    CompositeOp::Erase
                } else {
                    CompositeOp::Paint
                };
                self.layer
                    .stroke_segment(last, to, self.line_width(), self.brush.color, op);
                self.gesture = Gesture::Drawing { last: to };
                Some(Effect::Stroke { from: last, to })
            }
            (PointerKind::Move, Gesture::Idle) => None,
            (PointerKind::Up | PointerKind::Leave, Gesture::Idle) => None,
            (PointerKind::Up | PointerKind::Leave, _) => {
                self.gesture = Gesture::Idle;
                Some(Effect::CursorChanged)
            }
        }
    }

    /// Clear the stroke layer.
    pub fn clear(&mut self) {
        self.layer.clear();
    }
}
