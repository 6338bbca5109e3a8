//! Floating menu model: status text and the drag state machine.
//!
//! Rendering is left to the host through [`MenuView`].

/// Everything the floating menu displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuStatus {
    pub filter_checked: bool,
    pub filter_status: String,
    pub filter_warning: String,
    /// Tooltip on the filter status line
    pub filter_title: String,
    pub highlight_checked: bool,
    pub highlight_status: String,
}

pub const FILTER_LABEL: &str = "Yerel Filtre";
pub const HIGHLIGHT_LABEL: &str = "Yerel Vurgulama";
pub const AUTO_DISABLED_WARNING: &str = "Bu sayfada ürünlerin çoğu Yerel. Filtre otomatik kapatıldı.";

const ON: &str = "AÇIK";
const OFF: &str = "KAPALI";

impl MenuStatus {
    pub fn new(filter_enabled: bool, highlight_enabled: bool, auto_disabled: bool, hidden: usize) -> Self {
        let (filter_status, filter_warning) = if auto_disabled {
            (
                format!("{OFF} (otomatik) • Gizlenen: {hidden}"),
                AUTO_DISABLED_WARNING.to_string(),
            )
        } else {
            let state = if filter_enabled { ON } else { OFF };
            (format!("{state} • Gizlenen: {hidden}"), String::new())
        };
        Self {
            filter_checked: filter_enabled,
            filter_status,
            filter_warning,
            filter_title: format!("Gizlenen: {hidden}"),
            highlight_checked: highlight_enabled,
            highlight_status: if highlight_enabled { ON } else { OFF }.to_string(),
        }
    }
}

/// Host side of the floating menu.
pub trait MenuView {
    fn render(&mut self, status: &MenuStatus);
    fn set_visible(&mut self, visible: bool);
}

// =============================================================================
// Drag
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// Checkbox, its label or the slider: never starts a drag.
    Control,
    /// Any other part of the panel.
    Panel,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Pointer position relative to the panel origin
        offset: Point,
    },
}

/// Pointer-driven panel dragging.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuDrag {
    state: DragState,
}

impl MenuDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Returns the origin the panel must be pinned to when a drag starts.
    pub fn pointer_down(&mut self, target: PointerTarget, pointer: Point, panel_origin: Point) -> Option<Point> {
        if target == PointerTarget::Control {
            return None;
        }
        self.state = DragState::Dragging {
            offset: Point::new(pointer.x - panel_origin.x, pointer.y - panel_origin.y),
        };
        Some(panel_origin)
    }

    /// New panel origin while dragging.
    pub fn pointer_move(&self, pointer: Point) -> Option<Point> {
        match self.state {
            DragState::Dragging { offset } => Some(Point::new(pointer.x - offset.x, pointer.y - offset.y)),
            DragState::Idle => None,
        }
    }

    /// Returns whether a drag was in progress.
    pub fn pointer_up(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let on = MenuStatus::new(true, false, false, 3);
        assert_eq!(on.filter_status, "AÇIK • Gizlenen: 3");
        assert_eq!(on.filter_warning, "");
        assert_eq!(on.filter_title, "Gizlenen: 3");
        assert_eq!(on.highlight_status, "KAPALI");

        let off = MenuStatus::new(false, true, false, 0);
        assert_eq!(off.filter_status, "KAPALI • Gizlenen: 0");
        assert!(off.highlight_checked);
        assert_eq!(off.highlight_status, "AÇIK");
    }

    #[test]
    fn test_auto_disabled_status() {
        let status = MenuStatus::new(false, false, true, 0);
        assert_eq!(status.filter_status, "KAPALI (otomatik) • Gizlenen: 0");
        assert_eq!(status.filter_warning, AUTO_DISABLED_WARNING);
        assert!(!status.filter_checked);
    }

    #[test]
    fn test_drag_tracks_pointer_offset() {
        let mut drag = MenuDrag::new();
        let pinned = drag.pointer_down(PointerTarget::Panel, Point::new(110.0, 220.0), Point::new(100.0, 200.0));
        assert_eq!(pinned, Some(Point::new(100.0, 200.0)));
        assert_eq!(drag.pointer_move(Point::new(150.0, 260.0)), Some(Point::new(140.0, 240.0)));
        assert!(drag.pointer_up());
        assert_eq!(drag.pointer_move(Point::new(0.0, 0.0)), None);
        assert!(!drag.pointer_up());
    }

    #[test]
    fn test_controls_do_not_start_drag() {
        let mut drag = MenuDrag::new();
        assert_eq!(drag.pointer_down(PointerTarget::Control, Point::default(), Point::default()), None);
        assert_eq!(drag.state(), DragState::Idle);
    }
}
