//! Shared constants and type definitions for the Local Filter engine.
//!
//! Class names, attribute names and selectors here are part of the contract with
//! the host page and the extension stylesheet; changing them breaks both.

// =============================================================================
// Page contract
// =============================================================================

/// Exact trimmed text of the badge span marking a local product.
pub const LOCAL_BADGE_TEXT: &str = "Yerel";

/// Obfuscated class the page currently puts on the badge span.
pub const BADGE_FAST_PATH_CLASS: &str = "C9HMW0KN";

/// Number of parent steps from the group container up to the card.
pub const CARD_DEPTH_ABOVE_GROUP: usize = 2;

// =============================================================================
// Marker classes (styled by the extension stylesheet)
// =============================================================================

pub const HIGHLIGHT_CLASS: &str = "temu-local-highlight";
pub const REMOVING_CLASS: &str = "temu-local-removing";
pub const RESTORING_CLASS: &str = "temu-local-restoring";
pub const RESTORE_ANIM_CLASS: &str = "temu-local-restore-anim";

/// Text of the comment node left where a hidden card used to be.
pub const PLACEHOLDER_TEXT: &str = "temu-local-placeholder";

// =============================================================================
// Timing and thresholds
// =============================================================================

/// Length of the removing / restoring CSS transitions.
pub const TRANSITION_MS: u32 = 960;

/// How long scanning stays suspended after auto-disable.
pub const AUTO_DISABLE_COOLDOWN_MS: f64 = 30_000.0;

/// Minimum number of group containers before density is considered.
pub const AUTO_DISABLE_MIN_GROUPS: usize = 12;

/// Density at or above which filtering turns itself off, as a fraction out of ten.
pub const AUTO_DISABLE_DENSITY_TENTHS: usize = 9;

pub const SCAN_IDLE_TIMEOUT_MS: u32 = 500;
pub const SCAN_FALLBACK_DELAY_MS: u32 = 100;
pub const RENDER_IDLE_TIMEOUT_MS: u32 = 300;
pub const RENDER_FALLBACK_DELAY_MS: u32 = 0;

// =============================================================================
// Selectors
// =============================================================================

/// The fixed set of queries the engine issues against the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `div[role="group"]`
    Group,
    /// `span.C9HMW0KN`
    BadgeFastPath,
    /// `span`
    Span,
    /// `.temu-local-highlight`
    Highlighted,
}

impl Selector {
    /// CSS form, for hosts with a native selector engine.
    pub fn css(self) -> &'static str {
        match self {
            Self::Group => "div[role=\"group\"]",
            Self::BadgeFastPath => "span.C9HMW0KN",
            Self::Span => "span",
            Self::Highlighted => ".temu-local-highlight",
        }
    }
}

// =============================================================================
// Card flags (recorded as data attributes on the element)
// =============================================================================

bitflags::bitflags! {
    /// Transient per-element tracking flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CardFlags: u8 {
        /// A badge resolved to this card or group
        const PROCESSED = 1 << 0;
        /// Counted as hidden
        const HIDDEN = 1 << 1;
        /// Removal started or completed
        const REMOVED = 1 << 2;
        /// Group container already scanned
        const CHECKED = 1 << 3;
        /// Highlight class applied
        const HIGHLIGHTED = 1 << 4;
        /// Waiting in the scan queue
        const QUEUED = 1 << 5;

        /// Flags dropped when a hidden card is put back
        const RESTORE_CLEARED = Self::PROCESSED.bits()
            | Self::HIDDEN.bits()
            | Self::REMOVED.bits()
            | Self::CHECKED.bits();
    }
}

impl CardFlags {
    /// Data attribute backing a single flag.
    ///
    /// Returns `None` for composite or empty values.
    pub fn attribute(self) -> Option<&'static str> {
        let name = if self == Self::PROCESSED {
            "data-temu-local-processed"
        } else if self == Self::HIDDEN {
            "data-temu-local-hidden"
        } else if self == Self::REMOVED {
            "data-temu-local-removed"
        } else if self == Self::CHECKED {
            "data-temu-local-checked"
        } else if self == Self::HIGHLIGHTED {
            "data-temu-local-highlighted"
        } else if self == Self::QUEUED {
            "data-temu-local-queued"
        } else {
            return None;
        };
        Some(name)
    }
}

// =============================================================================
// Mode
// =============================================================================

/// Effective behaviour derived from the two toggles.
///
/// Highlighting wins over filtering when both are on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Off,
    Filter,
    Highlight,
}

impl Mode {
    pub fn from_toggles(filter_enabled: bool, highlight_enabled: bool) -> Self {
        match (filter_enabled, highlight_enabled) {
            (_, true) => Self::Highlight,
            (true, false) => Self::Filter,
            (false, false) => Self::Off,
        }
    }

    pub fn is_active(self) -> bool {
        self != Self::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_attributes() {
        assert_eq!(CardFlags::CHECKED.attribute(), Some("data-temu-local-checked"));
        assert_eq!(CardFlags::RESTORE_CLEARED.attribute(), None);
        for flag in CardFlags::RESTORE_CLEARED.iter() {
            assert!(flag.attribute().is_some());
        }
        assert!(!CardFlags::RESTORE_CLEARED.contains(CardFlags::HIGHLIGHTED));
    }

    #[test]
    fn test_mode_precedence() {
        assert_eq!(Mode::from_toggles(true, true), Mode::Highlight);
        assert_eq!(Mode::from_toggles(false, true), Mode::Highlight);
        assert_eq!(Mode::from_toggles(true, false), Mode::Filter);
        assert!(!Mode::from_toggles(false, false).is_active());
    }
}
