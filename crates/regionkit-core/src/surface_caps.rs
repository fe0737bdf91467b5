#![forbid(unsafe_code)]

//! Output capabilities of the terminal a surface writes to.
//!
//! Detection reads environment variables only; nothing is queried from
//! the device. When in doubt a capability is disabled, since a missing color
//! is preferable to corrupted output.
//!
//! # Detection Strategy
//!
//! - `NO_COLOR`: de-facto standard for disabling color
//! - `TERM`: terminal type (`xterm-256color`, `dumb`, ...)
//! - `TERM_PROGRAM`: specific terminal (WezTerm, Alacritty, Ghostty, ...)

use std::env;

/// Terminal programs that support synchronized output (DEC 2026).
const SYNC_OUTPUT_TERMINALS: &[&str] = &["WezTerm", "Alacritty", "Ghostty", "kitty", "Contour"];

#[derive(Debug, Clone, Default)]
struct DetectInputs {
    no_color: bool,
    term: String,
    term_program: String,
}

impl DetectInputs {
    fn from_env() -> Self {
        Self {
            no_color: env::var("NO_COLOR").is_ok(),
            term: env::var("TERM").unwrap_or_default(),
            term_program: env::var("TERM_PROGRAM").unwrap_or_default(),
        }
    }
}

/// Capabilities consulted when a surface emits escape sequences.
///
/// Cell colors are opaque values passed through as 24-bit SGR; the only
/// color decision here is whether to emit color at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCaps {
    /// Emit color sequences. When `false`, only style flags are written.
    pub color: bool,
    /// Wrap each flush in DEC 2026 synchronized output.
    pub sync_output: bool,
}

impl Default for SurfaceCaps {
    fn default() -> Self {
        Self::basic()
    }
}

impl SurfaceCaps {
    /// Detect capabilities from the environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_from_inputs(&DetectInputs::from_env())
    }

    fn detect_from_inputs(env: &DetectInputs) -> Self {
        let term = env.term.as_str();
        let term_program = env.term_program.as_str();

        let is_dumb = term == "dumb" || term.is_empty();
        let is_kitty = term.contains("kitty");

        let sync_output = !is_dumb
            && (is_kitty
                || SYNC_OUTPUT_TERMINALS
                    .iter()
                    .any(|t| term_program.contains(t)));

        Self {
            color: !(env.no_color || is_dumb),
            sync_output,
        }
    }

    /// Modern terminal: color and synchronized output.
    #[must_use]
    pub const fn modern() -> Self {
        Self {
            color: true,
            sync_output: true,
        }
    }

    /// Conservative profile: color, no synchronized output.
    #[must_use]
    pub const fn basic() -> Self {
        Self {
            color: true,
            sync_output: false,
        }
    }

    /// No color at all.
    #[must_use]
    pub const fn mono() -> Self {
        Self {
            color: false,
            sync_output: false,
        }
    }

    /// Return a copy with color output toggled.
    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Return a copy with synchronized output toggled.
    #[must_use]
    pub const fn with_sync_output(mut self, sync_output: bool) -> Self {
        self.sync_output = sync_output;
        self
    }
}
