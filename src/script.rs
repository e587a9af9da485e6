//! Scripted sessions
//!
//! A replay script is a JSON array of commands, each one a user action on a
//! [`Session`]. Scripts drive the whole workflow without a window, which is
//! how batches are re-measured and how the workflow is tested end to end.
//!
//! ```json
//! [
//!   {"LoadFolder": {"folder": "data/mouse3"}},
//!   "StartDrawing",
//!   {"Pointer": {"Click": {"at": {"x": 10, "y": 10}}}},
//!   "Calculate",
//!   "SaveAndNext"
//! ]
//! ```
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::measure::ThresholdConfig;
use crate::state::{AdjustmentSettings, InputEvent, Session};
use crate::ui::canvas::Viewport;

/// One user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    LoadFolder { folder: PathBuf },
    SetAdjustments(AdjustmentSettings),
    SetThreshold(ThresholdConfig),
    /// Cutoff as typed into the text field
    SetCutoffText(String),
    SetOverlay(bool),
    StartZoom,
    ZoomOut,
    ResetView,
    StartDrawing,
    Pointer(InputEvent),
    Calculate,
    SaveAndNext,
    DiscardAndNext,
    Resize(Viewport),
}

/// Read a script file
pub fn load_script(path: &Path) -> Result<Vec<Command>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Run one command against `session`
///
/// Relative folders are resolved against `base`.
pub fn apply(session: &mut Session, command: &Command, base: &Path) -> Result<()> {
    match command {
        Command::LoadFolder { folder } => {
            session.load_folder(&base.join(folder))?;
        }
        Command::SetAdjustments(settings) => session.set_adjustments(*settings)?,
        Command::SetThreshold(config) => session.set_threshold(*config),
        Command::SetCutoffText(text) => session.set_cutoff_text(text),
        Command::SetOverlay(show) => session.set_overlay(*show),
        Command::StartZoom => session.start_zoom()?,
        Command::ZoomOut => {
            session.zoom_out()?;
        }
        Command::ResetView => session.reset_view()?,
        Command::StartDrawing => session.start_drawing()?,
        Command::Pointer(event) => {
            session.pointer(*event)?;
        }
        Command::Calculate => {
            session.calculate()?;
        }
        Command::SaveAndNext => {
            session.save_and_next()?;
        }
        Command::DiscardAndNext => {
            session.discard_and_next()?;
        }
        Command::Resize(viewport) => session.set_viewport(*viewport),
    }
    Ok(())
}

/// Counters of one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub failed: usize,
}

/// Run every command in order
///
/// A failing command is reported and the replay continues, the same way an
/// interactive user would see a message and carry on.
pub fn replay(session: &mut Session, commands: &[Command], base: &Path) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for (i, command) in commands.iter().enumerate() {
        match apply(session, command, base) {
            Ok(()) => {
                debug!("▶️  #{} {:?}", i, command);
                summary.applied += 1;
            }
            Err(err) => {
                warn!("⚠️  Command #{} {:?} failed: {}", i, command, err);
                summary.failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::canvas::Point;

    #[test]
    fn test_script_shape() {
        let json = r#"[
            {"LoadFolder": {"folder": "data"}},
            "StartDrawing",
            {"Pointer": {"Click": {"at": {"x": 1.0, "y": 2.0}}}},
            {"Pointer": {"Click": {"at": {"x": 0.0, "y": 0.0}, "button": "Secondary"}}},
            {"SetThreshold": "Otsu"},
            {"SetThreshold": {"FixedCutoff": 90.0}},
            {"SetCutoffText": "abc"},
            "Calculate"
        ]"#;
        let commands: Vec<Command> = serde_json::from_str(json).unwrap();
        assert_eq!(commands.len(), 8);
        assert_eq!(
            commands[2],
            Command::Pointer(InputEvent::Click {
                at: Point::new(1.0, 2.0),
                button: crate::state::MouseButton::Primary,
                modifier: false,
            })
        );
        assert_eq!(commands[5], Command::SetThreshold(ThresholdConfig::FixedCutoff(90.0)));
    }

    #[test]
    fn test_failures_do_not_stop_replay() {
        let mut session = Session::new(Default::default());
        let commands = vec![Command::Calculate, Command::SetCutoffText("42".into()), Command::SaveAndNext];
        let summary = replay(&mut session, &commands, Path::new("."));
        assert_eq!(summary, ReplaySummary { applied: 1, failed: 2 });
        assert_eq!(session.threshold(), ThresholdConfig::FixedCutoff(42.0));
    }
}
