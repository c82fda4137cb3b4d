//! UI screens, the analysis phase machine, and shared UI state.

/// Screen currently shown by the TUI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Main scan/results screen.
    Main,
    /// Settings editor.
    Settings,
}

/// Lifecycle of one scan, from selection to rendered results.
///
/// The phase is the only guard on the analyze action: while a sequence is
/// in flight (`Uploading`/`Analyzing`) a new trigger is simply refused,
/// mirroring a disabled button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing selected yet.
    Idle,
    /// An image is selected and previewed; analyze is available.
    FileSelected,
    /// Multipart upload in flight.
    Uploading,
    /// OCR call in flight.
    Analyzing,
    /// Normalized results on screen.
    ShowingResults,
    /// A sequence failed; retry is offered. The selection is kept.
    Failed,
}

impl Phase {
    /// Whether the analyze action is currently allowed.
    pub fn can_analyze(&self) -> bool {
        matches!(
            self,
            Phase::FileSelected | Phase::ShowingResults | Phase::Failed
        )
    }

    /// Whether a network sequence is in flight.
    pub fn busy(&self) -> bool {
        matches!(self, Phase::Uploading | Phase::Analyzing)
    }

    /// Short label for the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::FileSelected => "Ready",
            Phase::Uploading => "Uploading",
            Phase::Analyzing => "Analyzing",
            Phase::ShowingResults => "Results",
            Phase::Failed => "Failed",
        }
    }
}

/// State shared with the rendering side.
#[derive(Clone, Debug)]
pub struct UiState {
    /// Current screen.
    pub screen: Screen,
    /// Current scan phase.
    pub phase: Phase,
    /// Whether the raw-response panel is expanded.
    pub raw_expanded: bool,
    /// Activity log shown in the side panel.
    pub log: Vec<String>,
    /// Status line at the bottom of the screen.
    pub status: String,
    /// Error message kept for the retry affordance.
    pub error: Option<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Main,
            phase: Phase::Idle,
            raw_expanded: false,
            log: vec![],
            status: "Ready".into(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_guard_follows_phase() {
        // In-flight phases refuse a new trigger.
        assert!(!Phase::Uploading.can_analyze());
        assert!(!Phase::Analyzing.can_analyze());
        assert!(!Phase::Idle.can_analyze());
        // Selected, shown and failed phases allow (re)analysis.
        assert!(Phase::FileSelected.can_analyze());
        assert!(Phase::ShowingResults.can_analyze());
        assert!(Phase::Failed.can_analyze());
    }

    #[test]
    fn busy_matches_network_phases() {
        assert!(Phase::Uploading.busy());
        assert!(Phase::Analyzing.busy());
        assert!(!Phase::FileSelected.busy());
        assert!(!Phase::Failed.busy());
    }
}
