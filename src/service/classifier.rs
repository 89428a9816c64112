use super::runner::CommandOutput;

/// Decides whether an importer run counts as a success.
pub trait OutcomeClassifier: Send + Sync {
    fn is_success(&self, output: &CommandOutput) -> bool;
}

/// Success when stdout or stderr contains any configured marker.
/// The exit code is ignored.
pub struct MarkerClassifier {
    markers: Vec<String>,
}

impl MarkerClassifier {
    pub fn new(markers: Vec<String>) -> Self {
        Self {
            markers: markers.into_iter().filter(|m| !m.is_empty()).collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl OutcomeClassifier for MarkerClassifier {
    fn is_success(&self, output: &CommandOutput) -> bool {
        self.markers
            .iter()
            .any(|m| output.stdout.contains(m.as_str()) || output.stderr.contains(m.as_str()))
    }
}
