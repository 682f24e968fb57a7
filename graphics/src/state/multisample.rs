//! Multisample state: sample coverage and alpha-to-coverage.

use std::sync::Arc;

use crate::backend::RenderBackend;

/// Sample coverage parameters.
///
/// Held behind `Arc`; the diff compares by pointer identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleCoverage {
    /// Coverage value in `[0, 1]`.
    pub value: f32,
    /// Invert the coverage mask.
    pub invert: bool,
}

/// Sample coverage and alpha-to-coverage.
///
/// Defaults: both disabled.
#[derive(Debug, Clone, Default)]
pub struct MultisampleState {
    coverage: Option<Arc<SampleCoverage>>,
    alpha_to_coverage: bool,
}

impl MultisampleState {
    /// Reset to defaults; chainable.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// The sample coverage, if enabled.
    pub fn coverage(&self) -> Option<Arc<SampleCoverage>> {
        self.coverage.clone()
    }

    /// Enable sample coverage with the given parameters; chainable.
    pub fn set_coverage(&mut self, value: f32, invert: bool) -> &mut Self {
        self.coverage = Some(Arc::new(SampleCoverage { value, invert }));
        self
    }

    /// Disable sample coverage; chainable.
    pub fn clear_coverage(&mut self) -> &mut Self {
        self.coverage = None;
        self
    }

    /// Whether alpha-to-coverage is enabled.
    pub fn alpha_to_coverage(&self) -> bool {
        self.alpha_to_coverage
    }

    /// Enable or disable alpha-to-coverage; chainable.
    pub fn set_alpha_to_coverage(&mut self, enabled: bool) -> &mut Self {
        self.alpha_to_coverage = enabled;
        self
    }

    /// Emit the backend calls needed to move from `previous` to this state.
    pub fn apply(&self, previous: Option<&Self>, backend: &dyn RenderBackend) {
        match previous {
            None => {
                match &self.coverage {
                    Some(coverage) => {
                        backend.set_sample_coverage_enabled(true);
                        backend.set_sample_coverage(coverage.value, coverage.invert);
                    }
                    None => backend.set_sample_coverage_enabled(false),
                }
                backend.set_alpha_to_coverage_enabled(self.alpha_to_coverage);
            }
            Some(prev) => {
                match (&self.coverage, &prev.coverage) {
                    (Some(coverage), None) => {
                        backend.set_sample_coverage_enabled(true);
                        backend.set_sample_coverage(coverage.value, coverage.invert);
                    }
                    (None, Some(_)) => backend.set_sample_coverage_enabled(false),
                    (Some(coverage), Some(prev_coverage)) => {
                        if !Arc::ptr_eq(coverage, prev_coverage) {
                            backend.set_sample_coverage(coverage.value, coverage.invert);
                        }
                    }
                    (None, None) => {}
                }
                if self.alpha_to_coverage != prev.alpha_to_coverage {
                    backend.set_alpha_to_coverage_enabled(self.alpha_to_coverage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, TraceBackend};

    #[test]
    fn test_first_activation() {
        let backend = TraceBackend::new();
        MultisampleState::default().apply(None, &backend);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::SampleCoverageEnabled(false),
                BackendCall::AlphaToCoverageEnabled(false),
            ]
        );
    }

    #[test]
    fn test_coverage_enable_and_disable() {
        let backend = TraceBackend::new();
        let prev = MultisampleState::default();
        let mut state = MultisampleState::default();
        state.set_coverage(0.5, true);

        state.apply(Some(&prev), &backend);
        assert_eq!(
            backend.take_calls(),
            vec![
                BackendCall::SampleCoverageEnabled(true),
                BackendCall::SampleCoverage(0.5, true),
            ]
        );

        prev.apply(Some(&state), &backend);
        assert_eq!(backend.take_calls(), vec![BackendCall::SampleCoverageEnabled(false)]);
    }

    #[test]
    fn test_alpha_to_coverage_diff() {
        let backend = TraceBackend::new();
        let prev = MultisampleState::default();
        let mut state = MultisampleState::default();
        state.set_alpha_to_coverage(true);

        state.apply(Some(&prev), &backend);
        assert_eq!(backend.calls(), vec![BackendCall::AlphaToCoverageEnabled(true)]);
    }
}
