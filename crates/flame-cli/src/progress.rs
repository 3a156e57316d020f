use crate::error::{CliError, Result};
use flamepp::core::models::State;
use flamepp::engine::Observer;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};

/// Element-by-element progress bar on stderr, driven as a propagation observer.
pub struct ElementProgress {
    pb: ProgressBar,
    names: Vec<String>,
}

impl ElementProgress {
    pub fn new(total: u64, names: Vec<String>, visible: bool) -> Result<Self> {
        let pb = ProgressBar::new(total).with_style(Self::bar_style()?);
        pb.set_draw_target(if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        });
        Ok(Self { pb, names })
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    fn bar_style() -> Result<ProgressStyle> {
        Ok(
            ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .map_err(|e| CliError::Other(e.into()))?
                .with_key(
                    "eta",
                    |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                        let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                    },
                )
                .progress_chars("##-"),
        )
    }
}

impl Observer for ElementProgress {
    fn observe(&mut self, index: usize, _state: &State) {
        if let Some(name) = self.names.get(index) {
            self.pb.set_message(name.clone());
        }
        self.pb.inc(1);
    }
}
