use gmxflow::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Renders pipeline progress as a single stderr spinner, one line per stage.
#[derive(Clone)]
pub struct PipelineProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl PipelineProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner()
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.disable_steady_tick();
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PipelineStart { total_stages } => {
                    pb_guard.reset();
                    pb_guard.set_style(Self::spinner_style());
                    pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb_guard.set_message(format!("Starting {} pipeline stages", total_stages));
                }
                Progress::StageStart {
                    index,
                    total,
                    name,
                    description,
                } => {
                    pb_guard.set_message(format!(
                        "[{}/{}] {}: {}",
                        index + 1,
                        total,
                        name,
                        description
                    ));
                }
                Progress::StageFinish { name } => {
                    pb_guard.println(format!("  ✓ {}", name));
                }
                Progress::PipelineFinish => {
                    pb_guard.disable_steady_tick();
                    pb_guard.finish_with_message("✓ All stages complete");
                }
                Progress::Message(msg) => {
                    if pb_guard.is_finished() {
                        pb_guard.set_message(msg);
                    } else {
                        pb_guard.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }
}

impl Default for PipelineProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
