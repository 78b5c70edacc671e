use indicatif::{ProgressBar, ProgressStyle};
use longsum_llm::ProgressSink;

/// Shows `(done, total)` call counts as a progress bar on stderr
pub struct CallProgress {
    bar: ProgressBar,
}

impl CallProgress {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} calls")?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ProgressSink for CallProgress {
    fn report(&self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }
}
