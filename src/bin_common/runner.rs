//! Banners and the run loop shared by the binaries

use tracing::info;

const RULE: &str = "========================================";

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Shown in the startup and shutdown banners
    pub name: String,
    /// Seconds between status lines
    pub status_interval_secs: u64,
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status_interval_secs: 60,
        }
    }

    pub fn with_status_interval(mut self, secs: u64) -> Self {
        self.status_interval_secs = secs;
        self
    }
}

/// A long-running binary driven by `execute`
#[allow(async_fn_in_trait)]
pub trait BinaryRunner {
    /// Main loop; returns once shutdown was requested
    async fn run(&mut self) -> anyhow::Result<()>;

    fn config(&self) -> &RunConfig;

    /// Summary printed in the shutdown banner
    fn stats(&self) -> Option<String> {
        None
    }

    fn print_banner(&self) {
        let name = &self.config().name;
        info!("{}", RULE);
        info!("{} starting (Ctrl+C to stop)", name);
        info!("{}", RULE);
    }

    fn print_shutdown(&self, summary: Option<&str>) {
        let name = &self.config().name;
        info!("{}", RULE);
        info!("{} stopped", name);
        if let Some(summary) = summary {
            info!("{}", summary);
        }
        info!("{}", RULE);
    }

    /// Banner, main loop, then the shutdown banner with `stats()`
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let outcome = self.run().await;
        let summary = self.stats();
        self.print_shutdown(summary.as_deref());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        run_config: RunConfig,
        runs: usize,
    }

    impl BinaryRunner for Counting {
        async fn run(&mut self) -> anyhow::Result<()> {
            self.runs += 1;
            Ok(())
        }

        fn config(&self) -> &RunConfig {
            &self.run_config
        }
    }

    #[test]
    fn test_status_interval_override() {
        let run_config = RunConfig::new("monitor").with_status_interval(15);
        assert_eq!(run_config.name, "monitor");
        assert_eq!(run_config.status_interval_secs, 15);
        assert_eq!(RunConfig::new("monitor").status_interval_secs, 60);
    }

    #[tokio::test]
    async fn test_execute_runs_once() {
        let mut runner = Counting {
            run_config: RunConfig::new("counting"),
            runs: 0,
        };
        runner.execute().await.unwrap();
        assert_eq!(runner.runs, 1);
        assert!(runner.stats().is_none());
    }
}
