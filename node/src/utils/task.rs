use anyhow::Result;
use tokio::{signal, sync::watch, task::JoinSet};

/// Stop flag shared with long-running tasks. A task checks it between
/// blocks so a block in flight is always finished or never started.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (tx, Shutdown { rx })
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop was requested or the sender is gone.
    pub async fn requested(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Waits for ctrl-c or the first task to finish. On ctrl-c the stop flag is
/// raised and the remaining tasks are given the chance to wind down before
/// being aborted.
pub async fn wait_for_shutdown(mut tasks: JoinSet<Result<()>>, stop: watch::Sender<bool>) -> Result<()> {
    let first = tokio::select! {
        biased;
        _ = signal::ctrl_c() => {
            log::info!("shutting down…");
            None
        }
        Some(res) = tasks.join_next() => Some(res),
    };

    let _ = stop.send(true);
    if let Some(res) = first {
        tasks.shutdown().await;
        return res?;
    }

    let drain = async {
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(Err(e)) => log::warn!("task failed during shutdown: {e}"),
                Err(e) => log::warn!("task aborted: {e}"),
                Ok(Ok(())) => {}
            }
        }
    };
    if tokio::time::timeout(std::time::Duration::from_secs(10), drain).await.is_err() {
        log::warn!("tasks did not stop in time, aborting");
        tasks.shutdown().await;
    }
    Ok(())
}
