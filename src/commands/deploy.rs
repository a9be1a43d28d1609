// ABOUTME: Deploy command implementation.
// ABOUTME: Submits a deploy and waits for the server to confirm it or for confirmation to time out.

use kahu::config::Config;
use kahu::error::{Error, Result};
use kahu::output::Output;
use kahu::status::Lifecycle;
use kahu::supervisor::{SyncErrorKind, SyncNotice, SyncPhase, SyncSupervisor, SyncView};
use kahu::transport::HttpSource;
use kahu::types::{ActionKind, Target};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

fn confirmed(view: &SyncView) -> bool {
    !view.is_pending(ActionKind::Deploy)
        && view
            .latest_deploy()
            .is_some_and(|deploy| deploy.status.is_live())
}

/// Deploy `target` and wait until the server shows the new deploy.
pub async fn deploy(config: Config, target: Target, mut output: Output) -> Result<()> {
    output.start_timer();

    let source = Arc::new(HttpSource::from_config(&config)?);
    let handle = SyncSupervisor::spawn(source, config);
    let mut views = handle.subscribe();
    let mut notices = handle.notices();

    handle.track(target.clone()).await?;
    output.progress(&format!("  → Syncing {target}..."));
    views
        .wait_for(|view| matches!(view.phase, SyncPhase::Synced | SyncPhase::Degraded))
        .await
        .map_err(|_| Error::SupervisorStopped)?;

    output.progress("  → Submitting deploy...");
    handle.submit(ActionKind::Deploy).await?;
    output.progress("  → Accepted, waiting for the server to pick it up...");

    let result = loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Ok(SyncNotice::Failure { error, .. })
                    if error.kind() == SyncErrorKind::ConfirmationTimeout =>
                {
                    break Err(Error::Sync(error));
                }
                Ok(SyncNotice::ResourceDeleted { target }) => {
                    break Err(Error::ResourceDeleted(target.to_string()));
                }
                Ok(notice) => output.notice(&notice),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Missed {} notices", missed);
                }
                Err(RecvError::Closed) => break Err(Error::SupervisorStopped),
            },
            view = views.wait_for(confirmed) => {
                let view = view.map_err(|_| Error::SupervisorStopped)?.clone();
                let status = view
                    .latest_deploy()
                    .map(|d| format!("deploy {} {}", d.id, d.status))
                    .unwrap_or_default();
                output.success(&format!("✓ {target}: {status}"));
                break Ok(());
            }
        }
    };

    handle.shutdown().await?;
    result
}
