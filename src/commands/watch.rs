// ABOUTME: Watch command implementation.
// ABOUTME: Tracks one resource and prints every view change until interrupted.

use kahu::config::Config;
use kahu::error::{Error, Result};
use kahu::output::Output;
use kahu::supervisor::{SyncNotice, SyncSupervisor};
use kahu::transport::HttpSource;
use kahu::types::Target;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Follow `target` until Ctrl-C or until the resource is deleted.
pub async fn watch(config: Config, target: Target, mut output: Output) -> Result<()> {
    let source = Arc::new(HttpSource::from_config(&config)?);
    let handle = SyncSupervisor::spawn(source, config);
    let mut views = handle.subscribe();
    let mut notices = handle.notices();

    handle.track(target.clone()).await?;
    output.progress(&format!("Watching {target} (Ctrl-C to stop)"));

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let mut deleted = false;
    loop {
        tokio::select! {
            _ = &mut interrupt => break,
            changed = views.changed() => {
                changed.map_err(|_| Error::SupervisorStopped)?;
                let view = views.borrow_and_update().clone();
                output.view(&view);
            }
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    output.notice(&notice);
                    if matches!(notice, SyncNotice::ResourceDeleted { .. }) {
                        deleted = true;
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Missed {} notices", missed);
                }
                Err(RecvError::Closed) => return Err(Error::SupervisorStopped),
            },
        }
    }

    handle.shutdown().await?;
    if deleted {
        return Err(Error::ResourceDeleted(target.to_string()));
    }
    Ok(())
}
