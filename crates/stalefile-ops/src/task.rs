//! Async relocation with progress reporting.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use stalefile_core::MatchSet;

use crate::progress::{RelocateProgress, RelocationReport};
use crate::relocate::Relocator;
use crate::OPERATION_CHANNEL_SIZE;

/// Result sent through the channel during relocation.
#[derive(Debug)]
pub enum RelocateEvent {
    /// Progress update, sent after each file.
    Progress(RelocateProgress),
    /// The batch finished or was cancelled.
    Complete(RelocationReport),
}

/// Start relocating on a blocking task.
///
/// Cancellation is checked between files, so a file is either fully moved
/// or untouched. Must be called from within a tokio runtime.
pub fn start_relocate(
    relocator: Relocator,
    matches: MatchSet,
    cancel: CancellationToken,
) -> mpsc::Receiver<RelocateEvent> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let report = relocate_impl(&relocator, &matches, &cancel, &tx);
        let _ = tx.blocking_send(RelocateEvent::Complete(report));
    });

    rx
}

fn relocate_impl(
    relocator: &Relocator,
    matches: &MatchSet,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<RelocateEvent>,
) -> RelocationReport {
    let mut report = RelocationReport::new();
    let mut progress = RelocateProgress::new(matches.len());

    if let Err(err) = relocator.ensure_destination() {
        error!(destination = %relocator.destination().display(), error = %err, "cannot create destination");
        for matched in matches {
            report.record_failure(matched.path().to_path_buf(), &err);
        }
        return report;
    }

    for matched in matches {
        if cancel.is_cancelled() {
            info!(remaining = matches.len() - report.processed(), "relocation cancelled");
            report.cancelled = true;
            break;
        }

        relocator.relocate_into(matched, &mut report);

        progress.files_completed = report.processed();
        progress.failed = report.failed;
        progress.bytes_moved = report.bytes_moved;
        progress.current_file = Some(matched.path().to_path_buf());
        // A dropped receiver only means nobody is watching.
        let _ = tx.blocking_send(RelocateEvent::Progress(progress.clone()));
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        bytes = report.bytes_moved,
        "relocation complete"
    );
    report
}
