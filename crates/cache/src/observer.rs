use crate::archive::ArchiveId;
use std::path::Path;

/// Progress callbacks emitted by [`WorldCacheBuilder`](crate::WorldCacheBuilder).
///
/// For every archive, in list order, exactly one of the following happens:
/// 1. [`on_archive_skipped`](Self::on_archive_skipped): the entry was reused.
/// 2. [`on_archive_extracting`](Self::on_archive_extracting), followed by
///    [`on_archive_done`](Self::on_archive_done) once the extractor succeeded.
///
/// A failure ends the build early; `on_archive_done` is then never called for
/// the failing archive, and later archives produce no events at all.
///
/// Every method defaults to doing nothing.
pub trait Observer {
    fn on_archive_skipped(&mut self, _archive: &ArchiveId, _entry: &Path) {}
    /// Extraction can take minutes for the larger archives.
    fn on_archive_extracting(&mut self, _archive: &ArchiveId, _source: &Path) {}
    fn on_archive_done(&mut self, _archive: &ArchiveId, _entry: &Path) {}
}

/// Reports progress through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_archive_skipped(&mut self, archive: &ArchiveId, entry: &Path) {
        tracing::info!(%archive, entry = %entry.display(), "Archive already cached; skipping");
    }

    fn on_archive_extracting(&mut self, archive: &ArchiveId, source: &Path) {
        tracing::info!(%archive, source = %source.display(), "Extracting archive (this takes a few minutes)");
    }

    fn on_archive_done(&mut self, archive: &ArchiveId, entry: &Path) {
        tracing::info!(%archive, entry = %entry.display(), "Archive ready");
    }
}
