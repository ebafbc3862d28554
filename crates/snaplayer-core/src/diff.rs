use tracing::debug;

use crate::Snapshot;

/// Entries of `new` that are absent from `old` or whose size or modification
/// time changed.
///
/// Paths that disappeared between the two snapshots are not reported; the
/// result carries no deletion markers. File contents are never read.
pub fn diff(old: &Snapshot, new: &Snapshot) -> Snapshot {
    let mut added = 0_usize;
    let mut modified = 0_usize;
    let changed: Vec<_> = new
        .records()
        .filter(|record| match old.get(&record.path) {
            Some(previous) => {
                let differs = record.differs_from(previous);
                modified += usize::from(differs);
                differs
            }
            None => {
                added += 1;
                true
            }
        })
        .cloned()
        .collect();
    let result = Snapshot::derived(changed);
    debug!(
        old = %old,
        new = %new,
        added,
        modified,
        unchanged = new.len() - result.len(),
        "snapshot diff computed"
    );
    result
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use time::Duration;

    use super::*;
    use crate::FileRecord;

    fn file(path: &str, size: u64) -> FileRecord {
        FileRecord::regular_file(path, size, datetime!(2024-02-02 10:00 UTC), 0o644)
    }

    #[test]
    fn reports_additions_and_modifications_only() {
        let old = Snapshot::new(
            "/r",
            vec![
                FileRecord::directory("/r", datetime!(2024-02-02 10:00 UTC), 0o755),
                file("/r/same", 1),
                file("/r/grown", 1),
                file("/r/touched", 1),
            ],
        );
        let mut touched = file("/r/touched", 1);
        touched.mod_time += Duration::seconds(1);
        let new = Snapshot::new(
            "/r",
            vec![
                FileRecord::directory("/r", datetime!(2024-02-02 10:00 UTC), 0o755),
                file("/r/same", 1),
                file("/r/grown", 2),
                touched,
                file("/r/fresh", 3),
            ],
        );

        let delta = diff(&old, &new);

        assert_eq!(delta.paths(), vec!["/r/fresh", "/r/grown", "/r/touched"]);
        assert!(delta.name().is_none());
        for record in delta.records() {
            assert_eq!(new.get(&record.path), Some(record));
        }
    }

    #[test]
    fn deletions_are_not_represented() {
        let old = Snapshot::new("/r", vec![file("/r/x", 1), file("/r/y", 1)]);
        let new = Snapshot::new("/r", vec![file("/r/x", 1)]);
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn diff_against_itself_is_empty() {
        let snapshot = Snapshot::new(
            "/r",
            vec![
                file("/r/a", 1),
                FileRecord::symlink("/r/l", "/r/a", datetime!(2024-02-02 10:00 UTC), 0o777),
            ],
        );
        assert!(diff(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn offset_change_alone_is_not_a_modification() {
        let old = Snapshot::new("/r", vec![file("/r/a", 1)]);
        let mut shifted = file("/r/a", 1);
        shifted.mod_time = shifted.mod_time.to_offset(time::macros::offset!(-5));
        let new = Snapshot::new("/r", vec![shifted]);
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn permission_change_alone_is_not_a_modification() {
        let old = Snapshot::new("/r", vec![file("/r/a", 1)]);
        let mut chmod = file("/r/a", 1);
        chmod.mode = 0o600;
        let new = Snapshot::new("/r", vec![chmod]);
        assert!(diff(&old, &new).is_empty());
    }
}
