use std::fs;
use std::io;
use std::path::Path;

/// Rename `src` to `dst`, merging directory contents when `dst` is already a
/// directory.
///
/// A plain rename is tried first. When it fails and both paths are existing
/// directories, each entry of `src` is moved into `dst` instead and the
/// emptied `src` is removed. Entries already present in `dst` are overwritten
/// the way `fs::rename` overwrites files. Any other failure is returned
/// unchanged.
pub fn rename_or_merge(src: &Path, dst: &Path) -> io::Result<()> {
    let err = match fs::rename(src, dst) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    if !src.is_dir() || !dst.is_dir() {
        return Err(err);
    }
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        fs::rename(entry.path(), dst.join(entry.file_name()))?;
    }
    fs::remove_dir(src)
}

/// Copy `src` to `dst`, overwriting `dst` when it exists.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn rename_moves_when_destination_is_free() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("old");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.flac"), b"a").unwrap();

        let dst = tmp.path().join("new");
        rename_or_merge(&src, &dst).unwrap();

        assert!(!src.exists());
        assert!(dst.join("a.flac").exists());
    }

    #[test]
    fn rename_merges_into_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("old");
        let dst = tmp.path().join("new");
        fs::create_dir(&src).unwrap();
        fs::create_dir(&dst).unwrap();
        fs::write(src.join("a.flac"), b"a").unwrap();
        fs::write(dst.join("b.flac"), b"b").unwrap();

        rename_or_merge(&src, &dst).unwrap();

        assert!(!src.exists());
        assert!(dst.join("a.flac").exists());
        assert!(dst.join("b.flac").exists());
    }

    #[test]
    fn rename_onto_plain_file_fails_and_leaves_both_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("old");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.flac"), b"a").unwrap();

        let dst = tmp.path().join("new");
        fs::write(&dst, b"not a directory").unwrap();

        rename_or_merge(&src, &dst).unwrap_err();
        assert!(src.join("a.flac").exists());
        assert_eq!(fs::read(&dst).unwrap(), b"not a directory");
    }

    #[test]
    fn copy_file_overwrites_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("cover.png");
        let dst = tmp.path().join("cover.jpg");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"new");
    }
}
