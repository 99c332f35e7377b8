use crate::error::{RelocateError, Result};
use crate::paths::STAGING_PREFIX;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting config files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Directory moves
// ---------------------------------------------------------------------------

/// How a directory move was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveMethod {
    Rename,
    /// Source and destination are on different filesystems.
    CopyVerified,
    /// The verified copy is in place but the source could not be removed.
    CopyLeftSource { error: String },
}

/// Move the directory `src` to `dst`.
///
/// A plain rename is attempted first. When the rename fails because the paths
/// are on different filesystems, the tree is copied to a staging directory
/// next to `dst`, verified against the source, renamed into place, and only
/// then is the source removed.
///
/// Once the copy is in place the move counts as done: a source that cannot
/// be removed afterwards is reported as [`MoveMethod::CopyLeftSource`].
pub fn move_dir(src: &Path, dst: &Path) -> Result<MoveMethod> {
    move_dir_with(src, dst, |a, b| std::fs::rename(a, b), |p| std::fs::remove_dir_all(p))
}

fn move_dir_with(
    src: &Path,
    dst: &Path,
    rename: impl FnOnce(&Path, &Path) -> std::io::Result<()>,
    remove: impl FnOnce(&Path) -> std::io::Result<()>,
) -> Result<MoveMethod> {
    if dst.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", dst.display()),
        )
        .into());
    }
    match rename(src, dst) {
        Ok(()) => Ok(MoveMethod::Rename),
        Err(e) if is_cross_device(&e) => {
            tracing::info!(
                src = %src.display(),
                dst = %dst.display(),
                "rename crosses filesystems, copying instead"
            );
            copy_into_place(src, dst)?;
            match remove(src) {
                Ok(()) => Ok(MoveMethod::CopyVerified),
                Err(e) => {
                    tracing::warn!(src = %src.display(), error = %e, "copied folder but could not remove source");
                    Ok(MoveMethod::CopyLeftSource {
                        error: e.to_string(),
                    })
                }
            }
        }
        Err(e) => Err(e.into()),
    }
}

fn copy_into_place(src: &Path, dst: &Path) -> Result<()> {
    let parent = dst.parent().unwrap_or(Path::new("."));
    let staging = parent.join(format!("{STAGING_PREFIX}{}", uuid::Uuid::new_v4()));

    if let Err(e) = copy_dir_verified(src, &staging) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&staging, dst) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e.into());
    }
    Ok(())
}

/// Copy `src` to `dst` (which must not exist) and verify the copy matches.
pub fn copy_dir_verified(src: &Path, dst: &Path) -> Result<()> {
    copy_dir_recursive(src, dst)?;
    verify_tree(src, dst)
}

/// Recursively copy a directory. Existing files in `dst` are overwritten.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else if ty.is_symlink() {
            copy_symlink(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target = std::fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    std::fs::copy(from, to)?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Node {
    Dir,
    File(u64),
    Link(PathBuf),
}

fn tree_manifest(root: &Path) -> Result<BTreeMap<PathBuf, Node>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let rel = path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            let ty = entry.file_type()?;
            if ty.is_dir() {
                out.insert(rel, Node::Dir);
                stack.push(path);
            } else if ty.is_symlink() && cfg!(unix) {
                out.insert(rel, Node::Link(std::fs::read_link(&path)?));
            } else {
                out.insert(rel, Node::File(std::fs::metadata(&path)?.len()));
            }
        }
    }
    Ok(out)
}

/// Check that `dst` holds the same entries, sizes and file contents as `src`.
pub fn verify_tree(src: &Path, dst: &Path) -> Result<()> {
    let expected = tree_manifest(src)?;
    let actual = tree_manifest(dst)?;

    for (rel, node) in &expected {
        match actual.get(rel) {
            None => {
                return Err(RelocateError::CopyVerification {
                    path: dst.join(rel),
                    reason: "missing from copy".to_string(),
                })
            }
            Some(other) if other != node => {
                return Err(RelocateError::CopyVerification {
                    path: dst.join(rel),
                    reason: format!("expected {node:?}, found {other:?}"),
                })
            }
            Some(Node::File(_)) => {
                if !same_contents(&src.join(rel), &dst.join(rel))? {
                    return Err(RelocateError::CopyVerification {
                        path: dst.join(rel),
                        reason: "contents differ".to_string(),
                    });
                }
            }
            Some(_) => {}
        }
    }
    if let Some(extra) = actual.keys().find(|k| !expected.contains_key(*k)) {
        return Err(RelocateError::CopyVerification {
            path: dst.join(extra),
            reason: "not present in source".to_string(),
        });
    }
    Ok(())
}

fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    let mut fa = File::open(a)?;
    let mut fb = File::open(b)?;
    let mut ba = vec![0u8; 64 * 1024];
    let mut bb = vec![0u8; 64 * 1024];
    loop {
        let na = read_full(&mut fa, &mut ba)?;
        let nb = read_full(&mut fb, &mut bb)?;
        if na != nb || ba[..na] != bb[..nb] {
            return Ok(false);
        }
        if na == 0 {
            return Ok(true);
        }
    }
}

fn read_full(f: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match f.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

// EXDEV on unix, ERROR_NOT_SAME_DEVICE on windows
#[cfg(unix)]
const CROSS_DEVICE: i32 = 18;
#[cfg(windows)]
const CROSS_DEVICE: i32 = 17;
#[cfg(not(any(unix, windows)))]
const CROSS_DEVICE: i32 = -1;

fn is_cross_device(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(CROSS_DEVICE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_tree(root: &Path) {
        std::fs::create_dir_all(root.join("01 Admin/notes")).unwrap();
        std::fs::write(root.join("01 Admin/brief.txt"), b"scope of works").unwrap();
        std::fs::write(root.join("01 Admin/notes/a.md"), b"# a").unwrap();
        std::fs::write(root.join("25-97199-var.json"), b"{}").unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/config.yaml");
        atomic_write(&path, b"data").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
    }

    #[test]
    fn write_if_missing_skips_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, b"original").unwrap();
        let written = write_if_missing(&path, b"new").unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn move_dir_renames_within_filesystem() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        sample_tree(&src);

        let method = move_dir(&src, &dst).unwrap();
        assert_eq!(method, MoveMethod::Rename);
        assert!(!src.exists());
        assert_eq!(
            std::fs::read_to_string(dst.join("01 Admin/brief.txt")).unwrap(),
            "scope of works"
        );
    }

    #[test]
    fn move_dir_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        sample_tree(&src);
        std::fs::create_dir_all(&dst).unwrap();

        assert!(move_dir(&src, &dst).is_err());
        assert!(src.join("25-97199-var.json").exists());
    }

    #[test]
    fn copy_dir_verified_copies_everything() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        sample_tree(&src);

        copy_dir_verified(&src, &dst).unwrap();
        assert!(dst.join("empty").is_dir());
        assert!(dst.join("01 Admin/notes/a.md").exists());
        assert!(src.exists(), "copy must not touch the source");
    }

    #[test]
    fn verify_tree_detects_missing_and_changed_files() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        sample_tree(&src);
        copy_dir_recursive(&src, &dst).unwrap();

        std::fs::write(dst.join("01 Admin/brief.txt"), "scope of wörks".as_bytes()).unwrap();
        assert!(matches!(
            verify_tree(&src, &dst),
            Err(RelocateError::CopyVerification { .. })
        ));

        std::fs::write(dst.join("01 Admin/brief.txt"), b"scope of works").unwrap();
        verify_tree(&src, &dst).unwrap();

        std::fs::write(dst.join("01 Admin/brief.txt"), b"scope of wirks").unwrap();
        let err = verify_tree(&src, &dst).unwrap_err().to_string();
        assert!(err.contains("contents differ"), "{err}");

        std::fs::remove_file(dst.join("01 Admin/brief.txt")).unwrap();
        let err = verify_tree(&src, &dst).unwrap_err().to_string();
        assert!(err.contains("missing"), "{err}");
    }

    fn cross_device(_: &Path, _: &Path) -> std::io::Result<()> {
        Err(std::io::Error::from_raw_os_error(CROSS_DEVICE))
    }

    #[test]
    fn cross_device_move_copies_verifies_and_removes_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        sample_tree(&src);

        let method = move_dir_with(&src, &dst, cross_device, |p| std::fs::remove_dir_all(p)).unwrap();
        assert_eq!(method, MoveMethod::CopyVerified);
        assert!(!src.exists());
        assert_eq!(
            std::fs::read_to_string(dst.join("01 Admin/brief.txt")).unwrap(),
            "scope of works"
        );
        assert!(dst.join("empty").is_dir());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn cross_device_move_with_stuck_source_still_succeeds() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        sample_tree(&src);

        let method = move_dir_with(&src, &dst, cross_device, |_| {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "busy"))
        })
        .unwrap();
        assert!(matches!(method, MoveMethod::CopyLeftSource { ref error } if error.contains("busy")));
        verify_tree(&src, &dst).unwrap();
    }

    #[test]
    fn other_rename_errors_are_not_retried_as_copy() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        sample_tree(&src);

        let err = move_dir_with(
            &src,
            &dst,
            |_, _| Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")),
            |_| panic!("source must not be removed"),
        )
        .unwrap_err();
        assert!(matches!(err, RelocateError::Io(_)));
        assert!(!dst.exists());
        assert!(src.join("25-97199-var.json").exists());
    }

    #[test]
    fn cross_device_detection() {
        #[cfg(unix)]
        assert!(is_cross_device(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device(&std::io::Error::new(
            std::io::ErrorKind::Other,
            "nope"
        )));
    }
}
