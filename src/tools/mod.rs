pub mod exec;
pub mod fs_list;
pub mod fs_read;

use crate::errors::{ToolError, ToolResult};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Carries the caller's input, never the canonical form.
    #[error("path escapes root: {0}")]
    Escapes(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Resolves `input` against `root` and proves the result stays inside it.
///
/// The target does not have to exist: the deepest existing ancestor is
/// canonicalized (resolving symlinks) and the rest is applied lexically.
/// Containment is checked on whole path components, so `/srv/box` never
/// admits `/srv/box-evil`.
pub fn ensure_within_root(root: &Path, input: &Path) -> Result<PathBuf, ResolveError> {
    // absolute inputs replace the root in the join, then face the same check
    let canon_root = dunce::canonicalize(root)?;
    let canon_path = canonicalize_lenient(&canon_root.join(input))?;
    if canon_path.starts_with(&canon_root) {
        Ok(canon_path)
    } else {
        Err(ResolveError::Escapes(input.display().to_string()))
    }
}

const MAX_LINK_HOPS: usize = 40;

fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    resolve_components(path, 0)
}

fn resolve_components(path: &Path, hops: usize) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                // missing components stay lexical; anything on disk is re-canonicalized
                let Ok(meta) = fs::symlink_metadata(&resolved) else { continue };
                match dunce::canonicalize(&resolved) {
                    Ok(canon) => resolved = canon,
                    // dangling link: follow its target so containment judges where it points
                    Err(e) if e.kind() == io::ErrorKind::NotFound && meta.file_type().is_symlink() => {
                        if hops >= MAX_LINK_HOPS {
                            return Err(io::Error::new(io::ErrorKind::Other, "too many levels of symbolic links"));
                        }
                        let target = fs::read_link(&resolved)?;
                        resolved.pop();
                        resolved = resolve_components(&resolved.join(target), hops + 1)?;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
    Ok(resolved)
}

/// Guard shared by every tool. `verb` names the attempted action in the
/// confinement message ("list", "access", "execute").
pub(crate) fn confine(root: &Path, input: &str, verb: &'static str) -> ToolResult<PathBuf> {
    ensure_within_root(root, Path::new(input)).map_err(|e| match e {
        ResolveError::Escapes(_) => {
            debug!(root = %root.display(), path = input, verb, "path outside root");
            ToolError::OutsideRoot { verb, path: input.to_string() }
        }
        ResolveError::Io(e) => ToolError::Io(e),
    })
}
