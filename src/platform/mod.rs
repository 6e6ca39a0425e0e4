//! Platform-specific integration helpers.
//!
//! Keep OS quirks here to avoid leaking them into the core's walk and query
//! logic. Both capabilities are injected, so tests can substitute their own.

use std::io;
use std::path::{Path, PathBuf};

/// Produces the top-level locations an indexing session starts from.
pub trait RootProvider: Send + Sync {
    fn list_roots(&self) -> Vec<PathBuf>;
}

/// The machine's own roots: every mounted drive letter on Windows, `/` on
/// Linux and macOS, the home directory anywhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRoots;

impl RootProvider for SystemRoots {
    fn list_roots(&self) -> Vec<PathBuf> {
        let roots = platform_roots();
        if roots.is_empty() {
            return dirs::home_dir().into_iter().collect();
        }
        roots
    }
}

#[cfg(windows)]
fn platform_roots() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|drive| drive.exists())
        .collect()
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn platform_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}

#[cfg(not(any(windows, target_os = "linux", target_os = "macos")))]
fn platform_roots() -> Vec<PathBuf> {
    Vec::new()
}

/// A fixed list of roots, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub struct FixedRoots(pub Vec<PathBuf>);

impl RootProvider for FixedRoots {
    fn list_roots(&self) -> Vec<PathBuf> {
        self.0.clone()
    }
}

/// Hands a path to the desktop. Used by front ends for "open" actions on
/// result rows; the indexing and query paths never call it.
pub trait Opener: Send + Sync {
    fn open_default_handler(&self, path: &Path) -> io::Result<()>;

    fn open_containing_folder(&self, path: &Path) -> io::Result<()> {
        let folder = path.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no parent directory", path.display()),
            )
        })?;
        self.open_default_handler(folder)
    }
}

/// The production implementation that uses the `open` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open_default_handler(&self, path: &Path) -> io::Result<()> {
        tracing::info!("Opening {:?} with the default handler", path);
        open::that_detached(path)
    }
}
