use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use super::PdfError;

/// Environment variables consulted, in order, when no explicit path is set.
const ENV_HINTS: [&str; 3] = ["CHROME_PATH", "GOOGLE_CHROME_SHIM", "PLAYWRIGHT_BROWSERS_PATH"];

const UNIX_CANDIDATES: [&str; 6] = [
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

/// Locate the Chrome executable. Relative explicit paths resolve against
/// `base`, the workspace root.
pub fn discover(explicit: Option<&Path>, base: &Path) -> Result<PathBuf, PdfError> {
    let lookup = |name: &str| env::var_os(name);
    let candidates = platform_candidates(&lookup);
    discover_with(explicit, base, lookup, &candidates)
}

fn discover_with<F>(
    explicit: Option<&Path>,
    base: &Path,
    lookup: F,
    candidates: &[PathBuf],
) -> Result<PathBuf, PdfError>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(explicit) = explicit {
        let resolved = if explicit.is_absolute() {
            explicit.to_path_buf()
        } else {
            base.join(explicit)
        };
        if !resolved.exists() {
            return Err(PdfError::ExplicitMissing {
                path: resolved.display().to_string(),
            });
        }
        log_choice("explicit", &resolved);
        return Ok(resolved);
    }

    for name in ENV_HINTS {
        let Some(value) = lookup(name).filter(|value| !value.is_empty()) else {
            continue;
        };
        let path = PathBuf::from(value);
        if path.is_file() {
            log_choice(name, &path);
            return Ok(path);
        }
        debug!(
            target = "application::pdf::discovery",
            op = "discovery::discover",
            hint = name,
            path = %path.display(),
            "Ignoring hint that is not an executable file"
        );
    }

    match candidates.iter().find(|candidate| candidate.is_file()) {
        Some(found) => {
            log_choice("well_known", found);
            Ok(found.clone())
        }
        None => Err(PdfError::NotFound),
    }
}

fn platform_candidates<F>(lookup: &F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    if cfg!(windows) {
        ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
            .into_iter()
            .filter_map(|name| lookup(name))
            .map(|root| {
                PathBuf::from(root)
                    .join("Google")
                    .join("Chrome")
                    .join("Application")
                    .join("chrome.exe")
            })
            .collect()
    } else {
        UNIX_CANDIDATES.iter().map(PathBuf::from).collect()
    }
}

fn log_choice(source: &str, path: &Path) {
    info!(
        target = "application::pdf::discovery",
        op = "discovery::discover",
        source,
        executable = %path.display(),
        "Using Chrome executable"
    );
}
