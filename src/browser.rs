//! Open the HTML report in the default browser.
//!
//! - macOS: `open`
//! - Windows: `cmd /C start`
//! - Other Unix: `xdg-open`

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// File URL for a path.
pub fn file_url(path: &Path) -> String {
    let text = path.display().to_string().replace('\\', "/");
    if text.starts_with('/') {
        format!("file://{text}")
    } else {
        format!("file:///{text}")
    }
}

fn opener(url: &str) -> Command {
    #[cfg(target_os = "macos")]
    {
        let mut command = Command::new("open");
        command.arg(url);
        command
    }

    #[cfg(target_os = "windows")]
    {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", url]);
        command
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    }
}

/// Launch the platform opener for `path` without waiting for it.
pub fn open_in_browser(path: &Path) -> io::Result<()> {
    let url = file_url(path);
    tracing::debug!("Opening {url}");
    opener(&url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

/// Open `path`, logging a warning instead of failing.
pub fn try_open(path: &Path) {
    if let Err(e) = open_in_browser(path) {
        tracing::warn!("Could not open {} in a browser: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_unix() {
        assert_eq!(file_url(Path::new("/tmp/out.html")), "file:///tmp/out.html");
    }

    #[test]
    fn test_file_url_drive_letter() {
        assert_eq!(
            file_url(Path::new(r"C:\Users\me\out.html")),
            "file:///C:/Users/me/out.html"
        );
    }
}
