use std::path::PathBuf;

#[derive(Debug)]
pub enum HostError {
    /// A required Flutter artefact is missing from the data directory.
    MissingAsset { kind: &'static str, path: PathBuf },
    /// A Win32 API call failed.
    Win32 { function: &'static str, code: u32 },
    /// The OS window was created but the hosted view refused to attach.
    WindowRejected,
    Io(std::io::Error),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::MissingAsset { kind, path } => {
                write!(f, "Missing {} at `{}`", kind, path.display())
            }
            HostError::Win32 { function, code } => {
                write!(f, "{function} failed (error {code:#010x})")
            }
            HostError::WindowRejected => {
                write!(f, "Window creation was aborted by the hosted view.")
            }
            HostError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        HostError::Io(e)
    }
}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for HostError {
    fn from(e: windows::core::Error) -> Self {
        HostError::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
