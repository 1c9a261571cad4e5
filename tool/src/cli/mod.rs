pub mod hash;
pub mod render;

use leafweave_core::TranscodeError;

/// `CODE: message`, the shape every command reports failures in.
pub fn report(err: &TranscodeError) -> String {
    format!("{}: {}", err.code(), err)
}

pub fn io_report(code: &str, path: &std::path::Path, err: &std::io::Error) -> String {
    format!("{}: {}: {}", code, path.display(), err)
}
