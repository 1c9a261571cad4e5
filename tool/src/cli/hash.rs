use std::fs;
use std::path::Path;

use leafweave_core::content_fingerprint;

use super::io_report;

pub fn run(path: &Path, key: Option<&str>, hover: bool) -> Result<(), String> {
    let script = fs::read_to_string(path).map_err(|e| io_report("E_CLI_READ", path, &e))?;
    println!("{}", content_fingerprint(&script, key.unwrap_or(""), hover));
    Ok(())
}
