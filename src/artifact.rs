//! On-disk artifacts: the candidate file and optional prompt dumps.
//!
//! The candidate is written to the output path before every check and left
//! in place however the session ends. With `--save-prompts`, every request
//! sent to the model is also dumped next to the output for offline
//! inspection.

use std::path::{Path, PathBuf};

use crate::domain::Transcript;
use crate::error::Result;

const DEBUG_DIR: &str = "debug_prompts";

/// Write candidate source to the output path, creating parent directories.
///
/// The file content is exactly the candidate source, no trailing newline
/// added. Callers compare it byte for byte against the accepted candidate.
pub fn write_candidate(path: &Path, source: &str) -> Result<()> {
    std::fs::create_dir_all(artifact_parent(path))?;
    std::fs::write(path, source)?;
    Ok(())
}

/// Dump the system prompt once per session.
pub fn save_system_prompt(output_path: &Path, system_prompt: &str) -> Result<PathBuf> {
    let dir = debug_prompt_dir(output_path);
    std::fs::create_dir_all(&dir)?;

    let path = dir.join("system_prompt.md");
    std::fs::write(&path, system_prompt)?;
    Ok(path)
}

/// Dump the full transcript sent for one iteration as pretty JSON.
pub fn save_conversation(
    output_path: &Path,
    iteration: u32,
    transcript: &Transcript,
) -> Result<PathBuf> {
    let dir = debug_prompt_dir(output_path);
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(format!("conversation_iter{iteration}.json"));
    std::fs::write(&path, serde_json::to_string_pretty(transcript)?)?;
    Ok(path)
}

fn debug_prompt_dir(output_path: &Path) -> PathBuf {
    artifact_parent(output_path).join(DEBUG_DIR)
}

/// Parent directory of an artifact, with `.` for bare relative names
fn artifact_parent(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_candidate_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/output.rfx");

        write_candidate(&path, "reflex demo {}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "reflex demo {}");
    }

    #[test]
    fn test_write_candidate_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("output.rfx");

        write_candidate(&path, "first attempt").unwrap();
        write_candidate(&path, "second attempt").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second attempt");
    }

    #[test]
    fn test_write_candidate_is_byte_exact() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("output.rfx");
        let source = "reflex demo {\n  loop {}\n}";

        write_candidate(&path, source).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), source.as_bytes());
    }

    #[test]
    fn test_save_system_prompt_location() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out/output.rfx");

        let saved = save_system_prompt(&output, "the prompt").unwrap();
        assert_eq!(saved, temp.path().join("out/debug_prompts/system_prompt.md"));
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "the prompt");
    }

    #[test]
    fn test_save_conversation_is_message_array() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("output.rfx");

        let mut transcript = Transcript::new("sys", "task");
        transcript.push_assistant("reply");

        let saved = save_conversation(&output, 2, &transcript).unwrap();
        assert!(saved.ends_with("debug_prompts/conversation_iter2.json"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
        let array = json.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[0]["role"], "system");
        assert_eq!(array[2]["content"], "reply");
    }
}
