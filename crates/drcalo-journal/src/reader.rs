//! Reading frame streams back

use crate::{Error, Result};
use drcalo_core::Frame;
use std::io::BufRead;

/// Read every `(section, frame)` line of a RON stream
///
/// Blank lines are skipped. A malformed line fails with its 1-based number.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<(String, Frame)>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: (String, Frame) = ron::from_str(&line).map_err(|e| Error::Parse {
            line: index + 1,
            message: e.to_string(),
        })?;
        frames.push(entry);
    }
    tracing::debug!(frames = frames.len(), "frame stream read");
    Ok(frames)
}

/// Frames of one section, in stream order
pub fn section<'a>(
    frames: &'a [(String, Frame)],
    section: &'a str,
) -> impl Iterator<Item = &'a Frame> + 'a {
    frames
        .iter()
        .filter(move |(s, _)| s == section)
        .map(|(_, f)| f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_lines() {
        let text = "(\"events\",(collections:{},parameters:{}))\n\n(\"runs\",(collections:{},parameters:{}))\n";
        let frames = read_frames(text.as_bytes()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(section(&frames, "runs").count(), 1);
    }

    #[test]
    fn test_parse_error_has_line() {
        let text = "(\"events\",(collections:{},parameters:{}))\nnot a frame\n";
        match read_frames(text.as_bytes()) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
