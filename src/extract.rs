use crate::error::AsrError;

const FINAL_MARKER: &str = "Final transcript:";
const PARTIAL_MARKER: &str = "transcript:";

/// Pulls the transcript text out of the remote CLI's free-form output.
///
/// The CLI interleaves progress chatter with transcript lines, so the last
/// reported final transcript wins: scan in reverse for a line carrying the
/// `Final transcript:` marker and return whatever follows it. When no such
/// summary line exists, fall back to collecting every `transcript:` line in
/// order, unquoting each piece and joining them with single spaces.
pub fn extract_transcript(raw: &str) -> Result<String, AsrError> {
    for line in raw.lines().rev() {
        if let Some(idx) = line.find(FINAL_MARKER) {
            let text = line[idx + FINAL_MARKER.len()..].trim();
            if !text.is_empty() {
                return Ok(text.to_string());
            }
            // First match from the end settles this tier even when empty.
            break;
        }
    }

    let mut pieces: Vec<&str> = Vec::new();
    for line in raw.lines() {
        if let Some(rest) = line.trim().strip_prefix(PARTIAL_MARKER) {
            let text = strip_quotes(rest.trim());
            if !text.is_empty() {
                pieces.push(text);
            }
        }
    }

    if pieces.is_empty() {
        return Err(AsrError::Extraction(
            "unable to extract transcript".to_string(),
        ));
    }
    Ok(pieces.join(" "))
}

/// Removes one pair of enclosing quotes, if present.
fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_marker_wins_over_partials() {
        let raw = "transcript: \"hello\"\nFinal transcript: world\n";
        assert_eq!(extract_transcript(raw).unwrap(), "world");
    }

    #[test]
    fn last_final_marker_wins() {
        let raw = "Final transcript: first pass\nsome progress line\nFinal transcript: second pass\n";
        assert_eq!(extract_transcript(raw).unwrap(), "second pass");
    }

    #[test]
    fn partials_join_in_order() {
        let raw = "transcript: \"a\"\ntranscript: \"b\"\n";
        assert_eq!(extract_transcript(raw).unwrap(), "a b");
    }

    #[test]
    fn partials_tolerate_indentation_and_single_quotes() {
        let raw = "  transcript: 'one'\nnoise line\n\ttranscript:  two  \n";
        assert_eq!(extract_transcript(raw).unwrap(), "one two");
    }

    #[test]
    fn no_marker_is_an_error() {
        let raw = "connecting to server...\ndone.\n";
        match extract_transcript(raw) {
            Err(AsrError::Extraction(msg)) => {
                assert_eq!(msg, "unable to extract transcript");
            }
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[test]
    fn empty_final_marker_falls_back_to_partials() {
        let raw = "transcript: \"kept\"\nFinal transcript:\n";
        assert_eq!(extract_transcript(raw).unwrap(), "kept");
    }

    #[test]
    fn mismatched_quotes_are_kept() {
        assert_eq!(strip_quotes("\"a'"), "\"a'");
        assert_eq!(strip_quotes("\"a\""), "a");
        assert_eq!(strip_quotes("'"), "'");
    }
}
