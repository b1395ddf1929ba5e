//! User interaction operations (confirmation prompts, line input).

use anyhow::{Result, bail};

use super::RealRuntime;

use std::io::{self, BufRead, Write};

/// Reads one answer from `input` after writing `prompt [y/N]` to `output`.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Reads one line from `input` after writing `prompt` to `output`.
pub(crate) fn read_line_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    write!(output, "{}: ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("No input available for '{}'", prompt);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut stdin_lock = stdin.lock();
        confirm_with_io(prompt, &mut stdin_lock, &mut stdout)
    }

    pub(crate) fn read_line_impl(&self, prompt: &str) -> Result<String> {
        let stdin = io::stdin();
        let mut stderr = io::stderr();
        let mut stdin_lock = stdin.lock();
        read_line_with_io(prompt, &mut stdin_lock, &mut stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::{confirm_with_io, read_line_with_io};
    use anyhow::Result;
    use std::io::Cursor;

    #[test]
    fn confirms_yes_and_short_y() -> Result<()> {
        let cases = vec!["y\n", "Y\n", "yes\n", " YES \n", "  y  \n"];
        for case in cases {
            let mut input = Cursor::new(case.as_bytes());
            let mut output = Vec::new();
            let ok = confirm_with_io("Delete photo?", &mut input, &mut output)?;
            assert!(ok, "expected '{}' to be accepted as yes", case);
            let out = String::from_utf8(output)?;
            assert!(out.contains("Delete photo? [y/N]"));
        }
        Ok(())
    }

    #[test]
    fn rejects_no_and_empty() -> Result<()> {
        let cases = vec!["n\n", "no\n", "\n", "  \n", "other\n"];
        for case in cases {
            let mut input = Cursor::new(case.as_bytes());
            let mut output = Vec::new();
            let ok = confirm_with_io("Delete photo?", &mut input, &mut output)?;
            assert!(!ok, "expected '{}' to be rejected as no", case);
        }
        Ok(())
    }

    #[test]
    fn reads_line_without_newline() -> Result<()> {
        let mut input = Cursor::new(b"hunter2\r\n".as_slice());
        let mut output = Vec::new();
        let line = read_line_with_io("Password", &mut input, &mut output)?;
        assert_eq!(line, "hunter2");
        assert_eq!(String::from_utf8(output)?, "Password: ");
        Ok(())
    }

    #[test]
    fn read_line_fails_on_eof() {
        let mut input = Cursor::new(b"".as_slice());
        let mut output = Vec::new();
        assert!(read_line_with_io("Password", &mut input, &mut output).is_err());
    }
}
