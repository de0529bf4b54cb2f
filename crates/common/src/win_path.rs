//! Drive-letter handling for absolute program paths on Windows.
//!
//! `cmd.exe` splits `C:\Program Files\tool.exe` at the space, so an absolute
//! program path is turned into `C: && cd "<dir>" && "<file>"`.

use crate::{escape_arg, Platform};

fn drive_position(bytes: &[u8]) -> Option<usize> {
    if bytes.get(1) == Some(&b':') && bytes[0].is_ascii_alphabetic() {
        return Some(1);
    }
    if bytes.get(2) == Some(&b':')
        && matches!(bytes[0], b'"' | b'\'')
        && bytes[1].is_ascii_alphabetic()
    {
        return Some(2);
    }
    None
}

fn split_dir_base(path: &str) -> Option<(&str, &str)> {
    let idx = path.rfind(['\\', '/'])?;
    let dir = &path[..idx];
    let base = &path[idx + 1..];
    if dir.ends_with(':') {
        // keep the drive root: `C:\tool.exe` lives in `C:\`
        Some((&path[..=idx], base))
    } else {
        Some((dir, base))
    }
}

/// Rewrite an absolute Windows program path so the shell switches drive and
/// directory before running the program.
///
/// The path may be wrapped in a leading quote (`"C:\Program Files\x.exe"`);
/// the quotes are removed before splitting and both halves are re-quoted.
/// Commands without a drive letter, such as relative paths or bare program
/// names, are returned unchanged, and so are drive-relative forms with no
/// separator (`C:`, `C:tool.exe`).
pub fn rewrite_absolute_command(command: &str) -> String {
    let Some(position) = drive_position(command.as_bytes()) else {
        return command.to_string();
    };

    let drive = &command[position - 1..position];
    let path = if position == 2 {
        let quote = &command[..1];
        let unquoted = &command[1..];
        unquoted.strip_suffix(quote).unwrap_or(unquoted)
    } else {
        command
    };

    let Some((dir, base)) = split_dir_base(path) else {
        return command.to_string();
    };
    format!(
        "{drive}: && cd {} && {}",
        escape_arg(dir, Platform::Windows, None),
        escape_arg(base, Platform::Windows, None)
    )
}
