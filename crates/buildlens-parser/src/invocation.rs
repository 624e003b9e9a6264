//! Tokenization of a single cl.exe command line as it appears in MSBuild
//! output. Extraction is regex-driven except for the compiled-file list,
//! which is recovered by scanning the line backwards from its tail.

use buildlens_core::path::{absolutize, normalize_separators};
use once_cell::sync::Lazy;
use regex::Regex;

static DEFINE_RE: Lazy<Regex> = Lazy::new(|| {
    // Two value shapes after `/D `: fully quoted with \" escapes, or bare
    // with embedded quoted runs (BAR="a b").
    Regex::new(r#"(?:^|\s)/D\s+(?:"((?:\\.|[^"\\])*)"|([^\s"]*(?:"[^"]*"[^\s"]*)*))"#)
        .unwrap()
});

static INCLUDE_QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\s/I"([^"]+)""#).unwrap());
static INCLUDE_BARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\s/I([^\s"]+)"#).unwrap());

/// Does this line invoke the compiler? The executable must be the leading
/// path component; the same name appearing among the arguments does not
/// count.
pub(crate) fn is_compiler_invocation(line: &str, compiler_exe: &str) -> bool {
    let lower = line.trim_start().to_lowercase();
    let needle = format!("{} ", compiler_exe.to_lowercase());
    let Some(at) = lower.find(&needle) else {
        return false;
    };
    let before = &lower[..at];
    if before.contains(" /") {
        return false;
    }
    matches!(
        before.chars().next_back(),
        None | Some('\\') | Some('/') | Some('"')
    )
}

/// All `/D` preprocessor definitions, in command-line order. Quoting is
/// undone: `/D "FOO=\"x\""` yields `FOO="x"`, `/D BAR="a b"` yields
/// `BAR="a b"`.
pub(crate) fn parse_defines(line: &str) -> Vec<String> {
    let mut defines = Vec::new();
    for caps in DEFINE_RE.captures_iter(line) {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or("");
        let mut value = raw.to_string();
        // A trailing quote with no partner is a quoting artifact, not part
        // of the definition.
        if value.ends_with('"') && unescaped_quote_count(&value) % 2 == 1 {
            value.pop();
        }
        let value = value.replace("\\\"", "\"");
        if !value.is_empty() {
            defines.push(value);
        }
    }
    defines
}

fn unescaped_quote_count(value: &str) -> usize {
    let bytes = value.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'"' && (i == 0 || bytes[i - 1] != b'\\'))
        .count()
}

/// All `/I` include directories, quoted forms first, normalized to forward
/// slashes and absolutized against the project directory.
pub(crate) fn parse_includes(line: &str, project_dir: &str) -> Vec<String> {
    INCLUDE_QUOTED_RE
        .captures_iter(line)
        .chain(INCLUDE_BARE_RE.captures_iter(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| absolutize(&normalize_separators(m.as_str()), project_dir))
        .collect()
}

/// The source files compiled by this invocation. cl.exe puts them last, so
/// the line is walked backwards token by token until a `/`-flag is reached.
///
/// A token ending in `"` whose opening quote adjoins a previous token is one
/// argument with embedded spaces (`/Fd"a b.pdb"`), extended back to the
/// space. A bare `/D` flag means the token just collected was its value, not
/// a file.
pub(crate) fn parse_compiled_files(line: &str, project_dir: &str) -> Vec<String> {
    let chars: Vec<char> = line.trim_end().chars().collect();
    let mut files: Vec<String> = Vec::new();
    let mut end = chars.len() as isize - 1;

    while end >= 0 {
        while end >= 0 && chars[end as usize] == ' ' {
            end -= 1;
        }
        if end < 0 {
            break;
        }

        let quoted = chars[end as usize] == '"';
        if quoted {
            end -= 1;
        }

        // One position before the first char of the token
        let before = if quoted {
            let open = rfind(&chars, '"', end);
            if open < 0 {
                break;
            }
            if open > 0 && chars[open as usize - 1] != ' ' {
                rfind(&chars, ' ', open)
            } else {
                open
            }
        } else {
            rfind(&chars, ' ', end)
        };

        let token: String = chars[(before + 1) as usize..=end as usize].iter().collect();
        if token.starts_with('/') {
            if token == "/D" {
                // The previous token was this define's value
                files.pop();
            }
            break;
        }
        files.push(token.trim_end_matches('"').to_string());

        end = before - 1;
    }

    files.reverse();
    files
        .into_iter()
        .map(|f| absolutize(&normalize_separators(&f), project_dir))
        .collect()
}

fn rfind(chars: &[char], needle: char, from: isize) -> isize {
    let mut i = from;
    while i >= 0 {
        if chars[i as usize] == needle {
            return i;
        }
        i -= 1;
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"  C:\Program Files\VS\bin\cl.exe /c /Zi /nologo /D FOO=1 /D BAR="a b" /D "STR=\"quoted\"" /I"C:\inc 1" /Ic:\inc2 file1.cpp file2.cpp"#;

    #[test]
    fn test_detects_invocation_by_leading_component() {
        assert!(is_compiler_invocation(LINE, "cl.exe"));
        assert!(is_compiler_invocation("cl.exe /c a.cpp", "cl.exe"));
        assert!(is_compiler_invocation(
            r#"  C:\tools\shim-cl.exe /c a.cpp"#,
            "shim-cl.exe"
        ));
        // Same name as an argument is not an invocation
        assert!(!is_compiler_invocation(
            "  link.exe /OUT:cl.exe a.obj",
            "cl.exe"
        ));
        assert!(!is_compiler_invocation("  ClCompile:", "cl.exe"));
    }

    #[test]
    fn test_defines_keep_order_and_lose_quoting() {
        assert_eq!(
            parse_defines(LINE),
            vec![
                "FOO=1".to_string(),
                "BAR=\"a b\"".to_string(),
                "STR=\"quoted\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_define_with_stray_trailing_quote() {
        assert_eq!(
            parse_defines(r#"cl.exe /D "CMAKE_INTDIR=\"Debug\"" a.cpp"#),
            vec!["CMAKE_INTDIR=\"Debug\"".to_string()]
        );
    }

    #[test]
    fn test_includes_quoted_first_then_bare() {
        assert_eq!(
            parse_includes(LINE, "C:/proj/"),
            vec!["C:/inc 1".to_string(), "c:/inc2".to_string()]
        );
    }

    #[test]
    fn test_relative_include_absolutized_against_project_dir() {
        assert_eq!(
            parse_includes(r#"cl.exe /Iinc\sub a.cpp"#, "C:/proj/"),
            vec!["C:/proj/inc/sub".to_string()]
        );
    }

    #[test]
    fn test_compiled_files_scan_stops_at_flag() {
        assert_eq!(
            parse_compiled_files(LINE, "C:/proj/"),
            vec!["C:/proj/file1.cpp".to_string(), "C:/proj/file2.cpp".to_string()]
        );
    }

    #[test]
    fn test_quoted_flag_argument_is_not_a_file() {
        assert_eq!(
            parse_compiled_files(r#"cl.exe /c /Fd"a b.pdb" file.cpp"#, "C:/proj/"),
            vec!["C:/proj/file.cpp".to_string()]
        );
    }

    #[test]
    fn test_trailing_define_value_is_dropped() {
        assert_eq!(
            parse_compiled_files("cl.exe /c /D NDEBUG main.cpp", "C:/proj/"),
            vec!["C:/proj/main.cpp".to_string()]
        );
    }

    #[test]
    fn test_quoted_file_name_with_spaces() {
        assert_eq!(
            parse_compiled_files(r#"cl.exe /c "my file.cpp""#, "C:/proj/"),
            vec!["C:/proj/my file.cpp".to_string()]
        );
    }

    #[test]
    fn test_absolute_file_kept_as_is() {
        assert_eq!(
            parse_compiled_files(r#"cl.exe /c C:\other\x.cpp"#, "C:/proj/"),
            vec!["C:/other/x.cpp".to_string()]
        );
    }
}
