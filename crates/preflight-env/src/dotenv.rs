use std::collections::BTreeMap;
use std::path::Path;

use crate::EnvError;

/// Parses `KEY=VALUE` lines. Supports `#` comments, blank lines, an optional
/// `export ` prefix and single- or double-quoted values. Later duplicates win.
pub fn parse_dotenv(file: &str, content: &str) -> Result<BTreeMap<String, String>, EnvError> {
    let mut out = BTreeMap::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let err = |reason: &str| EnvError::Dotenv {
            file: file.to_string(),
            line: line_no,
            reason: reason.to_string(),
        };

        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);

        let (key, value) = line.split_once('=').ok_or_else(|| err("expected KEY=VALUE"))?;
        let key = key.trim();
        if !is_valid_key(key) {
            return Err(err("invalid key"));
        }
        let value = parse_value(value.trim()).map_err(err)?;
        out.insert(key.to_string(), value);
    }
    Ok(out)
}

pub fn load_dotenv(path: &Path) -> Result<BTreeMap<String, String>, EnvError> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| EnvError::io(shown.clone(), e))?;
    parse_dotenv(&shown, &content)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn parse_value(v: &str) -> Result<String, &'static str> {
    for quote in ['"', '\''] {
        let Some(rest) = v.strip_prefix(quote) else { continue };
        let end = closing_quote(rest, quote).ok_or("unterminated quote")?;
        let tail = rest[end + 1..].trim_start();
        if !tail.is_empty() && !tail.starts_with('#') {
            return Err("unexpected text after closing quote");
        }
        let inner = &rest[..end];
        return Ok(match quote {
            '"' => inner.replace("\\n", "\n").replace("\\\"", "\""),
            _ => inner.to_string(),
        });
    }
    // inline comment on unquoted values
    let v = match v.find(" #") {
        Some(i) => v[..i].trim_end(),
        None => v,
    };
    Ok(v.to_string())
}

/// Byte offset of the closing quote. Backslash escapes only apply inside
/// double quotes.
fn closing_quote(s: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' && quote == '"' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_env_file() {
        let src = "\
# database
DB_PASSWORD=s3cr3t
export JWT_SECRET=\"abc 123\"
ENCRYPTION_KEY='k#ey'
EMPTY=
TZ=Europe/Luxembourg # comment
ROTATED=\"abc 123\" # rotated 2024
SINGLE='x y'   # note
ESCAPED=\"say \\\"hi\\\"\"
";
        let m = parse_dotenv(".env", src).unwrap();
        assert_eq!(m["DB_PASSWORD"], "s3cr3t");
        assert_eq!(m["JWT_SECRET"], "abc 123");
        assert_eq!(m["ENCRYPTION_KEY"], "k#ey");
        assert_eq!(m["EMPTY"], "");
        assert_eq!(m["TZ"], "Europe/Luxembourg");
        assert_eq!(m["ROTATED"], "abc 123");
        assert_eq!(m["SINGLE"], "x y");
        assert_eq!(m["ESCAPED"], "say \"hi\"");
    }

    #[test]
    fn reports_line_of_malformed_entry() {
        let err = parse_dotenv(".env", "A=1\nnot a pair\n").unwrap_err();
        match err {
            EnvError::Dotenv { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn rejects_unterminated_quote_and_bad_keys() {
        assert!(parse_dotenv(".env", "A=\"open\n").is_err());
        assert!(parse_dotenv(".env", "A='open\n").is_err());
        assert!(parse_dotenv(".env", "A=\"x\" trailing\n").is_err());
        assert!(parse_dotenv(".env", "1A=x\n").is_err());
        assert!(parse_dotenv(".env", "=x\n").is_err());
    }

    #[test]
    fn later_duplicates_win() {
        let m = parse_dotenv(".env", "A=1\nA=2\n").unwrap();
        assert_eq!(m["A"], "2");
    }
}
