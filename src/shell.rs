// src/shell.rs

//! Splitting a command line string into argv tokens.

/// Split `line` on unquoted whitespace, roughly like POSIX `shlex`.
///
/// `"` and `'` group whitespace into one token. Quote characters are kept in
/// the token; this only tokenizes and never interprets or unescapes. Every
/// input character except separating whitespace is preserved.
pub fn split(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        if c.is_whitespace() && quote.is_none() {
            if let Some(token) = current.take() {
                result.push(token);
            }
            continue;
        }

        match quote {
            None if c == '"' || c == '\'' => quote = Some(c),
            Some(q) if c == q => quote = None,
            _ => {}
        }
        current.get_or_insert_with(String::new).push(c);
    }

    if let Some(token) = current {
        result.push(token);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_lines_give_no_tokens() {
        assert!(split("").is_empty());
        assert!(split(" \t\n ").is_empty());
    }

    #[test]
    fn splits_on_runs_of_whitespace() {
        assert_eq!(split("  gcloud   app\tdeploy "), vec!["gcloud", "app", "deploy"]);
    }

    #[test]
    fn quotes_group_and_are_preserved() {
        assert_eq!(
            split(r#"a "b c" 'd "e" f' g"#),
            vec!["a", r#""b c""#, r#"'d "e" f'"#, "g"]
        );
    }

    #[test]
    fn quote_inside_token_extends_it() {
        assert_eq!(split(r#"--msg="hello world" x"#), vec![r#"--msg="hello world""#, "x"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(split("a 'b c"), vec!["a", "'b c"]);
    }
}
