//! Minimal quote-aware comma-separated table reading and writing, shared by
//! the roster parser and the delivery log.

/// Parse comma-separated rows. Fields may be quoted; quoted fields can carry
/// commas, doubled quotes, and newlines. Blank lines are skipped.
pub(crate) fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_row(&mut rows, &mut row, &mut field);
            }
            '\n' => finish_row(&mut rows, &mut row, &mut field),
            _ => field.push(ch),
        }
    }
    finish_row(&mut rows, &mut row, &mut field);

    rows
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut String) {
    if row.is_empty() && field.is_empty() {
        return;
    }
    row.push(std::mem::take(field));
    rows.push(std::mem::take(row));
}

/// Render one row, quoting fields that contain separators, quotes, or
/// newlines. The trailing newline is included.
pub(crate) fn format_row(fields: &[&str]) -> String {
    let mut line = String::new();
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            line.push(',');
        }
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
        {
            line.push('"');
            line.push_str(&field.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(field);
        }
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_rows() {
        let rows = parse_rows("Day,Name\nMonday,Asha\n");
        assert_eq!(
            rows,
            vec![vec!["Day", "Name"], vec!["Monday", "Asha"]]
        );
    }

    #[test]
    fn skips_blank_lines() {
        let rows = parse_rows("a,b\n\nc,d\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn handles_quoted_commas_and_doubled_quotes() {
        let rows = parse_rows("a,\"x, y\",\"He said \"\"hi\"\"\"\n");
        assert_eq!(rows, vec![vec!["a", "x, y", "He said \"hi\""]]);
    }

    #[test]
    fn handles_newlines_inside_quoted_fields() {
        let rows = parse_rows("a,\"line one\nline two\"\nb,c\n");
        assert_eq!(
            rows,
            vec![vec!["a", "line one\nline two"], vec!["b", "c"]]
        );
    }

    #[test]
    fn handles_crlf_line_endings() {
        let rows = parse_rows("a,b\r\nc,d\r\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn preserves_empty_leading_fields() {
        let rows = parse_rows(",b\n");
        assert_eq!(rows, vec![vec!["", "b"]]);
    }

    #[test]
    fn format_row_quotes_only_when_needed() {
        assert_eq!(format_row(&["a", "b"]), "a,b\n");
        assert_eq!(format_row(&["a, b", "c\"d"]), "\"a, b\",\"c\"\"d\"\n");
        assert_eq!(format_row(&["line\nbreak"]), "\"line\nbreak\"\n");
    }

    #[test]
    fn round_trips_through_format_and_parse() {
        let line = format_row(&["Monday", "Lunch", "Asha", "Sweep, then mop"]);
        let rows = parse_rows(&line);
        assert_eq!(
            rows,
            vec![vec!["Monday", "Lunch", "Asha", "Sweep, then mop"]]
        );
    }
}
