use crate::domain::model::{Funder, InputRow};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::is_in_domain;
use std::path::Path;

const MIN_COLUMNS: usize = 3;

/// Reads and validates the whole input file up front.
///
/// Any problem aborts the run: unreadable file, non UTF-8 content, a line that
/// does not end with a Unix line feed, fewer than three tab separated columns,
/// an empty required field, an unknown funder column, or (when configured) an
/// email outside the institutional domain.
pub struct InputReader<'a> {
    email_domain: Option<&'a str>,
}

impl<'a> InputReader<'a> {
    pub fn new(email_domain: Option<&'a str>) -> Self {
        Self { email_domain }
    }

    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<InputRow>> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let bytes = std::fs::read(path).map_err(|e| ImportError::InputError {
            path: display.clone(),
            message: format!("cannot read file: {}", e),
        })?;
        let text = String::from_utf8(bytes).map_err(|e| ImportError::InputError {
            path: display.clone(),
            message: format!("file is not valid UTF-8: {}", e),
        })?;

        self.parse(&display, &text)
    }

    pub fn parse(&self, path: &str, text: &str) -> Result<Vec<InputRow>> {
        let mut rows = Vec::new();

        for (index, raw_line) in text.split_inclusive('\n').enumerate() {
            let line_number = index + 1;
            let line_error = |message: String| ImportError::InputLineError {
                path: path.to_string(),
                line: line_number,
                message,
            };

            let line = raw_line
                .strip_suffix('\n')
                .ok_or_else(|| line_error("line does not end with a Unix line feed".to_string()))?;
            if line.ends_with('\r') {
                return Err(line_error(
                    "line ends with CRLF, expected a Unix line feed".to_string(),
                ));
            }

            let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
            if columns.len() < MIN_COLUMNS {
                return Err(line_error(format!(
                    "expected at least {} columns, found {}",
                    MIN_COLUMNS,
                    columns.len()
                )));
            }

            for (column, label) in [(0, "grant id"), (1, "name"), (2, "email")] {
                if columns[column].is_empty() {
                    return Err(line_error(format!("{} is empty", label)));
                }
            }

            let email = columns[2];
            if let Some(domain) = self.email_domain {
                if !is_in_domain(email, domain) {
                    return Err(line_error(format!(
                        "email {} is not in domain {}",
                        email, domain
                    )));
                }
            }

            let orcid = columns
                .get(3)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string());

            let funder = match columns.get(4).filter(|value| !value.is_empty()) {
                Some(value) => Some(
                    Funder::parse(value)
                        .ok_or_else(|| line_error(format!("unknown funder '{}'", value)))?,
                ),
                None => None,
            };

            rows.push(InputRow {
                line: line_number,
                grant_id: columns[0].to_string(),
                person_name: columns[1].to_string(),
                email: email.to_string(),
                orcid,
                funder,
            });
        }

        tracing::debug!("Read {} rows from {}", rows.len(), path);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(text: &str) -> Result<Vec<InputRow>> {
        InputReader::new(None).parse("grants.txt", text)
    }

    #[test]
    fn test_parse_minimal_and_full_rows() {
        let rows = parse(
            "2021-05377\tOlsson Louise\tlouise.olsson@chalmers.se\n\
             2022-00001\tAndersson Urban\turban.andersson@chalmers.se\t0000-0002-8308-0784\tformas\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[0].grant_id, "2021-05377");
        assert_eq!(rows[0].person_name, "Olsson Louise");
        assert_eq!(rows[0].orcid, None);
        assert_eq!(rows[0].funder, None);
        assert_eq!(rows[1].orcid.as_deref(), Some("0000-0002-8308-0784"));
        assert_eq!(rows[1].funder, Some(Funder::Formas));
    }

    #[test]
    fn test_empty_file_has_no_rows() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_two_columns_abort() {
        let err = parse("2021-05377\tOlsson Louise\tlouise.olsson@chalmers.se\n2021-1\tNo Mail\n")
            .unwrap_err();
        match err {
            ImportError::InputLineError { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("found 2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_line_endings_are_checked() {
        assert!(matches!(
            parse("2021-05377\tOlsson Louise\tlouise.olsson@chalmers.se\r\n"),
            Err(ImportError::InputLineError { line: 1, .. })
        ));
        assert!(matches!(
            parse("2021-05377\tOlsson Louise\tlouise.olsson@chalmers.se"),
            Err(ImportError::InputLineError { line: 1, .. })
        ));
    }

    #[test]
    fn test_blank_line_and_empty_email_abort() {
        assert!(parse("\n").is_err());
        assert!(parse("2021-05377\tOlsson Louise\t\n").is_err());
    }

    #[test]
    fn test_unknown_funder_column_aborts() {
        let err = parse("2021-05377\tOlsson Louise\tlouise.olsson@chalmers.se\t\tnsf\n").unwrap_err();
        assert!(err.to_string().contains("unknown funder"));
    }

    #[test]
    fn test_email_domain_is_enforced_when_configured() {
        let reader = InputReader::new(Some("chalmers.se"));
        assert!(reader
            .parse("grants.txt", "2021-05377\tOlsson Louise\tlouise.olsson@chalmers.se\n")
            .is_ok());
        assert!(reader
            .parse("grants.txt", "2021-05377\tOlsson Louise\tlouise@gmail.com\n")
            .is_err());
    }

    #[test]
    fn test_read_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("2021-05377\tÅström Åsa\tasa.astrom@chalmers.se\n".as_bytes())
            .unwrap();

        let rows = InputReader::new(None).read(file.path()).unwrap();
        assert_eq!(rows[0].display_name(), "Åsa Åström");
    }

    #[test]
    fn test_missing_and_non_utf8_files_abort() {
        assert!(matches!(
            InputReader::new(None).read("/nonexistent/grants.txt"),
            Err(ImportError::InputError { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"2021-05377\tOlsson \xff\tlouise@chalmers.se\n").unwrap();
        assert!(matches!(
            InputReader::new(None).read(file.path()),
            Err(ImportError::InputError { .. })
        ));
    }
}
