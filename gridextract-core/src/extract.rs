//! Line-oriented value lookup in simulation input and result files.
//!
//! Every key is searched independently from the first line, so one line
//! can answer several keys and the first matching line always wins.

use std::path::Path;

use crate::config::RunConventions;
use crate::error::{ExtractError, Result, SourceKind};
use crate::keymap::KeyMapping;
use crate::record::SimulationRecord;

/// Returns the first line (1-based number and text) accepted by `matches`.
fn first_matching_line<'a>(
    text: &'a str,
    mut matches: impl FnMut(&str) -> bool,
) -> Option<(usize, &'a str)> {
    text.lines()
        .enumerate()
        .find(|(_, line)| matches(line))
        .map(|(idx, line)| (idx + 1, line))
}

/// Add the input parameters named in `mapping` to `record`.
///
/// A key is found on the first line that contains it anywhere; the value is
/// that line's first whitespace-separated token.
///
/// # Errors
///
/// Returns [`ExtractError::MissingKey`] if no line contains a key, naming
/// the key and `source`.
pub fn extract_input_parameters(
    text: &str,
    mapping: &KeyMapping,
    source: &Path,
    mut record: SimulationRecord,
) -> Result<SimulationRecord> {
    for entry in mapping.iter() {
        let key = entry.source_key.as_str();
        let (line_no, line) = first_matching_line(text, |line| line.contains(key)).ok_or_else(
            || ExtractError::MissingKey {
                key: key.to_string(),
                kind: SourceKind::Input,
                path: source.to_path_buf(),
            },
        )?;
        let value = line
            .split_whitespace()
            .next()
            .ok_or_else(|| ExtractError::MalformedLine {
                key: key.to_string(),
                path: source.to_path_buf(),
                line: line_no,
                field: 0,
            })?;
        record.insert(entry.output_name.clone(), value);
    }
    Ok(record)
}

/// Add the result values named in `mapping` to `record`.
///
/// A key is found on the first line starting with the result prefix followed
/// by the key (`value CII_158 ...`); the value is the configured field of that
/// line split on the result separator.
///
/// # Errors
///
/// Returns [`ExtractError::MissingKey`] if no line matches a key and
/// [`ExtractError::MalformedLine`] if the matching line has too few fields.
pub fn extract_result_values(
    text: &str,
    mapping: &KeyMapping,
    conventions: &RunConventions,
    source: &Path,
    mut record: SimulationRecord,
) -> Result<SimulationRecord> {
    for entry in mapping.iter() {
        let key = entry.source_key.as_str();
        let prefix = format!("{}{key}", conventions.result_prefix);
        let (line_no, line) = first_matching_line(text, |line| line.starts_with(&prefix))
            .ok_or_else(|| ExtractError::MissingKey {
                key: key.to_string(),
                kind: SourceKind::Result,
                path: source.to_path_buf(),
            })?;
        let value = line
            .split(conventions.result_separator.as_str())
            .nth(conventions.result_field)
            .ok_or_else(|| ExtractError::MalformedLine {
                key: key.to_string(),
                path: source.to_path_buf(),
                line: line_no,
                field: conventions.result_field,
            })?;
        record.insert(entry.output_name.clone(), value.trim());
    }
    Ok(record)
}

/// Build the record of one run from its input and result file contents.
///
/// Input parameters are added first, result values second, so a result
/// column sharing a name with an input column wins.
///
/// # Errors
///
/// Propagates the first extraction error of either file.
pub fn extract_record(
    run: &str,
    input: (&Path, &str),
    result: (&Path, &str),
    input_params: &KeyMapping,
    result_lines: &KeyMapping,
    conventions: &RunConventions,
) -> Result<SimulationRecord> {
    let record = SimulationRecord::new(run);
    let record = extract_input_parameters(input.1, input_params, input.0, record)?;
    let record = extract_result_values(result.1, result_lines, conventions, result.0, record)?;
    log::debug!("run {run}: extracted {} values", record.len());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> KeyMapping {
        KeyMapping::from_pairs(pairs.iter().copied(), Path::new("map.csv")).unwrap()
    }

    const INPUT: &str = "\
PDR17G1E20 model grid
1.0E+05  gas density P0
1.0E+00  radiation field G0 (Draine)
2.0E+01  Av max
";

    const RESULT: &str = "\
# header line # ignored # 0
value CII_158  something # unit # 2.3456E-07
value CII_158  duplicate # unit # 9.9999E-09
value CO_10 line # erg cm-2 s-1 sr-1 # 1.2E-09 # trailing
";

    #[test]
    fn input_value_is_first_token_of_first_matching_line() {
        let map = mapping(&[("P0", "gas_density")]);
        let record =
            extract_input_parameters(INPUT, &map, Path::new("run.in"), SimulationRecord::new("run"))
                .unwrap();
        assert_eq!(record.get("gas_density"), Some("1.0E+05"));
    }

    #[test]
    fn substring_match_anywhere_on_the_line() {
        let map = mapping(&[("gas density", "gas_density")]);
        let record =
            extract_input_parameters(INPUT, &map, Path::new("run.in"), SimulationRecord::new("run"))
                .unwrap();
        assert_eq!(record.get("gas_density"), Some("1.0E+05"));
    }

    #[test]
    fn one_line_can_satisfy_several_keys() {
        let map = mapping(&[("P0", "density"), ("gas", "gas")]);
        let record =
            extract_input_parameters(INPUT, &map, Path::new("run.in"), SimulationRecord::new("run"))
                .unwrap();
        assert_eq!(record.get("density"), Some("1.0E+05"));
        assert_eq!(record.get("gas"), Some("1.0E+05"));
    }

    #[test]
    fn each_key_rescans_from_the_top() {
        // "Av" only appears on the last line, "model" on the first.
        let map = mapping(&[("Av", "avmax"), ("model", "title")]);
        let record =
            extract_input_parameters(INPUT, &map, Path::new("run.in"), SimulationRecord::new("run"))
                .unwrap();
        assert_eq!(record.get("avmax"), Some("2.0E+01"));
        assert_eq!(record.get("title"), Some("PDR17G1E20"));
    }

    #[test]
    fn missing_input_key_names_key_and_path() {
        let map = mapping(&[("P0", "gas_density"), ("Zmet", "metallicity")]);
        let err = extract_input_parameters(
            INPUT,
            &map,
            Path::new("inputs/run001.in"),
            SimulationRecord::new("run001"),
        )
        .unwrap_err();
        match err {
            ExtractError::MissingKey { key, kind, path } => {
                assert_eq!(key, "Zmet");
                assert_eq!(kind, SourceKind::Input);
                assert_eq!(path, Path::new("inputs/run001.in"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn result_value_is_third_field_of_first_prefixed_line() {
        let map = mapping(&[("CII_158", "CII158"), ("CO_10", "CO10")]);
        let record = extract_result_values(
            RESULT,
            &map,
            &RunConventions::default(),
            Path::new("run_s_20.stat"),
            SimulationRecord::new("run"),
        )
        .unwrap();
        assert_eq!(record.get("CII158"), Some("2.3456E-07"));
        assert_eq!(record.get("CO10"), Some("1.2E-09"));
    }

    #[test]
    fn result_key_must_start_the_line() {
        let text = "  value CII_158 # u # 1.0\nother value CII_158 # u # 2.0\n";
        let map = mapping(&[("CII_158", "CII158")]);
        let err = extract_result_values(
            text,
            &map,
            &RunConventions::default(),
            Path::new("results/run_s_20.stat"),
            SimulationRecord::new("run"),
        )
        .unwrap_err();
        match err {
            ExtractError::MissingKey { key, kind, path } => {
                assert_eq!(key, "CII_158");
                assert_eq!(kind, SourceKind::Result);
                assert_eq!(path, Path::new("results/run_s_20.stat"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn result_line_without_value_field_is_malformed() {
        let text = "value CII_158 # only two fields\n";
        let map = mapping(&[("CII_158", "CII158")]);
        let err = extract_result_values(
            text,
            &map,
            &RunConventions::default(),
            Path::new("run_s_20.stat"),
            SimulationRecord::new("run"),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedLine { line: 1, field: 2, .. }));
    }

    #[test]
    fn crlf_line_endings_do_not_leak_into_values() {
        let text = "value CII_158 x # u # 3.0E-05\r\n";
        let map = mapping(&[("CII_158", "CII158")]);
        let record = extract_result_values(
            text,
            &map,
            &RunConventions::default(),
            Path::new("run_s_20.stat"),
            SimulationRecord::new("run"),
        )
        .unwrap();
        assert_eq!(record.get("CII158"), Some("3.0E-05"));
    }

    #[test]
    fn record_combines_both_files_and_result_wins_on_name_clash() {
        let inputs = mapping(&[("P0", "shared"), ("G0", "radm")]);
        let results = mapping(&[("CII_158", "shared")]);
        let record = extract_record(
            "run001",
            (Path::new("run001.in"), INPUT),
            (Path::new("run001_s_20.stat"), RESULT),
            &inputs,
            &results,
            &RunConventions::default(),
        )
        .unwrap();
        assert_eq!(record.run(), "run001");
        assert_eq!(record.get("radm"), Some("1.0E+00"));
        assert_eq!(record.get("shared"), Some("2.3456E-07"));
        assert_eq!(record.len(), 2);
    }
}
