use super::Classification;

/// Render classification results as a display string, one
/// `(confidence): label` line per result.
pub fn format_classifications(results: &[Classification]) -> String {
    if results.is_empty() {
        return "Nothing recognized.".to_string();
    }

    results
        .iter()
        .map(|c| format!("({:.2}): {}", c.confidence, c.label))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_results() {
        assert_eq!(format_classifications(&[]), "Nothing recognized.");
    }

    #[test]
    fn test_formats_one_line_per_result() {
        let results = vec![
            Classification {
                label: "espresso".to_string(),
                confidence: 0.91,
            },
            Classification {
                label: "cup".to_string(),
                confidence: 0.05,
            },
        ];

        assert_eq!(
            format_classifications(&results),
            "(0.91): espresso\n(0.05): cup"
        );
    }
}
