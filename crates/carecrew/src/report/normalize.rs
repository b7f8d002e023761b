use crate::pipeline::PipelineResult;

/// Collapses any result shape into a single string.
///
/// Never fails: shapes without a better rule fall back to `Display`.
pub fn normalize(result: PipelineResult) -> String {
    match result {
        PipelineResult::Text(text) => text,
        PipelineResult::Sequence(parts) => parts.join("\n"),
        PipelineResult::Composite(parts) => parts.join(" "),
        PipelineResult::Other(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(
            normalize(PipelineResult::Text("Likely flu.".to_owned())),
            "Likely flu."
        );
        assert_eq!(
            normalize(PipelineResult::Sequence(vec!["A".into(), "B".into()])),
            "A\nB"
        );
        assert_eq!(
            normalize(PipelineResult::Composite(vec![
                "Diagnosis:".into(),
                "flu".into()
            ])),
            "Diagnosis: flu"
        );
        assert_eq!(normalize(PipelineResult::Other(Box::new(42.5))), "42.5");
    }

    #[test]
    fn test_empty_shapes() {
        assert_eq!(normalize(PipelineResult::Sequence(vec![])), "");
        assert_eq!(normalize(PipelineResult::Text(String::new())), "");
    }
}
