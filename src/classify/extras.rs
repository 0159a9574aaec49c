// Line-independent options offered for every failure line
use crate::classify::types::LineOption;
use crate::model::FailureLineContext;

/// Build the `manual` and `ignore` options, in that order
///
/// The ignore option carries `is_best` when the autoclassifier explicitly
/// recommends ignoring the line.
pub fn extra_options(context: &FailureLineContext) -> [LineOption; 2] {
    let manual = LineOption::manual(&context.id);
    let mut ignore = LineOption::ignore(&context.id);
    ignore.is_best = context.best_is_ignore();
    [manual, ignore]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::types::OptionType;
    use crate::model::{BestClassification, LineMetadata};

    #[test]
    fn test_extras_order() {
        let extras = extra_options(&FailureLineContext::new("5", ""));
        assert_eq!(extras[0].option_type, OptionType::Manual);
        assert_eq!(extras[1].option_type, OptionType::Ignore);
        assert!(!extras[1].is_best);
    }

    #[test]
    fn test_ignore_marked_best() {
        let mut ctx = FailureLineContext::new("5", "");
        ctx.metadata = Some(LineMetadata {
            best_classification: Some(BestClassification {
                id: None,
                bug_number: Some(0),
            }),
        });
        let extras = extra_options(&ctx);
        assert!(extras[1].is_best);
        assert!(!extras[0].is_best);
    }
}
