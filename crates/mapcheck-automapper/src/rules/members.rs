use super::{Finding, Rule, RuleContext};
use crate::descriptors::{MISSING_DESTINATION_PROPERTY, UNMAPPED_REQUIRED_PROPERTY};

/// Source members nothing on the destination side consumes.
pub struct MissingDestinationRule;

impl Rule for MissingDestinationRule {
    fn id(&self) -> &'static str {
        MISSING_DESTINATION_PROPERTY.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        for member in cx.matches.orphaned_sources() {
            out.push(Finding::for_member(
                &MISSING_DESTINATION_PROPERTY,
                member,
                vec![
                    member.to_string(),
                    cx.source.name.clone(),
                    cx.destination.name.clone(),
                ],
            ));
        }
    }
}

/// Required destination members that end up without a value. `Ignore()` and
/// `ForAllOtherMembers` leave a required member unset, so they do not count.
pub struct RequiredMemberRule;

impl Rule for RequiredMemberRule {
    fn id(&self) -> &'static str {
        UNMAPPED_REQUIRED_PROPERTY.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        let config = cx.config();
        for member in cx.destination.mappable_members() {
            if !member.is_required {
                continue;
            }
            let name_matched = cx
                .matches
                .destination(&member.name)
                .is_some_and(|m| m.is_name_match());
            let supplied = config
                .override_for(&member.name)
                .is_some_and(|o| o.kind.supplies_value());
            if name_matched || supplied {
                continue;
            }
            out.push(Finding::for_member(
                &UNMAPPED_REQUIRED_PROPERTY,
                member.name.clone(),
                vec![
                    member.name.clone(),
                    cx.destination.name.clone(),
                    cx.source.name.clone(),
                ],
            ));
        }
    }
}
