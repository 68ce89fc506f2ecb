//! Settles overlapping findings for the same member.
//!
//! Several pair rules can fire for one destination member (a case-insensitive
//! match whose types also differ, a set mapped to a list of other elements).
//! Only the semantically deepest one is kept:
//!
//! container > nested mapping = missing `ConvertUsing` > element > type = nullability > case
//!
//! Everything outside that family passes through untouched.

use crate::descriptors::{
    CASE_SENSITIVITY_MISMATCH, COLLECTION_ELEMENT_MISMATCH, COLLECTION_TYPE_INCOMPATIBILITY,
    MISSING_CONVERT_USING, NESTED_OBJECT_MAPPING_MISSING, NON_NULLABLE_TO_NULLABLE,
    NULLABLE_TO_NON_NULLABLE, PROPERTY_TYPE_MISMATCH,
};
use crate::rules::Finding;
use mapcheck_types::DiagnosticDescriptor;
use std::collections::HashMap;

fn rank(descriptor: &DiagnosticDescriptor) -> Option<u8> {
    let ranked: [(&DiagnosticDescriptor, u8); 8] = [
        (&COLLECTION_TYPE_INCOMPATIBILITY, 6),
        (&NESTED_OBJECT_MAPPING_MISSING, 5),
        (&MISSING_CONVERT_USING, 5),
        (&COLLECTION_ELEMENT_MISMATCH, 4),
        (&PROPERTY_TYPE_MISMATCH, 3),
        (&NULLABLE_TO_NON_NULLABLE, 3),
        (&NON_NULLABLE_TO_NULLABLE, 3),
        (&CASE_SENSITIVITY_MISMATCH, 1),
    ];
    ranked
        .iter()
        .find(|(candidate, _)| std::ptr::eq(*candidate, descriptor))
        .map(|(_, rank)| *rank)
}

/// Keep at most one pair-family finding per member: the highest-ranked one,
/// and of equal ranks the first. Relative order of the survivors is preserved.
pub fn resolve(findings: Vec<Finding>) -> Vec<Finding> {
    let mut best: HashMap<&str, (usize, u8)> = HashMap::new();
    for (idx, finding) in findings.iter().enumerate() {
        let (Some(member), Some(rank)) = (finding.member.as_deref(), rank(finding.descriptor))
        else {
            continue;
        };
        match best.get(member) {
            Some((_, current)) if *current >= rank => {}
            _ => {
                best.insert(member, (idx, rank));
            }
        }
    }

    let keep: Vec<bool> = findings
        .iter()
        .enumerate()
        .map(|(idx, finding)| {
            match (finding.member.as_deref(), rank(finding.descriptor)) {
                (Some(member), Some(_)) => best.get(member).is_some_and(|(kept, _)| *kept == idx),
                _ => true,
            }
        })
        .collect();

    findings
        .into_iter()
        .zip(keep)
        .filter_map(|(finding, keep)| keep.then_some(finding))
        .collect()
}
