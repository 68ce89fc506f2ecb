//! The diagnostic catalog. Ids, arity, and argument order are a stable contract.

use mapcheck_types::{DiagnosticDescriptor, Severity};

pub static PROPERTY_TYPE_MISMATCH: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM001",
    name: "PropertyTypeMismatch",
    title: "Property type mismatch",
    message_format: "Property '{0}' type mismatch: source '{1}.{0}' ({2}) cannot be implicitly converted to destination '{3}.{0}' ({4})",
    default_severity: Severity::Error,
    arity: 5,
};

pub static NULLABLE_TO_NON_NULLABLE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM002",
    name: "NullableToNonNullable",
    title: "Nullable source mapped to non-nullable destination",
    message_format: "Property '{0}' maps nullable source '{1}.{0}' ({2}) to non-nullable destination '{3}.{0}' ({4}); null values are not handled",
    default_severity: Severity::Warning,
    arity: 5,
};

pub static NON_NULLABLE_TO_NULLABLE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM002",
    name: "NonNullableToNullable",
    title: "Non-nullable source mapped to nullable destination",
    message_format: "Property '{0}' maps non-nullable source '{1}.{0}' ({2}) to nullable destination '{3}.{0}' ({4})",
    default_severity: Severity::Info,
    arity: 5,
};

pub static COLLECTION_TYPE_INCOMPATIBILITY: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM003",
    name: "CollectionTypeIncompatibility",
    title: "Incompatible collection types",
    message_format: "Property '{0}' collection type incompatibility: source '{1}.{0}' ({2}) cannot be mapped to destination '{3}.{0}' ({4}) without an explicit conversion",
    default_severity: Severity::Warning,
    arity: 5,
};

pub static COLLECTION_ELEMENT_MISMATCH: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM021",
    name: "CollectionElementMismatch",
    title: "Collection element type mismatch",
    message_format: "Property '{0}' collection element mismatch: elements of source '{1}.{0}' ({2}) cannot be mapped to elements of destination '{3}.{0}' ({4})",
    default_severity: Severity::Warning,
    arity: 5,
};

pub static MISSING_DESTINATION_PROPERTY: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM004",
    name: "MissingDestinationProperty",
    title: "Source property has no destination",
    message_format: "Source property '{0}' on '{1}' has no corresponding property on destination '{2}' and will not be mapped",
    default_severity: Severity::Warning,
    arity: 3,
};

pub static CASE_SENSITIVITY_MISMATCH: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM005",
    name: "CaseSensitivityMismatch",
    title: "Property names differ only in case",
    message_format: "Source property '{0}' on '{1}' matches destination property '{2}' on '{3}' only by case-insensitive name",
    default_severity: Severity::Info,
    arity: 4,
};

pub static UNMAPPED_REQUIRED_PROPERTY: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM011",
    name: "UnmappedRequiredProperty",
    title: "Required destination property is not mapped",
    message_format: "Required destination property '{0}' on '{1}' is not mapped from source '{2}'",
    default_severity: Severity::Error,
    arity: 3,
};

pub static NESTED_OBJECT_MAPPING_MISSING: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM020",
    name: "NestedObjectMappingMissing",
    title: "Nested object mapping is missing",
    message_format: "Property '{0}' maps '{1}' to '{2}' but no CreateMap<{1}, {2}>() is configured",
    default_severity: Severity::Warning,
    arity: 3,
};

pub static SELF_REFERENCING_TYPE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM022",
    name: "SelfReferencingType",
    title: "Self-referencing type without a recursion guard",
    message_format: "Type '{0}' references itself through '{1}'; mapping '{2}' to '{3}' needs MaxDepth or PreserveReferences",
    default_severity: Severity::Warning,
    arity: 4,
};

pub static INDIRECT_RECURSION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM022",
    name: "IndirectRecursion",
    title: "Circular mapping chain without a recursion guard",
    message_format: "Mapping '{0}' to '{1}' is part of a circular mapping chain ({2}) without MaxDepth or PreserveReferences",
    default_severity: Severity::Warning,
    arity: 3,
};

pub static CONVERTER_NULL_HANDLING: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM030",
    name: "ConverterNullHandling",
    title: "Converter does not handle null input",
    message_format: "Converter '{0}' dereferences its nullable source ({1}) before checking it for null",
    default_severity: Severity::Warning,
    arity: 2,
};

pub static INVALID_CONVERTER_IMPLEMENTATION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM030",
    name: "InvalidConverterImplementation",
    title: "Converter does not implement its contract",
    message_format: "Converter '{0}' does not correctly implement {1}",
    default_severity: Severity::Error,
    arity: 2,
};

pub static UNUSED_CONVERTER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM030",
    name: "UnusedConverter",
    title: "Converter is never used",
    message_format: "Converter '{0}' is not used by any mapping",
    default_severity: Severity::Info,
    arity: 1,
};

pub static MISSING_CONVERT_USING: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM030",
    name: "MissingConvertUsing",
    title: "Conversion requires ConvertUsing",
    message_format: "Property '{0}' maps {1} to {2}, which needs a ConvertUsing configuration",
    default_severity: Severity::Warning,
    arity: 3,
};

pub static EXPENSIVE_OPERATION_IN_RESOLVER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM031",
    name: "ExpensiveOperationInResolver",
    title: "Expensive operation in resolver",
    message_format: "Resolver for property '{0}' performs an expensive or non-deterministic operation: {1}",
    default_severity: Severity::Warning,
    arity: 2,
};

pub static DUPLICATE_MAPPING_DECLARATION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "AM041",
    name: "DuplicateMappingDeclaration",
    title: "Mapping declared more than once",
    message_format: "Mapping from '{0}' to '{1}' is declared more than once; the last declaration wins",
    default_severity: Severity::Info,
    arity: 2,
};

/// Every descriptor, in catalog order.
pub static ALL: [&DiagnosticDescriptor; 17] = [
    &PROPERTY_TYPE_MISMATCH,
    &NULLABLE_TO_NON_NULLABLE,
    &NON_NULLABLE_TO_NULLABLE,
    &COLLECTION_TYPE_INCOMPATIBILITY,
    &COLLECTION_ELEMENT_MISMATCH,
    &MISSING_DESTINATION_PROPERTY,
    &CASE_SENSITIVITY_MISMATCH,
    &UNMAPPED_REQUIRED_PROPERTY,
    &NESTED_OBJECT_MAPPING_MISSING,
    &SELF_REFERENCING_TYPE,
    &INDIRECT_RECURSION,
    &CONVERTER_NULL_HANDLING,
    &INVALID_CONVERTER_IMPLEMENTATION,
    &UNUSED_CONVERTER,
    &MISSING_CONVERT_USING,
    &EXPENSIVE_OPERATION_IN_RESOLVER,
    &DUPLICATE_MAPPING_DECLARATION,
];
