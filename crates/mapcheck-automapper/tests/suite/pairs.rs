use super::analyze;
use mapcheck_test_utils::Fixture;
use mapcheck_types::{ChainedCall, MemberDef, SpecialType};
use pretty_assertions::assert_eq;

fn single_member(
    source_ty: impl FnOnce(&mut Fixture) -> mapcheck_types::TypeId,
    destination_ty: impl FnOnce(&mut Fixture) -> mapcheck_types::TypeId,
) -> Fixture {
    let mut fixture = Fixture::new();
    let source_ty = source_ty(&mut fixture);
    let destination_ty = destination_ty(&mut fixture);
    let source = fixture.class("Source", vec![MemberDef::property("Value", source_ty)]);
    let destination = fixture.class("Destination", vec![MemberDef::property("Value", destination_ty)]);
    fixture.create_map(source, destination, Vec::new());
    fixture
}

#[test]
fn numeric_widening_is_compatible() {
    let fixture = single_member(
        |f| f.special(SpecialType::Int32),
        |f| f.special(SpecialType::Int64),
    );
    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn numeric_narrowing_gets_a_cast() {
    let fixture = single_member(
        |f| f.special(SpecialType::Int64),
        |f| f.special(SpecialType::Int32),
    );
    let analyzed = analyze(&fixture);
    assert_eq!(analyzed.names(), vec![("PropertyTypeMismatch", Some("Value"))]);
    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(
        fixes[0].clauses[0].to_string(),
        ".ForMember(dest => dest.Value, opt => opt.MapFrom(src => (int)src.Value))"
    );
}

#[test]
fn enums_convert_to_strings_and_their_underlying_type() {
    let fixture = single_member(|f| f.enumeration("Status"), |f| f.string());
    assert_eq!(analyze(&fixture).render(), "");

    let fixture = single_member(|f| f.enumeration("Status"), |f| f.int());
    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn nullable_source_into_non_nullable_destination() {
    let fixture = single_member(
        |f| {
            let int = f.int();
            f.nullable(int)
        },
        |f| f.int(),
    );
    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(
        analyzed.render(),
        @"AM002 warning 10:9: Property 'Value' maps nullable source 'Source.Value' (int?) to non-nullable destination 'Destination.Value' (int); null values are not handled"
    );
    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(
        fixes[0].clauses[0].to_string(),
        ".ForMember(dest => dest.Value, opt => opt.MapFrom(src => src.Value ?? 0))"
    );
}

#[test]
fn non_nullable_into_nullable_is_informational_without_fix() {
    let fixture = single_member(
        |f| f.int(),
        |f| {
            let int = f.int();
            f.nullable(int)
        },
    );
    let analyzed = analyze(&fixture);
    assert_eq!(analyzed.names(), vec![("NonNullableToNullable", Some("Value"))]);
    assert_eq!(
        analyzed.result.diagnostics[0].diagnostic.severity,
        mapcheck_types::Severity::Info
    );
    assert!(analyzed.fixes(&fixture, 0).is_empty());
}

#[test]
fn annotated_reference_types_count_as_nullable() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let source = fixture.class(
        "Source",
        vec![MemberDef::property("Name", mapcheck_types::TypeRef::nullable(string))],
    );
    let destination = fixture.class("Destination", vec![MemberDef::property("Name", string)]);
    fixture.create_map(source, destination, Vec::new());

    let analyzed = analyze(&fixture);
    assert_eq!(analyzed.names(), vec![("NullableToNonNullable", Some("Name"))]);
    assert_eq!(analyzed.result.diagnostics[0].diagnostic.args[2], "string?");
    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(
        fixes[0].clauses[0].to_string(),
        ".ForMember(dest => dest.Name, opt => opt.MapFrom(src => src.Name ?? \"\"))"
    );
}

#[test]
fn element_mismatch_projects_each_element() {
    let fixture = single_member(
        |f| {
            let int = f.int();
            f.list_of(int)
        },
        |f| {
            let string = f.string();
            f.list_of(string)
        },
    );
    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(
        analyzed.render(),
        @"AM021 warning 10:9: Property 'Value' collection element mismatch: elements of source 'Source.Value' (int) cannot be mapped to elements of destination 'Destination.Value' (string)"
    );
    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(
        fixes[0].clauses[0].to_string(),
        ".ForMember(dest => dest.Value, opt => opt.MapFrom(src => src.Value.Select(x => x.ToString()).ToList()))"
    );
    assert_eq!(
        fixes[0].required_imports.iter().collect::<Vec<_>>(),
        vec!["System.Linq"]
    );
}

#[test]
fn arrays_and_lists_are_interchangeable() {
    let fixture = single_member(
        |f| {
            let string = f.string();
            f.array(string)
        },
        |f| {
            let string = f.string();
            f.list_of(string)
        },
    );
    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn stack_destination_is_constructed_from_the_source() {
    use mapcheck_types::symbols::well_known;
    let fixture = single_member(
        |f| {
            let string = f.string();
            f.list_of(string)
        },
        |f| {
            let string = f.string();
            f.generic(well_known::STACK, &[string])
        },
    );
    let analyzed = analyze(&fixture);
    assert_eq!(
        analyzed.names(),
        vec![("CollectionTypeIncompatibility", Some("Value"))]
    );
    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(
        fixes[0].clauses[0].to_string(),
        ".ForMember(dest => dest.Value, opt => opt.MapFrom(src => new Stack<string>(src.Value)))"
    );
    assert_eq!(
        fixes[0].required_imports.iter().collect::<Vec<_>>(),
        vec!["System.Collections.Generic"]
    );
}

#[test]
fn string_to_date_needs_a_converter() {
    let fixture = single_member(|f| f.string(), |f| f.special(SpecialType::DateTime));
    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(
        analyzed.render(),
        @"AM030 warning 10:9: Property 'Value' maps string to DateTime, which needs a ConvertUsing configuration"
    );

    let fixes = analyzed.fixes(&fixture, 0);
    let clauses: Vec<String> = fixes.iter().map(|fix| fix.clauses[0].to_string()).collect();
    assert_eq!(
        clauses,
        vec![
            ".ForMember(dest => dest.Value, opt => opt.MapFrom(src => string.IsNullOrEmpty(src.Value) ? default(DateTime) : DateTime.Parse(src.Value)))",
            ".ForMember(dest => dest.Value, opt => opt.ConvertUsing<StringToDateTimeConverter, string>(src => src.Value))",
            ".ForMember(dest => dest.Value, opt => opt.ConvertUsing(new StringToDateTimeConverter(), src => src.Value))",
        ]
    );

    let applied = fixes[1].apply(&analyzed.unit.text).unwrap();
    assert!(applied.ends_with(
        "}\n\npublic class StringToDateTimeConverter : IValueConverter<string, DateTime>\n{\n    public DateTime Convert(string sourceMember, ResolutionContext context)\n    {\n        return string.IsNullOrEmpty(sourceMember) ? default : DateTime.Parse(sourceMember);\n    }\n}\n"
    ));
}

#[test]
fn nested_complex_member_without_mapping() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let customer = fixture.class("Customer", vec![MemberDef::property("Name", string)]);
    let customer_dto = fixture.class("CustomerDto", vec![MemberDef::property("Name", string)]);
    let order = fixture.class("Order", vec![MemberDef::property("Customer", customer)]);
    let order_dto = fixture.class("OrderDto", vec![MemberDef::property("Customer", customer_dto)]);
    fixture.create_map(order, order_dto, Vec::new());

    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(
        analyzed.render(),
        @"AM020 warning 10:9: Property 'Customer' maps 'Customer' to 'CustomerDto' but no CreateMap<Customer, CustomerDto>() is configured"
    );

    // The sibling declaration is exactly what a second `create_map` renders.
    let fixes = analyzed.fixes(&fixture, 0);
    let mut fixed = fixture.clone();
    fixed.create_map(customer, customer_dto, Vec::new());
    assert_eq!(
        fixes[0].apply(&analyzed.unit.text).unwrap(),
        fixed.unit().text
    );
    assert_eq!(analyze(&fixed).render(), "");
}

#[test]
fn reverse_map_counts_as_a_nested_mapping() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let customer = fixture.class("Customer", vec![MemberDef::property("Name", string)]);
    let customer_dto = fixture.class("CustomerDto", vec![MemberDef::property("Name", string)]);
    let order = fixture.class("Order", vec![MemberDef::property("Customer", customer)]);
    let order_dto = fixture.class("OrderDto", vec![MemberDef::property("Customer", customer_dto)]);
    fixture.create_map(order, order_dto, Vec::new());
    fixture.create_map(
        customer_dto,
        customer,
        vec![ChainedCall::new("ReverseMap", Vec::new())],
    );

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn type_converter_replaces_member_rules() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let source = fixture.class(
        "Source",
        vec![
            MemberDef::property("Age", string),
            MemberDef::property("Notes", string),
        ],
    );
    let destination = fixture.class("Destination", vec![MemberDef::property("Age", int)]);
    fixture.create_map(
        source,
        destination,
        vec![ChainedCall::generic(
            "ConvertUsing",
            vec!["SourceConverter".to_string()],
            Vec::new(),
        )],
    );

    assert_eq!(analyze(&fixture).render(), "");
}
