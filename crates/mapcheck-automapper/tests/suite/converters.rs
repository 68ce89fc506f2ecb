use super::analyze;
use mapcheck_test_utils::{for_member, src, Fixture, TYPE_CONVERTER, VALUE_CONVERTER};
use mapcheck_types::{
    ChainedCall, Expr, Literal, MemberDef, MethodDef, Stmt, TypeDef, TypeId,
};
use pretty_assertions::assert_eq;

fn resolution_context(fixture: &mut Fixture) -> TypeId {
    fixture
        .store
        .add_type(TypeDef::class("AutoMapper.ResolutionContext"))
}

/// `Convert(string sourceMember, ResolutionContext context)` returning int.
fn value_convert(fixture: &mut Fixture, body: Vec<Stmt>) -> MethodDef {
    let string = fixture.string();
    let int = fixture.int();
    let context = resolution_context(fixture);
    MethodDef::new("Convert")
        .param("sourceMember", string)
        .param("context", context)
        .returns(int)
        .body(body)
}

fn parse_member() -> Expr {
    Expr::name("int").call("Parse", vec![Expr::name("sourceMember")])
}

/// `string.IsNullOrEmpty(sourceMember) ? 0 : int.Parse(sourceMember)`.
fn guarded_parse() -> Expr {
    Expr::Conditional {
        condition: Box::new(
            Expr::name("string").call("IsNullOrEmpty", vec![Expr::name("sourceMember")]),
        ),
        when_true: Box::new(Expr::int(0)),
        when_false: Box::new(parse_member()),
    }
}

/// `Source { Age: string } -> Destination { Age: int }` using `AgeConverter`.
fn map_age_with_converter(fixture: &mut Fixture) {
    let string = fixture.string();
    let int = fixture.int();
    let source = fixture.class("Source", vec![MemberDef::property("Age", string)]);
    let destination = fixture.class("Destination", vec![MemberDef::property("Age", int)]);
    fixture.create_map(
        source,
        destination,
        vec![for_member(
            "Age",
            Expr::name("opt").call_generic(
                "ConvertUsing",
                vec!["AgeConverter".to_string(), "string".to_string()],
                vec![Expr::lambda("src", src("Age"))],
            ),
        )],
    );
}

#[test]
fn unused_converter_that_dereferences_its_input() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let convert = value_convert(&mut fixture, vec![Stmt::Return(Some(parse_member()))]);
    fixture.converter("AgeConverter", VALUE_CONVERTER, string, int, convert);

    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(analyzed.render(), @r###"
    AM030 warning 13:14: Converter 'AgeConverter' dereferences its nullable source (string) before checking it for null
    AM030 info 13:14: Converter 'AgeConverter' is not used by any mapping
    "###);
    assert!(analyzed
        .result
        .diagnostics
        .iter()
        .all(|d| d.declaration.is_none()));
    assert!(analyzed.fixes(&fixture, 0).is_empty());
}

#[test]
fn referenced_converter_with_a_null_guard_is_clean() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let convert = value_convert(&mut fixture, vec![Stmt::Return(Some(guarded_parse()))]);
    fixture.converter("AgeConverter", VALUE_CONVERTER, string, int, convert);
    map_age_with_converter(&mut fixture);

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn guard_statement_before_the_dereference() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let body = vec![
        Stmt::If {
            condition: Expr::binary(
                mapcheck_types::BinaryOp::Eq,
                Expr::name("sourceMember"),
                Expr::null(),
            ),
            then_branch: vec![Stmt::Return(Some(Expr::Literal(Literal::Default)))],
            else_branch: Vec::new(),
        },
        Stmt::Return(Some(parse_member())),
    ];
    let convert = value_convert(&mut fixture, body);
    fixture.converter("AgeConverter", VALUE_CONVERTER, string, int, convert);
    map_age_with_converter(&mut fixture);

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn class_without_a_converter_contract() {
    let mut fixture = Fixture::new();
    fixture.converter_candidate("AgeHelper");

    let analyzed = analyze(&fixture);
    assert_eq!(
        analyzed.names(),
        vec![
            ("InvalidConverterImplementation", None),
            ("UnusedConverter", None)
        ]
    );
    assert_eq!(
        analyzed.result.diagnostics[0].diagnostic.message,
        "Converter 'AgeHelper' does not correctly implement ITypeConverter<TSource, TDestination> or IValueConverter<TSourceMember, TDestinationMember>"
    );
}

#[test]
fn convert_method_with_the_wrong_return_type() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let int = fixture.int();
    let context = resolution_context(&mut fixture);
    let convert = MethodDef::new("Convert")
        .param("sourceMember", string)
        .param("context", context)
        .returns(string);
    fixture.converter("AgeConverter", VALUE_CONVERTER, string, int, convert);
    map_age_with_converter(&mut fixture);

    let analyzed = analyze(&fixture);
    assert_eq!(
        analyzed.names(),
        vec![("InvalidConverterImplementation", None)]
    );
    assert_eq!(
        analyzed.result.diagnostics[0].diagnostic.args,
        vec!["AgeConverter", "IValueConverter<string, int>"]
    );
}

#[test]
fn type_converter_referenced_by_the_declaration() {
    let mut fixture = Fixture::new();
    let string = fixture.string();
    let source = fixture.class("Source", vec![MemberDef::property("Code", string)]);
    let destination = fixture.class("Destination", vec![MemberDef::property("Label", string)]);
    let context = resolution_context(&mut fixture);
    let convert = MethodDef::new("Convert")
        .param("source", source)
        .param("destination", destination)
        .param("context", context)
        .returns(destination)
        .body(vec![Stmt::Return(Some(Expr::new_object(
            "Destination",
            Vec::new(),
        )))]);
    fixture.converter("OrderConverter", TYPE_CONVERTER, source, destination, convert);
    fixture.create_map(
        source,
        destination,
        vec![ChainedCall::generic(
            "ConvertUsing",
            vec!["OrderConverter".to_string()],
            Vec::new(),
        )],
    );

    assert_eq!(analyze(&fixture).render(), "");
}
