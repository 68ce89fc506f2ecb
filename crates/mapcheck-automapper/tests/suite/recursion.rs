use super::analyze;
use mapcheck_test_utils::{for_member, Fixture};
use mapcheck_types::{ChainedCall, Expr, MemberDef, TypeId};
use pretty_assertions::assert_eq;

/// `Category { Name, Parent: Category }` and its DTO twin.
fn categories(fixture: &mut Fixture) -> (TypeId, TypeId) {
    let string = fixture.string();
    let category = fixture.class("Category", vec![MemberDef::property("Name", string)]);
    fixture.add_members(category, vec![MemberDef::property("Parent", category)]);
    let dto = fixture.class("CategoryDto", vec![MemberDef::property("Name", string)]);
    fixture.add_members(dto, vec![MemberDef::property("Parent", dto)]);
    (category, dto)
}

/// `Order -> Customer -> List<Order>` on both sides, with both mappings declared.
fn orders_and_customers(fixture: &mut Fixture) -> [(TypeId, TypeId); 2] {
    let string = fixture.string();
    let order = fixture.class("Order", Vec::new());
    let customer = fixture.class("Customer", vec![MemberDef::property("Name", string)]);
    let orders = fixture.list_of(order);
    fixture.add_members(order, vec![MemberDef::property("Customer", customer)]);
    fixture.add_members(customer, vec![MemberDef::property("Orders", orders)]);

    let order_dto = fixture.class("OrderDto", Vec::new());
    let customer_dto = fixture.class("CustomerDto", vec![MemberDef::property("Name", string)]);
    let order_dtos = fixture.list_of(order_dto);
    fixture.add_members(order_dto, vec![MemberDef::property("Customer", customer_dto)]);
    fixture.add_members(customer_dto, vec![MemberDef::property("Orders", order_dtos)]);

    [(order, order_dto), (customer, customer_dto)]
}

#[test]
fn self_referencing_type_without_guard() {
    let mut fixture = Fixture::new();
    let (category, dto) = categories(&mut fixture);
    fixture.create_map(category, dto, Vec::new());

    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(
        analyzed.render(),
        @"AM022 warning 10:9: Type 'Category' references itself through 'Parent'; mapping 'Category' to 'CategoryDto' needs MaxDepth or PreserveReferences"
    );
    assert_eq!(
        analyzed.result.diagnostics[0].diagnostic.args,
        vec!["Category", "Parent", "Category", "CategoryDto"]
    );

    let fixes = analyzed.fixes(&fixture, 0);
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].title, "Limit recursion with MaxDepth(3)");
    assert_eq!(fixes[0].clauses[0].to_string(), ".MaxDepth(3)");

    let mut fixed = Fixture::new();
    let (category, dto) = categories(&mut fixed);
    fixed.create_map(
        category,
        dto,
        vec![ChainedCall::new("MaxDepth", vec![Expr::int(3)])],
    );
    assert_eq!(
        fixes[0].apply(&analyzed.unit.text).unwrap(),
        fixed.unit().text
    );
    assert_eq!(analyze(&fixed).render(), "");
}

#[test]
fn member_level_depth_limit_is_a_guard() {
    let mut fixture = Fixture::new();
    let (category, dto) = categories(&mut fixture);
    fixture.create_map(
        category,
        dto,
        vec![for_member(
            "Parent",
            Expr::name("opt").call("MaxDepth", vec![Expr::int(2)]),
        )],
    );

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn depth_limit_on_another_member_does_not_guard_the_recursive_one() {
    let mut fixture = Fixture::new();
    let (category, dto) = categories(&mut fixture);
    fixture.create_map(
        category,
        dto,
        vec![for_member(
            "Name",
            Expr::name("opt").call("MaxDepth", vec![Expr::int(2)]),
        )],
    );

    assert_eq!(
        analyze(&fixture).names(),
        vec![("SelfReferencingType", Some("Parent"))]
    );
}

#[test]
fn preserve_references_is_a_guard() {
    let mut fixture = Fixture::new();
    let (category, dto) = categories(&mut fixture);
    fixture.create_map(
        category,
        dto,
        vec![ChainedCall::new("PreserveReferences", Vec::new())],
    );

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn indirect_cycle_is_reported_on_every_declaration() {
    let mut fixture = Fixture::new();
    let [(order, order_dto), (customer, customer_dto)] = orders_and_customers(&mut fixture);
    fixture.create_map(order, order_dto, Vec::new());
    fixture.create_map(customer, customer_dto, Vec::new());

    let analyzed = analyze(&fixture);
    insta::assert_snapshot!(analyzed.render(), @r###"
    AM022 warning 10:9: Mapping 'Order' to 'OrderDto' is part of a circular mapping chain (Order -> Customer -> Order) without MaxDepth or PreserveReferences
    AM022 warning 11:9: Mapping 'Customer' to 'CustomerDto' is part of a circular mapping chain (Customer -> Order -> Customer) without MaxDepth or PreserveReferences
    "###);
    assert_eq!(
        analyzed.names(),
        vec![("IndirectRecursion", None), ("IndirectRecursion", None)]
    );
}

#[test]
fn one_guard_breaks_the_whole_cycle() {
    let mut fixture = Fixture::new();
    let [(order, order_dto), (customer, customer_dto)] = orders_and_customers(&mut fixture);
    fixture.create_map(order, order_dto, Vec::new());
    fixture.create_map(
        customer,
        customer_dto,
        vec![ChainedCall::new("PreserveReferences", Vec::new())],
    );

    assert_eq!(analyze(&fixture).render(), "");
}

#[test]
fn type_converter_takes_its_declaration_out_of_the_cycle() {
    let mut fixture = Fixture::new();
    let [(order, order_dto), (customer, customer_dto)] = orders_and_customers(&mut fixture);
    fixture.create_map(order, order_dto, Vec::new());
    fixture.create_map(
        customer,
        customer_dto,
        vec![ChainedCall::new(
            "ConvertUsing",
            vec![Expr::new_object("CustomerConverter", Vec::new())],
        )],
    );

    assert_eq!(analyze(&fixture).render(), "");
}
