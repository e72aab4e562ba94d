//! Custom field engine tests against Postgres.

use super::common::*;
use clubhouse_core::{
    AttributeCondition, AttributePredicate, Category, ClubError, MemberFilter,
};

pub async fn test_define_and_scope_fields(ctx: &TestContext) {
    println!("  🧪 test_define_and_scope_fields");
    ctx.reset().await;

    let fields = &ctx.services.fields;
    let amka = fields
        .define_field("ΑΜΚΑ", categories(&[Category::Members, Category::Athletes]))
        .await
        .unwrap();
    let school = fields
        .define_field("School", categories(&[Category::Students]))
        .await
        .unwrap();

    let for_athletes = fields.fields_for_category(Category::Athletes).await.unwrap();
    assert_eq!(for_athletes.len(), 1);
    assert_eq!(for_athletes[0].id, amka.id);
    assert_eq!(for_athletes[0].categories, amka.categories);

    let for_students = fields.fields_for_category(Category::Students).await.unwrap();
    assert_eq!(for_students[0].id, school.id);
    assert!(fields
        .fields_for_category(Category::Interested)
        .await
        .unwrap()
        .is_empty());

    let err = fields
        .define_field("  school ", categories(&[Category::Members]))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("label"));

    println!("     ✓ Fields scoped to their categories; duplicate labels rejected");
}

pub async fn test_set_value_on_wrong_category(ctx: &TestContext) {
    println!("  🧪 test_set_value_on_wrong_category");
    ctx.reset().await;

    let amka = ctx
        .services
        .fields
        .define_field("ΑΜΚΑ", categories(&[Category::Members, Category::Athletes]))
        .await
        .unwrap();
    let student = ctx
        .services
        .members
        .create(person("Anna", "Georgiou", Category::Students, None))
        .await
        .unwrap();

    let err = ctx
        .services
        .fields
        .set_value(student.id, amka.id, "12345678901")
        .await
        .unwrap_err();
    assert_eq!(err, ClubError::not_applicable());
    assert_eq!(attribute_rows(ctx).await, 0);

    println!("     ✓ Constraint error, nothing stored");
}

pub async fn test_set_clear_and_filter_values(ctx: &TestContext) {
    println!("  🧪 test_set_clear_and_filter_values");
    ctx.reset().await;

    let size = ctx
        .services
        .fields
        .define_field("Shirt size", categories(&Category::ALL))
        .await
        .unwrap();
    let a = ctx
        .services
        .members
        .create(person("A", "Alpha", Category::Members, None))
        .await
        .unwrap();
    let b = ctx
        .services
        .members
        .create(person("B", "Beta", Category::Athletes, None))
        .await
        .unwrap();

    ctx.services.fields.set_value(a.id, size.id, "XL").await.unwrap();
    ctx.services.fields.set_value(b.id, size.id, "M").await.unwrap();
    ctx.services.fields.set_value(b.id, size.id, "L").await.unwrap();

    let equals_xl = MemberFilter {
        attributes: vec![AttributePredicate::new(
            size.id,
            AttributeCondition::Equals(" xl ".into()),
        )],
        ..Default::default()
    };
    let hits = ctx.services.members.list(equals_xl).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, a.id);

    let b_loaded = ctx.services.members.get(b.id).await.unwrap();
    assert_eq!(b_loaded.attribute(size.id), Some("L"));

    ctx.services.fields.set_value(a.id, size.id, "   ").await.unwrap();
    let is_set = MemberFilter {
        attributes: vec![AttributePredicate::new(size.id, AttributeCondition::IsSet)],
        ..Default::default()
    };
    let hits = ctx.services.members.list(is_set).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, b.id);

    println!("     ✓ Upsert, clear and attribute predicates work in SQL");
}

pub async fn test_delete_field_cascades(ctx: &TestContext) {
    println!("  🧪 test_delete_field_cascades");
    ctx.reset().await;

    let fields = &ctx.services.fields;
    let size = fields
        .define_field("Shirt size", categories(&Category::ALL))
        .await
        .unwrap();
    let club = fields
        .define_field("Home club", categories(&Category::ALL))
        .await
        .unwrap();
    let a = ctx
        .services
        .members
        .create(person("A", "Alpha", Category::Members, None))
        .await
        .unwrap();
    fields.set_value(a.id, size.id, "S").await.unwrap();
    fields.set_value(a.id, club.id, "Athens BC").await.unwrap();
    assert_eq!(attribute_rows(ctx).await, 2);

    fields.delete_field(size.id).await.unwrap();
    assert_eq!(attribute_rows(ctx).await, 1);
    let loaded = ctx.services.members.get(a.id).await.unwrap();
    assert_eq!(loaded.attribute(club.id), Some("Athens BC"));

    let err = fields.delete_field(size.id).await.unwrap_err();
    assert_eq!(err, ClubError::field_not_found(size.id));

    println!("     ✓ Field deletion removes only its own values");
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n🏷️  Custom Field Tests");
    test_define_and_scope_fields(ctx).await;
    test_set_value_on_wrong_category(ctx).await;
    test_set_clear_and_filter_values(ctx).await;
    test_delete_field_cascades(ctx).await;
}
