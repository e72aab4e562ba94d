//! Member repository tests against Postgres.

use super::common::*;
use clubhouse_core::{
    Category, CategoryDetails, ClubError, MemberFilter, MemberPatch, MemberStatus, Month,
};

pub async fn test_create_and_get_round_trip(ctx: &TestContext) {
    println!("  🧪 test_create_and_get_round_trip");
    ctx.reset().await;

    let mut draft = person("Maria", "Papadopoulou", Category::Members, Some("maria@club.gr"));
    draft.phone = Some("2101234567".into());
    draft.year = Some(2019);
    draft.details = CategoryDetails::Members {
        joined_month: Some(Month::March),
        subscription_year: Some(2025),
    };
    let created = ctx.services.members.create(draft).await.unwrap();
    let loaded = ctx.services.members.get(created.id).await.unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.details.month(), Some(Month::March));
    assert_eq!(loaded.details.subscription_year(), Some(2025));

    let mut student = person("Eleni", "Markou", Category::Students, None);
    student.details = CategoryDetails::Students {
        period_month: Some(Month::October),
        university: true,
    };
    let student = ctx.services.members.create(student).await.unwrap();
    assert_eq!(student.details.university(), Some(true));

    println!("     ✓ Scalar columns and category details survive storage");
}

pub async fn test_validation_and_not_found(ctx: &TestContext) {
    println!("  🧪 test_validation_and_not_found");
    ctx.reset().await;

    let err = ctx
        .services
        .members
        .create(person("", "Nobody", Category::Members, None))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("first_name"));

    let err = ctx
        .services
        .members
        .update(4242, MemberPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, ClubError::member_not_found(4242));

    let err = ctx.services.members.delete(4242).await.unwrap_err();
    assert_eq!(err, ClubError::member_not_found(4242));

    println!("     ✓ Validation and stale ids reported");
}

pub async fn test_filters_and_ordering(ctx: &TestContext) {
    println!("  🧪 test_filters_and_ordering");
    ctx.reset().await;

    let members = &ctx.services.members;
    let mut a = person("Zoe", "Alexiou", Category::Members, Some("zoe@gmail.com"));
    a.year = Some(2015);
    let mut b = person("Anna", "Alexiou", Category::Members, Some("anna@club.gr"));
    b.status = MemberStatus::Inactive;
    b.year = Some(2020);
    let mut c = person("Petros", "Vlachos", Category::Athletes, Some("petros@gmail.com"));
    c.year = Some(2018);
    let d = person("Eleni", "Markou", Category::Students, None);
    for m in [a, b, c, d] {
        members.create(m).await.unwrap();
    }

    let names = |list: Vec<clubhouse_core::Member>| {
        list.into_iter().map(|m| m.full_name()).collect::<Vec<_>>()
    };

    assert_eq!(
        names(members.list(MemberFilter::default()).await.unwrap()),
        vec!["Anna Alexiou", "Zoe Alexiou", "Eleni Markou", "Petros Vlachos"]
    );

    let inactive = MemberFilter {
        status: Some(MemberStatus::Inactive),
        ..Default::default()
    };
    assert_eq!(names(members.list(inactive).await.unwrap()), vec!["Anna Alexiou"]);

    let gmail_recent = MemberFilter {
        email_contains: Some("GMAIL".into()),
        year_from: Some(2016),
        ..Default::default()
    };
    assert_eq!(
        names(members.list(gmail_recent).await.unwrap()),
        vec!["Petros Vlachos"]
    );

    let by_name = MemberFilter {
        name_contains: Some("alex".into()),
        category: Some(Category::Members),
        ..Default::default()
    };
    assert_eq!(members.list(by_name).await.unwrap().len(), 2);

    let counts = members.category_counts().await.unwrap();
    assert_eq!(counts.members, 2);
    assert_eq!(counts.athletes, 1);
    assert_eq!(counts.students, 1);
    assert_eq!(counts.total(), 4);

    println!("     ✓ SQL filters agree with the in-memory semantics");
}

pub async fn test_category_change_drops_attributes(ctx: &TestContext) {
    println!("  🧪 test_category_change_drops_attributes");
    ctx.reset().await;

    let amka = ctx
        .services
        .fields
        .define_field("ΑΜΚΑ", categories(&[Category::Members]))
        .await
        .unwrap();
    let notes = ctx
        .services
        .fields
        .define_field("Notes", categories(&Category::ALL))
        .await
        .unwrap();

    let mut draft = person("Giorgos", "Nikolaou", Category::Members, None);
    draft.attributes.insert(amka.id, "01018012345".into());
    draft.attributes.insert(notes.id, "left-handed".into());
    let created = ctx.services.members.create(draft).await.unwrap();
    assert_eq!(created.attributes.len(), 2);

    let moved = ctx
        .services
        .members
        .update(
            created.id,
            MemberPatch {
                details: Some(CategoryDetails::Athletes {
                    federation_number: Some("12034".into()),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.category(), Category::Athletes);
    assert_eq!(moved.details.federation_number(), Some("12034"));
    assert_eq!(moved.attribute(amka.id), None);
    assert_eq!(moved.attribute(notes.id), Some("left-handed"));
    assert_eq!(attribute_rows(ctx).await, 1);

    println!("     ✓ Inapplicable values removed with the category change");
}

pub async fn test_delete_cascades_attributes(ctx: &TestContext) {
    println!("  🧪 test_delete_cascades_attributes");
    ctx.reset().await;

    let notes = ctx
        .services
        .fields
        .define_field("Notes", categories(&Category::ALL))
        .await
        .unwrap();
    let mut draft = person("A", "B", Category::Interested, None);
    draft.attributes.insert(notes.id, "met at tournament".into());
    let created = ctx.services.members.create(draft).await.unwrap();
    assert_eq!(attribute_rows(ctx).await, 1);

    ctx.services.members.delete(created.id).await.unwrap();
    assert_eq!(attribute_rows(ctx).await, 0);

    println!("     ✓ Deleting a member removes its attribute rows");
}

pub async fn test_find_duplicate(ctx: &TestContext) {
    println!("  🧪 test_find_duplicate");
    ctx.reset().await;

    let members = &ctx.services.members;
    members
        .create(person("Eleni", "Kosta", Category::Members, Some("eleni@example.com")))
        .await
        .unwrap();
    members
        .create(person("Nikos", "Pappas", Category::Members, None))
        .await
        .unwrap();

    assert!(members
        .find_duplicate("ELENI", " kosta ", Some("Eleni@Example.COM"))
        .await
        .unwrap()
        .is_some());
    assert!(members
        .find_duplicate("Eleni", "Kosta", None)
        .await
        .unwrap()
        .is_none());
    assert!(members
        .find_duplicate("nikos", "pappas", None)
        .await
        .unwrap()
        .is_some());

    println!("     ✓ Duplicates matched case-insensitively");
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n👥 Member Tests");
    test_create_and_get_round_trip(ctx).await;
    test_validation_and_not_found(ctx).await;
    test_filters_and_ordering(ctx).await;
    test_category_change_drops_attributes(ctx).await;
    test_delete_cascades_attributes(ctx).await;
    test_find_duplicate(ctx).await;
}
