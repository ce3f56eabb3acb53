//! Integration test: templates, ownership and petition titles.
//!
//! 1. A template row is owned by a user or an organization, never both
//! 2. Petitions seeded from a template copy its settings
//! 3. Deleting a default template clears the pointer on its owner
//! 4. Plain-text titles drop markup and decode entities

use pytition_db::queries::{organizations, ownership, petitions, templates, users};
use pytition_db::DbError;
use pytition_integration_tests::{fresh_db, user};
use pytition_types::owner::Owner;
use pytition_types::{NewPetition, NewTemplate, OwnerRef, ValidationError};

#[test]
fn ownership_is_exclusive() {
    let conn = fresh_db();
    let uid = user(&conn, "ada");
    let org = organizations::create(&conn, "Org").expect("org");
    let template = templates::insert(&conn, &NewTemplate::named("t")).expect("template");

    assert!(matches!(
        ownership::insert(&conn, Some(uid), Some(org.id), template.id),
        Err(DbError::Validation(ValidationError::OwnerAmbiguous))
    ));

    // Storage refuses the row even when the check is bypassed
    let raw = conn.execute(
        "INSERT INTO template_ownerships (user_id, organization_id, template_id)
         VALUES (?1, ?2, ?3)",
        [uid, org.id, template.id],
    );
    assert!(raw.is_err());
    assert!(ownership::for_template(&conn, template.id)
        .expect("rows")
        .is_empty());
}

#[test]
fn templates_are_listed_per_owner() {
    let conn = fresh_db();
    let uid = user(&conn, "ada");
    let org = organizations::create(&conn, "Org").expect("org");

    ownership::create_template_for(&conn, OwnerRef::User(uid), &NewTemplate::named("mine"))
        .expect("user template");
    ownership::create_template_for(&conn, org.owner_ref(), &NewTemplate::named("ours"))
        .expect("org template");

    let mine = users::templates(&conn, uid).expect("user templates");
    let ours = organizations::templates(&conn, org.id).expect("org templates");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "mine");
    assert_eq!(ours.len(), 1);
    assert_eq!(ours[0].name, "ours");
}

#[test]
fn petition_from_template_copies_settings() {
    let conn = fresh_db();
    let mut preset = NewTemplate::named("preset");
    preset.target = Some(1200);
    preset.content.text = "<p>Body</p>".into();
    let template = templates::insert(&conn, &preset).expect("template");

    let petition = petitions::insert(&conn, &NewPetition::from_template(&template, "Seeded"))
        .expect("petition");
    assert_eq!(petition.target, 1200);
    assert_eq!(petition.content, template.content);
    assert_eq!(petition.raw_text(), "Body");
}

#[test]
fn deleting_default_template_clears_pointer() {
    let conn = fresh_db();
    let org = organizations::create(&conn, "Org").expect("org");
    let template =
        ownership::create_template_for(&conn, org.owner_ref(), &NewTemplate::named("default"))
            .expect("template");
    organizations::set_default_template(&conn, org.id, Some(template.id)).expect("set default");

    assert!(templates::delete(&conn, template.id).expect("delete"));

    let org = organizations::require(&conn, org.id).expect("org");
    assert_eq!(org.default_template_id, None);
    assert!(organizations::templates(&conn, org.id)
        .expect("templates")
        .is_empty());
}

#[test]
fn raw_title_strips_markup() {
    let conn = fresh_db();
    let stored = petitions::insert(&conn, &NewPetition::titled("<b>Hello</b> &amp; co"))
        .expect("petition");
    let petition = petitions::require(&conn, stored.id).expect("petition");

    assert_eq!(petition.title, "<b>Hello</b> &amp; co");
    assert_eq!(petition.raw_title(), "Hello & co");
}
