//! Integration test: organization membership.
//!
//! Adding a member writes the membership, a blank permission and the link
//! between them. A failure at any step must leave none of the three.

use rusqlite::Connection;

use pytition_db::queries::{organizations, permissions, users};
use pytition_integration_tests::{fresh_db, user};
use pytition_types::{Capability, OrganizationId, UserId};

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).expect("count")
}

fn setup(conn: &Connection) -> (OrganizationId, UserId) {
    let org = organizations::create(conn, "Greenpeace").expect("org");
    (org.id, user(conn, "ada"))
}

#[test]
fn add_member_writes_everything() {
    let conn = fresh_db();
    let (oid, uid) = setup(&conn);

    let permission = organizations::add_member(&conn, oid, uid).expect("add");

    let orgs = users::organizations(&conn, uid).expect("orgs");
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].id, oid);

    let held = users::permissions(&conn, uid).expect("permissions");
    assert_eq!(held, vec![permission.clone()]);
    assert_eq!(permission.organization_id, oid);
    assert!(Capability::ALL.iter().all(|c| !permission.allows(*c)));
    assert_eq!(
        permissions::label(&conn, permission.id).expect("label"),
        "Greenpeace : ada"
    );
}

#[test]
fn failed_permission_link_leaves_no_trace() {
    let conn = fresh_db();
    let (oid, uid) = setup(&conn);
    conn.execute_batch(
        "CREATE TRIGGER simulated_failure BEFORE INSERT ON user_permissions
         BEGIN SELECT RAISE(ABORT, 'simulated'); END;",
    )
    .expect("trigger");

    assert!(organizations::add_member(&conn, oid, uid).is_err());

    assert!(!organizations::is_member(&conn, oid, uid).expect("member"));
    assert!(users::organizations(&conn, uid).expect("orgs").is_empty());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM permissions"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM user_permissions"), 0);
}

#[test]
fn failed_permission_insert_leaves_no_trace() {
    let conn = fresh_db();
    let (oid, uid) = setup(&conn);
    conn.execute_batch(
        "CREATE TRIGGER simulated_failure BEFORE INSERT ON permissions
         BEGIN SELECT RAISE(ABORT, 'simulated'); END;",
    )
    .expect("trigger");

    assert!(organizations::add_member(&conn, oid, uid).is_err());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM user_organizations"), 0);

    // The same call succeeds once the fault is gone
    conn.execute_batch("DROP TRIGGER simulated_failure").expect("drop");
    organizations::add_member(&conn, oid, uid).expect("add");
    assert_eq!(users::permissions(&conn, uid).expect("permissions").len(), 1);
}

#[test]
fn invitation_round_trip() {
    let conn = fresh_db();
    let (oid, uid) = setup(&conn);

    assert!(organizations::invite(&conn, oid, uid).expect("invite"));
    assert_eq!(users::invitations(&conn, uid).expect("invitations").len(), 1);

    organizations::accept_invitation(&conn, oid, uid).expect("accept");
    assert!(users::invitations(&conn, uid).expect("invitations").is_empty());
    assert!(organizations::is_member(&conn, oid, uid).expect("member"));

    // Members are not invited again
    assert!(!organizations::invite(&conn, oid, uid).expect("invite"));
}

#[test]
fn removing_a_member_drops_its_permission() {
    let conn = fresh_db();
    let (oid, uid) = setup(&conn);
    organizations::add_member(&conn, oid, uid).expect("add");

    assert!(organizations::remove_member(&conn, oid, uid).expect("remove"));
    assert!(permissions::for_member(&conn, uid, oid).expect("lookup").is_none());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM permissions"), 0);
    assert!(!organizations::remove_member(&conn, oid, uid).expect("remove"));
}
