use provider_core::db::open_db_in_memory;
use provider_core::{
    AssignmentService, ErrorKind, MasterService, ServiceError, SqliteUnitOfWork,
    DEFAULT_MAX_COMPLEXITY,
};
use rusqlite::Connection;

fn masters(conn: &mut Connection) -> MasterService<SqliteUnitOfWork<'_>> {
    MasterService::new(SqliteUnitOfWork::try_new(conn).unwrap())
}

fn assignments(conn: &mut Connection) -> AssignmentService<SqliteUnitOfWork<'_>> {
    AssignmentService::new(SqliteUnitOfWork::try_new(conn).unwrap())
}

#[test]
fn create_master_uses_default_ceiling() {
    let mut conn = open_db_in_memory().unwrap();

    let master = masters(&mut conn).create_master("Ivanov", None).unwrap();
    assert_eq!(master.max_complexity, DEFAULT_MAX_COMPLEXITY);
    assert!(master.applications.is_empty());

    let custom = masters(&mut conn)
        .with_default_max_complexity(7)
        .create_master("Petrov", None)
        .unwrap();
    assert_eq!(custom.max_complexity, 7);
}

#[test]
fn create_master_rejects_blank_name() {
    let mut conn = open_db_in_memory().unwrap();
    let err = masters(&mut conn).create_master("  ", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(masters(&mut conn).list_masters().unwrap().is_empty());
}

#[test]
fn edit_master_is_partial() {
    let mut conn = open_db_in_memory().unwrap();
    let master = masters(&mut conn).create_master("Ivanov", Some(10)).unwrap();

    let renamed = masters(&mut conn)
        .edit_master(master.id, Some("Ivanov I."), None)
        .unwrap();
    assert_eq!(renamed.name, "Ivanov I.");
    assert_eq!(renamed.max_complexity, 10);

    let resized = masters(&mut conn)
        .edit_master(master.id, None, Some(12))
        .unwrap();
    assert_eq!(resized.name, "Ivanov I.");
    assert_eq!(resized.max_complexity, 12);
}

#[test]
fn edit_master_cannot_shrink_below_assigned_total() {
    let mut conn = open_db_in_memory().unwrap();
    let master = masters(&mut conn).create_master("Ivanov", Some(10)).unwrap();
    assignments(&mut conn)
        .add_application(master.id, "Lenina 1", Some(8))
        .unwrap();

    let err = masters(&mut conn)
        .edit_master(master.id, Some("Other"), Some(7))
        .unwrap_err();
    assert!(matches!(err, ServiceError::CapacityExceeded(ref e) if e.current_total == 8));

    let unchanged = masters(&mut conn).get_master(master.id).unwrap();
    assert_eq!(unchanged.name, "Ivanov");
    assert_eq!(unchanged.max_complexity, 10);

    let exact = masters(&mut conn)
        .edit_master(master.id, None, Some(8))
        .unwrap();
    assert_eq!(exact.max_complexity, 8);
}

#[test]
fn delete_master_cascades_and_disappears_from_listing() {
    let mut conn = open_db_in_memory().unwrap();
    let a = masters(&mut conn).create_master("A", Some(10)).unwrap();
    let b = masters(&mut conn).create_master("B", Some(10)).unwrap();
    let first = assignments(&mut conn)
        .add_application(a.id, "one", Some(2))
        .unwrap();
    let second = assignments(&mut conn)
        .add_application(a.id, "two", Some(3))
        .unwrap();

    assert_eq!(masters(&mut conn).delete_master(a.id).unwrap(), 2);

    let listed = masters(&mut conn).list_masters().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, b.id);
    assert!(listed
        .iter()
        .flat_map(|m| m.applications.iter())
        .all(|app| app.id != first.id && app.id != second.id));

    let err = masters(&mut conn).get_master(a.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = masters(&mut conn).delete_master(a.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn invariant_holds_across_mixed_operations() {
    let mut conn = open_db_in_memory().unwrap();
    let a = masters(&mut conn).create_master("A", Some(6)).unwrap();
    let b = masters(&mut conn).create_master("B", Some(4)).unwrap();

    let ops: Vec<(bool, i64)> = vec![(true, 3), (false, 2), (true, 3), (false, 3), (true, 1)];
    for (to_a, complexity) in ops {
        let target = if to_a { a.id } else { b.id };
        let _ = assignments(&mut conn).add_application(target, "job", Some(complexity));
    }
    let first_on_a = masters(&mut conn).get_master(a.id).unwrap().applications[0].id;
    let _ = assignments(&mut conn).transfer_application(a.id, b.id, first_on_a);

    for master in masters(&mut conn).list_masters().unwrap() {
        assert!(
            master.assigned_total() <= master.max_complexity,
            "master {} over capacity",
            master.name
        );
    }
}
