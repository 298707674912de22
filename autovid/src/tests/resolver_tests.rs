use rusqlite::Connection;

use crate::errors::AutomationError;
use crate::resolver::SiteResolver;

fn seeded(rows: &[(&str, i64)], sites: &[(i64, &str)]) -> SiteResolver {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE Sites (ID INTEGER PRIMARY KEY, SiteName TEXT);
         CREATE TABLE DvrCameras (Name TEXT, Dvr_ID INTEGER);",
    )
    .unwrap();
    for (id, name) in sites {
        conn.execute("INSERT INTO Sites (ID, SiteName) VALUES (?1, ?2)", (id, name))
            .unwrap();
    }
    for (name, dvr_id) in rows {
        conn.execute(
            "INSERT INTO DvrCameras (Name, Dvr_ID) VALUES (?1, ?2)",
            (name, dvr_id),
        )
        .unwrap();
    }
    SiteResolver::with_connection(conn)
}

#[test]
fn unknown_terminal_resolves_to_none() {
    let resolver = seeded(&[("CAM-14", 1)], &[(1, "North Lot")]);
    assert_eq!(resolver.resolve("CAM-99").unwrap(), None);
}

#[test]
fn single_match_returns_trimmed_site_name() {
    let resolver = seeded(&[("CAM-14", 1)], &[(1, "  North Lot  ")]);
    assert_eq!(
        resolver.resolve("CAM-14").unwrap(),
        Some("North Lot".to_string())
    );
}

#[test]
fn substring_match_finds_the_camera() {
    let resolver = seeded(&[("ATM CAM-14 front", 1)], &[(1, "North Lot")]);
    assert_eq!(
        resolver.resolve("CAM-14").unwrap(),
        Some("North Lot".to_string())
    );
}

#[test]
fn multiple_matches_fail_with_exact_count() {
    let resolver = seeded(
        &[("CAM-14a", 1), ("CAM-14b", 2), ("CAM-14c", 1)],
        &[(1, "North Lot"), (2, "South Lot")],
    );
    match resolver.resolve("CAM-14").unwrap_err() {
        AutomationError::AmbiguousMatch { terminal, count } => {
            assert_eq!(terminal, "CAM-14");
            assert_eq!(count, 3);
        }
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
}

#[test]
fn camera_without_site_row_resolves_to_none() {
    // LEFT JOIN with no matching site yields a NULL SiteName.
    let resolver = seeded(&[("CAM-14", 7)], &[(1, "North Lot")]);
    assert_eq!(resolver.resolve("CAM-14").unwrap(), None);
}

#[test]
fn batch_resolution_is_not_implemented() {
    let resolver = seeded(&[], &[]);
    assert!(matches!(
        resolver.resolve_many(&["CAM-1", "CAM-2"]),
        Err(AutomationError::NotImplemented(_))
    ));
}

#[test]
fn missing_database_path_is_a_configuration_error() {
    let err = SiteResolver::open(std::path::Path::new("/no/such/database.db")).unwrap_err();
    assert!(matches!(err, AutomationError::Configuration(_)));
}
