/// Integration tests for the appointments migration against in-memory SQLite
/// Covers the add/skip decisions, the updated_at backfill and re-runs
use appointment_schema_migrator::schema::introspect;
use appointment_schema_migrator::{migrate, verify, Database, Engine, MigrationError};
use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::BTreeSet;

const LEGACY_TABLE: &str = r#"
    CREATE TABLE appointments (
        id INTEGER PRIMARY KEY,
        patient_name TEXT NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'pending',
        created_at DATETIME NOT NULL
    )
"#;

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite")
}

async fn legacy_db(rows: u32) -> (SqlitePool, Database) {
    let pool = memory_pool().await;
    sqlx::query(LEGACY_TABLE).execute(&pool).await.unwrap();
    seed(&pool, rows).await;
    (pool.clone(), Database::from(pool))
}

async fn seed(pool: &SqlitePool, rows: u32) {
    for day in 1..=rows {
        let created_at = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        sqlx::query("INSERT INTO appointments (patient_name, created_at) VALUES (?1, ?2)")
            .bind(format!("patient {}", day))
            .bind(created_at)
            .execute(pool)
            .await
            .unwrap();
    }
}

async fn timestamps(pool: &SqlitePool) -> Vec<(i64, Option<String>, Option<String>)> {
    sqlx::query_as(
        "SELECT id, CAST(created_at AS TEXT), CAST(updated_at AS TEXT) FROM appointments ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod migrate_tests {
    use super::*;

    #[tokio::test]
    async fn fresh_table_gets_both_columns_and_backfill() {
        let (pool, db) = legacy_db(3).await;

        let report = migrate(&db, "appointments").await.unwrap();

        assert_eq!(report.added, set(&["rejection_reason", "updated_at"]));
        assert!(report.already_present.is_empty());
        assert_eq!(report.backfilled_rows, 3);
        assert!(report.changes_made());

        let rows = timestamps(&pool).await;
        assert_eq!(rows.len(), 3);
        for (id, created_at, updated_at) in rows {
            assert!(created_at.is_some());
            assert_eq!(updated_at, created_at, "row {id} not backfilled");
        }

        let with_reason: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments WHERE rejection_reason IS NOT NULL",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(with_reason, 0);
    }

    #[tokio::test]
    async fn only_missing_columns_are_added() {
        let (pool, db) = legacy_db(2).await;
        sqlx::query("ALTER TABLE appointments ADD COLUMN rejection_reason TEXT")
            .execute(&pool)
            .await
            .unwrap();

        let report = migrate(&db, "appointments").await.unwrap();

        assert_eq!(report.added, set(&["updated_at"]));
        assert_eq!(report.already_present, set(&["rejection_reason"]));
        assert_eq!(report.backfilled_rows, 2);
    }

    #[tokio::test]
    async fn second_run_changes_nothing() {
        let (pool, db) = legacy_db(3).await;

        migrate(&db, "appointments").await.unwrap();
        let schema_after_first = introspect(&db, "appointments").await.unwrap();
        let values_after_first = timestamps(&pool).await;

        let second = migrate(&db, "appointments").await.unwrap();

        assert!(second.added.is_empty());
        assert_eq!(second.already_present, set(&["rejection_reason", "updated_at"]));
        assert_eq!(second.backfilled_rows, 0);
        assert!(!second.changes_made());
        assert_eq!(introspect(&db, "appointments").await.unwrap(), schema_after_first);
        assert_eq!(timestamps(&pool).await, values_after_first);
    }

    #[tokio::test]
    async fn existing_columns_are_left_untouched() {
        let (_pool, db) = legacy_db(1).await;
        let before = introspect(&db, "appointments").await.unwrap();

        migrate(&db, "appointments").await.unwrap();
        let after = introspect(&db, "appointments").await.unwrap();

        assert_eq!(&after[..before.len()], &before[..]);
        let added: Vec<_> = after[before.len()..]
            .iter()
            .map(|c| (c.name.as_str(), c.declared_type.as_str()))
            .collect();
        assert_eq!(
            added,
            vec![("rejection_reason", "TEXT"), ("updated_at", "DATETIME")]
        );
    }

    #[tokio::test]
    async fn present_updated_at_is_never_backfilled() {
        let pool = memory_pool().await;
        sqlx::query(
            "CREATE TABLE appointments (id INTEGER PRIMARY KEY, created_at DATETIME, updated_at DATETIME)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO appointments (created_at, updated_at) VALUES \
             ('2024-01-01 08:00:00', '2024-02-01 10:00:00'), \
             ('2024-01-02 08:00:00', NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        let before = timestamps(&pool).await;

        let report = migrate(&Database::from(pool.clone()), "appointments")
            .await
            .unwrap();

        assert_eq!(report.added, set(&["rejection_reason"]));
        assert_eq!(report.backfilled_rows, 0);
        assert_eq!(timestamps(&pool).await, before);
        assert_eq!(before[0].2.as_deref(), Some("2024-02-01 10:00:00"));
    }

    #[tokio::test]
    async fn mixed_case_columns_count_as_present() {
        let pool = memory_pool().await;
        sqlx::query(
            "CREATE TABLE appointments (id INTEGER PRIMARY KEY, created_at DATETIME, \
             Updated_At DATETIME, REJECTION_REASON TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        let db = Database::from(pool);

        let report = migrate(&db, "appointments").await.unwrap();

        assert!(report.added.is_empty());
        assert_eq!(report.already_present, set(&["rejection_reason", "updated_at"]));
        assert!(verify(&db, "appointments").await.unwrap().is_complete());
    }

    #[tokio::test]
    async fn empty_table_is_migrated() {
        let (_pool, db) = legacy_db(0).await;

        let report = migrate(&db, "appointments").await.unwrap();

        assert_eq!(report.added.len(), 2);
        assert_eq!(report.backfilled_rows, 0);
    }

    #[tokio::test]
    async fn other_table_names_are_supported() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE bookings_v2 (id INTEGER PRIMARY KEY, created_at DATETIME)")
            .execute(&pool)
            .await
            .unwrap();

        let report = migrate(&Database::from(pool), "bookings_v2").await.unwrap();

        assert_eq!(report.table, "bookings_v2");
        assert_eq!(report.added.len(), 2);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn missing_table_is_reported() {
        let db = Database::from(memory_pool().await);

        let err = migrate(&db, "appointments").await.unwrap_err();

        assert!(matches!(err, MigrationError::TableNotFound(ref t) if t == "appointments"));
        assert!(err.is_operation_failure());
    }

    #[tokio::test]
    async fn unusable_connection_is_an_operation_failure() {
        let (pool, db) = legacy_db(1).await;
        pool.close().await;

        let err = migrate(&db, "appointments").await.unwrap_err();

        assert!(matches!(err.root_cause(), MigrationError::Database(_)));
        assert!(err.is_operation_failure());
    }

    #[tokio::test]
    async fn unsafe_table_name_is_rejected_before_any_query() {
        let (pool, db) = legacy_db(1).await;

        let err = migrate(&db, "appointments; DROP TABLE appointments")
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::InvalidIdentifier(_)));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn unsupported_engine_is_refused_at_connect() {
        let err = Database::connect("mysql://root@localhost/app")
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::UnsupportedEngine(ref e) if e == "mysql"));
    }

    #[tokio::test]
    async fn connect_opens_sqlite_urls() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        assert_eq!(db.engine(), Engine::Sqlite);
        db.close().await;
    }
}

#[cfg(test)]
mod verify_tests {
    use super::*;

    #[tokio::test]
    async fn legacy_table_is_missing_both_columns() {
        let (_pool, db) = legacy_db(1).await;

        let report = verify(&db, "appointments").await.unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.missing_required, set(&["rejection_reason", "updated_at"]));
        let names: Vec<_> = report.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "patient_name", "status", "created_at"]);
        assert_eq!(report.columns[2].declared_type, "VARCHAR(20)");
    }

    #[tokio::test]
    async fn migrated_table_passes_verification() {
        let (_pool, db) = legacy_db(2).await;

        migrate(&db, "appointments").await.unwrap();
        let report = verify(&db, "appointments").await.unwrap();

        assert!(report.is_complete());
        assert!(report.missing_required.is_empty());
    }

    #[tokio::test]
    async fn verify_does_not_modify_schema() {
        let (_pool, db) = legacy_db(1).await;
        let before = introspect(&db, "appointments").await.unwrap();

        verify(&db, "appointments").await.unwrap();

        assert_eq!(introspect(&db, "appointments").await.unwrap(), before);
    }

    #[tokio::test]
    async fn verify_missing_table_fails() {
        let db = Database::from(memory_pool().await);
        let err = verify(&db, "appointments").await.unwrap_err();
        assert!(matches!(err, MigrationError::TableNotFound(_)));
    }
}
