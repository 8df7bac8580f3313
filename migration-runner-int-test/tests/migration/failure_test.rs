use migration_runner::errors::ErrorKind;
use migration_runner::{ChangeUnit, MigrationRunner};
use migration_runner_int_test::test_util::{
    add_column_unit, cleanup, create_test_context, failing_unit, random_path, registry_of,
    run_test,
};
use migration_runner_sqlite_adapter::{SqliteDatabase, SqliteMigrator};

#[test]
fn test_missing_directory_is_config_error() {
    let db = SqliteDatabase::in_memory().expect("Failed to open database");
    let result = MigrationRunner::new(db.clone(), registry_of(vec![]).unwrap(), random_path());

    let err = result.err().expect("Runner should not open");
    assert_eq!(err.kind(), &ErrorKind::ConfigError);
    // no ledger table was created
    let tables = migration_runner::DatabaseProvider::migrator(&db)
        .unwrap()
        .tables()
        .unwrap();
    assert!(tables.is_empty());
}

#[test]
fn test_failed_apply_leaves_no_trace() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            ctx.write_unit("002_broken.sql")?;
            ctx.write_unit("003_c.sql")?;
            let registry = registry_of(vec![
                add_column_unit("001_a.sql", "a"),
                failing_unit("002_broken.sql"),
                add_column_unit("003_c.sql", "c"),
            ])?;
            let runner = ctx.runner(registry)?;

            let err = runner.run().unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::ApplyFailed("002_broken.sql".to_string())
            );
            assert_eq!(err.cause().map(|c| c.kind()), Some(&ErrorKind::InternalError));

            // earlier unit committed, failing one rolled back, later one never ran
            assert_eq!(runner.applied()?, vec!["001_a.sql"]);
            assert_eq!(ctx.columns("mytable")?, vec!["id", "a"]);
            assert!(ctx.columns("half_done")?.is_empty());
            assert_eq!(runner.pending()?, vec!["002_broken.sql", "003_c.sql"]);
            assert!(!ctx.db().in_transaction());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_invalid_sql_fails_apply() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_bad.sql")?;
            let unit = ChangeUnit::builder("001_bad.sql")
                .apply(|m: &SqliteMigrator| m.execute_batch("ALTER TABLE nope ADD COLUMN x"))
                .build();
            let runner = ctx.runner(registry_of(vec![unit])?)?;

            let err = runner.run().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ApplyFailed("001_bad.sql".to_string()));
            assert_eq!(err.cause().map(|c| c.kind()), Some(&ErrorKind::BackendError));
            assert!(runner.applied()?.is_empty());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_unregistered_file_is_malformed() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            ctx.write_unit("002_unknown.sql")?;
            let registry = registry_of(vec![add_column_unit("001_a.sql", "a")])?;
            let runner = ctx.runner(registry)?;

            let err = runner.run().unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::MalformedUnit("002_unknown.sql".to_string())
            );
            assert_eq!(runner.applied()?, vec!["001_a.sql"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_failed_revert_keeps_record() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            let unit = ChangeUnit::builder("001_a.sql")
                .apply(|m: &SqliteMigrator| {
                    m.execute_batch("ALTER TABLE mytable ADD COLUMN a INTEGER")
                })
                .revert(|m: &SqliteMigrator| {
                    m.execute_batch("ALTER TABLE mytable DROP COLUMN does_not_exist")
                })
                .build();
            let runner = ctx.runner(registry_of(vec![unit])?)?;
            runner.run()?;

            let err = runner.rollback().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::RevertFailed("001_a.sql".to_string()));
            assert_eq!(runner.applied()?, vec!["001_a.sql"]);
            assert_eq!(ctx.columns("mytable")?, vec!["id", "a"]);
            Ok(())
        },
        cleanup,
    );
}
