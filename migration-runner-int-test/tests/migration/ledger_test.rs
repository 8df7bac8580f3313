use migration_runner::{DatabaseProvider, LedgerSchema};
use migration_runner_int_test::test_util::{
    add_column_unit, cleanup, create_test_context, registry_of, run_test,
};

#[test]
fn test_ledger_table_created_on_open() {
    run_test(
        create_test_context,
        |ctx| {
            assert!(ctx.columns("schemamigration")?.is_empty());
            ctx.runner(registry_of(vec![])?)?;
            assert_eq!(ctx.columns("schemamigration")?, vec!["filename"]);

            // opening again is harmless
            ctx.runner(registry_of(vec![])?)?;
            assert_eq!(ctx.columns("schemamigration")?, vec!["filename"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_ledger_matches_directory_after_run() {
    run_test(
        create_test_context,
        |ctx| {
            for name in ["001_a.sql", "002_b.sql", "_wip.sql"] {
                ctx.write_unit(name)?;
            }
            let registry = registry_of(vec![
                add_column_unit("001_a.sql", "a"),
                add_column_unit("002_b.sql", "b"),
                add_column_unit("_wip.sql", "wip"),
            ])?;
            ctx.runner(registry)?.run()?;

            let records = ctx.reopen()?.record_names(&LedgerSchema::default())?;
            assert_eq!(records, vec!["001_a.sql", "002_b.sql"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_preexisting_records_are_not_reapplied() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            ctx.write_unit("002_b.sql")?;
            let db = ctx.db();
            let schema = LedgerSchema::default();
            db.create_table_if_absent(&schema)?;
            db.insert_record(&schema, "001_a.sql")?;

            let registry = registry_of(vec![
                add_column_unit("001_a.sql", "a"),
                add_column_unit("002_b.sql", "b"),
            ])?;
            let runner = ctx.runner(registry)?;

            assert_eq!(runner.run()?, vec!["002_b.sql"]);
            assert_eq!(ctx.columns("mytable")?, vec!["id", "b"]);
            Ok(())
        },
        cleanup,
    );
}
