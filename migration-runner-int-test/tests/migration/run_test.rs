use migration_runner_int_test::test_util::{
    add_column_unit, cleanup, create_test_context, registry_of, run_test,
};

#[test]
fn test_run_applies_unit_and_skips_draft() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_AddColumn.py")?;
            ctx.write_unit("_Draft.py")?;
            let registry = registry_of(vec![
                add_column_unit("001_AddColumn.py", "testcolumn"),
                add_column_unit("_Draft.py", "wonthappen"),
            ])?;

            let runner = ctx.runner(registry)?;
            let applied = runner.run()?;

            assert_eq!(applied, vec!["001_AddColumn.py"]);
            assert_eq!(runner.applied()?, vec!["001_AddColumn.py"]);
            let columns = ctx.columns("mytable")?;
            assert!(columns.contains(&"testcolumn".to_string()));
            assert!(!columns.contains(&"wonthappen".to_string()));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_run_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_AddColumn.py")?;
            ctx.write_unit("_Draft.py")?;
            let registry = registry_of(vec![
                add_column_unit("001_AddColumn.py", "testcolumn"),
                add_column_unit("_Draft.py", "wonthappen"),
            ])?;

            let runner = ctx.runner(registry)?;
            runner.run()?;
            assert!(runner.run()?.is_empty());
            assert!(runner.run()?.is_empty());

            assert_eq!(runner.applied()?, vec!["001_AddColumn.py"]);
            assert_eq!(ctx.columns("mytable")?, vec!["id", "testcolumn"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_run_applies_in_name_order() {
    run_test(
        create_test_context,
        |ctx| {
            // created out of order on purpose
            for name in ["003_c.sql", "001_a.sql", "010_d.sql", "002_b.sql"] {
                ctx.write_unit(name)?;
            }
            let registry = registry_of(vec![
                add_column_unit("001_a.sql", "a"),
                add_column_unit("002_b.sql", "b"),
                add_column_unit("003_c.sql", "c"),
                add_column_unit("010_d.sql", "d"),
            ])?;

            let runner = ctx.runner(registry)?;
            let applied = runner.run()?;

            assert_eq!(applied, vec!["001_a.sql", "002_b.sql", "003_c.sql", "010_d.sql"]);
            assert_eq!(ctx.columns("mytable")?, vec!["id", "a", "b", "c", "d"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_run_picks_up_new_files() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            let registry = registry_of(vec![
                add_column_unit("001_a.sql", "a"),
                add_column_unit("002_b.sql", "b"),
            ])?;
            let runner = ctx.runner(registry)?;
            assert_eq!(runner.run()?, vec!["001_a.sql"]);
            assert_eq!(runner.pending()?.len(), 0);

            ctx.write_unit("002_b.sql")?;
            assert_eq!(runner.pending()?, vec!["002_b.sql"]);
            assert_eq!(runner.run()?, vec!["002_b.sql"]);

            let status = runner.status()?;
            assert!(status.is_up_to_date());
            assert_eq!(status.applied, vec!["001_a.sql", "002_b.sql"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_ledger_survives_restart() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            ctx.write_unit("002_b.sql")?;
            let units = || {
                registry_of(vec![
                    add_column_unit("001_a.sql", "a"),
                    add_column_unit("002_b.sql", "b"),
                ])
            };

            ctx.runner(units()?)?.run()?;

            let restarted = migration_runner::MigrationRunner::new(
                ctx.reopen()?,
                units()?,
                ctx.migrations_dir(),
            )?;
            assert!(restarted.pending()?.is_empty());
            assert!(restarted.run()?.is_empty());
            assert_eq!(restarted.applied()?, vec!["001_a.sql", "002_b.sql"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_custom_ledger_table_and_extension() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            ctx.write_unit("002_notes.txt")?;
            let registry = registry_of(vec![add_column_unit("001_a.sql", "a")])?;

            let runner = migration_runner::MigrationRunner::builder(ctx.db())
                .migrations_dir(ctx.migrations_dir())
                .ledger_table("applied_units")
                .ledger_column("unit")
                .extension("sql")
                .registry(registry)
                .build()?;

            assert_eq!(runner.run()?, vec!["001_a.sql"]);
            assert_eq!(ctx.columns("applied_units")?, vec!["unit"]);
            assert!(ctx.columns("schemamigration")?.is_empty());
            Ok(())
        },
        cleanup,
    );
}
