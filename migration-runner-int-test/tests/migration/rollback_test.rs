use migration_runner::errors::ErrorKind;
use migration_runner_int_test::test_util::{
    add_column_unit, cleanup, create_test_context, one_way_unit, registry_of, run_test,
};

#[test]
fn test_run_then_rollback_restores_schema() {
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
            let reverted = runner.rollback()?;

            assert_eq!(reverted.as_deref(), Some("001_AddColumn.py"));
            assert!(runner.applied()?.is_empty());
            assert_eq!(ctx.columns("mytable")?, vec!["id"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_rollback_on_empty_ledger_is_noop() {
    run_test(
        create_test_context,
        |ctx| {
            let runner = ctx.runner(registry_of(vec![])?)?;
            assert_eq!(runner.rollback()?, None);
            assert_eq!(runner.rollback()?, None);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_rollback_targets_greatest_name() {
    run_test(
        create_test_context,
        |ctx| {
            for name in ["001_a.sql", "002_b.sql", "003_c.sql"] {
                ctx.write_unit(name)?;
            }
            let registry = registry_of(vec![
                add_column_unit("001_a.sql", "a"),
                add_column_unit("002_b.sql", "b"),
                add_column_unit("003_c.sql", "c"),
            ])?;
            let runner = ctx.runner(registry)?;
            runner.run()?;

            assert_eq!(runner.rollback()?.as_deref(), Some("003_c.sql"));
            assert_eq!(ctx.columns("mytable")?, vec!["id", "a", "b"]);
            assert_eq!(runner.rollback()?.as_deref(), Some("002_b.sql"));
            assert_eq!(runner.applied()?, vec!["001_a.sql"]);

            // the reverted unit is pending again
            assert_eq!(runner.run()?, vec!["002_b.sql", "003_c.sql"]);
            assert_eq!(ctx.columns("mytable")?, vec!["id", "a", "b", "c"]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_rollback_without_revert_keeps_record() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            let registry = registry_of(vec![one_way_unit("001_a.sql", "a")])?;
            let runner = ctx.runner(registry)?;
            runner.run()?;

            let err = runner.rollback().unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::NoRevertDefined("001_a.sql".to_string())
            );
            assert_eq!(runner.applied()?, vec!["001_a.sql"]);
            assert_eq!(ctx.columns("mytable")?, vec!["id", "a"]);
            assert!(!ctx.db().in_transaction());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_rollback_with_deleted_file() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.write_unit("001_a.sql")?;
            let registry = registry_of(vec![add_column_unit("001_a.sql", "a")])?;
            let runner = ctx.runner(registry)?;
            runner.run()?;

            ctx.remove_unit("001_a.sql")?;
            let err = runner.rollback().unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::MissingUnitFile("001_a.sql".to_string())
            );
            assert_eq!(runner.applied()?, vec!["001_a.sql"]);
            Ok(())
        },
        cleanup,
    );
}
