mod failure_test;
mod ledger_test;
mod rollback_test;
mod run_test;
