use crate::commands::{with_pool, CommandResult, StepFailure};
use shelf_db::migrations;

pub fn run() -> CommandResult {
    let result = with_pool("migrate", |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| StepFailure::new("migration", error.to_string(), 5))
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => failure,
    }
}
