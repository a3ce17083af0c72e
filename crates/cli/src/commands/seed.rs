use crate::commands::{with_pool, CommandResult, StepFailure};
use shelf_db::{migrations, DemoCatalog, SeedResult};

pub fn run() -> CommandResult {
    let result = with_pool("seed", |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| StepFailure::new("migration", error.to_string(), 5))?;

        let seeded = DemoCatalog::load(&pool)
            .await
            .map_err(|error| StepFailure::new("seed_execution", error.to_string(), 5))?;

        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| StepFailure::new("seed_verification", error.to_string(), 6))?;

        if verification.all_present {
            Ok(seeded)
        } else {
            Err(StepFailure::new(
                "seed_verification",
                verification_failure_message(&verification.checks),
                6,
            ))
        }
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err(failure) => failure,
    }
}

fn summary(seeded: &SeedResult) -> String {
    let lines: Vec<String> = seeded
        .products
        .iter()
        .map(|(name, price)| format!("  - {name}: {price}"))
        .collect();
    format!(
        "demo catalog ready ({} inserted, {} total):\n{}",
        seeded.inserted,
        seeded.products.len(),
        lines.join("\n")
    )
}

fn verification_failure_message(checks: &[(&str, bool)]) -> String {
    let missing =
        checks.iter().filter_map(|(name, present)| (!present).then_some(*name)).collect::<Vec<_>>();

    if missing.is_empty() {
        "some demo products failed to load".to_string()
    } else {
        format!("demo catalog verification failed for: {}", missing.join(", "))
    }
}
