//! Main simulation loop

use std::time::Instant;

use crate::core::error::Result;
use crate::output::SimulationOutput;
use crate::scenario::Scenario;

/// Run a scenario end to end: snapshot, step `run.steps` times, snapshot
pub fn simulate(scenario: &Scenario) -> Result<SimulationOutput> {
    let start = Instant::now();

    scenario.validate()?;
    let seed = scenario.resolve_seed();
    if scenario.run.seed.is_none() {
        tracing::info!(seed, "no seed configured, drew one from entropy");
    }

    let mut world = scenario.build_world(seed)?;
    let initial = world.snapshot();

    tracing::info!(
        scenario = %scenario.name,
        agents = world.agents().len(),
        steps = scenario.run.steps,
        "starting simulation"
    );

    world.run(scenario.run.steps)?;

    Ok(SimulationOutput::new(
        scenario.name.clone(),
        seed,
        initial,
        world,
        start.elapsed(),
    ))
}
