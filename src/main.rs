/*!
 * Deadlock Simulator - Main Entry Point
 *
 * Builds one canonical scenario, then:
 * - compares RAG and safety-check detection
 * - evaluates every recovery strategy from the same starting state
 * - runs the step loop with the best strategy
 *
 * The combined report is printed to stdout as JSON; logs go to stderr.
 */

use deadlock_sim::core::errors::SerializableError;
use deadlock_sim::core::limits::{DEFAULT_SIMULATION_STEPS, ENV_SCENARIO};
use deadlock_sim::{
    init_tracing, span_phase, DeadlockResolver, DetectionAnalysis, ResolverConfig, Scenario,
    SimError, SimResult, Simulation, SimulationConfig, StatusCounts, StepRecord, Strategy,
    TrialReport,
};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Serialize)]
struct Report {
    scenario: Scenario,
    config: ResolverConfig,
    initial: StatusCounts,
    analysis: DetectionAnalysis,
    trials: TrialReport,
    simulation_strategy: Strategy,
    steps: Vec<StepRecord>,
    final_statuses: StatusCounts,
}

fn scenario_from_env() -> SimResult<Scenario> {
    match std::env::var(ENV_SCENARIO) {
        Ok(raw) if !raw.trim().is_empty() => raw.parse(),
        _ => Ok(Scenario::default()),
    }
}

fn run() -> SimResult<Report> {
    let scenario = scenario_from_env()?;
    let config = ResolverConfig::from_env()?;
    info!(%scenario, seed = config.seed, "starting deadlock simulation");

    let mut system = scenario.build()?;
    let initial = system.status_counts();
    let mut resolver = DeadlockResolver::with_config(&mut system, config.clone());

    let analysis = {
        let _phase = span_phase("detect");
        resolver.detector().analyze()
    };
    info!(
        deadlocked = analysis.deadlocked(),
        consensus = analysis.consensus,
        "detection complete"
    );

    let trials = {
        let phase = span_phase("evaluate");
        let trials = resolver.evaluate_strategies();
        phase.record_result(trials.is_ok());
        trials?
    };

    let simulation_strategy = trials
        .ranking()
        .first()
        .copied()
        .unwrap_or(Strategy::Termination);

    let steps = {
        let _phase = span_phase("simulate");
        let sim_config = SimulationConfig::default()
            .with_strategy(simulation_strategy)
            .with_priority_based(config.priority_based);
        Simulation::new(&mut resolver, sim_config).run(DEFAULT_SIMULATION_STEPS)?
    };

    Ok(Report {
        scenario,
        config,
        initial,
        analysis,
        trials,
        simulation_strategy,
        steps,
        final_statuses: resolver.system().status_counts(),
    })
}

fn main() {
    init_tracing();

    let outcome = run().and_then(|report| Ok(serde_json::to_string_pretty(&report)?));
    match outcome {
        Ok(json) => println!("{}", json),
        Err(err) => {
            error!(error = %err, "simulation failed");
            report_failure(err);
            std::process::exit(1);
        }
    }
}

fn report_failure(err: SimError) {
    let serializable = SerializableError::from(&err);
    if let Ok(json) = serde_json::to_string_pretty(&serializable) {
        println!("{}", json);
    }
    eprintln!("{:?}", miette::Report::new(err));
}
