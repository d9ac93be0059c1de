use std::collections::HashMap;

use cloud_drift::prelude::*;
use cloud_drift_examples::init_tracing;
use tracing::info;

fn run(name: &str, boundary: BoundaryPolicy) -> anyhow::Result<()> {
    let config = SimConfig::new(20_000.0)
        .with_drift(135.0, 12.0)
        .with_boundary(boundary);
    let mut system = WeatherSystem::try_new(config, 3)?;

    let mut reasons: HashMap<RetireReason, usize> = HashMap::new();
    let mut oldest = 0u32;
    {
        let mut sink = FnSink::new(|event| {
            if let WeatherEvent::Retired { reason, age, .. } = event {
                *reasons.entry(reason).or_default() += 1;
                oldest = oldest.max(age);
            }
        });
        for _ in 0..6000 {
            system.step_with_events(None, None, &mut sink);
        }
    }

    info!(
        "{name}: population {}, oldest retired at {oldest} frames, retired {:?}",
        system.len(),
        reasons
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    run("drift", BoundaryPolicy::drift())?;
    run("wrap", BoundaryPolicy::wrap())?;
    Ok(())
}
