use cloud_drift::prelude::*;
use cloud_drift_examples::{init_tracing, load_scenario, render_system_to_png, RenderConfig};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        format!(
            "{}/assets/drift-config-file/scenario.ron",
            env!("CARGO_MANIFEST_DIR")
        )
    });
    let scenario = load_scenario(&path)?;
    info!(
        "Loaded {path}: {} frames, {} cloud types",
        scenario.frames,
        scenario.sim.cloud_types.len()
    );

    let mut system = WeatherSystem::try_new(scenario.sim.clone(), scenario.seed)?;
    let render = RenderConfig::new(scenario.image_size, system.config().domain_size_m)
        .with_trails([80, 120, 180]);

    for frame in 1..=scenario.frames {
        system.step(None, None);
        if scenario.snapshot_every > 0 && frame % scenario.snapshot_every == 0 {
            render_system_to_png(&system, &render, format!("drift-config-file-{frame:05}.png"))?;
        }
    }
    if scenario.snapshot_every == 0 {
        render_system_to_png(&system, &render, "drift-config-file.png")?;
    }

    info!("coverage at end: {:.1}%", system.coverage_pct());
    Ok(())
}
