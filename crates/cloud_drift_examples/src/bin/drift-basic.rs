use cloud_drift::prelude::*;
use cloud_drift_examples::{init_tracing, render_system_to_png, RenderConfig};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SimConfig::new(50_000.0)
        .with_drift(135.0, 4.0)
        .with_trail_length(40);
    let mut system = WeatherSystem::try_new(config, 42)?;

    for frame in 1..=3600 {
        system.step(None, None);
        if frame % 600 == 0 {
            let drift = system.drift_estimate();
            info!(
                "frame {frame}: {} clouds, coverage {:.1}%, drift {:.1} km/h @ {:.0} deg",
                system.len(),
                system.coverage_pct(),
                drift.speed_kmh.unwrap_or(0.0),
                drift.heading_deg.unwrap_or(0.0),
            );
        }
    }

    let stats = system.stats();
    info!(
        "spawned {}, retired {}, splits {}",
        stats.spawned, stats.retired, stats.splits
    );

    let mut render = RenderConfig::new((800, 800), system.config().domain_size_m)
        .with_trails([70, 110, 170]);
    render
        .set_cloud_color("cumulus", [250, 250, 250])
        .set_cloud_color("cirrus", [225, 235, 250])
        .set_cloud_color("cumulonimbus", [150, 155, 165]);
    render_system_to_png(&system, &render, "drift-basic.png")?;
    Ok(())
}
