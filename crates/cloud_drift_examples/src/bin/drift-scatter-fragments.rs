use cloud_drift::prelude::*;
use cloud_drift_examples::{init_tracing, render_system_to_png, RenderConfig};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SimConfig::new(50_000.0)
        .with_lifecycle(LifecycleFrames::new(200, 1200, 200))
        .with_split(SplitConfig {
            scatter_probability: 0.0008,
            fragments: (2, 4),
            offset_m: 3000.0,
            ..Default::default()
        })
        .with_spawn(SpawnConfig {
            max_particles: 8,
            ..Default::default()
        });
    let mut system = WeatherSystem::try_new(config, 7)?;
    let mut sink = VecSink::only([WeatherEventKind::Split, WeatherEventKind::Warning]);

    let mut rendered = 0;
    for frame in 1..=2400 {
        sink.clear();
        system.step_with_events(None, None, &mut sink);

        for event in sink.as_slice() {
            match event {
                WeatherEvent::Split {
                    cloud_type,
                    position,
                    fragments,
                } => info!(
                    "frame {frame}: {cloud_type} at ({:.0}, {:.0}) broke into {fragments}",
                    position.x, position.y
                ),
                WeatherEvent::Warning { context, message } => {
                    info!("warning [{context}]: {message}")
                }
                _ => {}
            }
        }

        // Capture the sky shortly after the first few break-ups, once fragments have spread.
        let splitting = system
            .particles()
            .iter()
            .any(|p| p.split_fade_countdown() == 30);
        if splitting && rendered < 3 {
            rendered += 1;
            let render = RenderConfig::new((800, 800), system.config().domain_size_m);
            render_system_to_png(
                &system,
                &render,
                format!("drift-scatter-fragments-{rendered}.png"),
            )?;
        }
    }

    info!("total splits: {}", system.stats().splits);
    Ok(())
}
