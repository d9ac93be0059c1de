use cloud_drift::prelude::*;
use cloud_drift_examples::{init_tracing, render_shapes_to_png, RenderConfig};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let domain = 20_000.0;
    let center = Vec2::splat(domain * 0.5);
    let registry = CloudTypeRegistry::from_defs(&CloudTypeDef::builtin())?;
    let mut rng = StdRng::seed_from_u64(11);

    let cumulus = registry.resolve("cumulus")?;
    let cirrus = registry.resolve("cirrus")?;

    let from = scatter_shapes_for_type(
        &cumulus,
        12,
        center,
        (2000.0, 8000.0),
        &mut rng,
    );
    let to = scatter_shapes_for_type(
        &cirrus,
        8,
        center,
        (1500.0, 6000.0),
        &mut rng,
    );

    let mut render = RenderConfig::new((600, 600), domain);
    render.set_cloud_color("cirrus", [230, 238, 252]);

    for (i, t) in [0.0, 0.25, 0.5, 0.75, 1.0].into_iter().enumerate() {
        let blended = interpolate(&from, &to, t);
        let shapes = ShapePass::FilterVisible(0.02).apply(blended);
        render_shapes_to_png(&shapes, &render, format!("shapes-interpolate-{i}.png"))?;
    }
    Ok(())
}
