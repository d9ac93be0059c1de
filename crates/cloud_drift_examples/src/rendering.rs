use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use cloud_drift::prelude::{sort_by_altitude, CloudShape, WeatherSystem};
use glam::Vec2;
use image::{Rgb, RgbImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber honouring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// How a frame is rasterized.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub domain_size_m: f32,
    pub background: [u8; 3],
    pub default_color: [u8; 3],
    pub trail_color: Option<[u8; 3]>,
    cloud_colors: HashMap<String, [u8; 3]>,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32), domain_size_m: f32) -> Self {
        Self {
            image_size,
            domain_size_m,
            background: [110, 160, 215],
            default_color: [250, 250, 250],
            trail_color: None,
            cloud_colors: HashMap::new(),
        }
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    pub fn with_trails(mut self, color: [u8; 3]) -> Self {
        self.trail_color = Some(color);
        self
    }

    pub fn set_cloud_color(&mut self, cloud_type: impl Into<String>, color: [u8; 3]) -> &mut Self {
        self.cloud_colors.insert(cloud_type.into(), color);
        self
    }

    fn color_for(&self, cloud_type: &str) -> [u8; 3] {
        self.cloud_colors
            .get(cloud_type)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Domain metres to pixels. Both share the north-west origin.
    fn to_pixel(&self, p: Vec2) -> Vec2 {
        p * self.pixels_per_metre()
    }

    fn pixels_per_metre(&self) -> Vec2 {
        let (w, h) = self.image_size;
        Vec2::new(w as f32, h as f32) / self.domain_size_m
    }
}

/// Draws `shapes` as soft ellipses, highest altitude first, and writes a PNG.
pub fn render_shapes_to_png(
    shapes: &[CloudShape],
    config: &RenderConfig,
    out: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let mut img = blank(config);
    draw_shapes(&mut img, shapes, config);
    save(img, out.as_ref())
}

/// Renders the visible clouds of `system`, plus their trails if enabled.
pub fn render_system_to_png(
    system: &WeatherSystem,
    config: &RenderConfig,
    out: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let mut img = blank(config);
    if let Some(color) = config.trail_color {
        for particle in system.particles() {
            for point in particle.trail().iter() {
                plot(&mut img, config.to_pixel(point), color, 1.0);
            }
        }
    }
    draw_shapes(&mut img, &system.visible_shapes(), config);
    save(img, out.as_ref())
}

fn blank(config: &RenderConfig) -> RgbImage {
    let (w, h) = config.image_size;
    RgbImage::from_pixel(w, h, Rgb(config.background))
}

fn save(img: RgbImage, out: &Path) -> anyhow::Result<()> {
    img.save(out)
        .with_context(|| format!("writing {}", out.display()))?;
    info!("Wrote {}", out.display());
    Ok(())
}

fn draw_shapes(img: &mut RgbImage, shapes: &[CloudShape], config: &RenderConfig) {
    let ordered = sort_by_altitude(shapes.to_vec());
    let scale = config.pixels_per_metre();
    for shape in &ordered {
        let center = config.to_pixel(shape.position);
        let radii = Vec2::new(shape.width, shape.height) * 0.5 * scale;
        draw_ellipse(
            img,
            center,
            radii,
            shape.rotation,
            config.color_for(&shape.cloud_type),
            shape.opacity,
        );
    }
}

fn draw_ellipse(
    img: &mut RgbImage,
    center: Vec2,
    radii: Vec2,
    rotation: f32,
    color: [u8; 3],
    opacity: f32,
) {
    if radii.x <= 0.0 || radii.y <= 0.0 {
        return;
    }
    let reach = radii.max_element();
    let (w, h) = img.dimensions();
    let x0 = (center.x - reach).floor().max(0.0) as u32;
    let y0 = (center.y - reach).floor().max(0.0) as u32;
    let x1 = ((center.x + reach).ceil().max(0.0) as u32).min(w);
    let y1 = ((center.y + reach).ceil().max(0.0) as u32).min(h);
    let (sin, cos) = rotation.sin_cos();

    for y in y0..y1 {
        for x in x0..x1 {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
            let local = Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos) / radii;
            let r2 = local.length_squared();
            if r2 <= 1.0 {
                // Full density in the core, falling to zero at the rim.
                let alpha = opacity * (1.0 - r2).sqrt();
                blend(img.get_pixel_mut(x, y), color, alpha);
            }
        }
    }
}

fn plot(img: &mut RgbImage, p: Vec2, color: [u8; 3], alpha: f32) {
    let (w, h) = img.dimensions();
    if p.x < 0.0 || p.y < 0.0 || p.x >= w as f32 || p.y >= h as f32 {
        return;
    }
    blend(img.get_pixel_mut(p.x as u32, p.y as u32), color, alpha);
}

fn blend(px: &mut Rgb<u8>, color: [u8; 3], alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    for (dst, src) in px.0.iter_mut().zip(color) {
        *dst = (*dst as f32 * (1.0 - a) + src as f32 * a).round() as u8;
    }
}
