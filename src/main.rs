//! Builds backbone cylinders for a synthetic two-copy helix and logs what
//! each update step wrote.
//!
//! Run with `RUST_LOG=debug cargo run --features binary`.

use std::{path::Path, sync::Arc};

use glam::{IVec3, Mat4, Vec3};
use viso_repr::{
    gpu::DeviceCapabilities,
    options::{BackboneCylinderOptions, Options},
    repr::{polymer_backbone_cylinder_visual, UnitsRepresentation, VisualContext},
    structure::{AtomicUnit, MoleculeType, Operator, Structure, Unit, UnitModel},
    theme::{MoleculeTypeColorTheme, Theme, UniformSizeTheme},
    ReprError,
};

fn helix(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let angle = (i as f32 * 100.0).to_radians();
            Vec3::new(2.3 * angle.cos(), 2.3 * angle.sin(), 1.5 * i as f32)
        })
        .collect()
}

fn structure() -> Structure {
    let model = Arc::new(UnitModel::new(
        helix(120),
        vec![MoleculeType::Protein; 120],
        (0..120).collect(),
        vec![60],
    ));
    let base = AtomicUnit::new(0, 0, model);
    let copy = base.with_operator(
        1,
        Arc::new(Operator::new(
            "2_555",
            Mat4::from_translation(Vec3::new(25.0, 0.0, 0.0)),
            IVec3::ZERO,
        )),
    );
    let units: Vec<Arc<dyn Unit>> = vec![Arc::new(base), Arc::new(copy)];
    Structure::new(units)
}

fn main() -> Result<(), ReprError> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => Options::load(Path::new(&path))?,
        None => Options::default(),
    };
    let props = options.backbone_cylinder;
    let structure = structure();
    let theme = Theme::new(
        Arc::new(MoleculeTypeColorTheme::default()),
        Arc::new(UniformSizeTheme { size: 1.0 }),
    );

    let mut repr =
        UnitsRepresentation::new(Box::new(polymer_backbone_cylinder_visual));
    for capabilities in [DeviceCapabilities::FULL, DeviceCapabilities::MINIMAL]
    {
        let ctx = VisualContext::new(capabilities);
        repr.update(&ctx, &structure, &theme, &props)?;
        for renderable in repr.renderables() {
            log::info!(
                "object {} ({:?}): {} draw count x {} instances, bound r={:.1}",
                renderable.id(),
                renderable.kind(),
                renderable.draw_count(),
                renderable.instance_count(),
                renderable.bounding_sphere().radius
            );
        }
    }

    let thicker = BackboneCylinderOptions {
        size_factor: props.size_factor * 2.0,
        ..props
    };
    repr.update(
        &VisualContext::new(DeviceCapabilities::MINIMAL),
        &structure,
        &theme,
        &thicker,
    )?;
    log::info!(
        "after size change: bound r={:.1}",
        repr.bounding_sphere().radius
    );
    Ok(())
}
