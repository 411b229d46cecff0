//! Scene builders shared by the benchmarks.

use std::sync::Arc;

use anyhow::{Context, Result};
use clump::{BodyDesc, BoundingVolume, MeshData, PhysicsConfig, PhysicsWorld};
use glam::{Mat4, Vec3};

pub const DT: f32 = 1.0 / 60.0;
pub const TOLERANCE: f32 = 1e-4;

/// Two unit boxes, the second placed by `transform`.
pub fn box_pair(transform: Mat4) -> Result<(BoundingVolume, BoundingVolume)> {
    let a = BoundingVolume::from_transform(Mat4::IDENTITY, TOLERANCE).context("identity box")?;
    let b = BoundingVolume::from_transform(transform, TOLERANCE).context("degenerate box transform")?;
    Ok((a, b))
}

fn floor(cube: &Arc<MeshData>, half_width: f32) -> BodyDesc {
    BodyDesc {
        position: Vec3::new(0.0, -1.0, 0.0),
        scale: Vec3::new(half_width, 1.0, half_width),
        ..BodyDesc::wall(cube.clone())
    }
}

/// `n` boxes laid out on a grid with `spacing` between centers, one layer above a floor.
///
/// A spacing below 2.0 makes neighbours overlap.
pub fn setup_grid_world(n: usize, spacing: f32) -> Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());
    let cube = Arc::new(MeshData::cube());
    let side = (n as f32).sqrt().ceil() as usize;
    let half_width = side as f32 * spacing;

    world.spawn(floor(&cube, half_width))?;
    for i in 0..n {
        let (row, col) = (i / side, i % side);
        world.spawn(BodyDesc {
            position: Vec3::new(
                col as f32 * spacing - half_width / 2.0,
                1.5,
                row as f32 * spacing - half_width / 2.0,
            ),
            orientation: Vec3::new(0.0, 0.1 * (i % 7) as f32, 0.0),
            ..BodyDesc::dynamic(cube.clone(), 1.0)
        })?;
    }
    Ok(world)
}

/// `n` three-box dumbbells dropped in a row onto a floor.
pub fn setup_dumbbell_world(n: usize) -> Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());
    let cube = Arc::new(MeshData::cube());
    world.spawn(floor(&cube, 8.0 * n as f32))?;

    for i in 0..n {
        let z = i as f32 * 4.0;
        let part = |x: f32, scale: Vec3| BodyDesc {
            position: Vec3::new(x, 3.0, z),
            scale,
            ..BodyDesc::dynamic(cube.clone(), 1.0)
        };
        world.spawn_group([
            part(-2.0, Vec3::splat(0.75)),
            part(0.0, Vec3::new(1.25, 0.2, 0.2)),
            part(2.0, Vec3::splat(0.75)),
        ])?;
    }
    Ok(world)
}

pub fn run_ticks(world: &mut PhysicsWorld, ticks: usize) {
    for _ in 0..ticks {
        world.tick(DT);
    }
}
