use std::f32::consts::PI;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use clump::{BodyDesc, MeshData, PhysicsConfig, PhysicsWorld, StepOutcome};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

/// Headless sandbox: boxes tumbling inside a closed room.
#[derive(Parser, Debug)]
#[command(name = "clump-app")]
struct Args {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Number of random loose boxes.
    #[arg(long, default_value_t = 24)]
    boxes: usize,

    /// Seed for box placement.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Add the spinning wall at the bottom of the room.
    #[arg(long)]
    blender: bool,

    /// Split every group into single bodies halfway through the run.
    #[arg(long)]
    ungroup: bool,

    /// Direction of gravity.
    #[arg(long, value_enum)]
    gravity: Option<GravityAxis>,

    /// Log a progress line every N ticks.
    #[arg(long, default_value_t = 120)]
    report_every: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GravityAxis {
    None,
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl GravityAxis {
    fn vector(self) -> Vec3 {
        let g = 9.81;
        match self {
            GravityAxis::None => Vec3::ZERO,
            GravityAxis::PosX => Vec3::new(g, 0.0, 0.0),
            GravityAxis::NegX => Vec3::new(-g, 0.0, 0.0),
            GravityAxis::PosY => Vec3::new(0.0, g, 0.0),
            GravityAxis::NegY => Vec3::new(0.0, -g, 0.0),
            GravityAxis::PosZ => Vec3::new(0.0, 0.0, g),
            GravityAxis::NegZ => Vec3::new(0.0, 0.0, -g),
        }
    }
}

/// Inner half size and wall thickness of the room.
struct Room {
    scale: Vec3,
    thickness: Vec3,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            scale: Vec3::new(30.0, 20.0, 30.0),
            thickness: Vec3::splat(2.0),
        }
    }
}

impl Room {
    /// Floor, ceiling and four walls, all in one immovable group.
    fn walls(&self, cube: &Arc<MeshData>) -> Vec<BodyDesc> {
        let offset = self.scale + self.thickness;
        let (s, t) = (self.scale, self.thickness);
        let slab = |position: Vec3, scale: Vec3| BodyDesc {
            position,
            scale,
            ..BodyDesc::wall(cube.clone())
        };
        vec![
            slab(Vec3::new(0.0, -offset.y, 0.0), Vec3::new(s.x, t.y, s.z)),
            slab(Vec3::new(0.0, offset.y, 0.0), Vec3::new(s.x, t.y, s.z)),
            slab(Vec3::new(-offset.x, 0.0, 0.0), Vec3::new(t.x, s.y, s.z)),
            slab(Vec3::new(offset.x, 0.0, 0.0), Vec3::new(t.x, s.y, s.z)),
            slab(Vec3::new(0.0, 0.0, -offset.z), Vec3::new(s.x, s.y, t.z)),
            slab(Vec3::new(0.0, 0.0, offset.z), Vec3::new(s.x, s.y, t.z)),
        ]
    }

    fn blender(&self, cube: &Arc<MeshData>) -> BodyDesc {
        BodyDesc {
            position: Vec3::new(0.0, -self.scale.y / 2.0, 0.0),
            angular_velocity: Vec3::new(0.0, PI / 2.0, 0.0),
            scale: Vec3::new(self.scale.x * 4.0 / 3.0, self.scale.y / 2.0, self.thickness.x),
            ..BodyDesc::wall(cube.clone())
        }
    }
}

fn random_box(rng: &mut StdRng, room: &Room, cube: &Arc<MeshData>) -> BodyDesc {
    let size = Vec3::new(
        rng.gen_range(0.5..2.5),
        rng.gen_range(0.5..2.5),
        rng.gen_range(0.5..2.5),
    );
    let reach = room.scale - Vec3::splat(3.0);
    BodyDesc {
        position: Vec3::new(
            rng.gen_range(-reach.x..reach.x),
            rng.gen_range(0.0..reach.y),
            rng.gen_range(-reach.z..reach.z),
        ),
        velocity: Vec3::new(rng.gen_range(-3.0..3.0), 0.0, rng.gen_range(-3.0..3.0)),
        orientation: Vec3::new(
            rng.gen_range(-PI..PI),
            rng.gen_range(-PI..PI),
            rng.gen_range(-PI..PI),
        ),
        scale: size,
        restitution: rng.gen_range(0.3..0.9),
        ..BodyDesc::dynamic(cube.clone(), size.x * size.y * size.z)
    }
}

/// Three boxes forming a dumbbell that moves as one body.
fn dumbbell(cube: &Arc<MeshData>) -> Vec<BodyDesc> {
    let part = |x: f32, scale: Vec3, mass: f32| BodyDesc {
        position: Vec3::new(x, 8.0, 0.0),
        scale,
        ..BodyDesc::dynamic(cube.clone(), mass)
    };
    vec![
        part(-4.0, Vec3::splat(1.5), 6.0),
        part(0.0, Vec3::new(2.5, 0.4, 0.4), 1.0),
        part(4.0, Vec3::splat(1.5), 6.0),
    ]
}

fn build_scene(world: &mut PhysicsWorld, args: &Args) -> Result<()> {
    let room = Room::default();
    let cube = Arc::new(MeshData::cube());
    let mut rng = StdRng::seed_from_u64(args.seed);

    for _ in 0..args.boxes {
        world.spawn(random_box(&mut rng, &room, &cube))?;
    }
    world.spawn_group(dumbbell(&cube))?;
    world.spawn_group(room.walls(&cube))?;
    if args.blender {
        world.spawn(room.blender(&cube))?;
    }

    tracing::info!(
        "scene built: {} bodies in {} groups",
        world.bodies().len(),
        world.groups().len()
    );
    Ok(())
}

fn log_progress(world: &PhysicsWorld, tick: u32) {
    let moving = world.bodies().iter().filter(|b| !b.wall);
    let (count, height, fastest) = moving.fold((0usize, 0.0f32, 0.0f32), |(n, h, v), b| {
        (n + 1, h + b.position.y, v.max(b.velocity.length()))
    });
    let mean_height = if count > 0 { height / count as f32 } else { 0.0 };
    tracing::info!(
        "tick {}: {} contacts, mean height {:.2}, max speed {:.2}",
        tick,
        world.contacts().len(),
        mean_height,
        fastest
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let mut world = PhysicsWorld::new(PhysicsConfig::default());
    build_scene(&mut world, &args)?;
    if let Some(axis) = args.gravity {
        world.override_gravity(axis.vector());
    }

    let mut skipped = 0u32;
    let mut resolved = 0usize;
    for tick in 1..=args.ticks {
        if args.ungroup && tick == args.ticks / 2 {
            world.ungroup();
            tracing::info!("ungrouped at tick {}", tick);
        }

        match world.tick(args.dt) {
            StepOutcome::Integrated => resolved += world.contacts().len(),
            StepOutcome::Skipped => skipped += 1,
        }

        if args.report_every > 0 && tick % args.report_every == 0 {
            log_progress(&world, tick);
        }
    }

    tracing::info!(
        "done: {} ticks, {} skipped, {} contacts resolved",
        args.ticks,
        skipped,
        resolved
    );
    Ok(())
}
