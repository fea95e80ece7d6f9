//! Headless demo: walks a rig over block terrain and streams snapshots as
//! JSON lines.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use bevy::prelude::*;
use clap::Parser;
use legwork::{
    init_logging, Block, BlockSlope, BlockTerrain, BodyVelocity, LegRig, LocomotionConfig,
    LocomotionPlugin, Terrain,
};
use log::info;

/// Walks a legged rig across block terrain and prints one JSON snapshot per
/// fixed tick
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON rig configuration; a hexapod is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of fixed ticks to simulate
    #[arg(long, default_value_t = 240)]
    ticks: u32,
    /// Fixed timestep in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Forward body speed in units per second
    #[arg(long, default_value_t = 4.0)]
    speed: f32,
    /// Body turn rate in radians per second
    #[arg(long, default_value_t = 0.0)]
    turn_rate: f32,
    /// Height of the body above the floor
    #[arg(long, default_value_t = 1.0)]
    ride_height: f32,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Scripted body: walks forward along its heading and rides the floor.
struct Walker {
    position: Vec3,
    yaw: f32,
    velocity: Vec3,
    ride_height: f32,
}

impl Walker {
    fn new(terrain: &BlockTerrain, ride_height: f32) -> Self {
        let floor = terrain.floor_height_at(0.0, 0.0).unwrap_or_default();
        Self {
            position: Vec3::new(0.0, floor + ride_height, 0.0),
            yaw: 0.0,
            velocity: Vec3::ZERO,
            ride_height,
        }
    }

    fn advance(&mut self, terrain: &BlockTerrain, speed: f32, turn_rate: f32, dt: f32) {
        self.yaw += turn_rate * dt;
        let heading = Quat::from_rotation_y(self.yaw) * Vec3::Z;
        self.velocity = heading * speed;
        self.position += self.velocity * dt;
        if let Some(floor) = terrain.floor_height_at(self.position.x, self.position.z) {
            self.position.y = floor + self.ride_height;
        }
    }

    fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(Quat::from_rotation_y(self.yaw))
    }
}

/// Flat ground that climbs two steps and then a ramp along +Z.
fn demo_terrain() -> BlockTerrain {
    let mut blocks = Vec::new();
    let mut id = 0;
    for z in 8..64 {
        let level = if z < 16 { 0 } else { 1 };
        for x in -6..6 {
            id += 1;
            blocks.push(Block { id, x, y: level, z });
        }
    }
    let slopes = blocks
        .iter()
        .filter(|block| block.z >= 32)
        .map(|block| BlockSlope {
            block_id: block.id,
            grad_x: 0.0,
            grad_z: 0.05,
        })
        .collect::<Vec<_>>();
    BlockTerrain::from_parts(Some(0.0), blocks, slopes)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    ensure!(args.dt.is_finite() && args.dt > 0.0, "--dt must be positive");

    let config = match &args.config {
        Some(path) => LocomotionConfig::load(path)
            .with_context(|| format!("loading rig configuration from {}", path.display()))?,
        None => LocomotionConfig::hexapod(),
    };

    let terrain = demo_terrain();
    let mut walker = Walker::new(&terrain, args.ride_height);
    let rig = LegRig::build(&config, &walker.transform(), &terrain)
        .context("invalid rig configuration")?;
    info!("walking {} legs for {} ticks", rig.coordinator().legs().len(), args.ticks);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LocomotionPlugin)
        .insert_resource(Time::<Fixed>::from_seconds(f64::from(args.dt)))
        .insert_resource(Terrain::new(terrain.clone()));
    let body = app
        .world_mut()
        .spawn((walker.transform(), BodyVelocity::default(), rig))
        .id();

    let mut out = io::stdout().lock();
    for _ in 0..args.ticks {
        walker.advance(&terrain, args.speed, args.turn_rate, args.dt);
        if let Some(mut transform) = app.world_mut().get_mut::<Transform>(body) {
            *transform = walker.transform();
        }
        if let Some(mut velocity) = app.world_mut().get_mut::<BodyVelocity>(body) {
            velocity.0 = walker.velocity;
        }
        app.world_mut().run_schedule(FixedUpdate);

        let Some(rig) = app.world().get::<LegRig>(body) else {
            break;
        };
        let line = serde_json::to_string(&rig.coordinator().snapshot())
            .context("serialising snapshot")?;
        writeln!(out, "{line}").context("writing snapshot")?;
    }

    if let Some(rig) = app.world().get::<LegRig>(body) {
        info!("final state:\n{}", rig.coordinator().snapshot());
    }
    Ok(())
}
