//! Runs the lattice generator over a span of scene time and reports what
//! each frame would hand to the renderer.
//!
//! Usage: `lattice [--poles=N] [--seed=N] [--start=T] [--frames=N] [--fps=N] [--threads=N]`

use std::{num::NonZeroUsize, time::Instant};

use anyhow::{Context, bail};
use lattice_ngin::{SceneConfig, SceneFlow, resources::BuiltinShapes};

struct Args {
    config: SceneConfig,
    start: f32,
    frames: u32,
    fps: f32,
    threads: Option<NonZeroUsize>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: SceneConfig::default(),
        start: 0.0,
        frames: 120,
        fps: 30.0,
        threads: None,
    };

    for arg in std::env::args().skip(1) {
        let Some((key, value)) = arg.strip_prefix("--").and_then(|a| a.split_once('=')) else {
            bail!("unexpected argument '{arg}', expected --key=value");
        };
        let ctx = || format!("invalid value for --{key}: '{value}'");
        match key {
            "poles" => args.config.pole_count = value.parse().with_context(ctx)?,
            "seed" => args.config.seed = value.parse().with_context(ctx)?,
            "range" => args.config.base_range = value.parse().with_context(ctx)?,
            "stride" => args.config.node_stride = value.parse().with_context(ctx)?,
            "lifetime" => args.config.lifetime = value.parse().with_context(ctx)?,
            "emission" => args.config.emission_rate = value.parse().with_context(ctx)?,
            "start" => args.start = value.parse().with_context(ctx)?,
            "frames" => args.frames = value.parse().with_context(ctx)?,
            "fps" => args.fps = value.parse().with_context(ctx)?,
            "threads" => args.threads = Some(value.parse().with_context(ctx)?),
            _ => bail!("unknown option --{key}"),
        }
    }
    args.config.validate()?;
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let shapes = BuiltinShapes::new(args.config.node_stride);
    let mut flow = SceneFlow::new(args.config, shapes);
    if let Some(threads) = args.threads {
        flow.set_workers(threads);
    }

    for frame in 0..args.frames {
        let time = args.start + frame as f32 / args.fps;
        let started = Instant::now();
        match flow.update(time) {
            Ok(mesh) => log::info!(
                "frame {frame:4} t={time:6.2}s: {:6} vertices, {:6} triangles in {:?}",
                mesh.vertex_count(),
                mesh.triangle_count(),
                started.elapsed()
            ),
            // The previous mesh stays on screen.
            Err(e) => log::error!("frame {frame} t={time:.2}s dropped: {e}"),
        }
    }

    if let Some(stats) = flow.last_stats() {
        log::info!(
            "last frame: {} instances, {} poles, {} emitters, longest pole {} nodes",
            stats.instances,
            stats.poles,
            stats.emitters,
            stats.max_node_iterations
        );
    }
    Ok(())
}
