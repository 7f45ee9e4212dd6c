use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use voxelstore_engine::provider::{NoIoProvider, Provider};
use voxelstore_engine::world::{ChunkOrigin, World};
use voxelstore_server::anvil::AnvilProvider;
use voxelstore_server::generator::FlatGenerator;

#[derive(Parser)]
#[command(name = "voxelstore-server", about = "Host a voxel world stored in Anvil region files")]
struct Cli {
    /// World directory
    #[arg(long, default_value = "world")]
    world: PathBuf,

    /// Ephemeral world: generate every chunk, persist nothing
    #[arg(long)]
    no_io: bool,

    /// Chunk radius kept loaded around spawn
    #[arg(long, default_value = "8")]
    radius: i32,

    /// Seconds between autosaves
    #[arg(long, default_value = "300")]
    autosave_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let provider: Box<dyn Provider> = if cli.no_io {
        tracing::info!("Running an ephemeral world (no disk I/O)");
        Box::new(NoIoProvider)
    } else {
        let provider = AnvilProvider::open(&cli.world)
            .with_context(|| format!("opening world at {}", cli.world.display()))?;
        Box::new(provider)
    };
    let world = Arc::new(World::open(provider, Box::new(FlatGenerator::default())));

    load_spawn_area(&world, cli.radius);

    // ── Periodic autosave ────────────────────────────────────────────────
    let save_world_ref = Arc::clone(&world);
    let autosave = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cli.autosave_secs.max(1)));
        interval.tick().await; // first tick is immediate, skip it
        loop {
            interval.tick().await;
            tracing::info!("Autosaving...");
            let world = Arc::clone(&save_world_ref);
            match tokio::task::spawn_blocking(move || world.save()).await {
                Ok(Ok(n)) => tracing::info!("Autosave complete: {} chunks", n),
                Ok(Err(e)) => tracing::error!("Autosave failed: {}", e),
                Err(e) => tracing::error!("Autosave task failed: {}", e),
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl+C")?;
    tracing::info!("Ctrl+C received, shutting down...");
    autosave.abort();
    let _ = autosave.await;

    // ── Save and close on shutdown ───────────────────────────────────────
    match Arc::try_unwrap(world) {
        Ok(world) => world.close().context("closing world")?,
        // An in-flight autosave still holds a reference; the last one dropped
        // performs the close.
        Err(_) => tracing::warn!("Autosave still running, world closes when it finishes"),
    }
    Ok(())
}

/// Load (or generate) every chunk within `radius` of spawn. Chunks whose
/// saved data is unreadable are left unloaded rather than regenerated.
fn load_spawn_area(world: &World, radius: i32) {
    let spawn = world.settings().spawn;
    let Some(center) = spawn.chunk() else {
        tracing::error!("Spawn {:?} lies outside the world, not loading a spawn area", spawn);
        return;
    };
    let (mut loaded, mut generated, mut failed) = (0usize, 0usize, 0usize);

    for pos in center.square_around(radius) {
        match world.load_chunk(pos) {
            Ok(ChunkOrigin::Loaded) => loaded += 1,
            Ok(ChunkOrigin::Generated) => generated += 1,
            Ok(ChunkOrigin::Resident) => {}
            Err(e) => {
                failed += 1;
                tracing::error!("Leaving chunk {} unloaded: {}", pos, e);
            }
        }
    }

    tracing::info!(
        "Spawn area ready around chunk {}: {} loaded, {} generated, {} unreadable",
        center,
        loaded,
        generated,
        failed,
    );
}
