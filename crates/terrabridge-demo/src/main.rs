//! Headless demo that streams synthetic map tiles through terrabridge.
//!
//! A worker thread plays the part of the native streaming engine, producing
//! terrain, road and building meshes plus raster textures for the cells
//! around the camera. The scene backend only keeps bookkeeping, which is
//! logged as a scripted camera tour runs.

mod backend;
mod launch_params;
mod synthetic;
mod tiles;
mod tour;

use std::process::ExitCode;

use terrabridge::MapSession;
use web_time::Instant;

use crate::backend::HeadlessBackend;
use crate::synthetic::SyntheticEngine;
use crate::tour::Tour;

/// Frames between progress logs.
const LOG_INTERVAL: u64 = 120;

fn main() -> ExitCode {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let params = match launch_params::parse() {
        Ok(params) => params,
        Err(e) => {
            tracing::error!(error = %e, "invalid launch parameters");
            return ExitCode::FAILURE;
        }
    };

    let mut session = match MapSession::new(params.map, HeadlessBackend::new(), SyntheticEngine::new()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "failed to start map session");
            return ExitCode::FAILURE;
        }
    };

    let tour = Tour {
        frames_per_stop: params.frames_per_stop,
        dt: params.dt,
    };
    let started = Instant::now();
    let mut frames = 0u64;
    let result = tour.run(&mut session, |session| {
        frames += 1;
        if frames % LOG_INTERVAL == 0 {
            let stats = session.backend().stats();
            tracing::info!(
                frames,
                live = session.scene().len(),
                tiles = session.engine().live_tiles(),
                objects = stats.objects,
                active = stats.active_objects,
                materials = stats.materials,
                textures = stats.textures,
                max_object_distance = stats.max_object_distance,
                "streaming"
            );
        }
    });

    let elapsed = started.elapsed();
    let engine_stats = session.engine().stats();
    let backend_stats = session.backend().stats();
    tracing::info!(
        frames,
        seconds = elapsed.as_secs_f64(),
        requested = engine_stats.requested,
        added = engine_stats.added,
        evicted = engine_stats.evicted,
        uploaded_vertices = backend_stats.uploaded_vertices,
        "tour finished"
    );

    let (backend, _engine) = session.shutdown();
    let leftover = backend.stats();
    if leftover.objects + leftover.geometries + leftover.materials + leftover.textures > 0 {
        tracing::warn!(?leftover, "backend resources outlived the session");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tour failed");
            ExitCode::FAILURE
        }
    }
}
