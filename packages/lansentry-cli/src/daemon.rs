//! The watch loop: periodic scan cycles, asynchronous probe application,
//! runtime commands on stdin, and graceful shutdown.
//!
//! The reconciled device list is the only shared mutable resource. It
//! lives behind a mutex; the full reconcile pass and each individual
//! probe application take the lock for the whole update, so the two
//! writers never interleave. Probe completions are funneled through a
//! channel into a single apply task rather than mutating state from
//! each probe future.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use lansentry_core::{
    config::{self, Command, Config},
    occupancy::{self, OccupancyTransition},
    presence::{self, PresenceState, ReconcileOptions},
    projection, registry,
    registry::Device,
    scanner::{self, ProbeOutcome},
    store::LastSeenStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, interval};

use crate::render;

pub async fn run_watch(mut config: Config) -> Result<()> {
    let registry = registry::normalize(&config.devices);
    tracing::info!(
        "watching {} configured devices every {}s (keep-alive {}s)",
        registry.len(),
        config.update_interval,
        config.keep_alive
    );

    let mut store = if config.save_last_seen {
        Some(LastSeenStore::open_default()?)
    } else {
        None
    };

    let mut initial = PresenceState::new(&registry);
    if let Some(store) = &store {
        store.restore_devices(&mut initial.devices);
    }
    let state = Arc::new(Mutex::new(initial));

    // Single-writer apply loop for probe completions. Results from a
    // previous cycle may still arrive here; applying them by identity
    // against the live state is safe.
    let (probe_tx, mut probe_rx) = mpsc::channel::<ProbeOutcome>(64);
    let apply_state = state.clone();
    let keep_alive = config.keep_alive;
    tokio::spawn(async move {
        while let Some(probe) = probe_rx.recv().await {
            let mut state = apply_state.lock().await;
            let applied = presence::apply_probe_result(
                &mut state.devices,
                &probe.ip_address,
                probe.is_alive,
                Utc::now(),
                keep_alive,
            );
            if applied {
                tracing::debug!(
                    "probe result: {} is {}",
                    probe.ip_address,
                    if probe.is_alive { "alive" } else { "unreachable" }
                );
            }
        }
    });

    let mut ticker = interval(Duration::from_secs(config.update_interval.max(1)));
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(&config, &registry, &state, store.as_mut(), &probe_tx).await;
            }

            line = stdin_lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match Command::parse(line) {
                            Some(command) => {
                                let outcome = config::apply_command(&mut config, &command);
                                println!("{}", outcome.reply);
                                if outcome.rescan {
                                    // A fresh interval fires immediately,
                                    // which doubles as the forced rescan.
                                    ticker = interval(Duration::from_secs(
                                        config.update_interval.max(1),
                                    ));
                                }
                            }
                            None => println!("unrecognized command: {line}"),
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        tracing::debug!("stopped reading control commands: {e}");
                        stdin_open = false;
                    }
                }
            }

            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    if let Some(store) = store.as_mut() {
        let state = state.lock().await;
        if let Err(e) = store.save_devices(&state.devices) {
            tracing::warn!("failed to persist last-seen data on shutdown: {e}");
        }
    }

    Ok(())
}

/// One scan cycle: sweep, reconcile under the state lock, evaluate
/// occupancy, persist, render, then fan out this cycle's probes.
async fn run_cycle(
    config: &Config,
    registry: &[Device],
    state: &Arc<Mutex<PresenceState>>,
    store: Option<&mut LastSeenStore>,
    probe_tx: &mpsc::Sender<ProbeOutcome>,
) {
    let sweep = match scanner::sweep_link_layer(&config.network).await {
        Ok(sweep) => sweep,
        Err(e) => {
            // Degrade to "nothing visible"; prior sightings age out
            // through the keep-alive window instead of vanishing.
            tracing::warn!("link-layer sweep failed: {e}");
            Vec::new()
        }
    };

    let now = Utc::now();
    let options = ReconcileOptions {
        show_offline: config.show_offline,
        show_unknown: config.show_unknown,
        sort: config.sort,
        keep_alive_secs: config.keep_alive,
    };

    {
        let mut guard = state.lock().await;
        let next = presence::reconcile(&guard.devices, &sweep, registry, &options, now);
        guard.devices = next;

        if !config.residents.is_empty() {
            let outcome =
                occupancy::evaluate(&guard.devices, &config.residents, guard.occupied);
            guard.occupied = outcome.occupied;
            match outcome.transition {
                Some(OccupancyTransition::BecameOccupied) => {
                    tracing::info!("someone has come home");
                    forward_event("occupied", config.occupied_cmd.as_ref());
                }
                Some(OccupancyTransition::BecameVacant) => {
                    tracing::info!("everyone has left home");
                    forward_event("vacant", config.vacant_cmd.as_ref());
                }
                None => {}
            }
        }

        if let Some(store) = store {
            if let Err(e) = store.save_devices(&guard.devices) {
                tracing::warn!("failed to persist last-seen data: {e}");
            }
        }

        let online = guard.devices.iter().filter(|d| d.online).count();
        tracing::info!("cycle complete: {} devices, {} online", guard.devices.len(), online);
        render::print_view(&projection::project(&guard.devices, config, now));
    }

    // Reachability probes run concurrently with each other and with the
    // next sweep; each completion lands in the apply loop.
    for ip in registry.iter().filter_map(|d| d.ip_address.clone()) {
        let tx = probe_tx.clone();
        tokio::spawn(async move {
            let is_alive = scanner::probe_reachability(&ip).await;
            let _ = tx
                .send(ProbeOutcome {
                    ip_address: ip,
                    is_alive,
                })
                .await;
        });
    }
}

/// Forward a configured occupancy command descriptor, verbatim, for an
/// external dispatcher to consume from stdout.
fn forward_event(event: &str, descriptor: Option<&serde_json::Value>) {
    if let Some(descriptor) = descriptor {
        println!("EVENT {event} {descriptor}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
