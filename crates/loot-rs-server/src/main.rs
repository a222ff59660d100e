mod config;
mod console;
mod sandbox;

use std::path::Path;
use std::time::Duration;

use config::ServerConfig;
use loot_rs_core::{LootCoordinator, LootEvent};
use loot_rs_table::{load_item_catalog, load_loot_stores, ItemCatalog};
use sandbox::Sandbox;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, error, info, warn};

fn log_event(event: &LootEvent) {
    match event {
        LootEvent::LootError { .. } | LootEvent::EquipError { .. } => {
            warn!("-> {}: {:?}", event.recipient(), event)
        }
        LootEvent::RollWon { .. } | LootEvent::AllPassed { .. } | LootEvent::NewItem { .. } => {
            info!("-> {}: {:?}", event.recipient(), event)
        }
        _ => debug!("-> {}: {:?}", event.recipient(), event),
    }
}

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("config.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Loot server v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Data: {}, tick: {} ms, roll timeout: {} ms",
        config.server.data_dir, config.server.tick_ms, config.loot.roll_timeout_ms
    );

    let data_dir = Path::new(&config.server.data_dir);
    let catalog = match load_item_catalog(data_dir) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load item catalog: {e}");
            ItemCatalog::new()
        }
    };
    let stores = load_loot_stores(data_dir, catalog, config.rates.clone());

    let mut loot = match config.server.rng_seed {
        Some(seed) => {
            info!("Using fixed rng seed {seed}");
            LootCoordinator::with_seed(stores, config.loot.clone(), seed)
        }
        None => LootCoordinator::new(stores, config.loot.clone()),
    };
    let mut world = Sandbox::new();

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    let shutdown_tx_ctrlc = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx_ctrlc.send(true);
    });

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    info!("Ready. Type 'help' for commands.");

    // Console lines queue up and are applied at the start of the next tick.
    let tick_ms = config.server.tick_ms.max(1);
    let mut tick_interval = tokio::time::interval(Duration::from_millis(tick_ms));
    let mut pending: Vec<String> = Vec::new();
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                for line in pending.drain(..) {
                    let result = console::execute(&line, &mut loot, &mut world);
                    for message in &result.messages {
                        if result.success {
                            info!("{message}");
                        } else {
                            warn!("{message}");
                        }
                    }
                    if result.should_stop {
                        let _ = shutdown_tx.send(true);
                    }
                }

                loot.update(&mut world, u32::try_from(tick_ms).unwrap_or(u32::MAX));
                for event in loot.drain_events() {
                    log_event(&event);
                }
            }
            Some(line) = console_rx.recv() => {
                pending.push(line);
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    loot.shutdown(&mut world);
    for event in loot.drain_events() {
        log_event(&event);
    }
    info!("Server shut down.");
}
