//! Printing of the event stream and the final summary.
use combat_core::WorldSnapshot;
use runtime::Event;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::cli::OutputFormat;

/// Prints every event from `rx` until the bus closes.
pub async fn print_events(mut rx: broadcast::Receiver<Event>, format: OutputFormat) {
    loop {
        match rx.recv().await {
            Ok(event) => print_event(&event, format),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!(
            "[{:>6}] {:?} {:?}",
            event.tick().0,
            event.topic(),
            event.combat_event()
        ),
        OutputFormat::Json => match event.to_json() {
            Ok(line) => println!("{line}"),
            Err(error) => warn!(%error, "failed to encode event"),
        },
    }
}

pub fn print_summary(snapshot: &WorldSnapshot) {
    let player = &snapshot.player;
    println!("── encounter summary ──");
    println!("tick            {}", snapshot.tick);
    println!("wave            {}", snapshot.wave);
    println!(
        "this wave       {} spawned / {} defeated / {} pending",
        snapshot.enemies_spawned, snapshot.enemies_defeated, snapshot.pending_spawns
    );
    println!("enemies alive   {}", snapshot.enemies.iter().filter(|e| e.alive).count());
    println!(
        "player          {} ({:.0}/{:.0} hp, {} stance, {} souls)",
        if player.alive { "alive" } else { "dead" },
        player.health,
        player.max_health,
        player.stance,
        player.souls
    );
}
