/// Fixed-interval polling of one station
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::station::Station;

/// Start the poll loop of a station
///
/// The first fetch happens one interval after the call. Every outcome,
/// good or bad, schedules the next fetch after the same interval; there is
/// no backoff and no retry within a cycle. A new fetch only starts once the
/// previous outcome has been applied. The loop ends when `shutdown` fires.
pub fn spawn_poller(station: Station, shutdown: watch::Receiver<()>) -> JoinHandle<()> {
    tokio::spawn(run(station, shutdown))
}

async fn run(station: Station, mut shutdown: watch::Receiver<()>) {
    let interval = station.poll_interval();
    info!(
        "{}: polling every {} ms",
        station.name(),
        interval.as_millis()
    );

    loop {
        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.changed() => {
                info!("{}: poller stopped", station.name());
                break;
            }
        }

        station.cycle().await;
    }
}
