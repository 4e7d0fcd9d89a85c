use futures::future::BoxFuture;

use super::events::Event;
use super::types::Command;

/// Executes dashboard commands.
///
/// Commands run in the order received. On success `dispatch` returns the
/// events describing what changed; refreshes it starts keep running after
/// the call returns and report through the snapshot feed.
pub trait Store {
    type Error;

    fn dispatch(&self, cmd: Command) -> BoxFuture<'_, Result<Vec<Event>, Self::Error>>;
}
