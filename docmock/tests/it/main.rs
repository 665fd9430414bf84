/*! Integration tests for docmock.
 *
 * A single integration test binary. Modules mirror the public surface:
 * - paths: Path parsing, parity rules and reference handles
 * - writes: set, merge, update, delete and field-value sentinels
 * - snapshots: Reading documents and decoding references
 * - queries: Ordering, cursors, limits and filters
 * - batch: Write batches and transactions
 * - listeners: Snapshot listeners and change notification
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("docmock_memory=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod batch;
mod helpers;
mod listeners;
mod queries;
mod snapshots;
