use lazy_static::lazy_static;
use tokio::runtime::Runtime;

lazy_static! {
    /// Runtime for out-of-line service lookups (player stats, live status).
    pub static ref TOKIO_RUNTIME: Runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("scatter-entity-io")
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");
}
