pub use metrics::*;
use std::sync::LazyLock;

/*
 * Shuffling cache
 */
pub static SHUFFLING_CACHE_HITS: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_shuffling_cache_hits_total",
        "Count of times the shuffling cache fulfils a request",
    )
});
pub static SHUFFLING_CACHE_MISSES: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_shuffling_cache_misses_total",
        "Count of times the shuffling cache misses",
    )
});
pub static SHUFFLING_CACHE_PROMISE_WAITS: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_shuffling_cache_promise_waits_total",
        "Count of times a request waited on a shuffling being computed by another thread",
    )
});
pub static SHUFFLING_CACHE_SIZE: LazyLock<Result<IntGauge>> = LazyLock::new(|| {
    try_create_int_gauge(
        "beacon_shuffling_cache_size",
        "Number of shufflings and promises held in the shuffling cache",
    )
});
pub static COMMITTEE_CACHE_BUILD_TIMES: LazyLock<Result<Histogram>> = LazyLock::new(|| {
    try_create_histogram(
        "beacon_committee_cache_build_seconds",
        "Time spent shuffling the active set into committees",
    )
});

/*
 * Proposer cache
 */
pub static PROPOSER_CACHE_HITS: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_proposer_cache_hits_total",
        "Count of times the proposer cache fulfils a request",
    )
});
pub static PROPOSER_CACHE_MISSES: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_proposer_cache_misses_total",
        "Count of times the proposer cache misses",
    )
});
pub static PROPOSER_COMPUTATION_TIMES: LazyLock<Result<Histogram>> = LazyLock::new(|| {
    try_create_histogram(
        "beacon_proposer_computation_seconds",
        "Time spent selecting the proposers of an epoch",
    )
});

/*
 * Validator duties
 */
pub static DUTIES_REQUESTS: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_duties_requests_total",
        "Count of validator duties requests",
    )
});
pub static DUTIES_REQUEST_FAILURES: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_duties_request_failures_total",
        "Count of validator duties requests that returned an error",
    )
});
pub static DUTIES_REQUESTED_KEYS: LazyLock<Result<IntCounter>> = LazyLock::new(|| {
    try_create_int_counter(
        "beacon_duties_requested_keys_total",
        "Count of public keys for which duties were requested",
    )
});
pub static DUTIES_REQUEST_TIMES: LazyLock<Result<Histogram>> = LazyLock::new(|| {
    try_create_histogram(
        "beacon_duties_request_seconds",
        "Full runtime of validator duties requests",
    )
});
