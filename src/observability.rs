use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("academe.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("academe.client.request_errors");

pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("academe.stream.fragments");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("academe.stream.errors");

pub(crate) static SESSION_TURNS: Counter = Counter::new("academe.session.turns");
pub(crate) static SESSION_INTERRUPTS: Counter = Counter::new("academe.session.interrupts");
pub(crate) static SESSION_BATCH_QUESTIONS: Counter =
    Counter::new("academe.session.batch_questions");
pub(crate) static SESSION_EXPORTS: Counter = Counter::new("academe.session.exports");
pub(crate) static SESSION_TURN_DURATION: Moments =
    Moments::new("academe.session.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_INTERRUPTS);
    collector.register_counter(&SESSION_BATCH_QUESTIONS);
    collector.register_counter(&SESSION_EXPORTS);
    collector.register_moments(&SESSION_TURN_DURATION);
}
