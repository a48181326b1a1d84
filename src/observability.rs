use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("flyora.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("flyora.client.request_errors");
pub(crate) static CLIENT_NETWORK_FAILURES: Counter =
    Counter::new("flyora.client.network_failures");
pub(crate) static CLIENT_AUTH_FAILURES: Counter = Counter::new("flyora.client.auth_failures");
pub(crate) static CLIENT_LOGIN_REDIRECTS: Counter = Counter::new("flyora.client.login_redirects");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("flyora.client.request_duration_seconds");

pub(crate) static CHAT_QUESTIONS: Counter = Counter::new("flyora.chat.questions");
pub(crate) static CHAT_FALLBACKS: Counter = Counter::new("flyora.chat.fallbacks");
pub(crate) static CHAT_PARSE_FAILURES: Counter = Counter::new("flyora.chat.parse_failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_NETWORK_FAILURES);
    collector.register_counter(&CLIENT_AUTH_FAILURES);
    collector.register_counter(&CLIENT_LOGIN_REDIRECTS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_QUESTIONS);
    collector.register_counter(&CHAT_FALLBACKS);
    collector.register_counter(&CHAT_PARSE_FAILURES);
}
