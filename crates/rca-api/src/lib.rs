//! Client for the question-answering service: query encoding, HTTP
//! transport with retry, response memoization, and conversational sessions.

pub mod memo;
pub mod query;
pub mod retry;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use memo::{ANSWER_FUNCTION, AnswerRequest, MemoizedClient, build_transport};
pub use query::{QueryParams, encode_query};
pub use retry::{Backoff, RetryEvent, RetryObserver, RetryPolicy, RetryingTransport, retry_with};
pub use session::{ConversationSession, SessionPhase, SessionState};
pub use transport::{
    CONVERSATION_ENDPOINT, HttpTransport, SHORT_ANSWER_ENDPOINT, Transport, TransportRequest,
    classify_response,
};
