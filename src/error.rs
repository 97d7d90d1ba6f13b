use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {name} has been configured")]
    Missing { name: &'static str },
}

#[derive(Debug, Error)]
pub enum RestError {
    #[error("unexpected status {status} from {target}: {body}")]
    UnexpectedStatus {
        status: u16,
        target: String,
        body: String,
    },

    #[error("too many pending (202) responses from {target} after {attempts} attempts")]
    TooManyPending { target: String, attempts: usize },

    #[error("unexpected content type from {target}: {content_type}")]
    UnexpectedContentType {
        target: String,
        content_type: String,
    },
}
