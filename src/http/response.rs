/// Statuses the runner treats as a successful call.
pub const SUCCESS_STATUSES: [u16; 2] = [200, 201];

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        SUCCESS_STATUSES.contains(&self.status)
    }
}
